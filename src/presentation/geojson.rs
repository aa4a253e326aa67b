use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde_json::{json, Value};
use tracing::info;

use crate::distance::oracle::NetworkOracle;
use crate::domain::registry::PubRegistry;
use crate::domain::types::CrawlPlan;
use crate::error::{CrawlError, Result};
use crate::network::geo::haversine_distance;

/// Route map as a GeoJSON `FeatureCollection`: a numbered point per stop and
/// a line per leg following the walking path. Coordinates are `[lon, lat]`.
pub fn route_feature_collection(plan: &CrawlPlan, legs: &[Vec<(f64, f64)>]) -> Value {
    let mut features: Vec<Value> = plan
        .stops
        .iter()
        .enumerate()
        .map(|(i, stop)| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [stop.longitude, stop.latitude],
                },
                "properties": {
                    "label": format!("{}: {}", i, stop.name),
                    "order": i,
                    "name": stop.name,
                    "address": stop.address,
                },
            })
        })
        .collect();

    features.extend(legs.iter().enumerate().map(|(i, path)| {
        let coordinates: Vec<[f64; 2]> = path.iter().map(|&(lat, lon)| [lon, lat]).collect();
        json!({
            "type": "Feature",
            "geometry": {
                "type": "LineString",
                "coordinates": coordinates,
            },
            "properties": { "leg": i },
        })
    }));

    json!({
        "type": "FeatureCollection",
        "properties": { "total_distance_m": plan.total_distance },
        "features": features,
    })
}

pub fn write_route_geojson(
    path: impl AsRef<Path>,
    plan: &CrawlPlan,
    legs: &[Vec<(f64, f64)>],
) -> Result<()> {
    let path = path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &route_feature_collection(plan, legs))?;
    info!("Wrote route map to {}", path.display());
    Ok(())
}

/// Map of every known pub next to the network node it was snapped to.
/// Pub points have `"kind": "pub"`, their nodes `"kind": "snapped_node"`.
pub fn registry_feature_collection(
    registry: &PubRegistry,
    oracle: &NetworkOracle,
) -> Result<Value> {
    let mut features = Vec::with_capacity(registry.len() * 2);
    for loc in registry.locations() {
        let idx = oracle.node_of(loc)?;
        let node = oracle.network().node(idx).ok_or_else(|| {
            CrawlError::invalid_data(format!("{} snapped to a missing node", loc.name))
        })?;
        let snap_distance = haversine_distance(loc.latitude, loc.longitude, node.lat, node.lon);

        features.push(json!({
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": [loc.longitude, loc.latitude],
            },
            "properties": {
                "kind": "pub",
                "name": loc.name,
                "address": loc.address,
            },
        }));
        features.push(json!({
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": [node.lon, node.lat],
            },
            "properties": {
                "kind": "snapped_node",
                "pub": loc.name,
                "osm_id": node.osm_id,
                "snap_distance_m": snap_distance,
            },
        }));
    }

    Ok(json!({
        "type": "FeatureCollection",
        "features": features,
    }))
}

pub fn write_registry_geojson(
    path: impl AsRef<Path>,
    registry: &PubRegistry,
    oracle: &NetworkOracle,
) -> Result<()> {
    let path = path.as_ref();
    let collection = registry_feature_collection(registry, oracle)?;
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &collection)?;
    info!("Wrote map of {} pubs to {}", registry.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::types::Location;
    use crate::network::graph::{NetworkNode, WalkNetwork};

    #[test]
    fn points_then_lines_in_lon_lat_order() {
        let plan = CrawlPlan {
            stops: vec![
                Location::new("A", 53.0, -9.0),
                Location::new("B", 53.1, -9.1),
            ],
            total_distance: 120.5,
        };
        let legs = vec![vec![(53.0, -9.0), (53.05, -9.05), (53.1, -9.1)]];
        let fc = route_feature_collection(&plan, &legs);

        let features = fc["features"].as_array().unwrap();
        assert_eq!(features.len(), 3);
        assert_eq!(features[0]["geometry"]["coordinates"], json!([-9.0, 53.0]));
        assert_eq!(features[1]["properties"]["label"], "1: B");
        assert_eq!(features[2]["geometry"]["type"], "LineString");
        assert_eq!(features[2]["geometry"]["coordinates"][1], json!([-9.05, 53.05]));
        assert_eq!(fc["properties"]["total_distance_m"], 120.5);
    }

    #[test]
    fn registry_map_pairs_each_pub_with_its_node() {
        let network = WalkNetwork::from_parts(
            &[
                NetworkNode { id: 11, lat: 53.2700, lon: -9.0500 },
                NetworkNode { id: 12, lat: 53.2720, lon: -9.0500 },
            ],
            &[],
        )
        .unwrap();
        let registry = PubRegistry::new(vec![
            Location::new("Caribou", 53.2701, -9.0500),
            Location::new("Taaffes", 53.2719, -9.0501),
        ])
        .unwrap();
        let oracle = NetworkOracle::new(Arc::new(network), registry.locations()).unwrap();

        let fc = registry_feature_collection(&registry, &oracle).unwrap();
        let features = fc["features"].as_array().unwrap();
        assert_eq!(features.len(), 4);
        assert_eq!(features[0]["properties"]["kind"], "pub");
        assert_eq!(features[1]["properties"]["kind"], "snapped_node");
        assert_eq!(features[1]["properties"]["osm_id"], 11);
        assert_eq!(features[3]["properties"]["pub"], "Taaffes");
        assert_eq!(features[3]["properties"]["osm_id"], 12);
        assert_eq!(features[3]["geometry"]["coordinates"], json!([-9.05, 53.272]));
        let snap = features[1]["properties"]["snap_distance_m"].as_f64().unwrap();
        assert!((snap - 11.1).abs() < 0.5, "got {snap}");
    }
}
