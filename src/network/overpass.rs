//! Downloads the walkable street network for a bounding box from the
//! Overpass API.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, trace, warn};

use crate::error::{CrawlError, Result};
use crate::network::geo::BoundingBox;
use crate::network::graph::{NetworkEdge, NetworkNode, WalkNetwork};

const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OsmElement>,
}

#[derive(Debug, Deserialize)]
struct OsmElement {
    #[serde(rename = "type")]
    elem_type: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    nodes: Option<Vec<i64>>,
}

/// Overpass QL selecting ways a pedestrian may use: no motorways, no
/// private access, no areas.
pub fn walk_query(bbox: &BoundingBox) -> String {
    format!(
        r#"[out:json][timeout:120];
(
  way["highway"]["area"!~"yes"]["highway"!~"abandoned|bus_guideway|construction|cycleway|motor|planned|platform|proposed|raceway"]["foot"!~"no"]["service"!~"private"]["access"!~"private"]
    ({},{},{},{});
);
(._;>;);
out body;"#,
        bbox.south, bbox.west, bbox.north, bbox.east
    )
}

pub async fn fetch_walk_network(bbox: &BoundingBox) -> Result<WalkNetwork> {
    if !bbox.is_valid() {
        return Err(CrawlError::invalid_input(format!(
            "bounding box {bbox:?} is empty or not finite"
        )));
    }

    let url = env::var("OVERPASS_URL").unwrap_or_else(|_| OVERPASS_URL.to_string());
    let query = walk_query(bbox);
    trace!("Overpass query:\n{}", query);

    let client = Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(180))
        .user_agent("pub-crawl/0.1")
        .build()?;

    info!(
        "Requesting walk network for N {:.4} S {:.4} E {:.4} W {:.4} from {}",
        bbox.north, bbox.south, bbox.east, bbox.west, url
    );

    let response = client
        .post(&url)
        .header("Content-Type", "text/plain")
        .body(query)
        .send()
        .await
        .map_err(|e| {
            error!("Overpass request failed: {}", e);
            CrawlError::from(e)
        })?;

    let status = response.status();
    debug!("Received response: HTTP {}", status);
    if !status.is_success() {
        error!(
            "Overpass returned HTTP {}: {}",
            status,
            status.canonical_reason().unwrap_or("Unknown")
        );
        return Err(CrawlError::Network(format!("Overpass API returned status {status}")));
    }

    let osm: OverpassResponse = response.json().await?;
    info!("Downloaded {} OSM elements", osm.elements.len());

    build_walk_network(&osm.elements)
}

/// Walking ignores `oneway`, so every way segment becomes a two-way edge.
fn build_walk_network(elements: &[OsmElement]) -> Result<WalkNetwork> {
    let coords: HashMap<i64, (f64, f64)> = elements
        .iter()
        .filter(|e| e.elem_type == "node")
        .filter_map(|e| Some((e.id, (e.lat?, e.lon?))))
        .collect();

    let mut used: HashMap<i64, NetworkNode> = HashMap::new();
    let mut edges = Vec::new();
    let mut skipped = 0usize;

    for way in elements.iter().filter(|e| e.elem_type == "way") {
        let Some(node_ids) = way.nodes.as_ref() else {
            continue;
        };
        for pair in node_ids.windows(2) {
            let (Some(&(lat1, lon1)), Some(&(lat2, lon2))) =
                (coords.get(&pair[0]), coords.get(&pair[1]))
            else {
                skipped += 1;
                continue;
            };
            used.entry(pair[0]).or_insert(NetworkNode {
                id: pair[0],
                lat: lat1,
                lon: lon1,
            });
            used.entry(pair[1]).or_insert(NetworkNode {
                id: pair[1],
                lat: lat2,
                lon: lon2,
            });
            edges.push(NetworkEdge {
                from: pair[0],
                to: pair[1],
                length: None,
                oneway: false,
            });
        }
    }

    if skipped > 0 {
        warn!("Skipped {} way segments with nodes outside the response", skipped);
    }

    let mut nodes: Vec<NetworkNode> = used.into_values().collect();
    nodes.sort_by_key(|n| n.id);
    WalkNetwork::from_parts(&nodes, &edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_orders_bbox_as_south_west_north_east() {
        let query = walk_query(&BoundingBox::galway());
        assert!(query.contains("(53.2691,-9.0644,53.2763,-9.0456)"));
        assert!(query.contains("[out:json]"));
    }

    #[test]
    fn builds_two_way_edges_from_ways() {
        let json = r#"{"elements": [
            {"type": "node", "id": 1, "lat": 53.270, "lon": -9.050},
            {"type": "node", "id": 2, "lat": 53.271, "lon": -9.050},
            {"type": "node", "id": 3, "lat": 53.272, "lon": -9.050},
            {"type": "node", "id": 99, "lat": 53.300, "lon": -9.100},
            {"type": "way", "id": 10, "nodes": [1, 2, 3, 4]}
        ]}"#;
        let osm: OverpassResponse = serde_json::from_str(json).unwrap();
        let network = build_walk_network(&osm.elements).unwrap();

        // node 99 belongs to no way and node 4 is missing from the response
        assert_eq!(network.node_count(), 3);
        assert_eq!(network.edge_count(), 4);
    }
}
