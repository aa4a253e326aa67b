use std::collections::HashMap;
use std::sync::Arc;

use petgraph::graph::NodeIndex;
use tracing::{debug, info};

use crate::domain::types::Location;
use crate::error::{CrawlError, Result};
use crate::network::graph::WalkNetwork;

/// Shortest walking distance between two locations, in meters.
pub trait DistanceOracle: Sync {
    fn distance(&self, from: &Location, to: &Location) -> Result<f64>;

    /// Distances from one origin to every target, in target order.
    fn distances_from(&self, from: &Location, targets: &[Location]) -> Result<Vec<f64>> {
        targets.iter().map(|to| self.distance(from, to)).collect()
    }
}

impl<F> DistanceOracle for F
where
    F: Fn(&Location, &Location) -> Result<f64> + Sync,
{
    fn distance(&self, from: &Location, to: &Location) -> Result<f64> {
        self(from, to)
    }
}

/// Oracle over a [`WalkNetwork`]. Each location is snapped to its nearest
/// network node once, at construction.
#[derive(Debug, Clone)]
pub struct NetworkOracle {
    network: Arc<WalkNetwork>,
    snapped: HashMap<String, NodeIndex>,
}

impl NetworkOracle {
    pub fn new(network: Arc<WalkNetwork>, locations: &[Location]) -> Result<Self> {
        let mut snapped = HashMap::with_capacity(locations.len());
        for loc in locations {
            let node = network.snap(loc.latitude, loc.longitude).ok_or_else(|| {
                CrawlError::invalid_data("walk network has no nodes to snap pubs onto")
            })?;
            debug!("Snapped {} to node {:?}", loc.name, node);
            snapped.insert(loc.name.clone(), node);
        }
        info!("Snapped {} pubs onto the walk network", snapped.len());
        Ok(Self { network, snapped })
    }

    pub fn network(&self) -> &WalkNetwork {
        &self.network
    }

    pub fn node_of(&self, location: &Location) -> Result<NodeIndex> {
        self.snapped
            .get(&location.name)
            .copied()
            .ok_or_else(|| CrawlError::MissingLocation(location.name.clone()))
    }

    /// Walking path between two locations as `(lat, lon)` points.
    pub fn path_between(&self, from: &Location, to: &Location) -> Result<Vec<(f64, f64)>> {
        let a = self.node_of(from)?;
        let b = self.node_of(to)?;
        if a == b {
            return Ok(self.network.coordinates(&[a]));
        }
        let (_, path) = self.network.path(a, b).ok_or_else(|| no_path(from, to))?;
        Ok(self.network.coordinates(&path))
    }
}

impl DistanceOracle for NetworkOracle {
    fn distance(&self, from: &Location, to: &Location) -> Result<f64> {
        let a = self.node_of(from)?;
        let b = self.node_of(to)?;
        self.network
            .length_between(a, b)
            .ok_or_else(|| no_path(from, to))
    }

    /// One Dijkstra run answers the whole row.
    fn distances_from(&self, from: &Location, targets: &[Location]) -> Result<Vec<f64>> {
        let origin = self.node_of(from)?;
        let lengths = self.network.lengths_from(origin);
        targets
            .iter()
            .map(|to| {
                let node = self.node_of(to)?;
                lengths.get(&node).copied().ok_or_else(|| no_path(from, to))
            })
            .collect()
    }
}

fn no_path(from: &Location, to: &Location) -> CrawlError {
    CrawlError::NoPath {
        from: from.name.clone(),
        to: to.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::graph::{NetworkEdge, NetworkNode};

    fn line_network() -> Arc<WalkNetwork> {
        let nodes = [
            NetworkNode { id: 1, lat: 53.2700, lon: -9.0500 },
            NetworkNode { id: 2, lat: 53.2710, lon: -9.0500 },
            NetworkNode { id: 3, lat: 53.2720, lon: -9.0500 },
            NetworkNode { id: 4, lat: 53.2800, lon: -9.0500 },
        ];
        let edges = [
            NetworkEdge { from: 1, to: 2, length: Some(100.0), oneway: false },
            NetworkEdge { from: 2, to: 3, length: Some(150.0), oneway: false },
        ];
        Arc::new(WalkNetwork::from_parts(&nodes, &edges).unwrap())
    }

    fn pubs() -> Vec<Location> {
        vec![
            Location::new("A", 53.27001, -9.05001),
            Location::new("B", 53.27099, -9.04999),
            Location::new("C", 53.27201, -9.05000),
        ]
    }

    #[test]
    fn same_location_is_zero() {
        let oracle = NetworkOracle::new(line_network(), &pubs()).unwrap();
        for loc in pubs() {
            assert_eq!(oracle.distance(&loc, &loc).unwrap(), 0.0);
        }
    }

    #[test]
    fn row_query_matches_point_queries() {
        let locations = pubs();
        let oracle = NetworkOracle::new(line_network(), &locations).unwrap();
        let row = oracle.distances_from(&locations[0], &locations).unwrap();
        let points: Vec<f64> = locations
            .iter()
            .map(|to| oracle.distance(&locations[0], to).unwrap())
            .collect();
        assert_eq!(row, points);
        assert_eq!(row, vec![0.0, 100.0, 250.0]);
    }

    #[test]
    fn unreachable_pub_is_no_path() {
        let mut locations = pubs();
        locations.push(Location::new("Island", 53.2800, -9.0500));
        let oracle = NetworkOracle::new(line_network(), &locations).unwrap();
        let err = oracle.distance(&locations[0], &locations[3]).unwrap_err();
        assert!(matches!(err, CrawlError::NoPath { ref to, .. } if to == "Island"));
    }

    #[test]
    fn empty_network_cannot_snap() {
        let err = NetworkOracle::new(Arc::new(WalkNetwork::new()), &pubs()).unwrap_err();
        assert!(matches!(err, CrawlError::InvalidData(_)));
    }
}
