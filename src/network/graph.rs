//! Walkable street network backed by petgraph.
//!
//! The network is loaded once (from the JSON format below or from an
//! Overpass download) and is read-only afterwards. Shortest paths use edge
//! lengths in meters.
//!
//! ```json
//! {"nodes": [{"id": 1, "lat": 53.27, "lon": -9.05}],
//!  "edges": [{"from": 1, "to": 2, "length": 41.5, "oneway": false}]}
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ordered_float::OrderedFloat;
use petgraph::algo::{astar, dijkstra};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CrawlError, Result};
use crate::network::geo::haversine_distance;

/// Node data in the walk graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeData {
    pub osm_id: i64,
    pub lat: f64,
    pub lon: f64,
}

/// Edge data in the walk graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeData {
    pub length_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub from: i64,
    pub to: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default)]
    pub oneway: bool,
}

/// On-disk representation of a [`WalkNetwork`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkFile {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

#[derive(Debug, Clone, Default)]
pub struct WalkNetwork {
    graph: DiGraph<NodeData, EdgeData>,
    by_osm_id: HashMap<i64, NodeIndex>,
}

impl WalkNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from node and edge lists. Two-way edges are expanded
    /// into a pair of directed edges.
    pub fn from_parts(nodes: &[NetworkNode], edges: &[NetworkEdge]) -> Result<Self> {
        let mut network = Self::new();

        for node in nodes {
            if !node.lat.is_finite() || !node.lon.is_finite() {
                return Err(CrawlError::invalid_data(format!(
                    "node {} has non-finite coordinates",
                    node.id
                )));
            }
            if network.by_osm_id.contains_key(&node.id) {
                return Err(CrawlError::invalid_data(format!("duplicate node id {}", node.id)));
            }
            let idx = network.graph.add_node(NodeData {
                osm_id: node.id,
                lat: node.lat,
                lon: node.lon,
            });
            network.by_osm_id.insert(node.id, idx);
        }

        for edge in edges {
            let from = network.lookup(edge.from)?;
            let to = network.lookup(edge.to)?;

            let length_m = match edge.length {
                Some(len) if len.is_finite() && len >= 0.0 => len,
                Some(len) => {
                    return Err(CrawlError::invalid_data(format!(
                        "edge {} -> {} has invalid length {}",
                        edge.from, edge.to, len
                    )))
                }
                None => {
                    let a = network.graph[from];
                    let b = network.graph[to];
                    haversine_distance(a.lat, a.lon, b.lat, b.lon)
                }
            };

            network.graph.add_edge(from, to, EdgeData { length_m });
            if !edge.oneway {
                network.graph.add_edge(to, from, EdgeData { length_m });
            }
        }

        info!(
            "Built walk network with {} nodes and {} edges",
            network.node_count(),
            network.edge_count()
        );
        Ok(network)
    }

    fn lookup(&self, osm_id: i64) -> Result<NodeIndex> {
        self.by_osm_id.get(&osm_id).copied().ok_or_else(|| {
            CrawlError::invalid_data(format!("edge references unknown node {osm_id}"))
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading walk network from {}", path.display());
        let reader = BufReader::new(File::open(path)?);
        let file: NetworkFile = serde_json::from_reader(reader)?;
        Self::from_parts(&file.nodes, &file.edges)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &self.to_file())?;
        info!("Saved walk network to {}", path.display());
        Ok(())
    }

    /// Every directed edge is written as a one-way edge so the graph
    /// reloads identically.
    pub fn to_file(&self) -> NetworkFile {
        let nodes = self
            .graph
            .node_indices()
            .map(|idx| &self.graph[idx])
            .map(|n| NetworkNode {
                id: n.osm_id,
                lat: n.lat,
                lon: n.lon,
            })
            .collect();

        let edges = self
            .graph
            .edge_references()
            .map(|e| NetworkEdge {
                from: self.graph[e.source()].osm_id,
                to: self.graph[e.target()].osm_id,
                length: Some(e.weight().length_m),
                oneway: true,
            })
            .collect();

        NetworkFile { nodes, edges }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&NodeData> {
        self.graph.node_weight(idx)
    }

    /// Finds the node nearest to the given coordinates.
    pub fn snap(&self, lat: f64, lon: f64) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .min_by_key(|&idx| {
                let n = &self.graph[idx];
                OrderedFloat(haversine_distance(lat, lon, n.lat, n.lon))
            })
    }

    /// Shortest walking length from `from` to every reachable node.
    pub fn lengths_from(&self, from: NodeIndex) -> HashMap<NodeIndex, f64> {
        let lengths = dijkstra(&self.graph, from, None, |e| e.weight().length_m);
        debug!("Dijkstra from {:?} reached {} nodes", from, lengths.len());
        lengths
    }

    /// Shortest walking length between two nodes, or `None` if unreachable.
    pub fn length_between(&self, from: NodeIndex, to: NodeIndex) -> Option<f64> {
        if from == to {
            return Some(0.0);
        }
        self.path(from, to).map(|(length, _)| length)
    }

    /// Shortest path as its length and visited nodes (both endpoints included).
    pub fn path(&self, from: NodeIndex, to: NodeIndex) -> Option<(f64, Vec<NodeIndex>)> {
        // A* with a zero heuristic is Dijkstra that also returns the path
        astar(
            &self.graph,
            from,
            |n| n == to,
            |e| e.weight().length_m,
            |_| 0.0,
        )
    }

    /// Coordinates `(lat, lon)` of a list of nodes.
    pub fn coordinates(&self, path: &[NodeIndex]) -> Vec<(f64, f64)> {
        path.iter()
            .filter_map(|&idx| self.graph.node_weight(idx).map(|n| (n.lat, n.lon)))
            .collect()
    }
}
