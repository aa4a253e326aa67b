pub mod geo;
pub mod graph;
pub mod overpass;

pub use geo::{haversine_distance, BoundingBox};
pub use graph::{NetworkEdge, NetworkFile, NetworkNode, WalkNetwork};
pub use overpass::fetch_walk_network;
