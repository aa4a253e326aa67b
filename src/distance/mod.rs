pub mod matrix;
pub mod oracle;

pub use matrix::{build_matrix, DistanceMatrix};
pub use oracle::{DistanceOracle, NetworkOracle};
