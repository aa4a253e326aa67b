pub mod fitness;

pub use fitness::{tour_cost, tour_distance};
