pub mod registry;
pub mod types;

pub use registry::PubRegistry;
pub use types::{CrawlPlan, Location, OptimizedRoute};
