//! Plans the shortest walking pub crawl through a chosen set of pubs.
//!
//! Pubs are snapped onto a pedestrian street network, the walking distance
//! between every pair goes into an integer-scaled matrix, and a time-bounded
//! tour solver orders the visits from a fixed start pub.

pub mod cli;
pub mod config;
pub mod distance;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod fixtures;
pub mod network;
pub mod planner;
pub mod presentation;
pub mod setup;
pub mod solver;
pub mod utils;

pub use config::{Settings, SolverKind, TourShape};
pub use domain::{CrawlPlan, Location, OptimizedRoute, PubRegistry};
pub use error::{CrawlError, Result};
pub use planner::CrawlPlanner;
