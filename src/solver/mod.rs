//! Tour solvers and the route optimizer built on them.
//!
//! A [`TourSolver`] receives a [`TourProblem`] (matrix, fixed start, the
//! other stops, tour shape and a wall-clock budget) and returns a [`Tour`]
//! or fails with [`CrawlError::NoSolutionFound`]. Implementations are
//! interchangeable behind [`RouteOptimizer`].

pub mod annealing;
pub mod exhaustive;
pub mod optimizer;

use std::time::{Duration, Instant};

use crate::config::TourShape;
use crate::distance::matrix::DistanceMatrix;
use crate::error::{CrawlError, Result};

pub use annealing::{AnnealingConfig, AnnealingSolver};
pub use exhaustive::ExhaustiveSolver;
pub use optimizer::RouteOptimizer;

/// Ordered matrix indices, starting at the depot, with their scaled cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tour {
    pub stops: Vec<usize>,
    pub cost: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct TourProblem<'a> {
    pub matrix: &'a DistanceMatrix,
    pub start: usize,
    /// Stops to visit after `start`, without duplicates and without `start`.
    pub visits: &'a [usize],
    pub shape: TourShape,
    pub budget: Duration,
}

impl TourProblem<'_> {
    pub fn size(&self) -> usize {
        self.visits.len() + 1
    }

    pub fn deadline(&self, started: Instant) -> Instant {
        // budgets too large for Instant are capped at a year
        started
            .checked_add(self.budget)
            .unwrap_or_else(|| started + Duration::from_secs(365 * 24 * 3600))
    }

    pub fn no_solution(&self) -> CrawlError {
        CrawlError::NoSolutionFound {
            budget: self.budget,
        }
    }
}

pub trait TourSolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, problem: &TourProblem<'_>) -> Result<Tour>;
}
