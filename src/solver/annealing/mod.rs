//! Simulated annealing over 2-opt, swap and relocate moves.

pub mod neighborhood;
pub mod search;

use std::time::Instant;

use tracing::{debug, info};

use super::{Tour, TourProblem, TourSolver};
use crate::config::constant::SEED;
use crate::error::Result;
use crate::evaluation::fitness::tour_cost;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealingConfig {
    pub seed: u64,
    /// Cap on the length of the cooling schedule. The time budget still cuts
    /// a run short.
    pub max_iterations: usize,
    /// Multiplier on the sampled starting temperature.
    pub initial_temperature_scale: f64,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            seed: SEED,
            max_iterations: 1_000_000,
            initial_temperature_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnnealingSolver {
    config: AnnealingConfig,
}

impl AnnealingSolver {
    pub fn new(config: AnnealingConfig) -> Self {
        Self { config }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(AnnealingConfig {
            seed,
            ..AnnealingConfig::default()
        })
    }
}

impl TourSolver for AnnealingSolver {
    fn name(&self) -> &'static str {
        "annealing"
    }

    fn solve(&self, problem: &TourProblem<'_>) -> Result<Tour> {
        let started = Instant::now();
        let deadline = problem.deadline(started);

        let initial = search::nearest_neighbour_tour(problem, deadline)?;
        debug!(
            "Nearest neighbour tour: {:?} (cost {})",
            initial,
            tour_cost(&initial, problem.matrix, problem.shape)
        );

        if initial.len() < 3 {
            // a single visit leaves nothing to reorder
            let cost = tour_cost(&initial, problem.matrix, problem.shape);
            return Ok(Tour {
                stops: initial,
                cost,
            });
        }

        let outcome = search::run(problem, &self.config, initial, started);
        info!(
            "Annealing produced a {}-stop tour in {:?} ({} iterations)",
            outcome.tour.stops.len(),
            started.elapsed(),
            outcome.iterations
        );
        Ok(outcome.tour)
    }
}
