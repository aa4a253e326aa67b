use std::time::Instant;

use itertools::Itertools;
use tracing::{debug, info, warn};

use super::{Tour, TourProblem, TourSolver};
use crate::config::constant::EXHAUSTIVE_LIMIT;
use crate::error::{CrawlError, Result};
use crate::evaluation::fitness::tour_cost;

/// Tries every ordering of the stops. Exact, but only usable for a handful
/// of pubs; larger problems are refused.
#[derive(Debug, Clone)]
pub struct ExhaustiveSolver {
    max_visits: usize,
}

impl Default for ExhaustiveSolver {
    fn default() -> Self {
        Self {
            max_visits: EXHAUSTIVE_LIMIT,
        }
    }
}

impl ExhaustiveSolver {
    pub fn new(max_visits: usize) -> Self {
        Self { max_visits }
    }
}

impl TourSolver for ExhaustiveSolver {
    fn name(&self) -> &'static str {
        "exhaustive"
    }

    fn solve(&self, problem: &TourProblem<'_>) -> Result<Tour> {
        let k = problem.visits.len();
        if k > self.max_visits {
            return Err(CrawlError::invalid_input(format!(
                "exhaustive search supports at most {} stops besides the start, got {}",
                self.max_visits, k
            )));
        }

        let started = Instant::now();
        let deadline = problem.deadline(started);
        let mut best: Option<Tour> = None;
        let mut evaluated = 0usize;
        let mut tour = Vec::with_capacity(problem.size());

        for order in problem.visits.iter().copied().permutations(k) {
            if Instant::now() >= deadline {
                warn!(
                    "Time budget ran out after {} orderings; returning the best so far",
                    evaluated
                );
                break;
            }
            tour.clear();
            tour.push(problem.start);
            tour.extend(order);
            let cost = tour_cost(&tour, problem.matrix, problem.shape);
            evaluated += 1;

            if best.as_ref().map_or(true, |b| cost < b.cost) {
                debug!("New best ordering {:?}: cost = {}", tour, cost);
                best = Some(Tour {
                    stops: tour.clone(),
                    cost,
                });
            }
        }

        let best = best.ok_or_else(|| problem.no_solution())?;
        info!(
            "Exhaustive search checked {} orderings in {:?}, best cost {}",
            evaluated,
            started.elapsed(),
            best.cost
        );
        Ok(best)
    }
}
