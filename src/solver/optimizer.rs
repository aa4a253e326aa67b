use std::time::Duration;

use tracing::{debug, info, span, warn, Level};

use super::{AnnealingConfig, AnnealingSolver, ExhaustiveSolver, TourProblem, TourSolver};
use crate::config::{Settings, SolverKind, TourShape};
use crate::distance::matrix::DistanceMatrix;
use crate::domain::types::OptimizedRoute;
use crate::error::{CrawlError, Result};
use crate::evaluation::fitness::tour_cost;

/// Picks the visiting order for a subset of the matrix, starting at a fixed
/// stop, through a pluggable [`TourSolver`].
pub struct RouteOptimizer {
    solver: Box<dyn TourSolver>,
    time_budget: Duration,
    shape: TourShape,
}

impl std::fmt::Debug for RouteOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteOptimizer")
            .field("solver", &self.solver.name())
            .field("time_budget", &self.time_budget)
            .field("shape", &self.shape)
            .finish()
    }
}

impl RouteOptimizer {
    pub fn new(solver: Box<dyn TourSolver>, time_budget: Duration, shape: TourShape) -> Self {
        Self {
            solver,
            time_budget,
            shape,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let solver: Box<dyn TourSolver> = match settings.solver {
            SolverKind::Annealing => Box::new(AnnealingSolver::new(AnnealingConfig {
                seed: settings.seed,
                ..AnnealingConfig::default()
            })),
            SolverKind::Exhaustive => Box::new(ExhaustiveSolver::default()),
        };
        Self::new(solver, settings.time_budget, settings.tour_shape)
    }

    pub fn time_budget(&self) -> Duration {
        self.time_budget
    }

    pub fn shape(&self) -> TourShape {
        self.shape
    }

    /// Orders `subset_indices` into a route starting at `start_index`.
    ///
    /// The subset is de-duplicated and the start is added if missing. The
    /// returned distance is in meters and counts the walk back to the start
    /// only for [`TourShape::Closed`].
    pub fn optimize(
        &self,
        matrix: &DistanceMatrix,
        start_index: usize,
        subset_indices: &[usize],
    ) -> Result<OptimizedRoute> {
        let n = matrix.len();
        if start_index >= n {
            return Err(CrawlError::invalid_input(format!(
                "start index {start_index} is outside a {n}-stop matrix"
            )));
        }
        if let Some(bad) = subset_indices.iter().find(|&&i| i >= n) {
            return Err(CrawlError::invalid_input(format!(
                "stop index {bad} is outside a {n}-stop matrix"
            )));
        }
        if !subset_indices.contains(&start_index) {
            warn!("Start stop {} was not in the subset; adding it", start_index);
        }

        let mut visits: Vec<usize> = Vec::with_capacity(subset_indices.len());
        for &idx in subset_indices {
            if idx != start_index && !visits.contains(&idx) {
                visits.push(idx);
            }
        }

        if visits.is_empty() {
            debug!("Only the start stop requested; nothing to optimize");
            return Ok(OptimizedRoute {
                stops: vec![start_index],
                total_distance: 0.0,
            });
        }

        let problem = TourProblem {
            matrix,
            start: start_index,
            visits: &visits,
            shape: self.shape,
            budget: self.time_budget,
        };

        let span = span!(Level::INFO, "optimize", solver = self.solver.name(), stops = problem.size());
        let _guard = span.enter();
        info!(
            "Optimizing a {}-stop route from {} with a {:?} budget",
            problem.size(),
            start_index,
            self.time_budget
        );

        let tour = self.solver.solve(&problem)?;
        check_tour(&tour.stops, start_index, &visits)?;

        let cost = tour_cost(&tour.stops, matrix, self.shape);
        if cost != tour.cost {
            warn!(
                "Solver {} reported cost {} but the route costs {}",
                self.solver.name(),
                tour.cost,
                cost
            );
        }

        Ok(OptimizedRoute {
            total_distance: matrix.descale(cost),
            stops: tour.stops,
        })
    }
}

/// Verifies a solver result starts at the start and visits every stop once.
fn check_tour(stops: &[usize], start: usize, visits: &[usize]) -> Result<()> {
    if stops.first() != Some(&start) {
        return Err(CrawlError::invalid_data(format!(
            "solver route {stops:?} does not start at {start}"
        )));
    }
    let mut seen = stops[1..].to_vec();
    let mut expected = visits.to_vec();
    seen.sort_unstable();
    expected.sort_unstable();
    if seen != expected {
        return Err(CrawlError::invalid_data(format!(
            "solver route {stops:?} does not visit {visits:?} exactly once"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::Tour;

    fn abc() -> DistanceMatrix {
        DistanceMatrix::from_meters(
            &[
                vec![0.0, 100.0, 300.0],
                vec![100.0, 0.0, 150.0],
                vec![300.0, 150.0, 0.0],
            ],
            1000.0,
        )
        .unwrap()
    }

    fn optimizer(shape: TourShape) -> RouteOptimizer {
        RouteOptimizer::new(
            Box::new(AnnealingSolver::default()),
            Duration::from_secs(1),
            shape,
        )
    }

    struct Panicking;

    impl TourSolver for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn solve(&self, _: &TourProblem<'_>) -> Result<Tour> {
            panic!("solver must not be called");
        }
    }

    struct Broken;

    impl TourSolver for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn solve(&self, problem: &TourProblem<'_>) -> Result<Tour> {
            Ok(Tour {
                stops: vec![problem.start, problem.visits[0], problem.visits[0]],
                cost: 0,
            })
        }
    }

    #[test]
    fn three_pub_scenario() {
        let route = optimizer(TourShape::Open).optimize(&abc(), 0, &[0, 1, 2]).unwrap();
        assert_eq!(route.stops, vec![0, 1, 2]);
        assert_eq!(route.total_distance, 250.0);
    }

    #[test]
    fn closed_shape_counts_the_walk_back() {
        let route = optimizer(TourShape::Closed).optimize(&abc(), 0, &[0, 1, 2]).unwrap();
        assert_eq!(route.stops[0], 0);
        assert_eq!(route.total_distance, 550.0);
    }

    #[test]
    fn start_only_skips_the_solver() {
        let optimizer =
            RouteOptimizer::new(Box::new(Panicking), Duration::from_secs(1), TourShape::Open);
        let route = optimizer.optimize(&abc(), 2, &[2, 2]).unwrap();
        assert_eq!(route.stops, vec![2]);
        assert_eq!(route.total_distance, 0.0);
    }

    #[test]
    fn missing_start_and_duplicates_are_normalised() {
        let route = optimizer(TourShape::Open).optimize(&abc(), 0, &[2, 1, 2]).unwrap();
        assert_eq!(route.stops, vec![0, 1, 2]);
    }

    #[test]
    fn out_of_range_indices_are_invalid() {
        let err = optimizer(TourShape::Open).optimize(&abc(), 3, &[0]).unwrap_err();
        assert!(matches!(err, CrawlError::InvalidInput(_)));
        let err = optimizer(TourShape::Open).optimize(&abc(), 0, &[0, 7]).unwrap_err();
        assert!(matches!(err, CrawlError::InvalidInput(_)));
    }

    #[test]
    fn no_solution_is_propagated() {
        let optimizer = RouteOptimizer::new(
            Box::new(AnnealingSolver::default()),
            Duration::ZERO,
            TourShape::Open,
        );
        let err = optimizer.optimize(&abc(), 0, &[0, 1, 2]).unwrap_err();
        assert!(matches!(err, CrawlError::NoSolutionFound { .. }));
    }

    #[test]
    fn malformed_solver_output_is_rejected() {
        let optimizer = RouteOptimizer::new(Box::new(Broken), Duration::from_secs(1), TourShape::Open);
        let err = optimizer.optimize(&abc(), 0, &[0, 1, 2]).unwrap_err();
        assert!(matches!(err, CrawlError::InvalidData(_)));
    }
}
