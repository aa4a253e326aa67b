//! The request-serving context: pubs, network and the precomputed matrix.

use std::sync::Arc;

use tracing::{info, span, Level};

use crate::config::{Settings, TourShape};
use crate::distance::matrix::{build_matrix, DistanceMatrix};
use crate::distance::oracle::NetworkOracle;
use crate::domain::registry::PubRegistry;
use crate::domain::types::{CrawlPlan, Location};
use crate::error::{CrawlError, Result};
use crate::evaluation::fitness::tour_distance;
use crate::network::graph::WalkNetwork;
use crate::solver::optimizer::RouteOptimizer;

/// Read-only once built, so one planner can serve any number of requests.
#[derive(Debug)]
pub struct CrawlPlanner {
    registry: PubRegistry,
    oracle: NetworkOracle,
    matrix: DistanceMatrix,
    optimizer: RouteOptimizer,
}

impl CrawlPlanner {
    /// Snaps every pub onto the network and builds the full distance matrix.
    pub fn new(
        registry: PubRegistry,
        network: Arc<WalkNetwork>,
        optimizer: RouteOptimizer,
        distance_scale: f64,
    ) -> Result<Self> {
        let span = span!(Level::INFO, "planner_setup", pubs = registry.len());
        let _guard = span.enter();

        let oracle = NetworkOracle::new(network, registry.locations())?;
        let matrix = build_matrix(registry.locations(), &oracle, distance_scale)?;

        info!("Planner ready for {} pubs", registry.len());
        Ok(Self {
            registry,
            oracle,
            matrix,
            optimizer,
        })
    }

    pub fn from_settings(
        registry: PubRegistry,
        network: Arc<WalkNetwork>,
        settings: &Settings,
    ) -> Result<Self> {
        Self::new(
            registry,
            network,
            RouteOptimizer::from_settings(settings),
            settings.distance_scale,
        )
    }

    pub fn registry(&self) -> &PubRegistry {
        &self.registry
    }

    pub fn matrix(&self) -> &DistanceMatrix {
        &self.matrix
    }

    pub fn optimizer(&self) -> &RouteOptimizer {
        &self.optimizer
    }

    /// Plans a crawl from `start` through every pub in `subset`.
    ///
    /// Every name is resolved before the solver runs, so an unknown pub fails
    /// with [`CrawlError::MissingLocation`] without any search.
    pub fn compute_route<S: AsRef<str>>(&self, start: &str, subset: &[S]) -> Result<CrawlPlan> {
        let start_index = self.registry.index_of(start)?;
        let subset_indices = self.registry.indices_of(subset)?;

        let route = self
            .optimizer
            .optimize(&self.matrix, start_index, &subset_indices)?;

        let stops = self.resolve(&route.stops)?;
        info!(
            "Planned {} stops from {}: {:.1} m",
            stops.len(),
            start,
            route.total_distance
        );
        Ok(CrawlPlan {
            stops,
            total_distance: route.total_distance,
        })
    }

    /// Distance of walking `names` in exactly the given order.
    pub fn evaluate_order<S: AsRef<str>>(&self, names: &[S]) -> Result<CrawlPlan> {
        let indices = self.registry.indices_of(names)?;
        for (pos, idx) in indices.iter().enumerate() {
            if indices[..pos].contains(idx) {
                return Err(CrawlError::invalid_input(format!(
                    "pub '{}' appears twice in the route",
                    names[pos].as_ref()
                )));
            }
        }
        let total_distance = tour_distance(&indices, &self.matrix, self.optimizer.shape());
        Ok(CrawlPlan {
            stops: self.resolve(&indices)?,
            total_distance,
        })
    }

    /// Walking path of every leg as `(lat, lon)` points, for map rendering.
    /// A closed plan also gets the leg back to the start.
    pub fn route_geometry(&self, plan: &CrawlPlan) -> Result<Vec<Vec<(f64, f64)>>> {
        let mut legs: Vec<(&Location, &Location)> =
            plan.stops.windows(2).map(|w| (&w[0], &w[1])).collect();
        if self.optimizer.shape() == TourShape::Closed && plan.stops.len() > 1 {
            legs.push((&plan.stops[plan.stops.len() - 1], &plan.stops[0]));
        }
        legs.into_iter()
            .map(|(from, to)| self.oracle.path_between(from, to))
            .collect()
    }

    fn resolve(&self, indices: &[usize]) -> Result<Vec<Location>> {
        indices
            .iter()
            .map(|&i| {
                self.registry.get(i).cloned().ok_or_else(|| {
                    CrawlError::invalid_data(format!("route refers to unknown stop {i}"))
                })
            })
            .collect()
    }
}
