use std::sync::Arc;

use dotenv::dotenv;
use tracing::{info, span, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Settings;
use crate::distance::matrix::print_dist_matrix;
use crate::domain::registry::PubRegistry;
use crate::error::Result;
use crate::network::graph::WalkNetwork;
use crate::planner::CrawlPlanner;

/// Initialize tracing and environment
pub fn init_tracing_and_env(verbose: bool) {
    dotenv().ok();

    let default_directive = if verbose { "pub_crawl=debug" } else { "pub_crawl=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // ignore a second init (tests, embedding)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

/// Loads the pub list and walk network named in `settings` and builds the
/// planner, including the full distance matrix.
pub fn load_planner(settings: &Settings) -> Result<CrawlPlanner> {
    let span = span!(Level::INFO, "setup");
    let _guard = span.enter();

    info!(
        "Starting setup with pubs from {} and network from {}",
        settings.pubs_csv.display(),
        settings.network_path.display()
    );

    let registry = PubRegistry::from_csv(&settings.pubs_csv)?;
    let network = Arc::new(WalkNetwork::load(&settings.network_path)?);
    let planner = CrawlPlanner::from_settings(registry, network, settings)?;

    print_dist_matrix(planner.matrix());
    info!("Setup completed successfully");
    Ok(planner)
}
