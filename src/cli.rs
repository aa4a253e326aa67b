//! Command line front end.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use itertools::Itertools;
use tracing::{error, info, warn};

use crate::config::constant::{DEFAULT_START_PUB, GALWAY_BBOX};
use crate::config::{parse_budget, Settings, SolverKind, TourShape};
use crate::distance::oracle::NetworkOracle;
use crate::domain::registry::PubRegistry;
use crate::error::{CrawlError, Result};
use crate::fixtures::data_generator::generate_town;
use crate::network::geo::BoundingBox;
use crate::network::graph::WalkNetwork;
use crate::network::overpass::fetch_walk_network;
use crate::planner::CrawlPlanner;
use crate::presentation::console::{print_comparison, print_error, print_plan, print_registry};
use crate::presentation::describe_route;
use crate::presentation::export::save_matrix_csv;
use crate::presentation::geojson::{write_registry_geojson, write_route_geojson};
use crate::setup::{init_tracing_and_env, load_planner};

/// Plan the shortest walking pub crawl through a set of pubs
#[derive(Parser, Debug)]
#[command(name = "pub-crawl", author, version, about)]
pub struct Cli {
    /// Pub list CSV (name,latitude,longitude,address)
    #[arg(long, global = true)]
    pubs: Option<PathBuf>,

    /// Walk network JSON
    #[arg(long, global = true)]
    network: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the known pubs
    List {
        /// Also write a map of the pubs and their snapped network nodes
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
    /// Compute the shortest route from a start pub through the chosen pubs
    Route {
        #[arg(long, default_value = DEFAULT_START_PUB)]
        start: String,
        /// Pub to visit; repeat for several
        #[arg(long = "visit")]
        visits: Vec<String>,
        /// Visit every known pub
        #[arg(long, conflicts_with = "visits")]
        all: bool,
        #[command(flatten)]
        solver: SolverArgs,
        /// Write the route map as GeoJSON
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
    /// Export the pub-to-pub walking distance matrix (meters) as CSV
    Matrix {
        #[arg(long)]
        out: PathBuf,
    },
    /// Download the walk network for a bounding box from Overpass
    FetchNetwork {
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = GALWAY_BBOX[0], allow_hyphen_values = true)]
        north: f64,
        #[arg(long, default_value_t = GALWAY_BBOX[1], allow_hyphen_values = true)]
        south: f64,
        #[arg(long, default_value_t = GALWAY_BBOX[2], allow_hyphen_values = true)]
        east: f64,
        #[arg(long, default_value_t = GALWAY_BBOX[3], allow_hyphen_values = true)]
        west: f64,
    },
    /// Plan a crawl through every pub of a generated grid town
    Demo {
        /// Number of pubs to place
        #[arg(long, default_value_t = 12)]
        count: usize,
        #[arg(long, default_value_t = 2024)]
        seed: u64,
        #[command(flatten)]
        solver: SolverArgs,
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
struct SolverArgs {
    /// Solver time budget in seconds
    #[arg(long)]
    time_budget: Option<String>,
    /// annealing or exhaustive
    #[arg(long)]
    solver: Option<String>,
    /// Walk back to the start pub at the end
    #[arg(long)]
    closed: bool,
}

impl SolverArgs {
    fn apply(&self, settings: &mut Settings) -> Result<()> {
        if let Some(raw) = &self.time_budget {
            settings.time_budget = parse_budget(raw)?;
        }
        if let Some(raw) = &self.solver {
            settings.solver = raw.parse::<SolverKind>()?;
        }
        if self.closed {
            settings.tour_shape = TourShape::Closed;
        }
        Ok(())
    }
}

pub async fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing_and_env(cli.verbose);

    if let Err(e) = execute(cli).await {
        error!("{}", e);
        print_error(&e.to_string());
        return Err(e.into());
    }
    Ok(())
}

async fn execute(cli: Cli) -> Result<()> {
    let mut settings = Settings::from_env()?;
    if let Some(path) = cli.pubs {
        settings.pubs_csv = path;
    }
    if let Some(path) = cli.network {
        settings.network_path = path;
    }

    match cli.command {
        Command::List { geojson } => {
            let registry = PubRegistry::from_csv(&settings.pubs_csv)?;
            print_registry(&registry);
            if let Some(path) = geojson {
                let network = Arc::new(WalkNetwork::load(&settings.network_path)?);
                let oracle = NetworkOracle::new(network, registry.locations())?;
                write_registry_geojson(&path, &registry, &oracle)?;
                println!("Pub map written to {}", path.display());
            }
        }
        Command::Route {
            start,
            visits,
            all,
            solver,
            geojson,
        } => {
            solver.apply(&mut settings)?;
            let planner = load_planner(&settings)?;
            let subset: Vec<String> = if all {
                planner.registry().names().map(str::to_string).collect()
            } else {
                visits
            };
            plan_and_report(&planner, &start, &subset, geojson)?;
        }
        Command::Matrix { out } => {
            let planner = load_planner(&settings)?;
            save_matrix_csv(&out, planner.registry(), planner.matrix())?;
        }
        Command::FetchNetwork {
            out,
            north,
            south,
            east,
            west,
        } => {
            let bbox = BoundingBox::new(north, south, east, west);
            let network = fetch_walk_network(&bbox).await?;
            network.save(&out)?;
            println!(
                "Saved {} nodes and {} edges to {}",
                network.node_count(),
                network.edge_count(),
                out.display()
            );
            // pubs outside the box would snap to the edge of the network
            if let Ok(registry) = PubRegistry::from_csv(&settings.pubs_csv) {
                for loc in registry.locations() {
                    if !bbox.contains(loc.latitude, loc.longitude) {
                        warn!("{} lies outside the downloaded area", loc.name);
                    }
                }
            }
        }
        Command::Demo {
            count,
            seed,
            solver,
            geojson,
        } => {
            solver.apply(&mut settings)?;
            let side = ((count as f64).sqrt().ceil() as usize * 2).max(3);
            let town = generate_town(side, side, 120.0, count, seed)?;
            let registry = PubRegistry::new(town.pubs)?;
            let planner =
                CrawlPlanner::from_settings(registry, Arc::new(town.network), &settings)?;
            let subset: Vec<String> = planner.registry().names().map(str::to_string).collect();
            let start = subset
                .first()
                .cloned()
                .ok_or_else(|| CrawlError::invalid_input("demo needs at least one pub"))?;
            plan_and_report(&planner, &start, &subset, geojson)?;
        }
    }
    Ok(())
}

fn plan_and_report(
    planner: &CrawlPlanner,
    start: &str,
    subset: &[String],
    geojson: Option<PathBuf>,
) -> Result<()> {
    // the order as given, starting from the start pub
    let given: Vec<&str> = std::iter::once(start)
        .chain(subset.iter().map(String::as_str))
        .unique()
        .collect();
    let initial = planner.evaluate_order(&given)?;

    let optimizer = planner.optimizer();
    info!(
        "Planning {} stops with a {:?} budget ({:?} route)",
        given.len(),
        optimizer.time_budget(),
        optimizer.shape()
    );

    let plan = planner.compute_route(start, subset)?;
    info!("Route: {}", describe_route(&plan.stops));

    print_plan("Optimised route", &plan);
    print_comparison(&initial, &plan);

    if let Some(path) = geojson {
        let legs = planner.route_geometry(&plan)?;
        write_route_geojson(&path, &plan, &legs)?;
        println!("Route map written to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn route_flags_override_settings() {
        let cli = Cli::try_parse_from([
            "pub-crawl",
            "--pubs",
            "pubs.csv",
            "route",
            "--visit",
            "Taaffes",
            "--visit",
            "The Quays",
            "--time-budget",
            "0.5",
            "--closed",
        ])
        .unwrap();
        assert_eq!(cli.pubs, Some(PathBuf::from("pubs.csv")));

        let Command::Route {
            start,
            visits,
            solver,
            ..
        } = cli.command
        else {
            panic!("expected the route command");
        };
        assert_eq!(start, "Caribou");
        assert_eq!(visits, vec!["Taaffes", "The Quays"]);

        let mut settings = Settings::default();
        solver.apply(&mut settings).unwrap();
        assert_eq!(settings.time_budget, std::time::Duration::from_millis(500));
        assert_eq!(settings.tour_shape, TourShape::Closed);
    }

    #[test]
    fn list_takes_an_optional_map() {
        let cli = Cli::try_parse_from(["pub-crawl", "list", "--geojson", "pubs.geojson"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::List { geojson: Some(ref path) } if path == &PathBuf::from("pubs.geojson")
        ));
        let cli = Cli::try_parse_from(["pub-crawl", "list"]).unwrap();
        assert!(matches!(cli.command, Command::List { geojson: None }));
    }

    #[test]
    fn all_conflicts_with_visit() {
        let result = Cli::try_parse_from(["pub-crawl", "route", "--all", "--visit", "Taaffes"]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_solver_is_a_config_error() {
        let args = SolverArgs {
            solver: Some("genetic".to_string()),
            ..SolverArgs::default()
        };
        let err = args.apply(&mut Settings::default()).unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));
    }
}
