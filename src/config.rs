use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use dotenv::dotenv;
use tracing::{debug, info};

use crate::error::{CrawlError, Result};

pub mod constant {
    pub(crate) const PUBS_CSV_PATH: &str = "galway_pubs.csv";
    pub(crate) const NETWORK_PATH: &str = "galway_walk.json";
    pub(crate) const TIME_BUDGET_SECS: f64 = 5.0;
    pub(crate) const DISTANCE_SCALE: f64 = 1000.0;
    pub(crate) const SEED: u64 = 12345;
    pub(crate) const EXHAUSTIVE_LIMIT: usize = 9;
    pub(crate) const DEFAULT_START_PUB: &str = "Caribou";
    /// Galway city centre as [north, south, east, west].
    pub(crate) const GALWAY_BBOX: [f64; 4] = [53.2763, 53.2691, -9.0456, -9.0644];
}

/// Whether a tour ends at its last stop or walks back to the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TourShape {
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverKind {
    #[default]
    Annealing,
    Exhaustive,
}

impl FromStr for SolverKind {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "annealing" | "sa" => Ok(SolverKind::Annealing),
            "exhaustive" | "brute-force" => Ok(SolverKind::Exhaustive),
            other => Err(CrawlError::config(format!("unknown solver kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub pubs_csv: PathBuf,
    pub network_path: PathBuf,
    pub time_budget: Duration,
    pub distance_scale: f64,
    pub seed: u64,
    pub solver: SolverKind,
    pub tour_shape: TourShape,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pubs_csv: PathBuf::from(constant::PUBS_CSV_PATH),
            network_path: PathBuf::from(constant::NETWORK_PATH),
            time_budget: Duration::from_secs_f64(constant::TIME_BUDGET_SECS),
            distance_scale: constant::DISTANCE_SCALE,
            seed: constant::SEED,
            solver: SolverKind::default(),
            tour_shape: TourShape::default(),
        }
    }
}

impl Settings {
    /// Loads settings from the process environment (and `.env`, if present),
    /// falling back to the defaults in [`constant`].
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(path) = lookup("PUBS_CSV_PATH") {
            settings.pubs_csv = PathBuf::from(path);
        }
        if let Some(path) = lookup("NETWORK_PATH") {
            settings.network_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup("SOLVER_TIME_BUDGET_SECS") {
            settings.time_budget = parse_budget(&raw)?;
        }
        if let Some(raw) = lookup("DISTANCE_SCALE") {
            let scale: f64 = parse_var("DISTANCE_SCALE", &raw)?;
            if !scale.is_finite() || scale <= 0.0 {
                return Err(CrawlError::config(format!(
                    "DISTANCE_SCALE must be positive, got {raw}"
                )));
            }
            settings.distance_scale = scale;
        }
        if let Some(raw) = lookup("SOLVER_SEED") {
            settings.seed = parse_var("SOLVER_SEED", &raw)?;
        }
        if let Some(raw) = lookup("SOLVER_KIND") {
            settings.solver = raw.parse()?;
        }
        if let Some(raw) = lookup("RETURN_TO_START") {
            let closed = parse_flag("RETURN_TO_START", &raw)?;
            settings.tour_shape = if closed { TourShape::Closed } else { TourShape::Open };
        }

        debug!("Resolved settings: {:?}", settings);
        info!(
            "Solver: {:?}, budget {:?}, shape {:?}",
            settings.solver, settings.time_budget, settings.tour_shape
        );
        Ok(settings)
    }
}

/// Parses a time budget given in (possibly fractional) seconds.
pub fn parse_budget(raw: &str) -> Result<Duration> {
    let secs: f64 = parse_var("SOLVER_TIME_BUDGET_SECS", raw)?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| CrawlError::config(format!("invalid time budget '{raw}'")))
}

/// Accepts `true/false`, `yes/no`, `on/off` and `1/0`, in any case.
fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(CrawlError::config(format!(
            "{key} has an invalid value '{raw}', expected true/false, yes/no, on/off or 1/0"
        ))),
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| CrawlError::config(format!("{key} has an invalid value '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.time_budget, Duration::from_secs(5));
        assert_eq!(settings.distance_scale, 1000.0);
        assert_eq!(settings.solver, SolverKind::Annealing);
        assert_eq!(settings.tour_shape, TourShape::Open);
    }

    #[test]
    fn overrides_are_parsed() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("SOLVER_TIME_BUDGET_SECS", "0.25"),
            ("SOLVER_KIND", "Exhaustive"),
            ("RETURN_TO_START", "TRUE"),
            ("SOLVER_SEED", "7"),
        ]))
        .unwrap();
        assert_eq!(settings.time_budget, Duration::from_millis(250));
        assert_eq!(settings.solver, SolverKind::Exhaustive);
        assert_eq!(settings.tour_shape, TourShape::Closed);
        assert_eq!(settings.seed, 7);
    }

    #[test]
    fn return_to_start_accepts_common_flag_forms() {
        for (raw, shape) in [
            ("1", TourShape::Closed),
            ("yes", TourShape::Closed),
            (" On ", TourShape::Closed),
            ("0", TourShape::Open),
            ("no", TourShape::Open),
            ("OFF", TourShape::Open),
        ] {
            let settings = Settings::from_lookup(lookup_from(&[("RETURN_TO_START", raw)])).unwrap();
            assert_eq!(settings.tour_shape, shape, "RETURN_TO_START={raw:?}");
        }
        let err = Settings::from_lookup(lookup_from(&[("RETURN_TO_START", "maybe")])).unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));
    }

    #[test]
    fn bad_values_are_config_errors() {
        let err = Settings::from_lookup(lookup_from(&[("DISTANCE_SCALE", "-3")])).unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));

        let err = Settings::from_lookup(lookup_from(&[("SOLVER_KIND", "genetic")])).unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));

        assert!(parse_budget("-1").is_err());
    }
}
