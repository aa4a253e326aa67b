use rayon::prelude::*;
use tracing::{debug, info, span, Level};

use super::oracle::DistanceOracle;
use crate::domain::types::Location;
use crate::error::{CrawlError, Result};

/// Square matrix of scaled integer walking distances.
///
/// `cell(i, j) = round(meters(i -> j) * scale)`. Integer costs keep the
/// solver free of floating point tie-break noise; [`DistanceMatrix::descale`]
/// converts a cost back to meters.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    cells: Vec<Vec<i64>>,
    scale: f64,
}

impl DistanceMatrix {
    /// Wraps precomputed scaled cells. Rows must be square with a zero diagonal.
    pub fn from_cells(cells: Vec<Vec<i64>>, scale: f64) -> Result<Self> {
        validate_scale(scale)?;
        let n = cells.len();
        for (i, row) in cells.iter().enumerate() {
            if row.len() != n {
                return Err(CrawlError::invalid_input(format!(
                    "row {i} has {} cells, expected {n}",
                    row.len()
                )));
            }
            if row[i] != 0 {
                return Err(CrawlError::invalid_input(format!(
                    "diagonal cell ({i}, {i}) is {}",
                    row[i]
                )));
            }
            if let Some(neg) = row.iter().find(|&&c| c < 0) {
                return Err(CrawlError::invalid_input(format!(
                    "row {i} has negative distance {neg}"
                )));
            }
        }
        Ok(Self { cells, scale })
    }

    /// Scales a matrix given in meters.
    pub fn from_meters(meters: &[Vec<f64>], scale: f64) -> Result<Self> {
        validate_scale(scale)?;
        let cells = meters
            .iter()
            .map(|row| row.iter().map(|&m| scale_distance(m, scale)).collect())
            .collect();
        Self::from_cells(cells, scale)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn get(&self, from: usize, to: usize) -> i64 {
        self.cells[from][to]
    }

    pub fn rows(&self) -> &[Vec<i64>] {
        &self.cells
    }

    pub fn descale(&self, cost: i64) -> f64 {
        cost as f64 / self.scale
    }

    pub fn meters(&self, from: usize, to: usize) -> f64 {
        self.descale(self.get(from, to))
    }
}

/// Builds the all-pairs matrix over `locations`.
///
/// Any unreachable pair aborts the whole build with [`CrawlError::NoPath`].
pub fn build_matrix<O>(locations: &[Location], oracle: &O, scale: f64) -> Result<DistanceMatrix>
where
    O: DistanceOracle + ?Sized,
{
    validate_scale(scale)?;
    if locations.is_empty() {
        return Err(CrawlError::invalid_input(
            "cannot build a distance matrix without locations",
        ));
    }

    let span = span!(Level::INFO, "build_matrix", locations = locations.len());
    let _guard = span.enter();
    info!("Creating {0}x{0} distance matrix", locations.len());

    let cells = locations
        .par_iter()
        .enumerate()
        .map(|(i, from)| {
            let meters = oracle.distances_from(from, locations)?;
            let row: Vec<i64> = meters
                .iter()
                .enumerate()
                .map(|(j, &m)| if i == j { 0 } else { scale_distance(m, scale) })
                .collect();
            debug!("Row {} ({}): {:?}", i, from.name, row);
            Ok(row)
        })
        .collect::<Result<Vec<Vec<i64>>>>()?;

    info!("Successfully created distance matrix");
    Ok(DistanceMatrix { cells, scale })
}

pub fn scale_distance(meters: f64, scale: f64) -> i64 {
    (meters * scale).round() as i64
}

fn validate_scale(scale: f64) -> Result<()> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(CrawlError::invalid_input(format!(
            "distance scale must be positive, got {scale}"
        )))
    }
}

// Print distance matrix for debugging
pub fn print_dist_matrix(dm: &DistanceMatrix) {
    debug!("Distance matrix:");
    for row in dm.rows() {
        debug!("{:?}", row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Vec<Location> {
        vec![
            Location::new("A", 0.0, 0.0),
            Location::new("B", 0.0, 1.0),
            Location::new("C", 0.0, 2.0),
        ]
    }

    fn table(from: &Location, to: &Location) -> Result<f64> {
        let d = match (from.name.as_str(), to.name.as_str()) {
            (a, b) if a == b => 0.0,
            ("A", "B") | ("B", "A") => 100.4,
            ("B", "C") | ("C", "B") => 150.0006,
            ("A", "C") => 300.0,
            ("C", "A") => 310.0,
            _ => unreachable!(),
        };
        Ok(d)
    }

    #[test]
    fn cells_are_rounded_scaled_lengths() {
        let dm = build_matrix(&abc(), &table, 1000.0).unwrap();
        assert_eq!(dm.len(), 3);
        assert_eq!(dm.get(0, 1), 100_400);
        assert_eq!(dm.get(1, 2), 150_001);
        assert!((dm.meters(1, 2) - 150.0006).abs() <= 1.0 / 1000.0);
        // one-way asymmetry survives
        assert_eq!(dm.get(0, 2), 300_000);
        assert_eq!(dm.get(2, 0), 310_000);
        for i in 0..3 {
            assert_eq!(dm.get(i, i), 0);
        }
    }

    #[test]
    fn building_twice_is_identical() {
        let first = build_matrix(&abc(), &table, 1000.0).unwrap();
        let second = build_matrix(&abc(), &table, 1000.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn no_path_aborts_the_build() {
        let oracle = |from: &Location, to: &Location| -> Result<f64> {
            if to.name == "C" && from.name != "C" {
                Err(CrawlError::NoPath {
                    from: from.name.clone(),
                    to: to.name.clone(),
                })
            } else {
                Ok(1.0)
            }
        };
        let err = build_matrix(&abc(), &oracle, 1000.0).unwrap_err();
        assert!(matches!(err, CrawlError::NoPath { .. }));
    }

    #[test]
    fn empty_input_and_bad_scale_are_rejected() {
        assert!(matches!(
            build_matrix(&[], &table, 1000.0),
            Err(CrawlError::InvalidInput(_))
        ));
        assert!(matches!(
            build_matrix(&abc(), &table, 0.0),
            Err(CrawlError::InvalidInput(_))
        ));
    }

    #[test]
    fn from_cells_checks_shape() {
        assert!(DistanceMatrix::from_cells(vec![vec![0, 1], vec![1]], 1.0).is_err());
        assert!(DistanceMatrix::from_cells(vec![vec![1]], 1.0).is_err());
        let dm = DistanceMatrix::from_meters(&[vec![0.0, 2.5], vec![2.5, 0.0]], 10.0).unwrap();
        assert_eq!(dm.get(0, 1), 25);
    }
}
