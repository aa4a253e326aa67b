use std::path::Path;

use csv::Writer;
use tracing::info;

use crate::distance::matrix::DistanceMatrix;
use crate::domain::registry::PubRegistry;
use crate::error::{CrawlError, Result};

/// Writes the matrix in meters, one row per origin pub, with a header of
/// destination names.
pub fn save_matrix_csv(
    path: impl AsRef<Path>,
    registry: &PubRegistry,
    dm: &DistanceMatrix,
) -> Result<()> {
    if registry.len() != dm.len() {
        return Err(CrawlError::invalid_input(format!(
            "{} pubs but a {}x{} matrix",
            registry.len(),
            dm.len(),
            dm.len()
        )));
    }

    let path = path.as_ref();
    let mut wtr = Writer::from_path(path)?;

    let mut header = vec!["from".to_string()];
    header.extend(registry.names().map(str::to_string));
    wtr.write_record(&header)?;

    for (i, name) in registry.names().enumerate() {
        let mut record = vec![name.to_string()];
        record.extend((0..dm.len()).map(|j| format!("{:.3}", dm.meters(i, j))));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    info!("Wrote {0}x{0} distance matrix to {1}", dm.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Location;

    #[test]
    fn writes_header_and_rows_in_meters() {
        let registry = PubRegistry::new(vec![
            Location::new("A", 0.0, 0.0),
            Location::new("B", 0.0, 0.0),
        ])
        .unwrap();
        let dm = DistanceMatrix::from_meters(&[vec![0.0, 12.3456], vec![12.0, 0.0]], 1000.0)
            .unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();
        save_matrix_csv(file.path(), &registry, &dm).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["from,A,B", "A,0.000,12.346", "B,12.000,0.000"]);
    }
}
