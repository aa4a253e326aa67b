use std::collections::HashMap;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::domain::types::Location;
use crate::error::{CrawlError, Result};

/// Fixed set of pubs, addressable by name or by position.
///
/// Positions are stable for the lifetime of the registry and are the row and
/// column indices of any distance matrix built from [`PubRegistry::locations`].
#[derive(Debug, Clone)]
pub struct PubRegistry {
    locations: Vec<Location>,
    by_name: HashMap<String, usize>,
}

impl PubRegistry {
    pub fn new(locations: Vec<Location>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(locations.len());
        for (idx, loc) in locations.iter().enumerate() {
            if !loc.latitude.is_finite() || !loc.longitude.is_finite() {
                return Err(CrawlError::invalid_data(format!(
                    "pub '{}' has non-finite coordinates",
                    loc.name
                )));
            }
            if by_name.insert(loc.name.clone(), idx).is_some() {
                return Err(CrawlError::invalid_data(format!(
                    "duplicate pub name '{}'",
                    loc.name
                )));
            }
        }
        Ok(Self { locations, by_name })
    }

    /// Reads a `name,latitude,longitude,address` CSV with a header row.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut locations = Vec::new();
        for row in reader.deserialize() {
            let loc: Location = row?;
            debug!("Loaded pub {} at ({}, {})", loc.name, loc.latitude, loc.longitude);
            locations.push(loc);
        }

        info!("Loaded {} pubs from {}", locations.len(), path.display());
        Self::new(locations)
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Location> {
        self.locations.get(index)
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| CrawlError::MissingLocation(name.to_string()))
    }

    /// Resolves every name, failing on the first unknown one.
    pub fn indices_of<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        names.iter().map(|n| self.index_of(n.as_ref())).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.locations.iter().map(|l| l.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_csv_with_address_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,latitude,longitude,address").unwrap();
        writeln!(file, "Caribou,53.2720,-9.0530,\"1 Shop St, Galway\"").unwrap();
        writeln!(file, "The Sliding Rock, 53.2741 , -9.0489,Upper Salthill").unwrap();

        let registry = PubRegistry::from_csv(file.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.index_of("The Sliding Rock").unwrap(), 1);
        assert_eq!(registry.get(0).unwrap().address, "1 Shop St, Galway");
        assert!((registry.get(1).unwrap().latitude - 53.2741).abs() < 1e-9);
    }

    #[test]
    fn unknown_name_is_missing_location() {
        let registry = PubRegistry::new(vec![Location::new("A", 0.0, 0.0)]).unwrap();
        match registry.indices_of(&["A", "Nowhere"]) {
            Err(CrawlError::MissingLocation(name)) => assert_eq!(name, "Nowhere"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = PubRegistry::new(vec![
            Location::new("A", 0.0, 0.0),
            Location::new("A", 1.0, 1.0),
        ])
        .unwrap_err();
        assert!(matches!(err, CrawlError::InvalidData(_)));
    }
}
