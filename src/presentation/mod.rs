//! Everything the user sees: route text, console output and map/matrix files.

pub mod console;
pub mod export;
pub mod geojson;

use itertools::Itertools;

use crate::domain::types::Location;

/// `name1 --> name2 --> ... --> nameK`
pub fn describe_route(stops: &[Location]) -> String {
    stops.iter().map(|l| l.name.as_str()).join(" --> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_names_with_arrows() {
        let stops = vec![
            Location::new("Caribou", 0.0, 0.0),
            Location::new("Taaffes", 0.0, 0.0),
            Location::new("The Quays", 0.0, 0.0),
        ];
        assert_eq!(describe_route(&stops), "Caribou --> Taaffes --> The Quays");
        assert_eq!(describe_route(&stops[..1]), "Caribou");
        assert_eq!(describe_route(&[]), "");
    }
}
