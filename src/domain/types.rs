use serde::{Deserialize, Serialize};

/// A named pub with its coordinates, as read from the pub list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: String,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            address: String::new(),
        }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Visiting order as indices into the distance matrix, with its total in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedRoute {
    pub stops: Vec<usize>,
    pub total_distance: f64,
}

/// A resolved route ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlPlan {
    pub stops: Vec<Location>,
    pub total_distance: f64,
}

impl CrawlPlan {
    pub fn names(&self) -> Vec<&str> {
        self.stops.iter().map(|l| l.name.as_str()).collect()
    }
}
