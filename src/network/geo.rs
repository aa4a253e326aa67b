use crate::config::constant::GALWAY_BBOX;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points in meters.
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Moves a point `north_m` meters north and `east_m` meters east.
pub fn offset(lat: f64, lng: f64, north_m: f64, east_m: f64) -> (f64, f64) {
    let dlat = (north_m / EARTH_RADIUS_M).to_degrees();
    let dlng = (east_m / (EARTH_RADIUS_M * lat.to_radians().cos())).to_degrees();
    (lat + dlat, lng + dlng)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    pub fn galway() -> Self {
        let [north, south, east, west] = GALWAY_BBOX;
        Self::new(north, south, east, west)
    }

    pub fn is_valid(&self) -> bool {
        [self.north, self.south, self.east, self.west]
            .iter()
            .all(|v| v.is_finite())
            && self.north > self.south
            && self.east > self.west
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.south..=self.north).contains(&lat) && (self.west..=self.east).contains(&lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_matches_known_distance() {
        // Eyre Square to the Spanish Arch, roughly 600 m
        let dist = haversine_distance(53.2747, -9.0490, 53.2700, -9.0535);
        assert!((dist - 600.0).abs() < 100.0, "got {dist}");
    }

    #[test]
    fn offset_round_trips_through_haversine() {
        let (lat, lng) = offset(53.27, -9.05, 300.0, 400.0);
        let dist = haversine_distance(53.27, -9.05, lat, lng);
        assert!((dist - 500.0).abs() < 1.0, "got {dist}");
    }

    #[test]
    fn galway_box_is_valid() {
        let bbox = BoundingBox::galway();
        assert!(bbox.is_valid());
        assert!(bbox.contains(53.272, -9.053));
        assert!(!bbox.contains(53.30, -9.053));
    }
}
