use itertools::Itertools;

use crate::config::TourShape;
use crate::distance::matrix::DistanceMatrix;

/// Scaled cost of visiting `stops` in order. A closed tour also pays for the
/// walk from the last stop back to the first.
pub fn tour_cost(stops: &[usize], dm: &DistanceMatrix, shape: TourShape) -> i64 {
    if stops.len() < 2 {
        return 0;
    }

    let legs: i64 = stops
        .iter()
        .tuple_windows()
        .map(|(&from, &to)| dist_between(from, to, dm))
        .sum();

    match shape {
        TourShape::Open => legs,
        TourShape::Closed => legs + dist_between(stops[stops.len() - 1], stops[0], dm),
    }
}

/// Same as [`tour_cost`], in meters.
pub fn tour_distance(stops: &[usize], dm: &DistanceMatrix, shape: TourShape) -> f64 {
    dm.descale(tour_cost(stops, dm, shape))
}

pub fn dist_between(from_loc: usize, to_loc: usize, dm: &DistanceMatrix) -> i64 {
    dm.get(from_loc, to_loc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dm() -> DistanceMatrix {
        DistanceMatrix::from_meters(
            &[
                vec![0.0, 100.0, 300.0],
                vec![100.0, 0.0, 150.0],
                vec![300.0, 150.0, 0.0],
            ],
            1000.0,
        )
        .unwrap()
    }

    #[test]
    fn open_tour_sums_consecutive_legs() {
        assert_eq!(tour_cost(&[0, 1, 2], &dm(), TourShape::Open), 250_000);
        assert_eq!(tour_distance(&[0, 2, 1], &dm(), TourShape::Open), 450.0);
    }

    #[test]
    fn closed_tour_adds_the_return_leg() {
        assert_eq!(tour_distance(&[0, 1, 2], &dm(), TourShape::Closed), 550.0);
    }

    #[test]
    fn single_stop_costs_nothing() {
        assert_eq!(tour_cost(&[2], &dm(), TourShape::Closed), 0);
        assert_eq!(tour_cost(&[], &dm(), TourShape::Open), 0);
    }
}
