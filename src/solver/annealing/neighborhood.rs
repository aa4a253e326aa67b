use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::config::TourShape;
use crate::distance::matrix::DistanceMatrix;
use crate::evaluation::fitness::tour_cost;

/// Local move on a tour. Position 0 holds the start and is never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Reverse the segment `[i..=j]` (2-opt).
    Reverse(usize, usize),
    /// Exchange the stops at `i` and `j`.
    Swap(usize, usize),
    /// Take the stop at `i` out and reinsert it at `j`.
    Relocate(usize, usize),
}

impl Move {
    pub fn apply(&self, tour: &mut [usize]) {
        match *self {
            Move::Reverse(i, j) => tour[i..=j].reverse(),
            Move::Swap(i, j) => tour.swap(i, j),
            Move::Relocate(i, j) if i < j => tour[i..=j].rotate_left(1),
            Move::Relocate(i, j) => tour[j..=i].rotate_right(1),
        }
    }

    /// Draws a random move between two distinct non-start positions.
    /// Tours with fewer than two movable stops have no moves.
    pub fn random(len: usize, rng: &mut ChaCha8Rng) -> Option<Move> {
        if len < 3 {
            return None;
        }
        let a = rng.gen_range(1..len);
        let mut b = rng.gen_range(1..len - 1);
        if b >= a {
            b += 1;
        }
        let (i, j) = if a < b { (a, b) } else { (b, a) };

        let mv = match rng.gen_range(0..3) {
            0 => Move::Reverse(i, j),
            1 => Move::Swap(i, j),
            _ => Move::Relocate(a, b),
        };
        Some(mv)
    }
}

/// Scores every 2-opt reversal and swap of `tour` and returns the cheapest
/// candidates first.
pub fn find_neighbours(
    tour: &[usize],
    dm: &DistanceMatrix,
    shape: TourShape,
) -> Vec<(i64, Move)> {
    let n = tour.len();

    let moves: Vec<Move> = (1..n)
        .flat_map(|i| ((i + 1)..n).flat_map(move |j| [Move::Reverse(i, j), Move::Swap(i, j)]))
        .collect();

    let mut candidates: Vec<(i64, Move)> = moves
        .par_iter()
        .map(|&mv| {
            let mut candidate = tour.to_vec();
            mv.apply(&mut candidate);
            (tour_cost(&candidate, dm, shape), mv)
        })
        .collect();

    candidates.par_sort_by_key(|&(cost, _)| cost);
    candidates
}
