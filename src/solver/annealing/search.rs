use std::cmp::max;
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, span, trace, Level};

use super::neighborhood::{find_neighbours, Move};
use super::AnnealingConfig;
use crate::error::Result;
use crate::evaluation::fitness::tour_cost;
use crate::solver::{Tour, TourProblem};
use crate::utils::temperature;

const ITERATIONS_PER_STOP_SQUARED: usize = 200;
const MIN_COOLING_ITERATIONS: usize = 10_000;
/// Share of the starting temperature below which the search counts as cold.
const COLD_FRACTION: f64 = 0.1;

/// Mutable state of one annealing run.
#[derive(Debug)]
pub struct SearchState {
    pub current: Vec<usize>,
    pub current_cost: i64,
    pub best: Vec<usize>,
    pub best_cost: i64,
    pub best_iteration: usize,
    pub stagnation: usize,
    pub max_stagnation: usize,
    pub temperature_factor: f64,
    pub accepted_worse: usize,
    pub reheats: usize,
    /// Set once the schedule has cooled below `COLD_FRACTION` of the start.
    pub cold: bool,
    pub rng: ChaCha8Rng,
}

impl SearchState {
    pub fn new(initial: Vec<usize>, cost: i64, seed: u64) -> Self {
        Self {
            best: initial.clone(),
            best_cost: cost,
            current: initial,
            current_cost: cost,
            best_iteration: 0,
            stagnation: 0,
            max_stagnation: 0,
            temperature_factor: 1.0,
            accepted_worse: 0,
            reheats: 0,
            cold: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

/// Cold iterations without improvement after which the search stops early.
/// Grows superlinearly with the number of stops, never below 300.
pub fn calculate_max_no_improvement(stops: usize) -> usize {
    let scaling_factor = if stops < 50 { 15.0 } else { 9.0 };
    max(300, (scaling_factor * (stops as f64).powf(1.33)) as usize)
}

/// Greedy tour from the start: always walk to the closest unvisited stop.
///
/// Fails if the deadline passes before the tour is complete.
pub fn nearest_neighbour_tour(problem: &TourProblem<'_>, deadline: Instant) -> Result<Vec<usize>> {
    let dm = problem.matrix;
    let mut tour = Vec::with_capacity(problem.size());
    tour.push(problem.start);
    let mut remaining: Vec<usize> = problem.visits.to_vec();

    while !remaining.is_empty() {
        if Instant::now() >= deadline {
            return Err(problem.no_solution());
        }
        let last = tour[tour.len() - 1];
        let Some((pos, _)) = remaining
            .iter()
            .enumerate()
            .min_by_key(|&(_, &to)| dm.get(last, to))
        else {
            break;
        };
        tour.push(remaining.swap_remove(pos));
    }

    Ok(tour)
}

/// Average cost increase of a sample of random moves, used as the starting
/// temperature so acceptance odds do not depend on the distance scale.
fn initial_temperature(problem: &TourProblem<'_>, tour: &[usize], rng: &mut ChaCha8Rng) -> f64 {
    let base = tour_cost(tour, problem.matrix, problem.shape);
    let mut total = 0i64;
    let mut uphill = 0i64;
    for _ in 0..(tour.len() * 4).max(20) {
        let Some(mv) = Move::random(tour.len(), rng) else {
            break;
        };
        let mut candidate = tour.to_vec();
        mv.apply(&mut candidate);
        let delta = tour_cost(&candidate, problem.matrix, problem.shape) - base;
        if delta > 0 {
            total += delta;
            uphill += 1;
        }
    }
    if uphill == 0 {
        1.0
    } else {
        total as f64 / uphill as f64
    }
}

/// Result of one annealing run, with the temperatures it went through.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub tour: Tour,
    pub iterations: usize,
    pub initial_temperature: f64,
    pub final_temperature: f64,
}

/// Length of the cooling schedule: quadratic in the number of stops, at
/// least `MIN_COOLING_ITERATIONS` and at most `max_iterations`.
pub fn cooling_iterations(stops: usize, max_iterations: usize) -> usize {
    (ITERATIONS_PER_STOP_SQUARED * stops * stops)
        .max(MIN_COOLING_ITERATIONS)
        .min(max_iterations)
}

/// Runs simulated annealing from `initial` over the cooling schedule, then
/// polishes the best tour. The deadline cuts the schedule short; the
/// stagnation limit only applies once the search has gone cold.
pub fn run(
    problem: &TourProblem<'_>,
    config: &AnnealingConfig,
    initial: Vec<usize>,
    started: Instant,
) -> SearchOutcome {
    let dm = problem.matrix;
    let deadline = problem.deadline(started);
    let initial_cost = tour_cost(&initial, dm, problem.shape);
    let mut state = SearchState::new(initial, initial_cost, config.seed);

    let loop_span = span!(Level::DEBUG, "annealing", stops = problem.size());
    let _loop_guard = loop_span.enter();

    let t0 = initial_temperature(problem, &state.current, &mut state.rng)
        * config.initial_temperature_scale;
    let horizon = cooling_iterations(problem.size(), config.max_iterations);
    let max_no_improvement = calculate_max_no_improvement(problem.size());
    debug!(
        "Initial cost {}, temperature {:.2}, {} iterations, stagnation limit {}",
        initial_cost, t0, horizon, max_no_improvement
    );

    let mut candidate = state.current.clone();
    let mut iteration = 0;
    let mut temp = t0;
    while iteration < horizon {
        if Instant::now() >= deadline {
            debug!("Time budget exhausted after {} iterations", iteration);
            break;
        }
        iteration += 1;

        let base = temperature(t0, iteration, horizon, 1.0);
        temp = base * state.temperature_factor;
        if !state.cold && base <= t0 * COLD_FRACTION {
            debug!("Search went cold at iteration {}", iteration);
            state.cold = true;
            state.stagnation = 0;
        }

        let Some(mv) = Move::random(state.current.len(), &mut state.rng) else {
            break;
        };
        candidate.copy_from_slice(&state.current);
        mv.apply(&mut candidate);
        let cost = tour_cost(&candidate, dm, problem.shape);
        let delta = cost - state.current_cost;

        let accept = delta <= 0
            || (temp > 0.0 && state.rng.gen::<f64>() < (-(delta as f64) / temp).exp());

        if accept {
            trace!("iteration {}: {:?} delta {} accepted", iteration, mv, delta);
            if delta > 0 {
                state.accepted_worse += 1;
            }
            std::mem::swap(&mut state.current, &mut candidate);
            state.current_cost = cost;
        }

        if state.current_cost < state.best_cost {
            state.best.clone_from(&state.current);
            state.best_cost = state.current_cost;
            state.best_iteration = iteration;
            debug!("New best at iteration {}: cost = {}", iteration, state.best_cost);
        }

        if state.best_iteration != iteration {
            state.stagnation += 1;
            if !state.cold {
                continue;
            }
            if state.stagnation >= max_no_improvement {
                debug!("Stopping early at iteration {}", iteration);
                break;
            } else if state.stagnation >= max_no_improvement / 2 && state.temperature_factor < 2.0 {
                state.temperature_factor = 2.0;
                state.reheats += 1;
                // restart from the best tour seen so far
                state.current.clone_from(&state.best);
                state.current_cost = state.best_cost;
            }
        } else {
            state.max_stagnation = max(state.stagnation, state.max_stagnation);
            state.stagnation = 0;
            state.temperature_factor = 1.0;
        }
    }

    let polished = polish(problem, state.best.clone(), state.best_cost, deadline);
    report_final_stats(&state, iteration, &polished);
    SearchOutcome {
        tour: polished,
        iterations: iteration,
        initial_temperature: t0,
        final_temperature: temp,
    }
}

/// Steepest-descent over 2-opt reversals and swaps until no move improves
/// the tour or the deadline passes.
pub fn polish(
    problem: &TourProblem<'_>,
    mut tour: Vec<usize>,
    mut cost: i64,
    deadline: Instant,
) -> Tour {
    while Instant::now() < deadline {
        let candidates = find_neighbours(&tour, problem.matrix, problem.shape);
        match candidates.first() {
            Some(&(candidate_cost, mv)) if candidate_cost < cost => {
                trace!("polish: {:?} improves {} -> {}", mv, cost, candidate_cost);
                mv.apply(&mut tour);
                cost = candidate_cost;
            }
            _ => break,
        }
    }
    Tour { stops: tour, cost }
}

fn report_final_stats(state: &SearchState, iterations: usize, tour: &Tour) {
    info!(
        "Annealing finished after {} iterations, best cost {} (found at iteration {})",
        iterations, tour.cost, state.best_iteration
    );
    debug!(
        "Max stagnation: {}, uphill moves accepted: {}, reheats: {}",
        state.max_stagnation, state.accepted_worse, state.reheats
    );
}
