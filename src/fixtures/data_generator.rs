use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::domain::types::Location;
use crate::error::{CrawlError, Result};
use crate::network::geo::offset;
use crate::network::graph::{NetworkEdge, NetworkNode, WalkNetwork};

const ADJECTIVES: [&str; 8] = [
    "Crooked", "Salty", "Quiet", "Jolly", "Red", "Sliding", "Old", "Drowsy",
];
const NOUNS: [&str; 8] = [
    "Anchor", "Fiddler", "Hooker", "Rock", "Lantern", "Cobble", "Heron", "Barrel",
];

/// A rectangular street grid with pubs on some of its corners.
#[derive(Debug, Clone)]
pub struct SyntheticTown {
    pub network: WalkNetwork,
    pub pubs: Vec<Location>,
    pub rows: usize,
    pub cols: usize,
    pub spacing_m: f64,
}

/// Grid of `rows x cols` junctions `spacing_m` apart, two-way streets
/// between orthogonal neighbours. Node ids are `row * cols + col`.
pub fn grid_network(
    rows: usize,
    cols: usize,
    spacing_m: f64,
    origin: (f64, f64),
) -> Result<WalkNetwork> {
    let mut nodes = Vec::with_capacity(rows * cols);
    let mut edges = Vec::new();

    for r in 0..rows {
        for c in 0..cols {
            let id = (r * cols + c) as i64;
            let (lat, lon) = offset(origin.0, origin.1, r as f64 * spacing_m, c as f64 * spacing_m);
            nodes.push(NetworkNode { id, lat, lon });
            if c + 1 < cols {
                edges.push(street(id, id + 1, spacing_m));
            }
            if r + 1 < rows {
                edges.push(street(id, id + cols as i64, spacing_m));
            }
        }
    }

    WalkNetwork::from_parts(&nodes, &edges)
}

fn street(from: i64, to: i64, length: f64) -> NetworkEdge {
    NetworkEdge {
        from,
        to,
        length: Some(length),
        oneway: false,
    }
}

/// Places `pub_count` pubs on distinct random junctions, each nudged a few
/// meters off the street so snapping has something to do.
pub fn generate_town(
    rows: usize,
    cols: usize,
    spacing_m: f64,
    pub_count: usize,
    seed: u64,
) -> Result<SyntheticTown> {
    if pub_count > rows * cols {
        return Err(CrawlError::invalid_input(format!(
            "cannot place {pub_count} pubs on a {rows}x{cols} grid"
        )));
    }

    let origin = (53.2691, -9.0644);
    let network = grid_network(rows, cols, spacing_m, origin)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut corners: Vec<usize> = (0..rows * cols).choose_multiple(&mut rng, pub_count);
    corners.sort_unstable();

    let max_nudge = spacing_m / 10.0;
    let pubs: Vec<Location> = corners
        .iter()
        .enumerate()
        .map(|(i, &corner)| {
            let (r, c) = (corner / cols, corner % cols);
            let (lat, lon) = offset(
                origin.0,
                origin.1,
                r as f64 * spacing_m + rng.gen_range(-max_nudge..=max_nudge),
                c as f64 * spacing_m + rng.gen_range(-max_nudge..=max_nudge),
            );
            let name = pub_name(i);
            debug!("Placed {} at junction ({}, {})", name, r, c);
            Location {
                name,
                latitude: lat,
                longitude: lon,
                address: format!("{} Street {}", NOUNS[r % NOUNS.len()], c + 1),
            }
        })
        .collect();

    info!(
        "Generated a {}x{} town with {} pubs (seed {})",
        rows,
        cols,
        pubs.len(),
        seed
    );
    Ok(SyntheticTown {
        network,
        pubs,
        rows,
        cols,
        spacing_m,
    })
}

/// Unique pub names: the first 64 are plain, later ones get a numeric suffix.
fn pub_name(i: usize) -> String {
    let adjective = ADJECTIVES[i % ADJECTIVES.len()];
    let noun = NOUNS[(i / ADJECTIVES.len()) % NOUNS.len()];
    let round = i / (ADJECTIVES.len() * NOUNS.len());
    if round == 0 {
        format!("The {adjective} {noun}")
    } else {
        format!("The {adjective} {noun} {}", round + 1)
    }
}
