/// Linear cooling over an iteration schedule: full `initial` heat at
/// iteration 0, zero at `horizon`. `temperature_factor` re-heats a stagnating
/// search.
pub fn temperature(
    initial: f64,
    iteration: usize,
    horizon: usize,
    temperature_factor: f64,
) -> f64 {
    if horizon == 0 {
        return 0.0;
    }
    let remaining = 1.0 - (iteration as f64 / horizon as f64).min(1.0);
    initial * remaining * temperature_factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cools_linearly_to_zero() {
        assert_eq!(temperature(100.0, 0, 400, 1.0), 100.0);
        assert_eq!(temperature(100.0, 100, 400, 1.0), 75.0);
        assert_eq!(temperature(100.0, 100, 400, 2.0), 150.0);
        assert_eq!(temperature(100.0, 400, 400, 1.0), 0.0);
        assert_eq!(temperature(100.0, 900, 400, 1.0), 0.0);
        assert_eq!(temperature(100.0, 0, 0, 1.0), 0.0);
    }
}
