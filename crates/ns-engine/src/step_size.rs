/// Multiplicative step-size control factor.
///
/// `f(r) = exp(alpha * (r - target_ratio))`: monotone in `r`, continuous,
/// and `f(target_ratio) == 1` for any `alpha`. `alpha` controls how
/// aggressively the step size reacts to an observed acceptance ratio away
/// from the target.
pub fn step_factor(r: f64, target_ratio: f64, alpha: f64) -> f64 {
    (alpha * (r - target_ratio)).exp()
}

/// Apply the step-size update and clamp to `[stepsize_min, max_stepsize]`.
pub fn update_stepsize(current: f64, factor: f64, stepsize_min: f64, max_stepsize: f64) -> f64 {
    (current * factor).clamp(stepsize_min, max_stepsize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_is_one_at_target() {
        assert!((step_factor(0.5, 0.5, 1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn factor_increases_with_ratio() {
        let low = step_factor(0.2, 0.5, 1.0);
        let high = step_factor(0.8, 0.5, 1.0);
        assert!(high > 1.0);
        assert!(low < 1.0);
        assert!(high > low);
    }

    #[test]
    fn update_clamps_to_bounds() {
        assert_eq!(update_stepsize(1.0, 100.0, 0.01, 2.0), 2.0);
        assert_eq!(update_stepsize(1.0, 0.0001, 0.01, 2.0), 0.01);
    }
}
