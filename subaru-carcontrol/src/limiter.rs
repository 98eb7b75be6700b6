//! Steering torque rate limiting
//!
//! Bounds how far the commanded steering torque may move from the previously
//! applied value in one steering update, and tightens that bound while the
//! driver resists the change.
//!
//! Step sizes:
//! - moving away from zero: `steer_delta_up`
//! - moving toward zero: `steer_delta_down`, overshooting zero by at most
//!   `steer_delta_up`
//!
//! Driver override: when the driver pushes against the direction of the change
//! with more than `steer_driver_allowance`, both steps shrink by
//! `(|driver| - allowance) * multiplier * factor`, never below zero.

use crate::config::Limits;

/// Outcome of one rate-limit evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Torque to apply
    pub torque: i32,
    /// True when `torque` differs from what was requested
    pub limited: bool,
}

/// Limit `desired` torque given the previously applied torque and the
/// measured driver torque.
///
/// The result is always within `[-steer_max, steer_max]`.
pub fn apply_steer_torque_limits(desired: i32, previous: i32, driver_torque: i32, limits: &Limits) -> i32 {
    let desired = i64::from(desired);
    let previous = i64::from(previous);
    let steer_max = i64::from(limits.steer_max.max(0));

    let reduction = driver_reduction(desired - previous, i64::from(driver_torque), limits);
    let delta_up = (i64::from(limits.steer_delta_up) - reduction).max(0);
    let delta_down = (i64::from(limits.steer_delta_down) - reduction).max(0);

    let (lower, upper) = if previous > 0 {
        ((previous - delta_down).max(-delta_up), previous + delta_up)
    } else if previous < 0 {
        (previous - delta_up, (previous + delta_down).min(delta_up))
    } else {
        (-delta_up, delta_up)
    };

    let limited = desired.clamp(lower, upper).clamp(-steer_max, steer_max);
    // Bounded by steer_max, which came from an i32
    limited as i32
}

/// Same as [`apply_steer_torque_limits`], also reporting whether the request
/// was modified.
pub fn limit_steer_torque(desired: i32, previous: i32, driver_torque: i32, limits: &Limits) -> RateLimit {
    let torque = apply_steer_torque_limits(desired, previous, driver_torque, limits);
    RateLimit {
        torque,
        limited: torque != desired,
    }
}

/// How much the driver's resistance shrinks the permitted step
fn driver_reduction(change: i64, driver_torque: i64, limits: &Limits) -> i64 {
    let opposing = (change > 0 && driver_torque < 0) || (change < 0 && driver_torque > 0);
    if !opposing {
        return 0;
    }

    let excess = driver_torque.abs() - i64::from(limits.steer_driver_allowance);
    if excess <= 0 {
        return 0;
    }

    excess
        .saturating_mul(i64::from(limits.steer_driver_multiplier))
        .saturating_mul(i64::from(limits.steer_driver_factor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> Limits {
        Limits::new()
    }

    #[test]
    fn test_step_up_from_zero() {
        assert_eq!(apply_steer_torque_limits(2047, 0, 0, &limits()), 50);
        assert_eq!(apply_steer_torque_limits(-2047, 0, 0, &limits()), -50);
    }

    #[test]
    fn test_step_down_toward_zero() {
        assert_eq!(apply_steer_torque_limits(0, 1000, 0, &limits()), 930);
        assert_eq!(apply_steer_torque_limits(0, -1000, 0, &limits()), -930);
    }

    #[test]
    fn test_small_request_passes_unchanged() {
        assert_eq!(apply_steer_torque_limits(520, 500, 0, &limits()), 520);
        assert_eq!(apply_steer_torque_limits(460, 500, 0, &limits()), 460);
        assert_eq!(apply_steer_torque_limits(500, 500, 0, &limits()), 500);
    }

    #[test]
    fn test_crossing_zero_overshoot_bounded() {
        // 30 -> -500: down step of 70 but never more than delta_up past zero
        assert_eq!(apply_steer_torque_limits(-500, 30, 0, &limits()), -40);
        assert_eq!(apply_steer_torque_limits(-500, 10, 0, &limits()), -50);
        assert_eq!(apply_steer_torque_limits(500, -10, 0, &limits()), 50);
    }

    #[test]
    fn test_clamped_to_steer_max() {
        assert_eq!(apply_steer_torque_limits(4000, 2040, 0, &limits()), 2047);
        assert_eq!(apply_steer_torque_limits(-4000, -2040, 0, &limits()), -2047);
    }

    #[test]
    fn test_driver_override_blocks_increase() {
        // (160 - 60) * 10 * 1 = 1000 > delta_up
        assert_eq!(apply_steer_torque_limits(2047, 0, -160, &limits()), 0);
        assert_eq!(apply_steer_torque_limits(2047, 300, -160, &limits()), 300);
        assert_eq!(apply_steer_torque_limits(-2047, -300, 160, &limits()), -300);
    }

    #[test]
    fn test_driver_within_allowance_ignored() {
        assert_eq!(apply_steer_torque_limits(2047, 0, -60, &limits()), 50);
    }

    #[test]
    fn test_driver_partial_reduction() {
        // (62 - 60) * 10 = 20 off delta_up
        assert_eq!(apply_steer_torque_limits(2047, 0, -62, &limits()), 30);
    }

    #[test]
    fn test_driver_assisting_not_penalized() {
        assert_eq!(apply_steer_torque_limits(2047, 0, 500, &limits()), 50);
    }

    #[test]
    fn test_limit_flag() {
        let result = limit_steer_torque(2047, 0, 0, &limits());
        assert_eq!(result, RateLimit { torque: 50, limited: true });

        let result = limit_steer_torque(30, 0, 0, &limits());
        assert!(!result.limited);
    }

    #[test]
    fn test_output_stays_within_bounds() {
        let limits = limits();
        for previous in (-2047..=2047).step_by(97) {
            for desired in (-2047..=2047).step_by(89) {
                for driver in [-400, -61, 0, 61, 400] {
                    let out = apply_steer_torque_limits(desired, previous, driver, &limits);
                    assert!(out.abs() <= limits.steer_max);

                    let moving_away = out.abs() > previous.abs() && out.signum() == previous.signum();
                    let step = (out - previous).abs();
                    if moving_away || previous == 0 {
                        assert!(step <= limits.steer_delta_up, "{} -> {}", previous, out);
                    } else {
                        assert!(step <= limits.steer_delta_down, "{} -> {}", previous, out);
                    }
                }
            }
        }
    }

    #[test]
    fn test_driver_resistance_monotonic() {
        let limits = limits();
        let mut last_step = i32::MAX;
        for driver in 0..=200 {
            let out = apply_steer_torque_limits(2047, 100, -driver, &limits);
            let step = out - 100;
            assert!(step >= 0);
            assert!(step <= last_step);
            last_step = step;
        }
        assert_eq!(last_step, 0);
    }
}
