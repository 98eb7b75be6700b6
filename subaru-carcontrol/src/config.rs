//! Controller limits
//!
//! Platform limits are built once when the controller is constructed and only
//! ever read afterwards. Every field has a serde default so a config file can
//! override a subset and inherit the rest.
//!
//! The defaults are the values tested on the vehicle. Raising the steering
//! limits in particular risks commands the EPS rejects or faults on.

use crate::types::{ConfigError, Result};
use serde::{Deserialize, Serialize};

/// Steering, throttle, rpm and brake limits for one platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum steering torque command (either direction)
    pub steer_max: i32,
    /// Steering command is sent every `steer_step` cycles
    pub steer_step: u32,
    /// Torque increase per steering update
    pub steer_delta_up: i32,
    /// Torque decrease per steering update
    pub steer_delta_down: i32,
    /// Driver torque tolerated before the rate limit tightens
    pub steer_driver_allowance: i32,
    /// Weight applied to driver torque beyond the allowance
    pub steer_driver_multiplier: i32,
    /// Driver torque signal scale
    pub steer_driver_factor: i32,

    pub rpm_min: i32,
    pub rpm_max: i32,
    pub rpm_base: i32,
    pub rpm_scale: f64,

    /// Idle throttle; also the neutral command when no gas is requested
    pub throttle_min: i32,
    pub throttle_max: i32,
    pub throttle_base: i32,
    pub throttle_scale: f64,

    pub brake_min: i32,
    pub brake_max: i32,
    pub brake_scale: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            steer_max: 2047,
            steer_step: 2,
            steer_delta_up: 50,
            steer_delta_down: 70,
            steer_driver_allowance: 60,
            steer_driver_multiplier: 10,
            steer_driver_factor: 1,

            rpm_min: 0,
            rpm_max: 3600,
            rpm_base: 600,
            rpm_scale: 3000.0,

            throttle_min: 808,
            throttle_max: 3400,
            throttle_base: 1810,
            throttle_scale: 1000.0,

            brake_min: 0,
            brake_max: 400,
            brake_scale: 400.0,
        }
    }
}

impl Limits {
    /// Create limits with the platform defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set steering torque limits
    pub fn with_steer(mut self, max: i32, delta_up: i32, delta_down: i32) -> Self {
        self.steer_max = max;
        self.steer_delta_up = delta_up;
        self.steer_delta_down = delta_down;
        self
    }

    /// Builder method: set how often the steering command is sent
    pub fn with_steer_step(mut self, step: u32) -> Self {
        self.steer_step = step;
        self
    }

    /// Builder method: set driver override shaping
    pub fn with_driver_override(mut self, allowance: i32, multiplier: i32, factor: i32) -> Self {
        self.steer_driver_allowance = allowance;
        self.steer_driver_multiplier = multiplier;
        self.steer_driver_factor = factor;
        self
    }

    /// Builder method: set the throttle range
    pub fn with_throttle(mut self, min: i32, max: i32, base: i32, scale: f64) -> Self {
        self.throttle_min = min;
        self.throttle_max = max;
        self.throttle_base = base;
        self.throttle_scale = scale;
        self
    }

    /// Builder method: set the rpm range
    pub fn with_rpm(mut self, min: i32, max: i32, base: i32, scale: f64) -> Self {
        self.rpm_min = min;
        self.rpm_max = max;
        self.rpm_base = base;
        self.rpm_scale = scale;
        self
    }

    /// Builder method: set the brake pressure range
    pub fn with_brake(mut self, min: i32, max: i32, scale: f64) -> Self {
        self.brake_min = min;
        self.brake_max = max;
        self.brake_scale = scale;
        self
    }

    /// Check that the limits describe a usable controller
    pub fn validate(&self) -> Result<()> {
        if self.steer_step == 0 {
            return Err(invalid("steer_step", "must be at least 1"));
        }

        for (name, value) in [
            ("steer_max", self.steer_max),
            ("steer_delta_up", self.steer_delta_up),
            ("steer_delta_down", self.steer_delta_down),
            ("steer_driver_allowance", self.steer_driver_allowance),
            ("steer_driver_multiplier", self.steer_driver_multiplier),
            ("steer_driver_factor", self.steer_driver_factor),
        ] {
            if value < 0 {
                return Err(invalid(name, format!("must not be negative, got {}", value)));
            }
        }

        for (name, min, max) in [
            ("rpm", self.rpm_min, self.rpm_max),
            ("throttle", self.throttle_min, self.throttle_max),
            ("brake", self.brake_min, self.brake_max),
        ] {
            if min > max {
                return Err(ConfigError::InvalidRange { name, min, max });
            }
        }

        for (name, scale) in [
            ("rpm_scale", self.rpm_scale),
            ("throttle_scale", self.throttle_scale),
            ("brake_scale", self.brake_scale),
        ] {
            if !scale.is_finite() {
                return Err(invalid(name, format!("must be finite, got {}", scale)));
            }
        }

        Ok(())
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidLimit {
        name,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let limits = Limits::new();
        assert!(limits.validate().is_ok());
        assert_eq!(limits.steer_max, 2047);
        assert_eq!(limits.steer_step, 2);
        assert_eq!(limits.throttle_min, 808);
    }

    #[test]
    fn test_limits_builder() {
        let limits = Limits::new()
            .with_steer(1000, 10, 20)
            .with_steer_step(4)
            .with_driver_override(30, 5, 2)
            .with_brake(0, 600, 600.0);

        assert_eq!(limits.steer_max, 1000);
        assert_eq!(limits.steer_delta_up, 10);
        assert_eq!(limits.steer_delta_down, 20);
        assert_eq!(limits.steer_step, 4);
        assert_eq!(limits.steer_driver_factor, 2);
        assert_eq!(limits.brake_max, 600);
    }

    #[test]
    fn test_zero_step_rejected() {
        let err = Limits::new().with_steer_step(0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLimit { name: "steer_step", .. }));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = Limits::new()
            .with_throttle(2000, 1000, 1500, 100.0)
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidRange {
                name: "throttle",
                min: 2000,
                max: 1000
            }
        );
    }

    #[test]
    fn test_non_finite_scale_rejected() {
        let err = Limits::new()
            .with_rpm(0, 100, 0, f64::NAN)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLimit { name: "rpm_scale", .. }));
    }

    #[test]
    fn test_negative_delta_rejected() {
        let err = Limits::new().with_steer(2047, -1, 70).validate().unwrap_err();
        assert!(err.to_string().contains("steer_delta_up"));
    }
}
