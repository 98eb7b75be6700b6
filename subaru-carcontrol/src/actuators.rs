//! Actuator mapping
//!
//! Converts normalized gas/brake requests into the physical command values the
//! cruise ECU accepts. Every output is clipped into its configured range, and
//! anything that is not a positive, finite request is treated as "no command".

use crate::config::Limits;
use crate::types::{ActuatorCommand, BrakeAssist};

/// Brake request as sent on the bus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrakeCommand {
    pub active: bool,
    pub pressure: i32,
}

/// Longitudinal values for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongitudinalCommand {
    pub throttle: i32,
    pub rpm: i32,
    pub brake: BrakeCommand,
}

/// Cruise throttle for a gas request; idle (`throttle_min`) without one
pub fn throttle_command(gas: f32, limits: &Limits) -> i32 {
    scaled(gas, limits.throttle_base, limits.throttle_scale, limits.throttle_min, limits.throttle_max)
        .unwrap_or(limits.throttle_min)
}

/// Cruise rpm for a gas request; `rpm_min` without one
pub fn rpm_command(gas: f32, limits: &Limits) -> i32 {
    scaled(gas, limits.rpm_base, limits.rpm_scale, limits.rpm_min, limits.rpm_max).unwrap_or(limits.rpm_min)
}

/// Brake pressure for a brake request
///
/// An active brake-assist passthrough wins over the request: its pressure is
/// clipped into the brake range and the brake is flagged active.
pub fn brake_command(brake: f32, assist: &BrakeAssist, limits: &Limits) -> BrakeCommand {
    if assist.active {
        return BrakeCommand {
            active: true,
            pressure: assist.pressure.clamp(limits.brake_min, limits.brake_max),
        };
    }

    match scaled(brake, 0, limits.brake_scale, limits.brake_min, limits.brake_max) {
        Some(pressure) => BrakeCommand {
            active: true,
            pressure,
        },
        None => BrakeCommand {
            active: false,
            pressure: limits.brake_min,
        },
    }
}

/// Map the planner's gas/brake for one cycle
///
/// While disabled, throttle and rpm stay neutral and only the brake-assist
/// passthrough can activate the brake.
pub fn map_longitudinal(
    enabled: bool,
    actuators: &ActuatorCommand,
    assist: &BrakeAssist,
    limits: &Limits,
) -> LongitudinalCommand {
    let (gas, brake) = if enabled {
        (actuators.gas, actuators.brake)
    } else {
        (0.0, 0.0)
    };

    LongitudinalCommand {
        throttle: throttle_command(gas, limits),
        rpm: rpm_command(gas, limits),
        brake: brake_command(brake, assist, limits),
    }
}

/// `clip(base + value * scale, min, max)`, or `None` when there is no request
fn scaled(value: f32, base: i32, scale: f64, min: i32, max: i32) -> Option<i32> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }

    let raw = f64::from(base) + f64::from(value) * scale;
    let clipped = raw.clamp(f64::from(min), f64::from(max));
    // NaN only if scale is non-finite; fall back to the floor of the range
    Some(if clipped.is_nan() { min } else { clipped.trunc() as i32 })
}
