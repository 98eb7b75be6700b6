//! Outbound message contents
//!
//! Builds the signal values for each outbound message. Pass-through messages
//! start from a copy of their inbound counterpart so that every field the
//! controller does not own is echoed back unchanged.

use crate::actuators::LongitudinalCommand;
use crate::types::{HudIndicators, PassThroughKind, PassThroughMessage, SignalValues, VisualAlert};

/// Per-cycle values shared by all pass-through builders
#[derive(Debug, Clone, Copy)]
pub struct EchoContext {
    pub enabled: bool,
    pub cancel_requested: bool,
    pub hud: HudIndicators,
    pub longitudinal: LongitudinalCommand,
}

/// `ES_LKAS`: the steering torque command
pub fn steering_control(torque: i32, counter: u8) -> SignalValues {
    let mut values = SignalValues::new();
    set(&mut values, "Counter", f64::from(counter));
    set(&mut values, "LKAS_Output", f64::from(torque));
    set_flag(&mut values, "LKAS_Request", torque != 0);
    set_flag(&mut values, "SET_1", true);
    values
}

/// Field values for a pass-through message of `kind`
pub fn pass_through(kind: PassThroughKind, inbound: &PassThroughMessage, ctx: &EchoContext) -> SignalValues {
    let mut values = inbound.signals.clone();
    set(&mut values, "Counter", f64::from(inbound.counter));

    let brake = ctx.longitudinal.brake;
    match kind {
        PassThroughKind::Distance => {
            if ctx.enabled {
                set(&mut values, "Cruise_Throttle", f64::from(ctx.longitudinal.throttle));
            }
            if ctx.cancel_requested {
                set_flag(&mut values, "Cruise_Cancel", true);
            }
            if brake.active {
                set_flag(&mut values, "Cruise_Brake_Active", true);
            }
        }
        PassThroughKind::Status => {
            if ctx.enabled {
                set_flag(&mut values, "Cruise_Activated", true);
                set(&mut values, "Cruise_RPM", f64::from(ctx.longitudinal.rpm));
            }
            if brake.active {
                set_flag(&mut values, "Brake_Lights", true);
            }
        }
        PassThroughKind::DashStatus => {
            set_flag(&mut values, "Car_Follow", ctx.hud.lead_visible);
        }
        PassThroughKind::LkasState => {
            if ctx.hud.visual_alert == VisualAlert::SteerRequired {
                set_flag(&mut values, "Keep_Hands_On_Wheel", true);
            }
            set_flag(&mut values, "LKAS_Left_Line_Visible", ctx.hud.left_lane_visible);
            set_flag(&mut values, "LKAS_Right_Line_Visible", ctx.hud.right_lane_visible);
        }
        PassThroughKind::Brake => {
            if ctx.enabled {
                set_flag(&mut values, "Cruise_Activated", true);
            }
            if brake.active {
                set(&mut values, "Brake_Pressure", f64::from(brake.pressure));
                set_flag(&mut values, "Cruise_Brake_Active", true);
                set_flag(&mut values, "Cruise_Brake_Lights", true);
            }
        }
        PassThroughKind::CruiseControl => {}
        PassThroughKind::BrakeStatus => {
            set_flag(&mut values, "ES_Brake", brake.active);
        }
    }

    values
}

fn set(values: &mut SignalValues, name: &str, value: f64) {
    values.insert(name.to_string(), value);
}

fn set_flag(values: &mut SignalValues, name: &str, on: bool) {
    set(values, name, if on { 1.0 } else { 0.0 });
}
