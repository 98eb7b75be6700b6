//! Scenario replay
//!
//! Expands the scenario's cycle list and feeds each cycle through a
//! `CarController`, collecting the frames it emits.

use crate::config::{CycleConfig, ScenarioConfig};
use anyhow::{Context, Result};
use subaru_carcontrol::{CarController, CycleInputs, OutboundFrame, PassThroughKind, VehicleState};

/// Frames emitted in one cycle, with the steering state after it
#[derive(Debug, Clone, PartialEq)]
pub struct CycleRecord {
    pub cycle: u64,
    pub enabled: bool,
    pub applied_steer: i32,
    pub steer_rate_limited: bool,
    pub frames: Vec<OutboundFrame>,
}

/// Run every cycle of `scenario`, stopping after `max_cycles` if given
pub fn run(scenario: &ScenarioConfig, max_cycles: Option<u64>) -> Result<Vec<CycleRecord>> {
    let mut controller =
        CarController::new(scenario.limits.clone()).context("Failed to create controller")?;
    let mut vehicle = VehicleState::new();
    let mut records = Vec::new();
    let mut cycle: u64 = 0;

    for entry in &scenario.cycles {
        apply_entry(&mut vehicle, entry);

        for repetition in 0..entry.repeat {
            if max_cycles.is_some_and(|max| cycle >= max) {
                log::info!("Stopping after {} cycles", cycle);
                return Ok(records);
            }

            if repetition > 0 && entry.advance_counters {
                advance_counters(&mut vehicle);
            }

            let inputs = CycleInputs::new(entry.enabled, cycle, entry.actuators(), &vehicle)
                .with_cancel(entry.cancel)
                .with_hud(entry.hud);
            let frames = controller.update(&inputs);
            log::debug!("Cycle {}: {} frame(s)", cycle, frames.len());

            records.push(CycleRecord {
                cycle,
                enabled: entry.enabled,
                applied_steer: controller.state().last_applied_steer,
                steer_rate_limited: controller.state().steer_rate_limited,
                frames,
            });
            cycle += 1;
        }
    }

    Ok(records)
}

/// Fold one scenario entry into the running vehicle state
fn apply_entry(vehicle: &mut VehicleState, entry: &CycleConfig) {
    vehicle.steering_torque = entry.driver_torque;
    vehicle.brake_assist = entry.brake_assist;
    for (&kind, message) in &entry.messages {
        vehicle.set_message(kind, message.clone());
    }
}

/// Step every known inbound counter, wrapping like the 4-bit bus counter
fn advance_counters(vehicle: &mut VehicleState) {
    for kind in PassThroughKind::ALL {
        if let Some(message) = vehicle.message(kind) {
            let mut next = message.clone();
            next.counter = next.counter.wrapping_add(1) % 16;
            vehicle.set_message(kind, next);
        }
    }
}
