//! Subaru Car Control Library
//!
//! Turns normalized actuator commands (steer, gas, brake) and vehicle state
//! into the CAN frames sent to a Subaru global-platform car each control
//! cycle.
//!
//! # Architecture
//!
//! Leaves first:
//! - `limiter` bounds the change in steering torque per update, tightening
//!   the bound while the driver resists
//! - `actuators` maps gas/brake onto throttle, rpm and brake pressure ranges
//! - `cadence` decides which frames are due: steering on a fixed divisor,
//!   pass-through messages whenever their inbound counter changes
//! - `controller` runs one cycle and hands field values to a `FrameEncoder`
//!
//! The library does NOT:
//! - Estimate vehicle state or plan trajectories
//! - Parse DBC files or fingerprint vehicles
//! - Talk to the bus hardware
//!
//! Every call is pure computation over in-memory state. Given the same inputs
//! and controller state, a cycle produces the same frames.
//!
//! # Example Usage
//!
//! ```
//! use subaru_carcontrol::{
//!     ActuatorCommand, CarController, CycleInputs, Limits, PassThroughKind,
//!     PassThroughMessage, VehicleState,
//! };
//!
//! let mut controller = CarController::new(Limits::default()).unwrap();
//!
//! let vehicle = VehicleState::new()
//!     .with_steering_torque(12)
//!     .with_message(PassThroughKind::Distance, PassThroughMessage::new(5));
//!
//! for cycle in 0..4 {
//!     let inputs = CycleInputs::new(true, cycle, ActuatorCommand::new(0.2, 0.1, 0.0), &vehicle);
//!     for frame in controller.update(&inputs) {
//!         println!("{}", frame);
//!     }
//! }
//! ```

// Public modules
pub mod actuators;
pub mod cadence;
pub mod config;
pub mod controller;
pub mod limiter;
pub mod message_encoder;
pub mod messages;
pub mod signals;
pub mod types;

// Re-export main types for convenience
pub use actuators::{BrakeCommand, LongitudinalCommand};
pub use cadence::{CounterTable, SyncState};
pub use config::Limits;
pub use controller::{CarController, ControllerState};
pub use limiter::{apply_steer_torque_limits, RateLimit};
pub use message_encoder::{CanPacker, FrameEncoder};
pub use signals::DatabaseStats;
pub use types::{
    ActuatorCommand, BrakeAssist, ConfigError, CycleInputs, HudIndicators, MessageKind,
    OutboundFrame, PassThroughKind, PassThroughMessage, Result, SignalValues, VehicleState,
    VisualAlert,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: a default controller starts centered and unsynced
        let controller = CarController::new(Limits::default()).unwrap();
        assert_eq!(controller.state().last_applied_steer, 0);
        assert_eq!(
            controller.state().counters.state(PassThroughKind::Distance),
            SyncState::Unobserved
        );
    }
}
