//! Main controller API
//!
//! `CarController` is the entry point of the library. It owns the limits, the
//! state carried between cycles and the frame encoder, and turns one cycle's
//! inputs into the ordered list of frames to send.

use crate::actuators::map_longitudinal;
use crate::cadence::{steer_counter, steer_due, CounterTable};
use crate::config::Limits;
use crate::limiter::limit_steer_torque;
use crate::message_encoder::{CanPacker, FrameEncoder};
use crate::messages::{self, EchoContext};
use crate::types::{ActuatorCommand, CycleInputs, MessageKind, OutboundFrame, Result, SignalValues};

/// State carried from one cycle to the next
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    /// Last steering torque sent, always within `[-steer_max, steer_max]`
    pub last_applied_steer: i32,
    /// Last-seen counter per pass-through kind
    pub counters: CounterTable,
    /// Whether the last steering update was rate limited (telemetry only)
    pub steer_rate_limited: bool,
}

/// The controller - turns actuator commands into CAN frames
pub struct CarController<E = CanPacker> {
    limits: Limits,
    state: ControllerState,
    encoder: E,
}

impl CarController<CanPacker> {
    /// Create a controller for the Subaru global platform
    ///
    /// # Example
    /// ```
    /// use subaru_carcontrol::{ActuatorCommand, CarController, CycleInputs, Limits, VehicleState};
    ///
    /// let mut controller = CarController::new(Limits::default()).unwrap();
    /// let vehicle = VehicleState::new();
    /// let frames = controller.update(&CycleInputs::new(true, 0, ActuatorCommand::new(1.0, 0.0, 0.0), &vehicle));
    /// assert_eq!(frames.len(), 1);
    /// ```
    pub fn new(limits: Limits) -> Result<Self> {
        Self::with_encoder(limits, CanPacker::subaru_global())
    }
}

impl<E: FrameEncoder> CarController<E> {
    /// Create a controller that encodes frames with `encoder`
    pub fn with_encoder(limits: Limits, encoder: E) -> Result<Self> {
        limits.validate()?;
        log::info!(
            "Car controller ready: steer max {} step {} up/down {}/{}",
            limits.steer_max,
            limits.steer_step,
            limits.steer_delta_up,
            limits.steer_delta_down
        );
        log::debug!("Limits: {:?}", limits);

        Ok(Self {
            limits,
            state: ControllerState::default(),
            encoder,
        })
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Run one control cycle
    ///
    /// Frames come out in a fixed order: steering (on steer cycles), then the
    /// pass-through messages whose inbound counter changed. The list is empty
    /// when nothing is due.
    pub fn update(&mut self, inputs: &CycleInputs<'_>) -> Vec<OutboundFrame> {
        let mut frames = Vec::new();

        if steer_due(inputs.cycle, self.limits.steer_step) {
            let torque = self.update_steer(inputs.enabled, &inputs.actuators, inputs.vehicle.steering_torque);
            let counter = steer_counter(inputs.cycle, self.limits.steer_step);
            frames.push(self.encode(MessageKind::EsLkas, &messages::steering_control(torque, counter)));
        }

        let longitudinal =
            map_longitudinal(inputs.enabled, &inputs.actuators, &inputs.vehicle.brake_assist, &self.limits);
        let ctx = EchoContext {
            enabled: inputs.enabled,
            cancel_requested: inputs.cancel_requested,
            hud: inputs.hud,
            longitudinal,
        };

        for kind in self.state.counters.changed(inputs.vehicle) {
            // changed() only reports kinds with an inbound message
            if let Some(inbound) = inputs.vehicle.message(kind) {
                let values = messages::pass_through(kind, inbound, &ctx);
                frames.push(self.encode(kind.message(), &values));
            }
        }

        frames
    }

    /// Rate limit the steering request and store it as the applied torque
    fn update_steer(&mut self, enabled: bool, actuators: &ActuatorCommand, driver_torque: i32) -> i32 {
        let desired = if enabled {
            desired_torque(actuators.steer, self.limits.steer_max)
        } else {
            0
        };

        let limit = limit_steer_torque(desired, self.state.last_applied_steer, driver_torque, &self.limits);
        if limit.limited {
            log::debug!(
                "Steer rate limited: wanted {}, applying {} (last {}, driver {})",
                desired,
                limit.torque,
                self.state.last_applied_steer,
                driver_torque
            );
        }
        self.state.steer_rate_limited = limit.limited;

        let torque = if enabled { limit.torque } else { 0 };
        self.state.last_applied_steer = torque;
        torque
    }

    fn encode(&self, message: MessageKind, values: &SignalValues) -> OutboundFrame {
        let frame = self.encoder.encode(message, values);
        log::trace!("{} -> {}", message, frame);
        frame
    }
}

/// Normalized steer request to integer torque
fn desired_torque(steer: f32, steer_max: i32) -> i32 {
    if !steer.is_finite() {
        return 0;
    }
    let steer = f64::from(steer).clamp(-1.0, 1.0);
    (steer * f64::from(steer_max)).round() as i32
}
