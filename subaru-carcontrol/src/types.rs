//! Core types for the car control library
//!
//! This module defines the per-cycle inputs the controller consumes (actuator
//! commands, vehicle state, HUD indicators) and the frames it emits. The
//! controller itself holds no references to these; every cycle receives a
//! fresh snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Named physical signal values for one message.
///
/// A `BTreeMap` keeps iteration order stable so that encoding is
/// deterministic across runs.
pub type SignalValues = BTreeMap<String, f64>;

/// Errors raised while building controller configuration
///
/// The control path itself never fails; only invalid limits are rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid limit '{name}': {reason}")]
    InvalidLimit { name: &'static str, reason: String },

    #[error("Invalid range '{name}': min {min} is greater than max {max}")]
    InvalidRange { name: &'static str, min: i32, max: i32 },

    #[error("Message layout not found: {0}")]
    MissingMessage(&'static str),
}

/// Normalized actuator outputs from the planner
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    /// Steering request in [-1, 1]
    #[serde(default)]
    pub steer: f32,
    /// Gas request in [0, 1]
    #[serde(default)]
    pub gas: f32,
    /// Brake request in [0, 1]
    #[serde(default)]
    pub brake: f32,
}

impl ActuatorCommand {
    pub fn new(steer: f32, gas: f32, brake: f32) -> Self {
        Self { steer, gas, brake }
    }
}

/// Outbound messages that echo an inbound counterpart
///
/// The declaration order is the order frames are emitted within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassThroughKind {
    Distance,
    Status,
    DashStatus,
    LkasState,
    Brake,
    CruiseControl,
    BrakeStatus,
}

impl PassThroughKind {
    /// Number of pass-through kinds
    pub const COUNT: usize = 7;

    /// All kinds in emission order
    pub const ALL: [PassThroughKind; Self::COUNT] = [
        PassThroughKind::Distance,
        PassThroughKind::Status,
        PassThroughKind::DashStatus,
        PassThroughKind::LkasState,
        PassThroughKind::Brake,
        PassThroughKind::CruiseControl,
        PassThroughKind::BrakeStatus,
    ];

    /// Slot of this kind in fixed-size tables
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Outbound message this kind is encoded as
    pub const fn message(self) -> MessageKind {
        match self {
            PassThroughKind::Distance => MessageKind::EsDistance,
            PassThroughKind::Status => MessageKind::EsStatus,
            PassThroughKind::DashStatus => MessageKind::EsDashStatus,
            PassThroughKind::LkasState => MessageKind::EsLkasState,
            PassThroughKind::Brake => MessageKind::EsBrake,
            PassThroughKind::CruiseControl => MessageKind::CruiseControl,
            PassThroughKind::BrakeStatus => MessageKind::BrakeStatus,
        }
    }
}

impl fmt::Display for PassThroughKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.message(), f)
    }
}

/// Every message type the controller can ask the encoder for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    EsLkas,
    EsDistance,
    EsStatus,
    EsDashStatus,
    EsLkasState,
    EsBrake,
    CruiseControl,
    BrakeStatus,
}

impl MessageKind {
    /// Number of message kinds
    pub const COUNT: usize = 8;

    /// All message kinds
    pub const ALL: [MessageKind; Self::COUNT] = [
        MessageKind::EsLkas,
        MessageKind::EsDistance,
        MessageKind::EsStatus,
        MessageKind::EsDashStatus,
        MessageKind::EsLkasState,
        MessageKind::EsBrake,
        MessageKind::CruiseControl,
        MessageKind::BrakeStatus,
    ];

    /// Slot of this kind in fixed-size tables
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Message name as it appears in the platform's layout table
    pub const fn name(self) -> &'static str {
        match self {
            MessageKind::EsLkas => "ES_LKAS",
            MessageKind::EsDistance => "ES_Distance",
            MessageKind::EsStatus => "ES_Status",
            MessageKind::EsDashStatus => "ES_DashStatus",
            MessageKind::EsLkasState => "ES_LKAS_State",
            MessageKind::EsBrake => "ES_Brake",
            MessageKind::CruiseControl => "CruiseControl",
            MessageKind::BrakeStatus => "Brake_Status",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Last-known inbound message of a pass-through kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassThroughMessage {
    /// Rolling counter from the source bus
    pub counter: u8,
    /// Decoded signal values, echoed back out with overrides applied
    #[serde(default)]
    pub signals: SignalValues,
}

impl PassThroughMessage {
    pub fn new(counter: u8) -> Self {
        Self {
            counter,
            signals: SignalValues::new(),
        }
    }

    /// Builder method: set a signal value
    pub fn with_signal(mut self, name: impl Into<String>, value: f64) -> Self {
        self.signals.insert(name.into(), value);
        self
    }
}

/// Brake pressure requested by the car's own eyesight system
///
/// When active this takes priority over whatever the planner commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrakeAssist {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub pressure: i32,
}

/// Vehicle telemetry snapshot for one control cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleState {
    /// Measured driver torque on the steering column
    pub steering_torque: i32,
    /// Brake-assist passthrough reported by the vehicle
    pub brake_assist: BrakeAssist,
    messages: [Option<PassThroughMessage>; PassThroughKind::COUNT],
}

impl VehicleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the driver steering torque
    pub fn with_steering_torque(mut self, torque: i32) -> Self {
        self.steering_torque = torque;
        self
    }

    /// Builder method: set the brake-assist passthrough
    pub fn with_brake_assist(mut self, active: bool, pressure: i32) -> Self {
        self.brake_assist = BrakeAssist { active, pressure };
        self
    }

    /// Builder method: record the latest inbound message of a kind
    pub fn with_message(mut self, kind: PassThroughKind, message: PassThroughMessage) -> Self {
        self.set_message(kind, message);
        self
    }

    pub fn set_message(&mut self, kind: PassThroughKind, message: PassThroughMessage) {
        self.messages[kind.index()] = Some(message);
    }

    /// Latest inbound message of a kind, if one was ever received
    pub fn message(&self, kind: PassThroughKind) -> Option<&PassThroughMessage> {
        self.messages[kind.index()].as_ref()
    }
}

/// Instrument-cluster alert requested by the planner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualAlert {
    #[default]
    None,
    SteerRequired,
    Other,
}

/// HUD flags passed straight through to the message builders
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudIndicators {
    #[serde(default)]
    pub visual_alert: VisualAlert,
    #[serde(default)]
    pub left_lane_visible: bool,
    #[serde(default)]
    pub right_lane_visible: bool,
    #[serde(default)]
    pub lead_visible: bool,
}

/// Everything the controller consumes in one cycle
#[derive(Debug, Clone, Copy)]
pub struct CycleInputs<'a> {
    pub enabled: bool,
    pub cycle: u64,
    pub actuators: ActuatorCommand,
    pub vehicle: &'a VehicleState,
    pub cancel_requested: bool,
    pub hud: HudIndicators,
}

impl<'a> CycleInputs<'a> {
    /// Inputs with no cancel request and default HUD state
    pub fn new(enabled: bool, cycle: u64, actuators: ActuatorCommand, vehicle: &'a VehicleState) -> Self {
        Self {
            enabled,
            cycle,
            actuators,
            vehicle,
            cancel_requested: false,
            hud: HudIndicators::default(),
        }
    }

    /// Builder method: request a cruise cancel
    pub fn with_cancel(mut self, cancel_requested: bool) -> Self {
        self.cancel_requested = cancel_requested;
        self
    }

    /// Builder method: set HUD indicators
    pub fn with_hud(mut self, hud: HudIndicators) -> Self {
        self.hud = hud;
        self
    }
}

/// Encoded CAN frame ready for the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    /// CAN message ID (11-bit)
    pub address: u32,
    /// Bus the frame is sent on
    pub bus: u8,
    /// Frame data bytes
    pub data: Vec<u8>,
}

impl OutboundFrame {
    /// Get the data length code (DLC) - number of data bytes
    pub fn dlc(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Display for OutboundFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bus {} 0x{:03X} [{}]", self.bus, self.address, self.dlc())?;
        for byte in &self.data {
            write!(f, " {:02X}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_through_order_matches_index() {
        for (i, kind) in PassThroughKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_vehicle_state_messages() {
        let state = VehicleState::new()
            .with_steering_torque(-12)
            .with_message(
                PassThroughKind::Brake,
                PassThroughMessage::new(3).with_signal("Brake_Pressure", 40.0),
            );

        assert_eq!(state.steering_torque, -12);
        assert!(state.message(PassThroughKind::Distance).is_none());
        let brake = state.message(PassThroughKind::Brake).unwrap();
        assert_eq!(brake.counter, 3);
        assert_eq!(brake.signals["Brake_Pressure"], 40.0);
    }

    #[test]
    fn test_frame_display() {
        let frame = OutboundFrame {
            address: 0x122,
            bus: 0,
            data: vec![0xAB, 0x01],
        };
        assert_eq!(format!("{}", frame), "bus 0 0x122 [2] AB 01");
        assert_eq!(format!("{}", PassThroughKind::LkasState), "ES_LKAS_State");
    }
}
