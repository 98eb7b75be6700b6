//! Outbound message cadence
//!
//! Two disciplines decide when a frame goes out:
//! - fixed divisor: the steering command, every `steer_step` cycles
//! - counter echo: each pass-through message, whenever the rolling counter of
//!   its inbound counterpart changes
//!
//! Echoing on counter change ties each outbound message to the rate the car
//! itself sends the original, independent of the control loop frequency.

use crate::types::{PassThroughKind, VehicleState};

/// True on cycles where the steering command is sent
pub fn steer_due(cycle: u64, steer_step: u32) -> bool {
    steer_step != 0 && cycle % u64::from(steer_step) == 0
}

/// Rolling counter carried by the steering frame
pub fn steer_counter(cycle: u64, steer_step: u32) -> u8 {
    let step = u64::from(steer_step.max(1));
    ((cycle / step) % 16) as u8
}

/// Sync state of one pass-through kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncState {
    /// No inbound message seen yet
    #[default]
    Unobserved,
    /// Counter of the last echoed inbound message
    Synced(u8),
}

/// Last-seen counter for every pass-through kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterTable {
    slots: [SyncState; PassThroughKind::COUNT],
}

impl CounterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of one kind
    pub fn state(&self, kind: PassThroughKind) -> SyncState {
        self.slots[kind.index()]
    }

    /// Record `counter` for `kind`, returning true if a frame is due
    pub fn observe(&mut self, kind: PassThroughKind, counter: u8) -> bool {
        let slot = &mut self.slots[kind.index()];
        if *slot == SyncState::Synced(counter) {
            return false;
        }
        *slot = SyncState::Synced(counter);
        true
    }

    /// Every kind whose inbound counter changed, in emission order
    ///
    /// Kinds with no inbound message in `vehicle` are skipped and keep their
    /// state.
    pub fn changed(&mut self, vehicle: &VehicleState) -> Vec<PassThroughKind> {
        PassThroughKind::ALL
            .into_iter()
            .filter(|&kind| match vehicle.message(kind) {
                Some(message) => self.observe(kind, message.counter),
                None => false,
            })
            .collect()
    }
}
