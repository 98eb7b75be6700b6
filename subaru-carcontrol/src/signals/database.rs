//! Message layout database
//!
//! Holds the bit layout of every message the controller can send, looked up
//! by name or CAN address.

use std::collections::HashMap;

/// A complete CAN message layout
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDefinition {
    /// CAN message ID
    pub address: u32,
    /// Message name
    pub name: String,
    /// Message size in bytes
    pub size: usize,
    /// Bus the message is sent on
    pub bus: u8,
    /// All signals in this message
    pub signals: Vec<SignalDefinition>,
}

impl MessageDefinition {
    pub fn new(address: u32, name: impl Into<String>, size: usize, bus: u8) -> Self {
        Self {
            address,
            name: name.into(),
            size,
            bus,
            signals: Vec::new(),
        }
    }

    /// Builder method: add a signal
    pub fn with_signal(mut self, signal: SignalDefinition) -> Self {
        self.signals.push(signal);
        self
    }

    /// Find a signal by name
    pub fn signal(&self, name: &str) -> Option<&SignalDefinition> {
        self.signals.iter().find(|s| s.name == name)
    }
}

/// A CAN signal layout
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDefinition {
    /// Signal name
    pub name: String,
    /// Start bit in the CAN frame
    pub start_bit: u16,
    /// Length in bits
    pub length: u16,
    /// Byte order
    pub byte_order: ByteOrder,
    /// Value type (signed/unsigned)
    pub value_type: ValueType,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Offset to add after scaling
    pub offset: f64,
}

impl SignalDefinition {
    /// Unsigned little-endian signal with unit scaling
    pub fn unsigned(name: impl Into<String>, start_bit: u16, length: u16) -> Self {
        Self {
            name: name.into(),
            start_bit,
            length,
            byte_order: ByteOrder::LittleEndian,
            value_type: ValueType::Unsigned,
            factor: 1.0,
            offset: 0.0,
        }
    }

    /// Signed little-endian signal with unit scaling
    pub fn signed(name: impl Into<String>, start_bit: u16, length: u16) -> Self {
        Self {
            value_type: ValueType::Signed,
            ..Self::unsigned(name, start_bit, length)
        }
    }

    /// Builder method: set physical scaling
    pub fn with_scaling(mut self, factor: f64, offset: f64) -> Self {
        self.factor = factor;
        self.offset = offset;
        self
    }

    /// Builder method: set the byte order
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Smallest and largest raw value the signal can hold
    pub fn raw_range(&self) -> (i64, i64) {
        let length = u32::from(self.length.clamp(1, 63));
        match self.value_type {
            ValueType::Unsigned => (0, (1i64 << length) - 1),
            ValueType::Signed => (-(1i64 << (length - 1)), (1i64 << (length - 1)) - 1),
        }
    }
}

/// Byte order for signal placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian (Intel format)
    LittleEndian,
    /// Big-endian (Motorola format)
    BigEndian,
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Signed integer
    Signed,
    /// Unsigned integer
    Unsigned,
}

/// All message layouts known to the packer
#[derive(Debug, Clone, Default)]
pub struct MessageDatabase {
    /// Key: message name, value: layout
    messages: HashMap<String, MessageDefinition>,
    /// Key: CAN address, value: message name
    address_lookup: HashMap<u32, String>,
}

impl MessageDatabase {
    /// Create a new empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message definition, replacing any with the same name
    pub fn add_message(&mut self, message: MessageDefinition) {
        self.address_lookup.insert(message.address, message.name.clone());
        self.messages.insert(message.name.clone(), message);
    }

    /// Get a message definition by name
    pub fn get_message(&self, name: &str) -> Option<&MessageDefinition> {
        self.messages.get(name)
    }

    /// Get a message definition by CAN address
    pub fn get_message_by_address(&self, address: u32) -> Option<&MessageDefinition> {
        self.address_lookup
            .get(&address)
            .and_then(|name| self.messages.get(name))
    }

    /// Get database statistics
    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            num_messages: self.messages.len(),
            num_signals: self.messages.values().map(|m| m.signals.len()).sum(),
        }
    }

    /// Get all CAN addresses in the database, sorted
    pub fn addresses(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.address_lookup.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Total number of message definitions
    pub num_messages: usize,
    /// Total number of signal definitions
    pub num_signals: usize,
}
