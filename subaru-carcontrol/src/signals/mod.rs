//! Message layouts
//!
//! This module contains the layout database and the compiled-in layout table
//! for the supported platform.

pub mod database;
pub mod subaru;

// Re-export key types for convenience
pub use database::{
    ByteOrder, DatabaseStats, MessageDatabase, MessageDefinition, SignalDefinition, ValueType,
};
