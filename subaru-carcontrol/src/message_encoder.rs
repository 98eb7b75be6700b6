//! Message Encoding Engine
//!
//! Packs physical signal values into raw CAN frames based on the layouts in
//! the message database. Handles bit placement, endianness, raw range
//! saturation and the platform checksum.

use crate::signals::database::{ByteOrder, MessageDatabase, MessageDefinition, SignalDefinition, ValueType};
use crate::signals::subaru;
use crate::types::{ConfigError, MessageKind, OutboundFrame, Result, SignalValues};

/// Turns a message type plus field values into a frame
///
/// Implementations must be total: every `MessageKind` encodes to a frame.
pub trait FrameEncoder {
    fn encode(&self, message: MessageKind, values: &SignalValues) -> OutboundFrame;
}

/// Frame encoder backed by a message layout database
///
/// Both byte orders are packed. The compiled-in Subaru layouts are all
/// little-endian; Motorola signals come from databases passed to `new`.
#[derive(Debug, Clone)]
pub struct CanPacker {
    /// Layout of every `MessageKind`, indexed by `MessageKind::index`
    layouts: [MessageDefinition; MessageKind::COUNT],
}

impl CanPacker {
    /// Create a packer, resolving a layout for every message kind
    pub fn new(db: &MessageDatabase) -> Result<Self> {
        if let Some(kind) = MessageKind::ALL.into_iter().find(|kind| db.get_message(kind.name()).is_none()) {
            return Err(ConfigError::MissingMessage(kind.name()));
        }

        // every kind is present, checked above
        let layouts = MessageKind::ALL
            .map(|kind| db.get_message(kind.name()).cloned().unwrap_or_else(|| subaru::layout(kind)));
        Ok(Self { layouts })
    }

    /// Packer for the Subaru global platform
    pub fn subaru_global() -> Self {
        Self {
            layouts: MessageKind::ALL.map(subaru::layout),
        }
    }

    /// Layout used for a message kind
    pub fn layout(&self, message: MessageKind) -> &MessageDefinition {
        &self.layouts[message.index()]
    }

    /// Decode a frame of the given kind back into physical values
    ///
    /// Returns `None` when the data is shorter than the layout.
    pub fn unpack(&self, message: MessageKind, data: &[u8]) -> Option<SignalValues> {
        let layout = self.layout(message);
        if data.len() < layout.size {
            log::warn!(
                "{} requires {} bytes but frame only has {} bytes",
                layout.name,
                layout.size,
                data.len()
            );
            return None;
        }

        Some(
            layout
                .signals
                .iter()
                .map(|signal| {
                    let raw = Self::extract_signal_value(data, signal);
                    (signal.name.clone(), signal.offset + signal.factor * raw as f64)
                })
                .collect(),
        )
    }

    /// Pack values into the data bytes of `layout`
    ///
    /// Values without a matching signal are ignored; signals without a value
    /// are left zero.
    fn pack(layout: &MessageDefinition, values: &SignalValues) -> Vec<u8> {
        let mut data = vec![0u8; layout.size];

        for (name, &value) in values {
            match layout.signal(name) {
                Some(signal) => Self::insert_signal_value(&mut data, signal, value),
                None => log::trace!("{} has no signal '{}', ignoring", layout.name, name),
            }
        }

        if let Some(checksum) = layout.signal("Checksum") {
            let sum = Self::subaru_checksum(layout.address, &data);
            Self::insert_signal_value(&mut data, checksum, f64::from(sum));
        }

        data
    }

    /// Convert a physical value to raw and write it into the frame
    fn insert_signal_value(data: &mut [u8], signal: &SignalDefinition, value: f64) {
        if !value.is_finite() || signal.factor == 0.0 {
            log::trace!("Skipping non-encodable value {} for '{}'", value, signal.name);
            return;
        }

        let (min, max) = signal.raw_range();
        // `as` saturates on overflow, then clamp to what the signal can hold
        let raw = (((value - signal.offset) / signal.factor).round() as i64).clamp(min, max);
        let length = usize::from(signal.length);
        let bits = (raw as u64) & Self::mask(length);

        let start_bit = usize::from(signal.start_bit);
        match signal.byte_order {
            ByteOrder::LittleEndian => Self::insert_little_endian(data, start_bit, length, bits),
            ByteOrder::BigEndian => Self::insert_big_endian(data, start_bit, length, bits),
        }
    }

    /// Extract raw signal value from frame data, sign-extended if needed
    fn extract_signal_value(data: &[u8], signal: &SignalDefinition) -> i64 {
        let start_bit = usize::from(signal.start_bit);
        let length = usize::from(signal.length);

        let raw_value = match signal.byte_order {
            ByteOrder::LittleEndian => Self::extract_little_endian(data, start_bit, length),
            ByteOrder::BigEndian => Self::extract_big_endian(data, start_bit, length),
        };

        match signal.value_type {
            ValueType::Unsigned => raw_value as i64,
            ValueType::Signed => Self::sign_extend(raw_value, length),
        }
    }

    fn mask(length: usize) -> u64 {
        if length >= 64 {
            u64::MAX
        } else {
            (1u64 << length) - 1
        }
    }

    /// Write bits in little-endian (Intel) order
    ///
    /// Start bit is the LSB; bits count upward through the frame.
    fn insert_little_endian(data: &mut [u8], start_bit: usize, length: usize, bits: u64) {
        for i in 0..length {
            let bit_pos = start_bit + i;
            let byte_idx = bit_pos / 8;
            let bit_in_byte = bit_pos % 8;

            if byte_idx < data.len() {
                let bit_value = ((bits >> i) & 0x01) as u8;
                data[byte_idx] = (data[byte_idx] & !(1 << bit_in_byte)) | (bit_value << bit_in_byte);
            }
        }
    }

    /// Write bits in big-endian (Motorola) order
    ///
    /// Start bit is the MSB; bit 0 is the MSB of byte 0.
    fn insert_big_endian(data: &mut [u8], start_bit: usize, length: usize, bits: u64) {
        for i in 0..length {
            let bit_pos = start_bit + i;
            let byte_idx = bit_pos / 8;
            let bit_in_byte = 7 - (bit_pos % 8);

            if byte_idx < data.len() {
                let bit_value = ((bits >> (length - 1 - i)) & 0x01) as u8;
                data[byte_idx] = (data[byte_idx] & !(1 << bit_in_byte)) | (bit_value << bit_in_byte);
            }
        }
    }

    fn extract_little_endian(data: &[u8], start_bit: usize, length: usize) -> u64 {
        let mut result: u64 = 0;

        for i in 0..length {
            let bit_pos = start_bit + i;
            let byte_idx = bit_pos / 8;
            let bit_in_byte = bit_pos % 8;

            if byte_idx < data.len() {
                let bit_value = (data[byte_idx] >> bit_in_byte) & 0x01;
                result |= (bit_value as u64) << i;
            }
        }

        result
    }

    fn extract_big_endian(data: &[u8], start_bit: usize, length: usize) -> u64 {
        let mut result: u64 = 0;

        for i in 0..length {
            let bit_pos = start_bit + i;
            let byte_idx = bit_pos / 8;
            let bit_in_byte = 7 - (bit_pos % 8);

            if byte_idx < data.len() {
                let bit_value = (data[byte_idx] >> bit_in_byte) & 0x01;
                result |= (bit_value as u64) << (length - 1 - i);
            }
        }

        result
    }

    /// Sign-extend a value from N bits to 64 bits
    fn sign_extend(value: u64, bit_length: usize) -> i64 {
        if bit_length == 0 || bit_length >= 64 {
            return value as i64;
        }

        let sign_bit = 1u64 << (bit_length - 1);
        if (value & sign_bit) != 0 {
            let mask = !0u64 << bit_length;
            (value | mask) as i64
        } else {
            value as i64
        }
    }

    /// Subaru checksum: address bytes plus data bytes 1.., modulo 256
    fn subaru_checksum(address: u32, data: &[u8]) -> u8 {
        let address_sum = address.to_le_bytes().iter().map(|&b| u32::from(b)).sum::<u32>();
        let data_sum = data.iter().skip(1).map(|&b| u32::from(b)).sum::<u32>();
        ((address_sum + data_sum) & 0xFF) as u8
    }
}

impl Default for CanPacker {
    fn default() -> Self {
        Self::subaru_global()
    }
}

impl FrameEncoder for CanPacker {
    fn encode(&self, message: MessageKind, values: &SignalValues) -> OutboundFrame {
        let layout = self.layout(message);
        let frame = OutboundFrame {
            address: layout.address,
            bus: layout.bus,
            data: Self::pack(layout, values),
        };
        log::trace!("Packed {}: {}", layout.name, frame);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, f64)]) -> SignalValues {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_insert_little_endian_cross_byte() {
        let mut data = vec![0u8; 4];
        CanPacker::insert_little_endian(&mut data, 4, 12, 0xABC);
        assert_eq!(data, vec![0xC0, 0xAB, 0x00, 0x00]);
    }

    #[test]
    fn test_insert_preserves_neighbours() {
        let mut data = vec![0xFF; 2];
        CanPacker::insert_little_endian(&mut data, 4, 4, 0x0);
        assert_eq!(data, vec![0x0F, 0xFF]);
    }

    #[test]
    fn test_insert_big_endian_simple() {
        let mut data = vec![0u8; 2];
        CanPacker::insert_big_endian(&mut data, 0, 8, 0xAB);
        assert_eq!(data, vec![0xAB, 0x00]);
        assert_eq!(CanPacker::extract_big_endian(&data, 0, 8), 0xAB);
    }

    #[test]
    fn test_sign_extend_negative() {
        assert_eq!(CanPacker::sign_extend(0x1FFF, 13), -1);
        assert_eq!(CanPacker::sign_extend(0x0FFF, 13), 4095);
    }

    #[test]
    fn test_checksum() {
        // 0x122 -> 0x22 + 0x01, plus bytes 1..
        let data = [0x00, 0x05, 0x10, 0x00];
        assert_eq!(CanPacker::subaru_checksum(0x122, &data), 0x23 + 0x15);

        let data = [0x00, 0xFF, 0xFF];
        assert_eq!(CanPacker::subaru_checksum(0x122, &data), ((0x23 + 0x1FE) & 0xFF) as u8);
    }

    #[test]
    fn test_encode_steering_frame() {
        let packer = CanPacker::subaru_global();
        let frame = packer.encode(
            MessageKind::EsLkas,
            &values(&[("Counter", 3.0), ("LKAS_Output", -50.0), ("LKAS_Request", 1.0), ("SET_1", 1.0)]),
        );

        assert_eq!(frame.address, 0x122);
        assert_eq!(frame.bus, 0);
        assert_eq!(frame.dlc(), 8);
        // Counter 3 in the low nibble, SET_1 at bit 12
        assert_eq!(frame.data[1], 0x13);
        // -50 as 13-bit two's complement = 0x1FCE, request bit at 29
        assert_eq!(frame.data[2], 0xCE);
        assert_eq!(frame.data[3], 0x1F | 0x20);
        assert_eq!(frame.data[0], CanPacker::subaru_checksum(0x122, &frame.data));

        let decoded = packer.unpack(MessageKind::EsLkas, &frame.data).unwrap();
        assert_eq!(decoded["LKAS_Output"], -50.0);
        assert_eq!(decoded["Counter"], 3.0);
    }

    #[test]
    fn test_encode_saturates_out_of_range() {
        let packer = CanPacker::subaru_global();
        let frame = packer.encode(
            MessageKind::EsDistance,
            &values(&[("Cruise_Throttle", 99999.0), ("Cruise_Cancel", -3.0)]),
        );
        let decoded = packer.unpack(MessageKind::EsDistance, &frame.data).unwrap();
        assert_eq!(decoded["Cruise_Throttle"], 4095.0);
        assert_eq!(decoded["Cruise_Cancel"], 0.0);
    }

    #[test]
    fn test_unknown_and_non_finite_values_ignored() {
        let packer = CanPacker::subaru_global();
        let frame = packer.encode(
            MessageKind::CruiseControl,
            &values(&[("NotASignal", 1.0), ("Cruise_On", f64::NAN)]),
        );
        let decoded = packer.unpack(MessageKind::CruiseControl, &frame.data).unwrap();
        assert_eq!(decoded["Cruise_On"], 0.0);
    }

    #[test]
    fn test_scaled_signal() {
        let mut db = subaru::global_platform();
        db.add_message(
            MessageDefinition::new(0x122, "ES_LKAS", 8, 0)
                .with_signal(SignalDefinition::unsigned("Counter", 8, 4))
                .with_signal(SignalDefinition::unsigned("LKAS_Output", 16, 16).with_scaling(0.5, -100.0)),
        );
        let packer = CanPacker::new(&db).unwrap();
        let frame = packer.encode(MessageKind::EsLkas, &values(&[("LKAS_Output", 0.0)]));
        // (0 - -100) / 0.5 = 200
        assert_eq!(frame.data[2], 200);
        assert_eq!(packer.unpack(MessageKind::EsLkas, &frame.data).unwrap()["LKAS_Output"], 0.0);
    }

    #[test]
    fn test_subaru_global_covers_all_kinds() {
        let packer = CanPacker::subaru_global();
        for kind in MessageKind::ALL {
            assert_eq!(packer.layout(kind).name, kind.name());
        }
    }

    #[test]
    fn test_big_endian_layout_from_database() {
        let mut db = subaru::global_platform();
        db.add_message(
            MessageDefinition::new(0x221, "ES_Distance", 8, 0).with_signal(
                SignalDefinition::unsigned("Cruise_Throttle", 4, 12).with_byte_order(ByteOrder::BigEndian),
            ),
        );
        let packer = CanPacker::new(&db).unwrap();
        assert_eq!(packer.layout(MessageKind::EsDistance).signals.len(), 1);

        let frame = packer.encode(MessageKind::EsDistance, &values(&[("Cruise_Throttle", 2310.0)]));
        // 2310 = 0x906, MSB first from bit 4
        assert_eq!(&frame.data[..2], &[0x09, 0x06]);
        assert_eq!(packer.unpack(MessageKind::EsDistance, &frame.data).unwrap()["Cruise_Throttle"], 2310.0);
    }

    #[test]
    fn test_layouts_follow_kind_order() {
        let mut db = MessageDatabase::new();
        for kind in MessageKind::ALL.into_iter().filter(|k| *k != MessageKind::EsBrake) {
            db.add_message(subaru::layout(kind));
        }
        assert_eq!(CanPacker::new(&db).unwrap_err(), ConfigError::MissingMessage("ES_Brake"));

        db.add_message(subaru::layout(MessageKind::EsBrake));
        let packer = CanPacker::new(&db).unwrap();
        for kind in MessageKind::ALL {
            assert_eq!(packer.layout(kind).address, subaru::layout(kind).address);
        }
    }

    #[test]
    fn test_missing_layout_rejected() {
        let db = MessageDatabase::new();
        let err = CanPacker::new(&db).unwrap_err();
        assert_eq!(err, ConfigError::MissingMessage("ES_LKAS"));
    }

    #[test]
    fn test_short_frame_not_unpacked() {
        let packer = CanPacker::subaru_global();
        assert!(packer.unpack(MessageKind::EsBrake, &[0u8; 4]).is_none());
    }
}
