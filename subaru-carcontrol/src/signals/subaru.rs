//! Subaru global platform message layouts
//!
//! Only the messages the controller sends are listed. Eyesight ("ES_*")
//! messages are forwarded onto the powertrain bus (0); `CruiseControl` and
//! `Brake_Status` go to the camera side (2).

use crate::signals::database::{MessageDatabase, MessageDefinition, SignalDefinition};
use crate::types::MessageKind;

/// Bus facing the powertrain
pub const BUS_PT: u8 = 0;
/// Bus facing the eyesight camera
pub const BUS_CAMERA: u8 = 2;

pub const ES_LKAS: u32 = 0x122;
pub const ES_BRAKE: u32 = 0x220;
pub const ES_DISTANCE: u32 = 0x221;
pub const ES_STATUS: u32 = 0x222;
pub const ES_DASH_STATUS: u32 = 0x321;
pub const ES_LKAS_STATE: u32 = 0x322;
pub const CRUISE_CONTROL: u32 = 0x240;
pub const BRAKE_STATUS: u32 = 0x13C;

fn u(name: &str, start_bit: u16, length: u16) -> SignalDefinition {
    SignalDefinition::unsigned(name, start_bit, length)
}

/// Checksum in byte 0, counter in the low nibble of byte 1
fn header(address: u32, name: &str, bus: u8) -> MessageDefinition {
    MessageDefinition::new(address, name, 8, bus)
        .with_signal(u("Checksum", 0, 8))
        .with_signal(u("Counter", 8, 4))
}

/// Layout of one outbound message on the global platform
pub fn layout(kind: MessageKind) -> MessageDefinition {
    match kind {
        MessageKind::EsLkas => {
            header(ES_LKAS, "ES_LKAS", BUS_PT)
                .with_signal(u("SET_1", 12, 1))
                .with_signal(SignalDefinition::signed("LKAS_Output", 16, 13))
                .with_signal(u("LKAS_Request", 29, 1))
        }
        MessageKind::EsBrake => {
            header(ES_BRAKE, "ES_Brake", BUS_PT)
                .with_signal(u("Signal1", 12, 4))
                .with_signal(u("Brake_Pressure", 16, 16))
                .with_signal(u("Signal2", 32, 4))
                .with_signal(u("Cruise_Brake_Lights", 36, 1))
                .with_signal(u("Cruise_Brake_Fault", 37, 1))
                .with_signal(u("Cruise_Brake_Active", 38, 1))
                .with_signal(u("Cruise_Activated", 39, 1))
                .with_signal(u("Signal3", 40, 24))
        }
        MessageKind::EsDistance => {
            header(ES_DISTANCE, "ES_Distance", BUS_PT)
                .with_signal(u("Signal1", 12, 3))
                .with_signal(u("Cruise_Fault", 15, 1))
                .with_signal(u("Cruise_Throttle", 16, 12))
                .with_signal(u("Signal2", 28, 4))
                .with_signal(u("Car_Follow", 32, 1))
                .with_signal(u("Signal3", 33, 2))
                .with_signal(u("Cruise_Brake_Active", 35, 1))
                .with_signal(u("Distance_Swap", 36, 1))
                .with_signal(u("Cruise_EPB", 37, 1))
                .with_signal(u("Signal4", 38, 2))
                .with_signal(u("Close_Distance", 40, 8))
                .with_signal(u("Signal5", 48, 8))
                .with_signal(u("Cruise_Cancel", 56, 1))
                .with_signal(u("Cruise_Set", 57, 1))
                .with_signal(u("Cruise_Resume", 58, 1))
                .with_signal(u("Signal6", 59, 5))
        }
        MessageKind::EsStatus => {
            header(ES_STATUS, "ES_Status", BUS_PT)
                .with_signal(u("Signal1", 12, 4))
                .with_signal(u("Cruise_Fault", 16, 1))
                .with_signal(u("Cruise_RPM", 17, 13))
                .with_signal(u("Cruise_Activated", 30, 1))
                .with_signal(u("Brake_Lights", 31, 1))
                .with_signal(u("Cruise_Hold", 32, 1))
                .with_signal(u("Signal3", 33, 31))
        }
        MessageKind::EsDashStatus => {
            header(ES_DASH_STATUS, "ES_DashStatus", BUS_PT)
                .with_signal(u("PCB_Off", 12, 1))
                .with_signal(u("LDW_Off", 13, 1))
                .with_signal(u("Signal1", 14, 2))
                .with_signal(u("Cruise_State_Msg", 16, 4))
                .with_signal(u("Signal2", 20, 4))
                .with_signal(u("Cruise_Set_Speed", 24, 8))
                .with_signal(u("Cruise_Fault", 32, 1))
                .with_signal(u("Cruise_On", 33, 1))
                .with_signal(u("Display_Own_Car", 34, 1))
                .with_signal(u("Brake_Lights", 35, 1))
                .with_signal(u("Car_Follow", 36, 1))
                .with_signal(u("Signal3", 37, 3))
                .with_signal(u("Far_Distance", 40, 4))
                .with_signal(u("Cruise_State", 44, 2))
                .with_signal(u("Cruise_Activated", 46, 1))
                .with_signal(u("Signal4", 47, 17))
        }
        // No checksum on the LKAS HUD message
        MessageKind::EsLkasState => {
            MessageDefinition::new(ES_LKAS_STATE, "ES_LKAS_State", 8, BUS_PT)
                .with_signal(u("Counter", 0, 4))
                .with_signal(u("LKAS_Alert_Msg", 4, 3))
                .with_signal(u("Signal1", 7, 2))
                .with_signal(u("LKAS_ACTIVE", 9, 1))
                .with_signal(u("LKAS_Dash_State", 10, 2))
                .with_signal(u("Signal2", 12, 4))
                .with_signal(u("Backward_Speed_Limit_Menu", 16, 1))
                .with_signal(u("LKAS_Left_Line_Enable", 17, 1))
                .with_signal(u("LKAS_Left_Line_Light_Blink", 18, 1))
                .with_signal(u("LKAS_Right_Line_Enable", 19, 1))
                .with_signal(u("LKAS_Right_Line_Light_Blink", 20, 1))
                .with_signal(u("Signal3", 21, 3))
                .with_signal(u("LKAS_Left_Line_Visible", 24, 1))
                .with_signal(u("LKAS_Right_Line_Visible", 25, 1))
                .with_signal(u("LKAS_Alert", 26, 5))
                .with_signal(u("Signal4", 31, 1))
                .with_signal(u("Keep_Hands_On_Wheel", 32, 1))
                .with_signal(u("Signal5", 33, 31))
        }
        MessageKind::CruiseControl => {
            header(CRUISE_CONTROL, "CruiseControl", BUS_CAMERA)
                .with_signal(u("Signal1", 12, 28))
                .with_signal(u("Cruise_On", 40, 1))
                .with_signal(u("Cruise_Activated", 41, 1))
                .with_signal(u("Signal2", 42, 22))
        }
        MessageKind::BrakeStatus => {
            header(BRAKE_STATUS, "Brake_Status", BUS_CAMERA)
                .with_signal(u("Signal1", 12, 34))
                .with_signal(u("ES_Brake", 46, 1))
                .with_signal(u("Signal2", 47, 4))
                .with_signal(u("Brake", 51, 1))
                .with_signal(u("Signal3", 52, 12))
        }
    }
}

/// Build the layout database for the global platform
pub fn global_platform() -> MessageDatabase {
    let mut db = MessageDatabase::new();
    for kind in MessageKind::ALL {
        db.add_message(layout(kind));
    }
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_fit_in_frame() {
        let db = global_platform();
        for address in db.addresses() {
            let msg = db.get_message_by_address(address).unwrap();
            for signal in &msg.signals {
                let end = usize::from(signal.start_bit + signal.length);
                assert!(end <= msg.size * 8, "{}.{} overflows", msg.name, signal.name);
            }
        }
    }

    #[test]
    fn test_layouts_do_not_overlap() {
        let db = global_platform();
        for address in db.addresses() {
            let msg = db.get_message_by_address(address).unwrap();
            let mut used = 0u64;
            for signal in &msg.signals {
                let mask = ((1u128 << signal.length) - 1) as u64;
                let bits = mask << signal.start_bit;
                assert_eq!(used & bits, 0, "{}.{} overlaps", msg.name, signal.name);
                used |= bits;
            }
        }
    }

    #[test]
    fn test_all_messages_present() {
        let db = global_platform();
        assert_eq!(db.stats().num_messages, 8);
        assert_eq!(db.get_message("ES_LKAS").unwrap().address, ES_LKAS);
        assert_eq!(db.get_message("Brake_Status").unwrap().bus, BUS_CAMERA);
    }

    #[test]
    fn test_layout_named_after_kind() {
        for kind in MessageKind::ALL {
            assert_eq!(layout(kind).name, kind.name());
        }
    }
}
