//! Field offsets of the 37 byte status/command frame, and the fixed request
//! templates.

use crate::frame::{CHECKSUM, REQUEST_SIZE};

pub mod convert;
pub mod types;

pub use convert::IsField;

use convert::TypedField;
use types::{Celsius, FanSetting, FreshSetting, LockSetting, ModeSetting, PowerSetting, SetPoint, SwingSetting};

pub const TEMPERATURE: usize = 13;
pub const COMMAND: usize = 17;
pub const MODE: usize = 23;
pub const FAN_SPEED: usize = 25;
pub const SWING: usize = 27;
pub const LOCK: usize = 28;
pub const POWER: usize = 29;
pub const FRESH: usize = 31;
pub const SET_TEMPERATURE: usize = 35;

pub type CurrentTemp = TypedField<TEMPERATURE, Celsius>;
pub type SetTemp = TypedField<SET_TEMPERATURE, SetPoint>;
pub type Mode = TypedField<MODE, ModeSetting>;
pub type FanSpeed = TypedField<FAN_SPEED, FanSetting>;
pub type Swing = TypedField<SWING, SwingSetting>;
pub type Lock = TypedField<LOCK, LockSetting>;
pub type Power = TypedField<POWER, PowerSetting>;
pub type Fresh = TypedField<FRESH, FreshSetting>;

/// Bytes the unit expects on every command frame, whatever the last status
/// frame carried there. Without them the command is not acknowledged.
pub const COMMAND_TEMPLATE: [(usize, u8); 4] = [
    (COMMAND, 0),
    (9, 1),
    (10, 77),
    (11, 95),
];

/// Solicits a status frame
pub const POLL_REQUEST: [u8; REQUEST_SIZE] = [255, 255, 10, 0, 0, 0, 0, 0, 1, 1, 77, 1, 90];

/// Switches the unit on, leaving its other settings alone
pub const POWER_ON_REQUEST: [u8; REQUEST_SIZE] = [255, 255, 10, 0, 0, 0, 0, 0, 1, 1, 77, 2, 91];

/// Named offsets, in frame order
pub const FIELD_NAMES: [(usize, &str); 10] = [
    (TEMPERATURE, "temperature"),
    (COMMAND, "command"),
    (MODE, "mode"),
    (FAN_SPEED, "fan"),
    (SWING, "swing"),
    (LOCK, "lock"),
    (POWER, "power"),
    (FRESH, "fresh"),
    (SET_TEMPERATURE, "set temperature"),
    (CHECKSUM, "checksum"),
];

pub fn field_name(offset: usize) -> Option<&'static str> {
    FIELD_NAMES.iter()
        .find(|(field, _)| *field == offset)
        .map(|(_, name)| *name)
}
