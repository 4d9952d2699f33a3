//! Mapping between frame fields and [`ClimateState`], in both directions.

use crate::climate::{clamp_target_temperature, ClimateState, Command, FanMode, HvacMode};
use crate::field::types::{Celsius, PowerSetting, SetPoint};
use crate::field::{self, IsField, COMMAND_TEMPLATE};
use crate::field::convert::ValueType;
use crate::frame::Frame;

/// Outcome of decoding one enumerated field
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded<T> {
    Known(T),
    /// raw value not recognised, a fallback value was substituted
    Defaulted { raw: u8, value: T },
    /// raw value not recognised, no value produced
    Unrecognized { raw: u8 },
}

impl<T> Decoded<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Decoded::Known(value) => Some(value),
            Decoded::Defaulted { value, .. } => Some(value),
            Decoded::Unrecognized { .. } => None,
        }
    }
}

pub fn is_powered_off(frame: &Frame) -> bool {
    matches!(field::Power::get(frame), Ok(PowerSetting::Off))
}

/// Off whenever the power byte says so, regardless of the mode byte. Mode
/// bytes outside the known set fall back to auto.
pub fn decode_mode(frame: &Frame) -> Decoded<HvacMode> {
    if is_powered_off(frame) {
        return Decoded::Known(HvacMode::Off);
    }

    match field::Mode::get(frame) {
        Ok(setting) => Decoded::Known(setting.into()),
        Err(err) => Decoded::Defaulted { raw: err.value, value: HvacMode::Auto },
    }
}

pub fn decode_fan(frame: &Frame) -> Decoded<FanMode> {
    match field::FanSpeed::get(frame) {
        Ok(setting) => Decoded::Known(setting.into()),
        Err(err) => Decoded::Unrecognized { raw: err.value },
    }
}

pub fn decode_target_temperature(raw: u8) -> Celsius {
    let Ok(set_point) = SetPoint::try_from_raw(raw);
    set_point.into()
}

pub fn encode_target_temperature(temp: Celsius) -> u8 {
    SetPoint(temp).to_raw()
}

/// Folds a validated status frame into `state`.
///
/// While the unit is off the fan byte is not consulted and the last known
/// fan mode is kept. An unrecognised fan byte also keeps the last known fan
/// mode; an unrecognised mode byte reads as auto.
pub fn update_state(state: &mut ClimateState, frame: &Frame) {
    let Ok(current) = field::CurrentTemp::get(frame);
    let Ok(target) = field::SetTemp::get(frame);
    state.current_temperature = Some(current);
    state.target_temperature = Some(target.into());

    state.power = match field::Power::get(frame) {
        Ok(power) => Some(power),
        Err(err) => {
            log::warn!("power: {err}");
            None
        }
    };

    state.mode = match decode_mode(frame) {
        Decoded::Defaulted { raw, value } => {
            log::warn!("mode: unknown value {raw}, assuming {value}");
            Some(value)
        }
        decoded => decoded.value(),
    };

    if !is_powered_off(frame) {
        match decode_fan(frame) {
            Decoded::Unrecognized { raw } => {
                log::warn!("fan: unknown value {raw}, keeping {:?}", state.fan);
            }
            decoded => {
                state.fan = decoded.value();
            }
        }
    }

    state.swing = field::Swing::get(frame).ok();
    state.fresh = field::Fresh::get(frame).ok();
    state.lock = field::Lock::get(frame).ok();
}

/// Writes `command` into the retained frame and stamps the bytes every
/// command frame must carry. Fields the command leaves unset keep whatever
/// the unit last reported.
pub fn apply_command(frame: &mut Frame, command: &Command) {
    if let Some(power) = command.power {
        field::Power::set(frame, power);
    }

    if let Some(mode) = command.mode {
        field::Mode::set(frame, mode);
    }

    if let Some(fan) = command.fan {
        field::FanSpeed::set(frame, fan);
    }

    if let Some(temp) = command.target_temperature {
        field::SetTemp::set(frame, SetPoint(clamp_target_temperature(temp)));
    }

    for (offset, value) in COMMAND_TEMPLATE {
        frame.set(offset, value);
    }
}
