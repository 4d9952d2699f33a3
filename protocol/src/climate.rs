//! Appliance-agnostic climate model exchanged with the host.

use core::fmt;
use core::str::FromStr;

use derive_more::Display;
use thiserror::Error;

use crate::field::types::{Celsius, FanSetting, FreshSetting, LockSetting, ModeSetting, PowerSetting, SwingSetting};

pub const MIN_TARGET_TEMPERATURE: Celsius = Celsius(10);
pub const MAX_TARGET_TEMPERATURE: Celsius = Celsius(50);

pub const SUPPORTED_MODES: [HvacMode; 6] = [
    HvacMode::Off,
    HvacMode::Auto,
    HvacMode::Cool,
    HvacMode::Heat,
    HvacMode::Dry,
    HvacMode::FanOnly,
];

pub const SUPPORTED_FAN_MODES: [FanMode; 4] = [
    FanMode::Auto,
    FanMode::Low,
    FanMode::Medium,
    FanMode::High,
];

/// Limits a requested target temperature to what the unit accepts
pub fn clamp_target_temperature(temp: Celsius) -> Celsius {
    let clamped = temp.clamp(MIN_TARGET_TEMPERATURE, MAX_TARGET_TEMPERATURE);
    if clamped != temp {
        log::warn!("target temperature {temp} out of range, using {clamped}");
    }
    clamped
}

#[derive(Error, Debug)]
#[error("invalid value for {0}: {1}")]
pub struct InvalidEnumString(&'static str, String);

#[derive(Debug, PartialEq, Eq, Display, Clone, Copy)]
pub enum HvacMode {
    #[display("off")]
    Off,
    #[display("auto")]
    Auto,
    #[display("cool")]
    Cool,
    #[display("heat")]
    Heat,
    #[display("dry")]
    Dry,
    #[display("fan_only")]
    FanOnly,
}

impl FromStr for HvacMode {
    type Err = InvalidEnumString;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(HvacMode::Off),
            "auto" => Ok(HvacMode::Auto),
            "cool" => Ok(HvacMode::Cool),
            "heat" => Ok(HvacMode::Heat),
            "dry" => Ok(HvacMode::Dry),
            "fan_only" => Ok(HvacMode::FanOnly),
            _ => Err(InvalidEnumString("HvacMode", s.to_string())),
        }
    }
}

impl From<ModeSetting> for HvacMode {
    fn from(value: ModeSetting) -> Self {
        match value {
            ModeSetting::Smart => HvacMode::Auto,
            ModeSetting::Cool => HvacMode::Cool,
            ModeSetting::Heat => HvacMode::Heat,
            ModeSetting::FanOnly => HvacMode::FanOnly,
            ModeSetting::Dry => HvacMode::Dry,
        }
    }
}

impl HvacMode {
    /// Mode byte for this mode, `None` for off which only touches power
    pub fn setting(self) -> Option<ModeSetting> {
        match self {
            HvacMode::Off => None,
            HvacMode::Auto => Some(ModeSetting::Smart),
            HvacMode::Cool => Some(ModeSetting::Cool),
            HvacMode::Heat => Some(ModeSetting::Heat),
            HvacMode::Dry => Some(ModeSetting::Dry),
            HvacMode::FanOnly => Some(ModeSetting::FanOnly),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Display, Clone, Copy)]
pub enum FanMode {
    #[display("off")]
    Off,
    #[display("auto")]
    Auto,
    #[display("low")]
    Low,
    #[display("medium")]
    Medium,
    #[display("high")]
    High,
}

impl FromStr for FanMode {
    type Err = InvalidEnumString;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(FanMode::Off),
            "auto" => Ok(FanMode::Auto),
            "low" => Ok(FanMode::Low),
            "medium" => Ok(FanMode::Medium),
            "high" => Ok(FanMode::High),
            _ => Err(InvalidEnumString("FanMode", s.to_string())),
        }
    }
}

impl From<FanSetting> for FanMode {
    fn from(value: FanSetting) -> Self {
        match value {
            FanSetting::Auto => FanMode::Auto,
            FanSetting::Low => FanMode::Low,
            FanSetting::Medium => FanMode::Medium,
            FanSetting::High => FanMode::High,
        }
    }
}

impl FanMode {
    /// Fan speed byte for this mode, `None` for off which only touches power
    pub fn setting(self) -> Option<FanSetting> {
        match self {
            FanMode::Off => None,
            FanMode::Auto => Some(FanSetting::Auto),
            FanMode::Low => Some(FanSetting::Low),
            FanMode::Medium => Some(FanSetting::Medium),
            FanMode::High => Some(FanSetting::High),
        }
    }
}

/// Last state reported by the unit. Fields stay `None` until a status frame
/// has carried a recognisable value for them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClimateState {
    pub power: Option<PowerSetting>,
    pub mode: Option<HvacMode>,
    pub fan: Option<FanMode>,
    pub target_temperature: Option<Celsius>,
    pub current_temperature: Option<Celsius>,
    pub swing: Option<SwingSetting>,
    pub fresh: Option<FreshSetting>,
    pub lock: Option<LockSetting>,
}

impl fmt::Display for ClimateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mode={} fan={} target={} current={} swing={} fresh={} lock={}",
            Unknown(&self.mode),
            Unknown(&self.fan),
            Unknown(&self.target_temperature),
            Unknown(&self.current_temperature),
            Unknown(&self.swing),
            Unknown(&self.fresh),
            Unknown(&self.lock),
        )
    }
}

struct Unknown<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for Unknown<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => fmt::Display::fmt(value, f),
            None => f.write_str("?"),
        }
    }
}

/// Changes requested by the host. Only fields that are `Some` are written
/// into the command frame; everything else keeps its last reported value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Command {
    pub power: Option<PowerSetting>,
    pub mode: Option<ModeSetting>,
    pub fan: Option<FanSetting>,
    pub target_temperature: Option<Celsius>,
}

impl Command {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a host climate call. Mode and fan both drive the shared
    /// power bit, and the fan request is applied last.
    pub fn from_call(mode: Option<HvacMode>, fan: Option<FanMode>, target: Option<Celsius>) -> Self {
        let mut command = Command::new();
        if let Some(mode) = mode {
            command = command.with_mode(mode);
        }
        if let Some(fan) = fan {
            command = command.with_fan(fan);
        }
        if let Some(target) = target {
            command = command.with_target_temperature(target);
        }
        command
    }

    pub fn with_mode(mut self, mode: HvacMode) -> Self {
        match mode.setting() {
            Some(setting) => {
                self.power = Some(PowerSetting::On);
                self.mode = Some(setting);
            }
            None => {
                self.power = Some(PowerSetting::Off);
            }
        }
        self
    }

    pub fn with_fan(mut self, fan: FanMode) -> Self {
        match fan.setting() {
            Some(setting) => {
                self.power = Some(PowerSetting::On);
                self.fan = Some(setting);
            }
            None => {
                self.power = Some(PowerSetting::Off);
            }
        }
        self
    }

    pub fn with_target_temperature(mut self, temp: Celsius) -> Self {
        self.target_temperature = Some(clamp_target_temperature(temp));
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Command::default()
    }
}
