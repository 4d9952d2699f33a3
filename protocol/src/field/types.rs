use core::convert::Infallible;

use derive_more::Display;
use thiserror::Error;

use super::convert::ValueType;

/// The set temperature byte counts up from this
pub const SET_POINT_BASE: i16 = 16;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("enum value out of range: {field_name}: {value}")]
pub struct EnumOutOfRange {
    pub field_name: &'static str,
    pub value: u8,
}

// Celcius, whole degrees
#[derive(Debug, Display, PartialEq, PartialOrd, Eq, Ord, Clone, Copy, Hash)]
#[display("{} °C", self.0)]
pub struct Celsius(pub i16);

impl ValueType for Celsius {
    type Err = Infallible;

    fn try_from_raw(raw: u8) -> Result<Self, Infallible> {
        Ok(Celsius(i16::from(raw)))
    }

    fn to_raw(&self) -> u8 {
        self.0 as u8
    }
}

/// Target temperature as carried in the set temperature byte, which holds
/// degrees above [`SET_POINT_BASE`]. The byte is read as two's complement so
/// set points below the base survive a round trip.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy)]
#[display("{}", self.0)]
pub struct SetPoint(pub Celsius);

impl From<SetPoint> for Celsius {
    fn from(value: SetPoint) -> Self {
        value.0
    }
}

impl ValueType for SetPoint {
    type Err = Infallible;

    fn try_from_raw(raw: u8) -> Result<Self, Infallible> {
        Ok(SetPoint(Celsius(i16::from(raw as i8) + SET_POINT_BASE)))
    }

    fn to_raw(&self) -> u8 {
        self.0.0.wrapping_sub(SET_POINT_BASE) as u8
    }
}

macro_rules! define_enum {
    { enum $name:ident { $( $variant:ident = $value:expr, )+ } } => {
        #[repr(u8)]
        #[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
        #[display("{:?}", self)]
        pub enum $name {
            $(
                $variant = $value,
            )+
        }

        impl ValueType for $name {
            type Err = EnumOutOfRange;

            fn try_from_raw(raw: u8) -> Result<Self, Self::Err> {
                match raw {
                    $( $value => Ok($name::$variant), )+
                    _ => Err(EnumOutOfRange { field_name: stringify!($name), value: raw })
                }
            }

            fn to_raw(&self) -> u8 {
                *self as u8
            }
        }
    };
}

define_enum! {
    enum PowerSetting {
        Off = 8,
        On = 9,
    }
}

define_enum! {
    enum ModeSetting {
        Smart = 0,
        Cool = 1,
        Heat = 2,
        FanOnly = 3,
        Dry = 4,
    }
}

// ordinals run from fastest to slowest, with auto last
define_enum! {
    enum FanSetting {
        High = 0,
        Medium = 1,
        Low = 2,
        Auto = 3,
    }
}

define_enum! {
    enum SwingSetting {
        Off = 0,
        Vertical = 1,
        Horizontal = 2,
    }
}

define_enum! {
    enum LockSetting {
        Off = 0x00,
        On = 0x80,
    }
}

define_enum! {
    enum FreshSetting {
        Off = 0,
        On = 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_point_is_offset_from_base() {
        assert_eq!(SetPoint::try_from_raw(6).unwrap(), SetPoint(Celsius(22)));
        assert_eq!(SetPoint(Celsius(23)).to_raw(), 7);
        assert_eq!(SetPoint(Celsius(16)).to_raw(), 0);
        assert_eq!(SetPoint(Celsius(i16::MIN)).to_raw(), 0xf0);
    }

    #[test]
    fn set_point_round_trips_display_range() {
        for temp in 10..=50 {
            let raw = SetPoint(Celsius(temp)).to_raw();
            assert_eq!(SetPoint::try_from_raw(raw).unwrap().0, Celsius(temp));
        }
    }

    #[test]
    fn sensed_temperature_has_no_offset() {
        assert_eq!(Celsius::try_from_raw(24).unwrap(), Celsius(24));
        assert_eq!(Celsius::try_from_raw(255).unwrap(), Celsius(255));
    }

    #[test]
    fn fan_ordinals_are_not_monotonic() {
        assert_eq!(FanSetting::Low.to_raw(), 2);
        assert_eq!(FanSetting::Medium.to_raw(), 1);
        assert_eq!(FanSetting::High.to_raw(), 0);
        assert_eq!(FanSetting::Auto.to_raw(), 3);
    }

    #[test]
    fn out_of_range_enum() {
        assert_eq!(
            SwingSetting::try_from_raw(3),
            Err(EnumOutOfRange { field_name: "SwingSetting", value: 3 }),
        );
        assert_eq!(LockSetting::try_from_raw(0x80), Ok(LockSetting::On));
        assert_eq!(PowerSetting::try_from_raw(0), Err(EnumOutOfRange { field_name: "PowerSetting", value: 0 }));
    }

    #[test]
    fn display() {
        assert_eq!(Celsius(22).to_string(), "22 °C");
        assert_eq!(ModeSetting::FanOnly.to_string(), "FanOnly");
    }
}
