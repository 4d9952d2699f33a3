//! Codec for the serial bus between a Haier split-system indoor unit and its
//! wired controller.
//!
//! Every status and command frame is a fixed 37 byte block starting with the
//! sentinel pair `ff ff` and ending in a one byte additive checksum. Fields
//! live at fixed offsets, see [`field`].

pub mod climate;
pub mod field;
pub mod frame;
pub mod pretty;
pub mod state;
pub mod translate;

pub use climate::{ClimateState, Command, FanMode, HvacMode};
pub use frame::{Frame, FrameError, FrameParser};
pub use state::ApplianceState;
