use crate::climate::{ClimateState, Command};
use crate::frame::{Frame, FrameError, FRAME_SIZE};
use crate::pretty::{self, Hex};
use crate::translate;

/// The retained frame buffer and the climate state decoded from it.
///
/// The buffer starts zeroed and is only ever replaced by a frame that passed
/// validation, or modified in place by a command. Commands are built on top
/// of it so that settings the host did not ask to change go back to the
/// unit exactly as it last reported them.
#[derive(Default)]
pub struct ApplianceState {
    frame: Frame,
    climate: ClimateState,
    has_status: bool,
}

impl ApplianceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and accepts one complete status frame. On error the retained
    /// buffer and climate state are left untouched.
    pub fn receive(&mut self, data: &[u8]) -> Result<&ClimateState, FrameError> {
        let frame = Frame::parse(data)?;
        Ok(self.replace(frame))
    }

    /// Accepts a frame from a [`crate::FrameParser`], validating it again.
    pub fn accept(&mut self, frame: Frame) -> Result<&ClimateState, FrameError> {
        frame.validate()?;
        Ok(self.replace(frame))
    }

    fn replace(&mut self, frame: Frame) -> &ClimateState {
        self.frame = frame;
        self.has_status = true;
        translate::update_state(&mut self.climate, &self.frame);
        pretty::log_status(&self.frame);
        &self.climate
    }

    /// Merges `command` into the retained buffer and returns the frame to
    /// transmit, checksum freshly computed.
    pub fn command(&mut self, command: &Command) -> [u8; FRAME_SIZE] {
        translate::apply_command(&mut self.frame, command);
        let bytes = self.frame.serialize();
        log::debug!("command frame: {}", Hex(&bytes));
        bytes
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn climate(&self) -> &ClimateState {
        &self.climate
    }

    /// Whether a status frame has been accepted since startup
    pub fn has_status(&self) -> bool {
        self.has_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::{FanMode, HvacMode};
    use crate::field::types::{Celsius, PowerSetting};
    use crate::field::{FAN_SPEED, MODE, POWER, SET_TEMPERATURE, SWING};
    use crate::frame::tests::status_bytes;
    use crate::frame::{CHECKSUM, HEADER_SIZE};
    use crate::FrameParser;

    #[test]
    fn starts_zeroed() {
        let state = ApplianceState::new();
        assert_eq!(state.frame(), &Frame::zeroed());
        assert_eq!(state.climate(), &ClimateState::default());
        assert!(!state.has_status());
    }

    #[test]
    fn receive_decodes_status() {
        let mut state = ApplianceState::new();
        let climate = state.receive(&status_bytes()).unwrap();

        assert_eq!(climate.current_temperature, Some(Celsius(24)));
        assert_eq!(climate.target_temperature, Some(Celsius(22)));
        assert!(state.has_status());
        assert_eq!(state.frame().as_bytes(), &status_bytes());
    }

    #[test]
    fn corrupted_frame_leaves_state_untouched() {
        let mut state = ApplianceState::new();
        state.receive(&status_bytes()).unwrap();
        let frame = state.frame().clone();
        let climate = state.climate().clone();

        for offset in HEADER_SIZE..CHECKSUM {
            let mut corrupt = status_bytes();
            corrupt[offset] ^= 0x01;
            assert!(matches!(state.receive(&corrupt), Err(FrameError::BadChecksum { .. })));
            assert_eq!(state.frame(), &frame);
            assert_eq!(state.climate(), &climate);
        }
    }

    #[test]
    fn accept_revalidates() {
        let mut bytes = status_bytes();
        bytes[13] = 30;

        let mut state = ApplianceState::new();
        assert!(state.accept(Frame::from_bytes(bytes)).is_err());
        assert!(!state.has_status());
    }

    #[test]
    fn command_builds_on_last_status() {
        let mut state = ApplianceState::new();
        state.receive(&status_bytes()).unwrap();

        let command = Command::from_call(Some(HvacMode::Cool), None, Some(Celsius(23)));
        let bytes = state.command(&command);

        let sent = Frame::parse(&bytes).unwrap();
        assert_eq!(sent.get(POWER), PowerSetting::On as u8);
        assert_eq!(sent.get(MODE), 1);
        assert_eq!(sent.get(SET_TEMPERATURE), 7);
        assert_eq!(sent.get(FAN_SPEED), 3);
        assert_eq!(sent.get(SWING), 1);
        assert_eq!(state.frame(), &sent);
    }

    #[test]
    fn later_status_replaces_command_writes() {
        let mut state = ApplianceState::new();
        state.receive(&status_bytes()).unwrap();
        state.command(&Command::new().with_fan(FanMode::Off));
        assert_eq!(state.frame().get(POWER), 8);

        let climate = state.receive(&status_bytes()).unwrap();
        assert_eq!(climate.mode, Some(HvacMode::Cool));
        assert_eq!(state.frame().as_bytes(), &status_bytes());
    }

    #[test]
    fn resynchronises_after_leading_garbage() {
        let mut stream = vec![10];
        stream.extend_from_slice(&status_bytes());

        let mut parser = FrameParser::new();
        let mut state = ApplianceState::new();
        for byte in stream {
            if let Some(frame) = parser.feed(byte).unwrap() {
                state.accept(frame).unwrap();
            }
        }

        assert!(state.has_status());
        assert_eq!(state.climate().current_temperature, Some(Celsius(24)));
    }
}
