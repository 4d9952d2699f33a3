use core::num::NonZeroUsize;

use derive_more::Debug;
use thiserror::Error;

/// Size of status and command frames on the wire
pub const FRAME_SIZE: usize = 37;
/// Size of the short poll and power-on requests
pub const REQUEST_SIZE: usize = 13;

pub const SENTINEL: u8 = 0xff;
pub const HEADER_SIZE: usize = 2;
pub const CHECKSUM: usize = FRAME_SIZE - 1;

pub type FrameData = heapless::Vec<u8, FRAME_SIZE>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame too short: {size} bytes, expected {FRAME_SIZE}")]
    TooShort { size: usize },
    #[error("frame too long: {size} bytes, expected {FRAME_SIZE}")]
    TooLong { size: usize },
    #[error("bad sentinel: received {received:02x?}")]
    BadSentinel { received: [u8; HEADER_SIZE] },
    #[error("bad checksum: received {received:02x}, expected {expected:02x}")]
    BadChecksum { received: u8, expected: u8 },
}

/// Additive checksum over everything between the sentinel pair and the
/// final byte, which is where the checksum itself is carried.
pub fn checksum(data: &[u8]) -> u8 {
    let end = data.len().saturating_sub(1);
    data.get(HEADER_SIZE..end)
        .unwrap_or_default()
        .iter()
        .fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

/// One full status or command frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[debug("Frame({:02x?})", self.0)]
pub struct Frame([u8; FRAME_SIZE]);

impl Frame {
    pub const fn zeroed() -> Self {
        Frame([0; FRAME_SIZE])
    }

    /// Wraps raw bytes without validating them
    pub const fn from_bytes(bytes: [u8; FRAME_SIZE]) -> Self {
        Frame(bytes)
    }

    /// Parses exactly one frame, checking sentinel and checksum.
    pub fn parse(data: &[u8]) -> Result<Self, FrameError> {
        if data.len() > FRAME_SIZE {
            return Err(FrameError::TooLong { size: data.len() });
        }

        let bytes: [u8; FRAME_SIZE] = data.try_into()
            .map_err(|_| FrameError::TooShort { size: data.len() })?;

        let frame = Frame(bytes);
        frame.validate()?;
        Ok(frame)
    }

    pub fn validate(&self) -> Result<(), FrameError> {
        let header = [self.0[0], self.0[1]];
        if header != [SENTINEL; HEADER_SIZE] {
            return Err(FrameError::BadSentinel { received: header });
        }

        let received = self.received_checksum();
        let expected = checksum(&self.0);
        if received != expected {
            return Err(FrameError::BadChecksum { received, expected });
        }

        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.0
    }

    pub fn get(&self, offset: usize) -> u8 {
        self.0[offset]
    }

    pub fn set(&mut self, offset: usize, value: u8) {
        self.0[offset] = value;
    }

    pub fn received_checksum(&self) -> u8 {
        self.0[CHECKSUM]
    }

    /// Stamps the sentinel pair and a freshly computed checksum into the
    /// frame and returns the bytes ready for transmission. Call only once
    /// every field write for the outgoing command has been applied.
    pub fn serialize(&mut self) -> [u8; FRAME_SIZE] {
        self.0[..HEADER_SIZE].fill(SENTINEL);
        self.0[CHECKSUM] = checksum(&self.0);
        self.0
    }
}

impl Default for Frame {
    fn default() -> Self {
        Frame::zeroed()
    }
}

/// Streaming frame parser
///
/// Bytes that do not start a sentinel pair are dropped one at a time, so the
/// parser resynchronises on the next `ff ff` after line noise or a truncated
/// frame.
#[derive(Default)]
pub struct FrameParser {
    state: State,
    buffer: FrameData,
}

#[derive(Default)]
enum State {
    #[default] Start,
    Sentinel,
    Data { remain: NonZeroUsize },
}

impl FrameParser {
    /// Alias for `FrameParser::default`
    pub fn new() -> Self {
        FrameParser::default()
    }

    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        let state = core::mem::take(&mut self.state);
        match feed_byte(state, &mut self.buffer, byte) {
            Transition::Next(state) => {
                self.state = state;
                Ok(None)
            }
            Transition::Complete(frame) => {
                self.state = State::Start;
                Ok(Some(frame))
            }
            Transition::Error(err) => {
                self.state = State::Start;
                self.rescan();
                Err(err)
            }
        }
    }

    /// Replays a rejected frame from the byte after its first sentinel, so a
    /// real frame starting inside the rejected bytes is still found.
    fn rescan(&mut self) {
        let rejected = core::mem::take(&mut self.buffer);

        for byte in &rejected[1..] {
            let state = core::mem::take(&mut self.state);
            // fewer than FRAME_SIZE bytes, so this never completes or fails
            self.state = match feed_byte(state, &mut self.buffer, *byte) {
                Transition::Next(state) => state,
                Transition::Complete(_) | Transition::Error(_) => State::Start,
            };
        }
    }
}

enum Transition {
    Next(State),
    Complete(Frame),
    Error(FrameError),
}

fn feed_byte(state: State, buffer: &mut FrameData, byte: u8) -> Transition {
    use Transition::{Next, Complete, Error};

    match state {
        State::Start if byte == SENTINEL => Next(State::Sentinel),
        State::Start => Next(State::Start),
        State::Sentinel if byte == SENTINEL => {
            buffer.clear();
            buffer.extend_from_slice(&[SENTINEL; HEADER_SIZE])
                .expect("buffer holds at least a header");
            Next(next_data_state(FRAME_SIZE - HEADER_SIZE))
        }
        // lone sentinel byte: drop it, the current byte cannot start a
        // sentinel pair either
        State::Sentinel => Next(State::Start),
        State::Data { remain } => {
            buffer.push(byte).expect("no capacity left in buffer, this should never happen");

            match NonZeroUsize::new(remain.get() - 1) {
                Some(remain) => Next(State::Data { remain }),
                None => match Frame::parse(&buffer[..]) {
                    Ok(frame) => Complete(frame),
                    Err(err) => Error(err),
                },
            }
        }
    }
}

fn next_data_state(remain: usize) -> State {
    match NonZeroUsize::new(remain) {
        Some(remain) => State::Data { remain },
        None => State::Start,
    }
}
