use core::fmt::{self, Write};

use crate::field::{self, IsField, field_name};
use crate::frame::{checksum, Frame, CHECKSUM, HEADER_SIZE, SENTINEL};

/// Space separated hex bytes, for wire logs
pub struct Hex<'a>(pub &'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, byte) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_char(' ')?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Writes the full byte table of `frame`, one offset per line, with decoded
/// values next to the offsets that carry a known field.
pub fn pretty_print(
    out: &mut dyn Write,
    frame: &Frame,
    use_color: bool,
) -> fmt::Result {
    let valid = frame.validate().is_ok();

    let head_color = color(use_color, if valid { "\x1b[1;32m" } else { "\x1b[1;31m" });
    let name_color = color(use_color, "\x1b[1;36m");
    let dim = color(use_color, "\x1b[90m");
    let reset = color(use_color, "\x1b[0m");

    writeln!(out, "{head_color}{}{reset}", if valid { "frame" } else { "frame (invalid)" })?;

    for (offset, byte) in frame.as_bytes().iter().enumerate() {
        match describe(frame, offset) {
            Some((name, value)) => {
                writeln!(out, "  {offset:>2}: 0x{byte:02x} {byte:>3}  {name_color}{name}{reset} = {value}")?;
            }
            None => {
                writeln!(out, "  {dim}{offset:>2}: 0x{byte:02x} {byte:>3}{reset}")?;
            }
        }
    }

    writeln!(out)?;
    Ok(())
}

/// Logs every named field of a status frame at debug level
pub fn log_status(frame: &Frame) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }

    log::debug!("status frame: {}", Hex(frame.as_bytes()));
    for (offset, _) in field::FIELD_NAMES {
        if let Some((name, value)) = describe(frame, offset) {
            log::debug!("  {name}: {value} ({})", frame.get(offset));
        }
    }
}

fn describe(frame: &Frame, offset: usize) -> Option<(&'static str, String)> {
    if offset < HEADER_SIZE {
        let value = if frame.get(offset) == SENTINEL { "ok" } else { "BAD" };
        return Some(("sentinel", value.to_string()));
    }

    let name = field_name(offset)?;
    let value = match offset {
        field::TEMPERATURE => render::<field::CurrentTemp>(frame),
        field::MODE => render::<field::Mode>(frame),
        field::FAN_SPEED => render::<field::FanSpeed>(frame),
        field::SWING => render::<field::Swing>(frame),
        field::LOCK => render::<field::Lock>(frame),
        field::POWER => render::<field::Power>(frame),
        field::FRESH => render::<field::Fresh>(frame),
        field::SET_TEMPERATURE => render::<field::SetTemp>(frame),
        CHECKSUM => {
            let expected = checksum(frame.as_bytes());
            if expected == frame.received_checksum() {
                "ok".to_string()
            } else {
                format!("BAD (expected 0x{expected:02x})")
            }
        }
        _ => frame.get(offset).to_string(),
    };

    Some((name, value))
}

fn render<F: IsField>(frame: &Frame) -> String {
    match F::get(frame) {
        Ok(value) => value.to_string(),
        Err(_) => format!("DEFAULT ({})", F::raw(frame)),
    }
}

fn color(use_color: bool, s: &str) -> &str {
    if use_color {
        s
    } else {
        ""
    }
}
