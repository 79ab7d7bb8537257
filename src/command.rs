//! Text commands received on the command characteristic.
//!
//! A write is trimmed of surrounding whitespace and compared byte-for-byte
//! against a fixed vocabulary:
//!
//! ```text
//! CALL:1     → indicator 1
//! CALL:2     → indicator 2
//! CALL:3     → indicator 3
//! DOOR_OPEN  → door indicator
//! ```
//!
//! Matching is exact: no prefixes, no case folding, interior characters
//! untouched. Anything else is an unknown command and is ignored.

use crate::blink::OutputId;
use crate::config;

/// Bytes stripped from both ends of a write: space, CR, LF, tab.
const fn is_trim_byte(b: u8) -> bool {
    matches!(b, b' ' | b'\r' | b'\n' | b'\t')
}

/// Strip leading and trailing whitespace from a raw write.
///
/// Never fails; a buffer made only of whitespace yields an empty token.
pub fn normalize(raw: &[u8]) -> &[u8] {
    let start = raw.iter().position(|&b| !is_trim_byte(b)).unwrap_or(raw.len());
    let end = raw
        .iter()
        .rposition(|&b| !is_trim_byte(b))
        .map_or(start, |i| i + 1);
    &raw[start..end]
}

/// A recognised command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Call1,
    Call2,
    Call3,
    DoorOpen,
}

impl Command {
    /// Every command, in vocabulary order.
    pub const ALL: [Command; 4] = [
        Command::Call1,
        Command::Call2,
        Command::Call3,
        Command::DoorOpen,
    ];

    /// Wire spelling of the command.
    pub const fn token(self) -> &'static [u8] {
        match self {
            Command::Call1 => b"CALL:1",
            Command::Call2 => b"CALL:2",
            Command::Call3 => b"CALL:3",
            Command::DoorOpen => b"DOOR_OPEN",
        }
    }

    /// Indicator this command blinks.
    pub const fn output(self) -> OutputId {
        match self {
            Command::Call1 => config::OUTPUT_CALL_1,
            Command::Call2 => config::OUTPUT_CALL_2,
            Command::Call3 => config::OUTPUT_CALL_3,
            Command::DoorOpen => config::OUTPUT_DOOR,
        }
    }

    /// Match an already-normalized token.
    pub fn from_token(token: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.token() == token)
    }

    /// Normalize a raw write and match it.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        Self::from_token(normalize(raw))
    }
}
