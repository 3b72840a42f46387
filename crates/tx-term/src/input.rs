// SPDX-License-Identifier: MIT
//
// Terminal input decoder.
//
// Turns one raw chunk from stdin into one event. The classification is
// deliberately simple:
//
//   - chunk starts with ESC: it must be an SGR mouse report for button 0,
//       ESC [ < 0 ; col ; row m   → press
//       ESC [ < 0 ; col ; row M   → release
//     anything else starting with ESC is a decode error carrying the bytes.
//   - otherwise: the first byte is a keystroke; the rest of the chunk is
//     ignored.
//
// Each chunk is decoded on its own. There is no carry-over buffer between
// reads, so a sequence split across two reads, or several keys typed fast
// enough to arrive in one read, are not reassembled. Multi-byte keys (arrows,
// UTF-8) come out as their first byte.
//
// The two mouse patterns live in a table built once per `Decoder`. The
// trailing byte is case-sensitive and decides the event kind.
//
// Coordinates arrive 1-based from the terminal and leave 0-based, in the same
// space as the drawing API, so a click can be fed straight back into `draw`.

use std::fmt;

use regex::bytes::Regex;

/// The escape byte that introduces every control sequence.
pub const ESC: u8 = 0x1b;

const PRESS_PATTERN: &str = r"^\x1b\[<0;([0-9]+);([0-9]+)m";
const RELEASE_PATTERN: &str = r"^\x1b\[<0;([0-9]+);([0-9]+)M";

// ─── Event ──────────────────────────────────────────────────────────────────

/// A decoded input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keystroke: the first byte of the chunk as a Latin-1 character.
    Key(char),
    /// Primary button pressed at a 0-based cell.
    MousePress { x: u16, y: u16 },
    /// Primary button released at a 0-based cell.
    MouseRelease { x: u16, y: u16 },
    /// An escape sequence that matched no known pattern.
    DecodeError(Vec<u8>),
}

impl Event {
    /// The cell position of a mouse event.
    #[must_use]
    pub const fn position(&self) -> Option<(u16, u16)> {
        match *self {
            Self::MousePress { x, y } | Self::MouseRelease { x, y } => Some((x, y)),
            Self::Key(_) | Self::DecodeError(_) => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(c) => write!(f, "key {c:?}"),
            Self::MousePress { x, y } => write!(f, "press ({x}, {y})"),
            Self::MouseRelease { x, y } => write!(f, "release ({x}, {y})"),
            Self::DecodeError(raw) => write!(f, "undecodable {}", raw.escape_ascii()),
        }
    }
}

// ─── Decoder ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MouseAction {
    Press,
    Release,
}

/// Stateless chunk decoder with an immutable pattern table.
#[derive(Debug, Clone)]
pub struct Decoder {
    patterns: Vec<(Regex, MouseAction)>,
}

impl Decoder {
    /// Build the pattern table.
    ///
    /// # Panics
    ///
    /// Never in practice: the patterns are constants covered by tests.
    #[must_use]
    pub fn new() -> Self {
        let compile = |pattern| Regex::new(pattern).expect("mouse pattern is a valid regex");
        Self {
            patterns: vec![
                (compile(PRESS_PATTERN), MouseAction::Press),
                (compile(RELEASE_PATTERN), MouseAction::Release),
            ],
        }
    }

    /// Decode one read chunk. Empty chunks produce nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use tx_term::input::{Decoder, Event};
    ///
    /// let decoder = Decoder::new();
    /// assert_eq!(decoder.decode(b"q"), Some(Event::Key('q')));
    /// assert_eq!(
    ///     decoder.decode(b"\x1b[<0;12;7m"),
    ///     Some(Event::MousePress { x: 11, y: 6 })
    /// );
    /// assert_eq!(decoder.decode(b""), None);
    /// ```
    #[must_use]
    pub fn decode(&self, chunk: &[u8]) -> Option<Event> {
        let &first = chunk.first()?;

        if first != ESC {
            return Some(Event::Key(char::from(first)));
        }

        let event = self
            .decode_mouse(chunk)
            .unwrap_or_else(|| Event::DecodeError(chunk.to_vec()));
        Some(event)
    }

    fn decode_mouse(&self, chunk: &[u8]) -> Option<Event> {
        self.patterns.iter().find_map(|(re, action)| {
            let caps = re.captures(chunk)?;
            let x = parse_coordinate(caps.get(1)?.as_bytes())?;
            let y = parse_coordinate(caps.get(2)?.as_bytes())?;
            Some(match action {
                MouseAction::Press => Event::MousePress { x, y },
                MouseAction::Release => Event::MouseRelease { x, y },
            })
        })
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a 1-based decimal coordinate into a 0-based cell index.
///
/// Zero and values beyond `u16` are rejected.
fn parse_coordinate(digits: &[u8]) -> Option<u16> {
    std::str::from_utf8(digits)
        .ok()?
        .parse::<u16>()
        .ok()?
        .checked_sub(1)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
