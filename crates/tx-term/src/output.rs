// SPDX-License-Identifier: MIT
//
// Output batching.
//
// Everything the renderer produces for a frame lands in an `OutputBuffer`
// first. One `write_all` + `flush` at the end of the frame replaces hundreds
// of tiny writes, and an empty buffer means the terminal is not touched at
// all.

use std::io::{self, Write};

use crate::ansi;
use crate::cell::Cell;

/// Default capacity: 16 KB, enough for a full 80×24 repaint with styles.
const DEFAULT_CAPACITY: usize = 16_384;

/// A byte buffer that accumulates ANSI output for a single write.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Append a character as UTF-8.
    pub fn push_char(&mut self, ch: char) {
        let mut enc = [0u8; 4];
        self.buf
            .extend_from_slice(ch.encode_utf8(&mut enc).as_bytes());
    }

    /// Append one changed cell: cursor move, style, character, reset.
    ///
    /// The reset is only emitted when a style was applied, so unstyled
    /// cells stay as short as `ESC[r;cH` plus the character.
    pub fn push_cell(&mut self, x: u16, y: u16, cell: &Cell) {
        // Writes into a Vec cannot fail.
        ansi::cursor_to(self, x, y).ok();
        if cell.style.is_none() {
            self.push_char(cell.ch);
        } else {
            ansi::style(self, &cell.style).ok();
            self.push_char(cell.ch);
            ansi::reset(self).ok();
        }
    }

    /// Write accumulated output to `w` in one call and clear the buffer.
    ///
    /// Does nothing at all (no write, no flush) when the buffer is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to or flushing `w` fails. The buffer is
    /// cleared either way, since a partial frame can't be replayed safely.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let result = w.write_all(&self.buf).and_then(|()| w.flush());
        self.buf.clear();
        result
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Real flushing goes through flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Color, Style};

    /// A writer that counts calls, to prove batching.
    #[derive(Default)]
    struct CountingWriter {
        bytes: Vec<u8>,
        writes: usize,
        flushes: usize,
    }

    impl Write for CountingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn new_is_empty() {
        let buf = OutputBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn write_trait_appends() {
        let mut buf = OutputBuffer::new();
        write!(buf, "hello {}", 42).unwrap();
        assert_eq!(buf.as_bytes(), b"hello 42");
    }

    #[test]
    fn push_char_multibyte() {
        let mut buf = OutputBuffer::new();
        buf.push_char('█');
        assert_eq!(buf.as_bytes(), "█".as_bytes());
    }

    #[test]
    fn push_plain_cell() {
        let mut buf = OutputBuffer::new();
        buf.push_cell(2, 0, &Cell::new('a'));
        assert_eq!(buf.as_bytes(), b"\x1b[1;3Ha");
    }

    #[test]
    fn push_styled_cell_is_scoped() {
        let mut buf = OutputBuffer::new();
        buf.push_cell(0, 1, &Cell::styled('r', Style::NONE.fg(Color::Red)));
        assert_eq!(buf.as_bytes(), b"\x1b[2;1H\x1b[31mr\x1b[0m");
    }

    #[test]
    fn flush_is_one_write() {
        let mut buf = OutputBuffer::new();
        for x in 0..10 {
            buf.push_cell(x, 0, &Cell::new('#'));
        }
        let mut w = CountingWriter::default();
        buf.flush_to(&mut w).unwrap();
        assert_eq!(w.writes, 1);
        assert_eq!(w.flushes, 1);
        assert!(buf.is_empty());
    }

    #[test]
    fn flush_empty_touches_nothing() {
        let mut buf = OutputBuffer::new();
        let mut w = CountingWriter::default();
        buf.flush_to(&mut w).unwrap();
        assert_eq!(w.writes, 0);
        assert_eq!(w.flushes, 0);
    }

    #[test]
    fn failed_flush_still_clears() {
        let mut buf = OutputBuffer::new();
        buf.push_char('x');
        assert!(buf.flush_to(&mut FailingWriter).is_err());
        assert!(buf.is_empty());
    }
}
