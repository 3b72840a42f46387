// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit. The renderer and the session decide;
// this module only knows the bytes.
//
// All cursor positions are 0-indexed in our API and converted to 1-indexed
// for the terminal.

use std::io::{self, Write};

use crate::cell::Style;

// ─── Raw Sequences ───────────────────────────────────────────────────────────

pub const HIDE_CURSOR: &[u8] = b"\x1b[?25l";
pub const SHOW_CURSOR: &[u8] = b"\x1b[?25h";
pub const CLEAR_SCREEN: &[u8] = b"\x1b[2J";
pub const CURSOR_HOME: &[u8] = b"\x1b[H";
pub const RESET: &[u8] = b"\x1b[0m";
pub const ENABLE_MOUSE: &[u8] = b"\x1b[?1000h";
pub const DISABLE_MOUSE: &[u8] = b"\x1b[?1000l";
pub const ENABLE_MOUSE_SGR: &[u8] = b"\x1b[?1006h";
pub const DISABLE_MOUSE_SGR: &[u8] = b"\x1b[?1006l";

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` (CUP). Our coordinates are 0-indexed.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(HIDE_CURSOR)
}

#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(SHOW_CURSOR)
}

#[inline]
pub fn cursor_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(CURSOR_HOME)
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2). Does not move the cursor.
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(CLEAR_SCREEN)
}

/// Reset all SGR attributes (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(RESET)
}

// ─── Style ───────────────────────────────────────────────────────────────────

/// Emit one SGR sequence for `style`: `ESC [ p1 ; p2 ; ... m`.
///
/// Writes nothing for [`Style::NONE`].
pub fn style(w: &mut impl Write, style: &Style) -> io::Result<()> {
    let mut params = style.sgr_params();
    let Some(first) = params.next() else {
        return Ok(());
    };

    write!(w, "\x1b[{first}")?;
    for p in params {
        write!(w, ";{p}")?;
    }
    w.write_all(b"m")
}

// ─── Mouse Protocol ─────────────────────────────────────────────────────────

/// Enable click reporting (DEC 1000) with SGR coordinates (DEC 1006).
///
/// The two always travel together: legacy encoding packs coordinates into
/// single bytes and breaks past column 223, and the input decoder only
/// understands the SGR form.
pub fn enable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(ENABLE_MOUSE)?;
    w.write_all(ENABLE_MOUSE_SGR)
}

/// Disable click reporting and the SGR coordinate format.
///
/// Both writes are attempted even if the first fails.
pub fn disable_mouse(w: &mut impl Write) -> io::Result<()> {
    let legacy = w.write_all(DISABLE_MOUSE);
    let sgr = w.write_all(DISABLE_MOUSE_SGR);
    legacy.and(sgr)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
