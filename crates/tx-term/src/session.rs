// SPDX-License-Identifier: MIT
//
// Session — one raw-mode stretch of terminal ownership.
//
// A session owns the pending grid, the renderer (and with it the committed
// grid), the terminal device holding the saved mode, the output stream, and
// the input reader if one was started. Its states:
//
//   Uninitialized ──begin()──▶ RawModeActive ──end()──▶ Restored
//                                   ▲                      │
//                                   └──────begin()─────────┘
//
// `end()` is the one thing that must always happen. It runs from `Drop` if
// the caller didn't get to it (early `?` return, panic unwinding through the
// draw loop), and the process-wide panic hook covers the case where unwinding
// never reaches us. Restore failures are reported, never retried: by the time
// the terminal can't be restored there is nothing useful left to try.
//
// The input reader is stopped before `end()` writes the restore sequence or
// touches termios. A reader stuck in a blocking read is detached rather than
// waited on. The reader never writes to the output stream itself, so nothing
// can reach the terminal after it has been handed back.

use std::io::{self, Write};
use std::sync::mpsc::Receiver;

use crate::ansi;
use crate::cell::{Cell, Style};
use crate::diff::{DiffRenderer, RenderStats};
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::input::{Decoder, Event};
use crate::reader::{InputReader, StdinSource};
use crate::terminal::{self, RawMode, Termios};

// ─── Config ──────────────────────────────────────────────────────────────────

/// Session construction parameters.
///
/// ```
/// use tx_term::SessionConfig;
///
/// let cfg = SessionConfig::new(120, 40);
/// assert_eq!(cfg.queue_capacity, 64);
/// assert!(cfg.validate().is_ok());
/// assert!(SessionConfig::new(0, 40).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Grid columns.
    pub width: u16,
    /// Grid rows.
    pub height: u16,
    /// Maximum queued input events before the reader waits.
    pub queue_capacity: usize,
    /// Bytes requested per read of the input stream.
    pub read_chunk: usize,
}

impl SessionConfig {
    /// A config of the given size with default queue settings.
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            queue_capacity: 64,
            read_chunk: 64,
        }
    }

    /// Reject a zero width or height.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSize`] if either dimension is 0.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    RawModeActive,
    Restored,
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// Terminal session over a raw-mode device `T` writing to `W`.
///
/// The defaults are the real thing: stdout and stdin's termios.
pub struct Session<W: Write = io::Stdout, T: RawMode = Termios> {
    config: SessionConfig,
    pending: Grid,
    renderer: DiffRenderer,
    device: T,
    output: W,
    state: SessionState,
    reader: Option<InputReader>,
    cursor_hidden: bool,
    mouse_enabled: bool,
}

impl Session {
    /// Begin a session on the real terminal with the given size.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSize`], [`Error::NotATerminal`],
    /// [`Error::ModeSwitchFailed`], or [`Error::Io`] if the initial clear
    /// can't be written.
    pub fn open(config: SessionConfig) -> Result<Self> {
        let mut session = Self::new(config, Termios::new(), io::stdout())?;
        session.begin()?;
        Ok(session)
    }

    /// Begin a session sized to the real terminal.
    ///
    /// # Errors
    ///
    /// [`Error::SizeQueryFailed`] if the size can't be read, otherwise as
    /// [`open`](Self::open).
    pub fn from_terminal() -> Result<Self> {
        let (width, height) = terminal::get_size().ok_or(Error::SizeQueryFailed)?;
        Self::open(SessionConfig::new(width, height))
    }

    /// Start decoding stdin on a background thread.
    ///
    /// # Errors
    ///
    /// As [`listen_with`](Self::listen_with).
    pub fn listen(&mut self) -> Result<Receiver<Event>> {
        self.listen_with(StdinSource::new())
    }
}

impl<W: Write, T: RawMode> Session<W, T> {
    /// A session in the `Uninitialized` state. Nothing is written yet.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSize`] if either dimension is 0.
    pub fn new(config: SessionConfig, device: T, output: W) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            pending: Grid::new(config.width, config.height),
            renderer: DiffRenderer::new(config.width, config.height),
            device,
            output,
            state: SessionState::Uninitialized,
            reader: None,
            cursor_hidden: false,
            mouse_enabled: false,
        })
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Enter raw mode and clear the screen.
    ///
    /// No-op when already active.
    ///
    /// # Errors
    ///
    /// [`Error::NotATerminal`], [`Error::ModeSwitchFailed`], or
    /// [`Error::Io`] if the clear can't be written (raw mode is undone
    /// before returning).
    pub fn begin(&mut self) -> Result<()> {
        if self.state == SessionState::RawModeActive {
            return Ok(());
        }
        if !self.device.is_terminal() {
            return Err(Error::NotATerminal);
        }
        self.device.enable_raw().map_err(Error::ModeSwitchFailed)?;

        if let Err(e) = self.write_clear() {
            if let Err(restore) = self.device.restore() {
                tracing::warn!(error = %restore, "restore after failed begin also failed");
            }
            return Err(Error::Io(e));
        }

        self.renderer = DiffRenderer::new(self.config.width, self.config.height);
        self.state = SessionState::RawModeActive;
        tracing::debug!(
            width = self.config.width,
            height = self.config.height,
            "session started"
        );
        Ok(())
    }

    /// Hand the terminal back: show cursor, clear, home, mouse off, flush,
    /// restore the original mode.
    ///
    /// Every step is attempted even if an earlier one fails. Calling this
    /// outside `RawModeActive` is a no-op.
    ///
    /// # Errors
    ///
    /// [`Error::RestoreFailed`] if the mode couldn't be restored (takes
    /// precedence), else [`Error::Io`] if the restore sequence couldn't be
    /// written. The session is `Restored` either way.
    pub fn end(&mut self) -> Result<()> {
        if self.state != SessionState::RawModeActive {
            return Ok(());
        }
        self.state = SessionState::Restored;

        if let Some(mut reader) = self.reader.take() {
            reader.stop();
        }

        let written = self.write_restore_sequence();
        let restored = self.device.restore();

        self.cursor_hidden = false;
        self.mouse_enabled = false;
        self.renderer = DiffRenderer::new(self.config.width, self.config.height);

        tracing::debug!("session ended");

        match (restored, written) {
            (Err(e), _) => Err(Error::RestoreFailed(e)),
            (Ok(()), Err(e)) => Err(Error::Io(e)),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    fn write_clear(&mut self) -> io::Result<()> {
        ansi::clear_screen(&mut self.output)?;
        ansi::cursor_home(&mut self.output)?;
        self.output.flush()
    }

    /// Each step is attempted regardless of earlier failures; the first
    /// error is returned.
    fn write_restore_sequence(&mut self) -> io::Result<()> {
        let out = &mut self.output;
        [
            ansi::cursor_show(out),
            ansi::clear_screen(out),
            ansi::cursor_home(out),
            ansi::disable_mouse(out),
            out.flush(),
        ]
        .into_iter()
        .collect()
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, SessionState::RawModeActive)
    }

    fn require_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::NotActive)
        }
    }

    // ─── Toggles ─────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// [`Error::NotActive`] outside raw mode, [`Error::Io`] on write failure.
    pub fn hide_cursor(&mut self) -> Result<()> {
        self.require_active()?;
        ansi::cursor_hide(&mut self.output)?;
        self.output.flush()?;
        self.cursor_hidden = true;
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::NotActive`] outside raw mode, [`Error::Io`] on write failure.
    pub fn show_cursor(&mut self) -> Result<()> {
        self.require_active()?;
        ansi::cursor_show(&mut self.output)?;
        self.output.flush()?;
        self.cursor_hidden = false;
        Ok(())
    }

    /// Turn on click reporting in SGR format.
    ///
    /// # Errors
    ///
    /// [`Error::NotActive`] outside raw mode, [`Error::Io`] on write failure.
    pub fn enable_mouse(&mut self) -> Result<()> {
        self.require_active()?;
        ansi::enable_mouse(&mut self.output)?;
        self.output.flush()?;
        self.mouse_enabled = true;
        tracing::debug!("mouse reporting on");
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::NotActive`] outside raw mode, [`Error::Io`] on write failure.
    pub fn disable_mouse(&mut self) -> Result<()> {
        self.require_active()?;
        ansi::disable_mouse(&mut self.output)?;
        self.output.flush()?;
        self.mouse_enabled = false;
        tracing::debug!("mouse reporting off");
        Ok(())
    }

    #[inline]
    #[must_use]
    pub const fn is_cursor_hidden(&self) -> bool {
        self.cursor_hidden
    }

    #[inline]
    #[must_use]
    pub const fn is_mouse_enabled(&self) -> bool {
        self.mouse_enabled
    }

    // ─── Drawing ─────────────────────────────────────────────────────────

    /// `(width, height)`, fixed for the life of the session.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> (u16, u16) {
        (self.config.width, self.config.height)
    }

    /// Write one cell into the pending frame. Off-grid is a silent no-op.
    #[inline]
    pub fn draw(&mut self, x: i32, y: i32, cell: Cell) {
        self.pending.draw(x, y, cell);
    }

    #[inline]
    pub fn draw_point(&mut self, x: i32, y: i32, cell: Cell) {
        self.pending.draw_point(x, y, cell);
    }

    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, filled: bool, cell: Cell) {
        self.pending.draw_rect(x, y, w, h, filled, cell);
    }

    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, cell: Cell) {
        self.pending.draw_line(x0, y0, x1, y1, cell);
    }

    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, style: Style) {
        self.pending.draw_text(x, y, text, style);
    }

    /// Blank the pending frame.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    #[must_use]
    pub const fn pending(&self) -> &Grid {
        &self.pending
    }

    pub fn pending_mut(&mut self) -> &mut Grid {
        &mut self.pending
    }

    /// What the terminal is currently showing, as far as we know.
    #[must_use]
    pub const fn committed(&self) -> &Grid {
        self.renderer.committed()
    }

    /// Write the difference between pending and committed to the terminal.
    ///
    /// One batched write per call; nothing at all if nothing changed.
    ///
    /// # Errors
    ///
    /// [`Error::NotActive`] outside raw mode, [`Error::Io`] if the write
    /// fails. After a failed write the next render repaints every cell, so
    /// nothing lost on the way to the terminal stays missing.
    pub fn render(&mut self) -> Result<RenderStats> {
        self.require_active()?;
        let stats = self.renderer.render(&self.pending);
        self.renderer.flush_to(&mut self.output)?;
        Ok(stats)
    }

    /// Make the next render repaint every cell.
    pub fn force_redraw(&mut self) {
        self.renderer.force_redraw();
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Start decoding `source` on a background thread.
    ///
    /// Replaces (and stops) any reader already running. Events arrive on
    /// the returned bounded queue; see [`InputReader`] for the full-queue
    /// policy.
    ///
    /// # Errors
    ///
    /// [`Error::NotActive`] outside raw mode, [`Error::Spawn`] if the thread
    /// can't be created.
    pub fn listen_with<R>(&mut self, source: R) -> Result<Receiver<Event>>
    where
        R: io::Read + Send + 'static,
    {
        self.require_active()?;
        if let Some(mut old) = self.reader.take() {
            old.stop();
        }

        let (reader, events) = InputReader::spawn(
            source,
            Decoder::new(),
            self.config.queue_capacity,
            self.config.read_chunk,
        )
        .map_err(Error::Spawn)?;

        self.reader = Some(reader);
        Ok(events)
    }

    // ─── Access ──────────────────────────────────────────────────────────

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub const fn output(&self) -> &W {
        &self.output
    }

    #[must_use]
    pub const fn device(&self) -> &T {
        &self.device
    }
}

impl<W: Write, T: RawMode> Drop for Session<W, T> {
    fn drop(&mut self) {
        if let Err(e) = self.end() {
            tracing::warn!(error = %e, "terminal restore failed during drop");
        }
    }
}

impl<W: Write, T: RawMode> std::fmt::Debug for Session<W, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("cursor_hidden", &self.cursor_hidden)
            .field("mouse_enabled", &self.mouse_enabled)
            .field("listening", &self.reader.is_some())
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
