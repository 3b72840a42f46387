// SPDX-License-Identifier: MIT
//
// tx-term — Terminal engine for terminux.
//
// A small substrate for games and TUIs that want to own every byte sent to
// the terminal. Two grids per session: the pending frame the application
// paints into and the committed frame that mirrors what the terminal shows.
// `render()` diffs them and writes only the changed cells in one batch.
//
// Input runs on its own thread. Raw stdin chunks are decoded into keys and
// SGR mouse press/release reports and pushed onto a bounded queue that the
// application drains at its own pace.
//
// No external TUI frameworks: raw termios for the mode switch, hand-written
// ANSI for output, a regex table for the mouse protocol.

pub mod ansi;
pub mod cell;
pub mod diff;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod input;
pub mod output;
pub mod reader;
pub mod session;
pub mod terminal;

pub use cell::{Attr, Cell, Color, Style};
pub use diff::RenderStats;
pub use error::{Error, Result};
pub use geometry::{Line, Point, Rect};
pub use grid::Grid;
pub use input::{Decoder, Event};
pub use session::{Session, SessionConfig, SessionState};
pub use terminal::{RawMode, Termios};
