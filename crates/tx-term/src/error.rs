// SPDX-License-Identifier: MIT
//
// Error taxonomy.
//
// Startup errors abort session construction; there is no degraded mode.
// Decode errors are not here at all: they are data and travel through the
// event queue as `Event::DecodeError`. Out-of-bounds drawing is silent.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid screen size {width}x{height}: both dimensions must be at least 1")]
    InvalidSize { width: u16, height: u16 },

    #[error("input is not an interactive terminal")]
    NotATerminal,

    #[error("failed to switch the terminal to raw mode: {0}")]
    ModeSwitchFailed(#[source] io::Error),

    #[error("failed to query the terminal size")]
    SizeQueryFailed,

    #[error("session is not in raw mode")]
    NotActive,

    #[error("failed to spawn the input reader thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("failed to restore the terminal: {0}")]
    RestoreFailed(#[source] io::Error),

    #[error("terminal output failed: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
