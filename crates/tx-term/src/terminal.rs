// SPDX-License-Identifier: MIT
//
// Terminal device control — raw mode, size query, panic-safe restore.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, and raw fd writes. These are
// the standard POSIX interfaces for terminal control. Each unsafe block is
// minimal.
#![allow(unsafe_code)]
//
// The session talks to the device through the `RawMode` trait so the whole
// lifecycle can be exercised against an in-memory fake. `Termios` is the
// real implementation over stdin.
//
// The panic hook bypasses Rust's stdout lock and writes a pre-built restore
// sequence straight to fd 1, then puts the saved termios back, then lets the
// original hook print. A panic mid-frame (while the stdout lock is held)
// would otherwise deadlock or leave the shell unusable.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once};

// ─── RawMode ─────────────────────────────────────────────────────────────────

/// A terminal whose line discipline can be switched to raw and back.
pub trait RawMode {
    /// Whether the input side is an interactive terminal.
    fn is_terminal(&self) -> bool;

    /// Save the current mode and switch to raw.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the mode can't be read or changed.
    fn enable_raw(&mut self) -> io::Result<()>;

    /// Put back the mode saved by [`enable_raw`](Self::enable_raw).
    ///
    /// A no-op when nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the mode can't be restored.
    fn restore(&mut self) -> io::Result<()>;
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the terminal size as `(columns, rows)` via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<(u16, u16)> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    (result == 0 && ws.ws_col > 0 && ws.ws_row > 0).then_some((ws.ws_col, ws.ws_row))
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<(u16, u16)> {
    None
}

/// Whether stdin is connected to a terminal.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Backup of the original termios for the panic hook, which can't reach
/// the [`Termios`] value that owns the real copy.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Whether raw mode is currently in effect. The hook only touches the
/// screen when it is, so a panic outside a session prints normally.
static RAW_ACTIVE: AtomicBool = AtomicBool::new(false);

static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Everything `end()` would write, as one buffer: show cursor, clear
/// screen, home cursor, disable both mouse modes, reset SGR.
#[rustfmt::skip]
pub(crate) const EMERGENCY_RESTORE: &[u8] = b"\
    \x1b[?25h\
    \x1b[2J\
    \x1b[H\
    \x1b[?1000l\x1b[?1006l\
    \x1b[0m";

#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Install a panic hook that restores the terminal before the message prints.
///
/// Once per process.
pub fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if RAW_ACTIVE.swap(false, Ordering::SeqCst) {
                emergency_restore();

                #[cfg(unix)]
                restore_termios_from_backup();
            }

            original(info);
        }));
    });
}

/// Write [`EMERGENCY_RESTORE`] straight to fd 1, bypassing the stdout lock.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        use std::io::Write;
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Termios ─────────────────────────────────────────────────────────────────

/// The real terminal: stdin's termios.
#[derive(Default)]
pub struct Termios {
    #[cfg(unix)]
    original: Option<libc::termios>,
}

impl std::fmt::Debug for Termios {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Termios")
            .field("raw", &self.is_raw())
            .finish()
    }
}

impl Termios {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this handle currently holds a saved mode (i.e. is raw).
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        #[cfg(unix)]
        {
            self.original.is_some()
        }
        #[cfg(not(unix))]
        {
            false
        }
    }
}

#[cfg(unix)]
impl RawMode for Termios {
    fn is_terminal(&self) -> bool {
        is_tty()
    }

    fn enable_raw(&mut self) -> io::Result<()> {
        if self.original.is_some() {
            return Ok(());
        }

        install_panic_hook();

        let fd = libc::STDIN_FILENO;

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }
            let original = termios;

            // cfmakeraw equivalent: no echo, no line buffering, no signals.
            termios.c_iflag &= !(libc::IGNBRK
                | libc::BRKINT
                | libc::PARMRK
                | libc::ISTRIP
                | libc::INLCR
                | libc::IGNCR
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &=
                !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;

            // VMIN=1, VTIME=0: read() blocks until at least 1 byte.
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            self.original = Some(original);
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(original);
            }
        }

        RAW_ACTIVE.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        let Some(original) = self.original.take() else {
            return Ok(());
        };

        RAW_ACTIVE.store(false, Ordering::SeqCst);
        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = None;
        }

        let rc = unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const original) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(not(unix))]
impl RawMode for Termios {
    fn is_terminal(&self) -> bool {
        false
    }

    fn enable_raw(&mut self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "raw mode requires a unix terminal",
        ))
    }

    fn restore(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
