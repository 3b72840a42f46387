// SPDX-License-Identifier: MIT
//
// terminux — demo for the tx-term engine.
//
// A filled square orbits the centre of the screen inside an outlined frame,
// with a line running from (20, 20) to the bottom-right corner and a border
// around everything. Mouse clicks are echoed on the status row. `q` quits.
//
// stdout is the screen, so logs go to a file:
//
//   TERMINUX_LOG_FILE   path of the log file (default: $TMPDIR/terminux.log)
//   TERMINUX_LOG        tracing filter directives (default: info)

use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tx_term::cell::glyph;
use tx_term::{Attr, Cell, Color, Event, Session, Style};

const FRAME: Duration = Duration::from_millis(1000 / 30);

const ORBIT_STYLE: Style = Style::NONE.fg(Color::BrightCyan);
const FRAME_STYLE: Style = Style::NONE.fg(Color::Yellow);
const LINE_STYLE: Style = Style::NONE.fg(Color::Green);
const BORDER_STYLE: Style = Style::NONE.fg(Color::BrightBlack);
const STATUS_STYLE: Style = Style::NONE.attrs(Attr::BOLD);

// ─── Logging ─────────────────────────────────────────────────────────────────

fn log_path() -> PathBuf {
    env::var_os("TERMINUX_LOG_FILE")
        .map_or_else(|| env::temp_dir().join("terminux.log"), PathBuf::from)
}

/// Route tracing to a file. A log file that can't be created just means no
/// logs; the demo still runs.
fn init_logging() {
    let Ok(file) = File::create(log_path()) else {
        return;
    };
    let filter = EnvFilter::try_from_env("TERMINUX_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

// ─── Scene ───────────────────────────────────────────────────────────────────

struct Demo {
    t: f64,
    status: String,
    running: bool,
}

impl Demo {
    const fn new() -> Self {
        Self {
            t: 0.0,
            status: String::new(),
            running: true,
        }
    }

    /// Drain everything queued since the last frame.
    fn handle_events(&mut self, events: &Receiver<Event>) {
        loop {
            match events.try_recv() {
                Ok(Event::Key('q')) => self.running = false,
                Ok(event @ (Event::MousePress { .. } | Event::MouseRelease { .. })) => {
                    self.status = event.to_string();
                }
                Ok(Event::DecodeError(raw)) => {
                    warn!(bytes = %raw.escape_ascii(), "ignored input");
                }
                Ok(Event::Key(_)) => {}
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.running = false;
                    break;
                }
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn paint(&mut self, session: &mut Session) {
        let (w, h) = session.size();
        let (w, h) = (i32::from(w), i32::from(h));

        session.clear();
        self.t += 0.1;

        let x = (self.t.cos() * 20.0 + f64::from(w / 2)) as i32;
        let y = (self.t.sin() * 8.0 + f64::from(h / 2)) as i32;

        session.draw_rect(x, y, 5, 5, true, Cell::styled(glyph::MEDIUM, ORBIT_STYLE));
        session.draw_rect(x - 5, y - 5, 15, 15, false, Cell::styled('!', FRAME_STYLE));
        session.draw(x, y, Cell::styled('#', ORBIT_STYLE.attrs(Attr::BOLD)));
        session.draw_line(20, 20, w, h, Cell::styled('-', LINE_STYLE));
        session.draw_rect(0, 0, w, h, false, Cell::styled(glyph::FULL, BORDER_STYLE));

        let status = if self.status.is_empty() {
            "click anywhere, q to quit"
        } else {
            &self.status
        };
        session.draw_text(2, h - 2, status, STATUS_STYLE);
    }
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    init_logging();
    info!("terminux starting");

    let mut session = Session::from_terminal().context("failed to start terminal session")?;
    session.hide_cursor()?;
    session.enable_mouse()?;
    let events = session.listen()?;

    let (w, h) = session.size();
    info!(width = w, height = h, "session ready");

    let mut demo = Demo::new();
    while demo.running {
        let started = Instant::now();

        demo.handle_events(&events);
        demo.paint(&mut session);
        session.render()?;

        if let Some(rest) = FRAME.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }

    session.end().context("failed to restore terminal")?;
    info!("terminux exiting");
    Ok(())
}
