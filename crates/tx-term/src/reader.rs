// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Background input reader — raw bytes in, decoded events out.
//
// A dedicated thread reads the input stream, decodes each chunk, and pushes
// the event onto a bounded queue (`sync_channel`). The render loop never
// blocks on input; it drains the queue whenever it likes.
//
// Backpressure: when the queue is full the reader waits for space. A
// consumer that stops draining will eventually stall input decoding; that is
// the intended policy, not a leak. While waiting, the reader keeps checking
// its stop flag so shutdown still works with a full queue.
//
// Shutdown: an `AtomicBool` stop flag checked between reads. The stdin
// source polls the descriptor with a short timeout and reports the timeout
// as `TimedOut`, so the thread comes back around to check the flag instead
// of sitting in a blocking `read()` forever. The loop also ends on
// end-of-stream, on a read error, or when the receiver is dropped. `stop()`
// waits a short grace period for the thread; a source that blocks without a
// timeout (the non-unix stdin fallback, or a caller's reader) gets detached
// instead of hanging the caller.
//
// The reader never writes to the terminal. Decode errors go onto the queue
// as events and into the log.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::input::{Decoder, Event};

/// How often the stdin source wakes up to let the stop flag be checked.
const POLL_TIMEOUT_MS: i32 = 50;

/// How long the reader sleeps between attempts to push onto a full queue.
const FULL_QUEUE_BACKOFF: Duration = Duration::from_millis(5);

/// How long [`InputReader::stop`] waits for the thread before detaching it.
/// Comfortably longer than one poll timeout plus one backoff.
pub const STOP_GRACE: Duration = Duration::from_millis(250);

const STOP_POLL: Duration = Duration::from_millis(2);

// ─── StdinSource ─────────────────────────────────────────────────────────────

/// Stdin as a [`Read`] that returns `TimedOut` after
/// `POLL_TIMEOUT_MS` without data.
#[derive(Debug, Default)]
pub struct StdinSource {
    _private: (),
}

impl StdinSource {
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(unix)]
impl Read for StdinSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let fd = libc::STDIN_FILENO;

        let ready = unsafe {
            let mut pfd = libc::pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            };
            libc::poll(&raw mut pfd, 1, POLL_TIMEOUT_MS)
        };

        if ready < 0 {
            return Err(io::Error::last_os_error());
        }
        if ready == 0 {
            return Err(io::Error::from(io::ErrorKind::TimedOut));
        }

        let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
        // Negative means error; everything else fits in usize.
        usize::try_from(n).map_err(|_| io::Error::last_os_error())
    }
}

/// Non-unix fallback: plain blocking reads. The thread only notices the
/// stop flag once a read returns.
#[cfg(not(unix))]
impl Read for StdinSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::stdin().lock().read(buf)
    }
}

// ─── InputReader ─────────────────────────────────────────────────────────────

/// Handle to the background reader thread.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use tx_term::input::{Decoder, Event};
/// use tx_term::reader::InputReader;
///
/// let (mut reader, events) =
///     InputReader::spawn(Cursor::new(b"q".to_vec()), Decoder::new(), 64, 64)?;
/// assert_eq!(events.recv().ok(), Some(Event::Key('q')));
/// reader.stop();
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct InputReader {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl InputReader {
    /// Spawn the reader thread over `source`.
    ///
    /// Returns the handle and the consumer end of a queue holding at most
    /// `capacity` events. Each `read` asks for at most `chunk` bytes. Both
    /// are raised to 1 if given as 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refuses to spawn the thread.
    pub fn spawn<R>(
        source: R,
        decoder: Decoder,
        capacity: usize,
        chunk: usize,
    ) -> io::Result<(Self, Receiver<Event>)>
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let chunk = chunk.max(1);

        let handle = thread::Builder::new()
            .name("terminux-input".into())
            .spawn(move || reader_loop(source, &decoder, &tx, &stop_flag, chunk))?;

        tracing::debug!(capacity, chunk, "input reader started");

        Ok((
            Self {
                handle: Some(handle),
                stop,
            },
            rx,
        ))
    }

    /// Signal the thread to stop and wait up to [`STOP_GRACE`] for it.
    ///
    /// A thread still parked in a blocking `read()` after that is detached:
    /// it exits on its own as soon as the read returns and sees the flag.
    /// It never writes to the terminal, so leaving it behind is harmless.
    ///
    /// Idempotent.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let Some(handle) = self.handle.take() else {
            return;
        };

        let deadline = Instant::now() + STOP_GRACE;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(STOP_POLL);
        }

        if !handle.is_finished() {
            tracing::debug!("input reader blocked in read, detaching");
            return;
        }
        if handle.join().is_err() {
            tracing::warn!("input reader thread panicked");
        }
        tracing::debug!("input reader stopped");
    }

    /// Whether the thread has exited or been stopped (end of input, error,
    /// or [`stop`](Self::stop)).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        self.stop();
    }
}

// ─── Loop ────────────────────────────────────────────────────────────────────

fn reader_loop<R: Read>(
    mut source: R,
    decoder: &Decoder,
    tx: &SyncSender<Event>,
    stop: &AtomicBool,
    chunk: usize,
) {
    let mut buf = vec![0u8; chunk];

    while !stop.load(Ordering::Relaxed) {
        let n = match source.read(&mut buf) {
            Ok(0) => {
                tracing::debug!("input stream closed");
                break;
            }
            Ok(n) => n,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                continue;
            }
            Err(e) => {
                tracing::warn!(error = %e, "input read failed");
                break;
            }
        };

        let Some(event) = decoder.decode(&buf[..n]) else {
            continue;
        };

        if let Event::DecodeError(raw) = &event {
            tracing::warn!(bytes = %raw.escape_ascii(), "unrecognized escape sequence");
        }

        if !send_waiting(tx, event, stop) {
            break;
        }
    }
}

/// Push `event`, waiting while the queue is full.
///
/// Returns `false` when the receiver is gone or a stop was requested.
fn send_waiting(tx: &SyncSender<Event>, mut event: Event, stop: &AtomicBool) -> bool {
    loop {
        match tx.try_send(event) {
            Ok(()) => return true,
            Err(TrySendError::Disconnected(_)) => return false,
            Err(TrySendError::Full(back)) => {
                if stop.load(Ordering::Relaxed) {
                    return false;
                }
                event = back;
                thread::sleep(FULL_QUEUE_BACKOFF);
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;

    const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    /// Yields one scripted chunk per read, then end-of-stream.
    struct Chunks(VecDeque<Vec<u8>>);

    impl Chunks {
        fn new(chunks: &[&[u8]]) -> Self {
            Self(chunks.iter().map(|c| c.to_vec()).collect())
        }
    }

    impl Read for Chunks {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let Some(chunk) = self.0.pop_front() else {
                return Ok(0);
            };
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            Ok(n)
        }
    }

    /// Never ends: every read is one `x`.
    struct Endless;

    impl Read for Endless {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            buf[0] = b'x';
            Ok(1)
        }
    }

    /// Times out a few times before yielding data.
    struct Sleepy {
        timeouts: usize,
        inner: Chunks,
    }

    impl Read for Sleepy {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.timeouts > 0 {
                self.timeouts -= 1;
                return Err(io::Error::from(io::ErrorKind::TimedOut));
            }
            self.inner.read(buf)
        }
    }

    fn collect(rx: &Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.recv_timeout(RECV_TIMEOUT) {
            out.push(ev);
        }
        out
    }

    #[test]
    fn chunks_decode_in_order() {
        let source = Chunks::new(&[b"a", b"\x1b[<0;3;4m", b"\x1b[<0;3;4M", b"b"]);
        let (mut reader, rx) = InputReader::spawn(source, Decoder::new(), 64, 64).unwrap();

        let events = collect(&rx);
        reader.stop();

        assert_eq!(
            events,
            vec![
                Event::Key('a'),
                Event::MousePress { x: 2, y: 3 },
                Event::MouseRelease { x: 2, y: 3 },
                Event::Key('b'),
            ]
        );
    }

    #[test]
    fn decode_error_does_not_stop_the_loop() {
        let source = Chunks::new(&[b"\x1b[Z", b"k"]);
        let (_reader, rx) = InputReader::spawn(source, Decoder::new(), 64, 64).unwrap();

        let events = collect(&rx);

        assert_eq!(
            events,
            vec![Event::DecodeError(b"\x1b[Z".to_vec()), Event::Key('k')]
        );
    }

    #[test]
    fn channel_closes_at_end_of_stream() {
        let (mut reader, rx) =
            InputReader::spawn(Cursor::new(Vec::new()), Decoder::new(), 64, 64).unwrap();
        assert!(rx.recv_timeout(RECV_TIMEOUT).is_err());
        reader.stop();
        assert!(reader.is_finished());
    }

    #[test]
    fn timeouts_are_retried() {
        let source = Sleepy {
            timeouts: 3,
            inner: Chunks::new(&[b"z"]),
        };
        let (_reader, rx) = InputReader::spawn(source, Decoder::new(), 64, 64).unwrap();
        assert_eq!(collect(&rx), vec![Event::Key('z')]);
    }

    #[test]
    fn chunk_size_limits_each_read() {
        // With 1-byte reads, "ab" arrives as two chunks → two keys.
        let source = Cursor::new(b"ab".to_vec());
        let (_reader, rx) = InputReader::spawn(source, Decoder::new(), 64, 1).unwrap();
        assert_eq!(collect(&rx), vec![Event::Key('a'), Event::Key('b')]);
    }

    #[test]
    fn full_queue_blocks_then_resumes() {
        let source = Chunks::new(&[b"1", b"2", b"3", b"4"]);
        let (_reader, rx) = InputReader::spawn(source, Decoder::new(), 1, 64).unwrap();

        // Give the producer time to fill the single slot and start waiting.
        thread::sleep(Duration::from_millis(50));

        let events = collect(&rx);
        assert_eq!(
            events,
            vec![
                Event::Key('1'),
                Event::Key('2'),
                Event::Key('3'),
                Event::Key('4'),
            ]
        );
    }

    #[test]
    fn stop_with_full_queue_does_not_hang() {
        let (mut reader, rx) = InputReader::spawn(Endless, Decoder::new(), 2, 64).unwrap();
        thread::sleep(Duration::from_millis(20));
        reader.stop();
        assert!(reader.is_finished());
        drop(rx);
    }

    #[test]
    fn dropped_receiver_ends_thread() {
        let (mut reader, rx) = InputReader::spawn(Endless, Decoder::new(), 2, 64).unwrap();
        drop(rx);
        reader.stop();
        assert!(reader.is_finished());
    }

    /// Blocks in `read()` until the test releases it.
    struct Blocked(mpsc::Receiver<()>);

    impl Read for Blocked {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[test]
    fn stop_does_not_wait_on_blocked_read() {
        let (release, gate) = mpsc::channel();
        let (mut reader, _rx) = InputReader::spawn(Blocked(gate), Decoder::new(), 4, 4).unwrap();
        thread::sleep(Duration::from_millis(20));

        let started = Instant::now();
        reader.stop();
        assert!(started.elapsed() < STOP_GRACE * 4);
        assert!(reader.is_finished());

        // Let the detached thread wind down.
        drop(release);
    }

    #[test]
    fn stop_is_idempotent() {
        let (mut reader, _rx) =
            InputReader::spawn(Cursor::new(Vec::new()), Decoder::new(), 4, 4).unwrap();
        reader.stop();
        reader.stop();
    }
}
