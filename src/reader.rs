//! The interruptible line reader.
//!
//! A [`LineReader`] owns the configured device and a wakeup pipe. Its read
//! loops block in a single `poll` over both, so [`LineReader::close`] from any
//! thread ends a pending wait as soon as the scheduler runs the loop again,
//! without waiting for device traffic.
//!
//! ```no_run
//! use serial_lines::{LineReader, ReaderConfig};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let config = ReaderConfig::new("/dev/ttyUSB0").baud_rate(115200);
//! let reader = Arc::new(LineReader::open(config)?);
//!
//! let worker = {
//!     let reader = Arc::clone(&reader);
//!     thread::spawn(move || {
//!         reader.read_lines_loop(
//!             |line| println!("{}", String::from_utf8_lossy(line)),
//!             |err| eprintln!("read error: {err}"),
//!         )
//!     })
//! };
//!
//! reader.write_line(b"C,START", b"\r\n")?;
//! reader.close()?;
//! worker.join().ok();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::{ReaderError, Result};
use crate::framing::LineFramer;
use crate::port::poll;
use crate::port::tty;
use crate::port::wakeup::WakeupSignal;
use crate::port::{BaudRate, ReaderConfig};
use parking_lot::{Mutex, RwLock};
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsFd, IntoRawFd, OwnedFd};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, trace, warn};

/// Size of the scratch buffer for a single device read.
const READ_CHUNK: usize = 4096;

/// Descriptors owned by an open reader. Released together, exactly once.
#[derive(Debug)]
struct Resources {
    device: File,
    wakeup: WakeupSignal,
}

/// What one readiness wait produced.
enum Wake {
    /// Bytes were appended to the framer.
    Data,
    /// The reader is shutting down.
    Shutdown,
}

/// Low-latency, cancellable, line-oriented access to a serial device.
///
/// All methods take `&self`; share the reader between threads with `Arc`.
/// At most one of [`read_line`](Self::read_line) or
/// [`read_lines_loop`](Self::read_lines_loop) runs at a time; a second
/// concurrent call fails with [`ReaderError::Busy`].
///
/// One-shot and continuous reads must not be interleaved: `read_line` discards
/// whatever follows the line it returns, while `read_lines_loop` keeps a
/// partial line buffered for the next iteration (and the next call).
#[derive(Debug)]
pub struct LineReader {
    config: ReaderConfig,
    baud: BaudRate,
    closed: AtomicBool,
    resources: RwLock<Option<Resources>>,
    framer: Mutex<LineFramer>,
}

impl LineReader {
    /// Open and configure the device described by `config`.
    ///
    /// Nothing stays open if any step fails.
    pub fn open(config: ReaderConfig) -> Result<Self> {
        if config.delimiter.is_empty() {
            return Err(ReaderError::invalid_config("delimiter must not be empty"));
        }

        let baud = BaudRate::resolve(config.baud_rate);
        let device = tty::open_raw(&config.device, baud)?;
        let wakeup = WakeupSignal::new().map_err(ReaderError::WakeupCreate)?;

        info!(device = %config.device.display(), baud = baud.bps(), "serial line reader opened");

        Ok(Self {
            framer: Mutex::new(LineFramer::new(&config.delimiter)),
            config,
            baud,
            closed: AtomicBool::new(false),
            resources: RwLock::new(Some(Resources { device, wakeup })),
        })
    }

    /// The configuration this reader was opened with.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// The line speed actually programmed into the device.
    pub fn baud_rate(&self) -> BaudRate {
        self.baud
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Write `payload` followed by `terminator` to the device.
    ///
    /// Both are sent as one buffer and short writes are retried until every
    /// byte is transferred. Safe to call while another thread runs a read loop.
    /// A write still waiting on the device when the reader is closed is
    /// abandoned and fails with [`ReaderError::Closed`].
    pub fn write_line(&self, payload: &[u8], terminator: &[u8]) -> Result<()> {
        if self.is_closed() {
            return Err(ReaderError::Closed);
        }
        let guard = self.resources.read();
        let res = guard.as_ref().ok_or(ReaderError::Closed)?;

        let mut frame = Vec::with_capacity(payload.len() + terminator.len());
        frame.extend_from_slice(payload);
        frame.extend_from_slice(terminator);

        (&res.device).write_all(&frame).map_err(|err| {
            if self.is_closed() {
                ReaderError::Closed
            } else {
                ReaderError::Write(err)
            }
        })?;
        trace!(bytes = frame.len(), "wrote line");
        Ok(())
    }

    /// Block until one complete line arrives and return it without its delimiter.
    ///
    /// Returns [`ReaderError::Closed`] if the reader is closed before or while
    /// waiting. Bytes already buffered after the returned line are discarded.
    pub fn read_line(&self) -> Result<Vec<u8>> {
        let mut framer = self.framer.try_lock().ok_or(ReaderError::Busy)?;
        framer.clear();

        let result = loop {
            match self.fill(&mut framer) {
                Ok(Wake::Data) => {
                    if let Some(line) = framer.next_line() {
                        break Ok(line);
                    }
                }
                Ok(Wake::Shutdown) => break Err(ReaderError::Closed),
                Err(err) => break Err(err),
            }
        };

        framer.clear();
        result
    }

    /// Read lines until the reader is closed or a read fails.
    ///
    /// `on_line` is called once per line, in stream order. A failure is
    /// delivered once to `on_error` and ends the loop; a graceful
    /// [`close`](Self::close) ends it without calling either callback.
    ///
    /// Callbacks run without any device lock held, so they may call
    /// [`write_line`](Self::write_line) or [`close`](Self::close).
    pub fn read_lines_loop<L, E>(&self, mut on_line: L, mut on_error: E)
    where
        L: FnMut(&[u8]),
        E: FnMut(ReaderError),
    {
        let Some(mut framer) = self.framer.try_lock() else {
            on_error(ReaderError::Busy);
            return;
        };

        loop {
            match self.fill(&mut framer) {
                Ok(Wake::Data) => {
                    let mut count = 0usize;
                    for line in framer.lines() {
                        on_line(&line);
                        count += 1;
                    }
                    if count > 0 {
                        trace!(lines = count, "dispatched lines");
                    }
                }
                Ok(Wake::Shutdown) => {
                    debug!("read loop stopped by close");
                    return;
                }
                Err(err) => {
                    debug!(error = %err, "read loop terminated");
                    on_error(err);
                    return;
                }
            }
        }
    }

    /// Wait for the device or the wakeup signal and perform at most one read.
    fn fill(&self, framer: &mut LineFramer) -> Result<Wake> {
        if self.is_closed() {
            return Ok(Wake::Shutdown);
        }
        let guard = self.resources.read();
        let Some(res) = guard.as_ref() else {
            return Ok(Wake::Shutdown);
        };

        loop {
            let ready = poll::wait(
                res.device.as_fd(),
                res.wakeup.as_fd(),
                self.config.read_timeout,
            )
            .map_err(ReaderError::Wait)?;

            if self.is_closed() {
                return Ok(Wake::Shutdown);
            }

            let Some(ready) = ready else {
                // Only reachable with a configured timeout.
                return Err(ReaderError::Timeout(self.config.read_timeout.unwrap_or_default()));
            };

            if ready.wakeup {
                if let Err(err) = res.wakeup.drain() {
                    warn!(error = %err, "failed to drain wakeup signal");
                }
                debug!("wakeup signal received");
                return Ok(Wake::Shutdown);
            }

            if ready.device {
                let mut scratch = [0u8; READ_CHUNK];
                match (&res.device).read(&mut scratch) {
                    Ok(0) => return Err(ReaderError::Disconnected),
                    Ok(n) => {
                        framer.push(&scratch[..n]);
                        return Ok(Wake::Data);
                    }
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    // Close switched the device to non-blocking; the next wait sees the wakeup.
                    Err(err) if err.kind() == io::ErrorKind::WouldBlock => continue,
                    Err(err) => return Err(ReaderError::Read(err)),
                }
            }
        }
    }

    /// Shut the reader down and release the device and the wakeup pipe.
    ///
    /// Only the first call does anything: it marks the reader closed, wakes
    /// any pending wait, abandons any pending write and discards unsent
    /// output, then closes the device followed by both pipe ends.
    /// Later calls, including concurrent ones, return `Ok(())` immediately.
    pub fn close(&self) -> Result<()> {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        if let Some(res) = self.resources.read().as_ref() {
            if let Err(err) = res.wakeup.notify() {
                warn!(error = %err, "failed to signal wakeup pipe");
            }
            if let Err(err) = tty::abort_output(res.device.as_fd()) {
                warn!(error = %err, "failed to abort pending output");
            }
        }

        // Waits for an in-flight wait or write to let go of the descriptors.
        let Some(Resources { device, wakeup }) = self.resources.write().take() else {
            return Ok(());
        };

        let result = close_fd(OwnedFd::from(device)).map_err(ReaderError::Close);
        let (wake_read, wake_write) = wakeup.into_parts();
        for (end, fd) in [("read", wake_read), ("write", wake_write)] {
            if let Err(err) = close_fd(fd) {
                warn!(end, error = %err, "failed to close wakeup pipe");
            }
        }

        info!(device = %self.config.device.display(), "serial line reader closed");
        result
    }
}

impl Drop for LineReader {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Close a descriptor and report the outcome, which dropping an `OwnedFd` hides.
fn close_fd(fd: OwnedFd) -> io::Result<()> {
    let raw = fd.into_raw_fd();
    // SAFETY: `raw` came from an owned descriptor that nothing else will close.
    if unsafe { libc::close(raw) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
