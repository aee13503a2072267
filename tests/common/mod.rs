//! Shared test utilities: a pseudo-terminal pair standing in for a serial device.
//!
//! The reader opens the slave side by path; the test plays the instrument on
//! the master side.

#![allow(dead_code)]

use serial_lines::{LineReader, ReaderConfig, ReaderError};
use std::fs::File;
use std::io::{Read, Write};
use std::os::unix::io::OwnedFd;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Generous bound for events that should happen "promptly".
pub const PROMPT: Duration = Duration::from_millis(500);

pub struct PtyPair {
    /// Instrument side.
    pub master: File,
    /// Kept open so the slave node outlives the reader under test.
    pub slave: OwnedFd,
    pub path: PathBuf,
}

impl PtyPair {
    pub fn open() -> Self {
        let pty = nix::pty::openpty(None, None).expect("Failed to create pty");
        let path = nix::unistd::ttyname(&pty.slave).expect("Failed to get slave path");
        Self {
            master: File::from(pty.master),
            slave: pty.slave,
            path,
        }
    }

    /// Reader config for the slave side with a `\n` delimiter.
    pub fn config(&self) -> ReaderConfig {
        ReaderConfig::new(&self.path).delimiter(b"\n".as_slice())
    }

    pub fn reader(&self) -> Arc<LineReader> {
        Arc::new(LineReader::open(self.config()).expect("Failed to open reader"))
    }

    /// Send bytes as the instrument.
    pub fn send(&mut self, bytes: &[u8]) {
        self.master.write_all(bytes).expect("master write");
        self.master.flush().expect("master flush");
    }

    /// Read exactly `len` bytes written by the reader, on a helper thread.
    pub fn expect_bytes(&self, len: usize) -> Receiver<Vec<u8>> {
        let mut master = self.master.try_clone().expect("clone master");
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = vec![0u8; len];
            if master.read_exact(&mut buf).is_ok() {
                let _ = tx.send(buf);
            }
        });
        rx
    }
}

/// Events surfaced by a continuous read loop.
#[derive(Debug)]
pub enum Event {
    Line(Vec<u8>),
    Error(ReaderError),
}

/// Run `read_lines_loop` on its own thread, forwarding every callback.
///
/// The join handle resolves when the loop returns.
pub fn spawn_loop(reader: &Arc<LineReader>) -> (Receiver<Event>, JoinHandle<()>) {
    let reader = Arc::clone(reader);
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        let err_tx = tx.clone();
        reader.read_lines_loop(
            |line| {
                let _ = tx.send(Event::Line(line.to_vec()));
            },
            |err| {
                let _ = err_tx.send(Event::Error(err));
            },
        );
    });
    (rx, handle)
}

/// Wait for the next line, failing the test on an error or timeout.
pub fn next_line(rx: &Receiver<Event>) -> Vec<u8> {
    match rx.recv_timeout(PROMPT) {
        Ok(Event::Line(line)) => line,
        Ok(Event::Error(err)) => panic!("unexpected error: {err}"),
        Err(_) => panic!("timeout waiting for line"),
    }
}

/// Join a loop thread, failing if it does not exit within `bound`.
pub fn join_within(handle: JoinHandle<()>, bound: Duration) {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(handle.join());
    });
    match rx.recv_timeout(bound) {
        Ok(Ok(())) => {}
        Ok(Err(_)) => panic!("read loop panicked"),
        Err(_) => panic!("read loop did not exit within {bound:?}"),
    }
}
