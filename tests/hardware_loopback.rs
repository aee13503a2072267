//! Tests requiring actual serial hardware.
//!
//! These tests are skipped if no hardware is available.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! export TEST_PORT=/dev/ttyUSB0   # port with TX wired to RX
//! export TEST_BAUD=115200         # optional, default: 115200
//! cargo test --test hardware_loopback -- --ignored
//! ```

use serial_lines::{LineReader, ReaderConfig};
use std::env;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Get the test port from environment variable.
fn get_test_port() -> Option<String> {
    env::var("TEST_PORT").ok()
}

/// Get the test baud rate from environment variable (default: 115200).
fn get_test_baud() -> u32 {
    env::var("TEST_BAUD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(115200)
}

/// Skip test if hardware is not available.
fn skip_without_hardware() -> Option<String> {
    let port = get_test_port();
    if port.is_none() {
        println!("Skipping hardware test: TEST_PORT not set");
    }
    port
}

#[test]
#[ignore] // Run with --ignored flag
fn loopback_echoes_written_lines() {
    let Some(port) = skip_without_hardware() else {
        return;
    };

    let config = ReaderConfig::new(&port).baud_rate(get_test_baud());
    let reader = Arc::new(LineReader::open(config).expect("open test port"));

    let (tx, rx) = mpsc::channel();
    let worker = {
        let reader = Arc::clone(&reader);
        thread::spawn(move || {
            reader.read_lines_loop(
                |line| {
                    let _ = tx.send(line.to_vec());
                },
                |err| panic!("read error: {err}"),
            )
        })
    };

    for i in 0..50 {
        let payload = format!("LOOP,{i}");
        reader.write_line(payload.as_bytes(), b"\r\n").expect("write");
        let echoed = rx.recv_timeout(Duration::from_secs(1)).expect("echo");
        assert_eq!(echoed, payload.into_bytes());
    }

    reader.close().expect("close");
    worker.join().expect("loop exits after close");
}

#[test]
#[ignore]
fn close_is_prompt_on_a_real_port() {
    let Some(port) = skip_without_hardware() else {
        return;
    };

    let reader = Arc::new(LineReader::open(ReaderConfig::new(&port)).expect("open test port"));
    let worker = {
        let reader = Arc::clone(&reader);
        thread::spawn(move || reader.read_line())
    };
    thread::sleep(Duration::from_millis(100));

    let started = std::time::Instant::now();
    reader.close().expect("close");
    // A chatty device may complete the line first; only latency matters here.
    let _ = worker.join().expect("join");
    assert!(started.elapsed() < Duration::from_millis(200));
}
