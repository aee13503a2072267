use clap::{Parser, Subcommand};
use serial_lines::config::{unescape, Config, ConfigLoader};
use serial_lines::{logging, LineReader, ReaderError};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Low-latency line reader for serial instruments.",
    long_about = "Reads delimiter-framed lines from a serial device in raw mode and prints them as they arrive. Settings come from serial-lines.toml, SERIAL_LINES_* environment variables and the flags below, in increasing priority."
)]
struct Args {
    /// Configuration file (overrides the standard search path).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serial device path.
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Baud rate (9600, 19200, 38400, 57600, 115200, 230400).
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    /// Line delimiter; escapes such as \r\n are expanded.
    #[arg(long, global = true)]
    delimiter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List serial ports present on this system.
    List,
    /// Print lines from the device until it closes or fails.
    Tail {
        /// Stop after this many lines.
        #[arg(short = 'n', long)]
        count: Option<usize>,
        /// Stop after this many seconds.
        #[arg(short = 't', long)]
        duration: Option<f64>,
    },
    /// Write a single line to the device.
    Send {
        /// Text to send.
        text: String,
        /// Terminator appended to the text; defaults to the line delimiter.
        #[arg(long)]
        terminator: Option<String>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("serial-lines: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("serial-lines: invalid log filter: {e}");
        return ExitCode::FAILURE;
    }

    let result = match args.command {
        Command::List => list_ports(),
        Command::Tail { count, duration } => match duration.map(Duration::try_from_secs_f64).transpose() {
            Ok(duration) => tail(&config, count, duration),
            Err(e) => Err(format!("invalid --duration: {e}").into()),
        },
        Command::Send { text, terminator } => {
            let terminator = terminator
                .map(|t| unescape(&t))
                .unwrap_or_else(|| config.serial.delimiter.clone());
            send(&config, &text, &terminator)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("serial-lines: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?.into_config(),
        None => ConfigLoader::load()?.into_config(),
    };

    if let Some(device) = &args.device {
        config.serial.device = device.clone();
    }
    if let Some(baud) = args.baud {
        config.serial.baud_rate = baud;
    }
    if let Some(delimiter) = &args.delimiter {
        config.serial.delimiter = unescape(delimiter);
    }
    config.validate()?;
    Ok(config)
}

fn list_ports() -> Result<(), Box<dyn std::error::Error>> {
    let ports = serialport::available_ports()?;
    if ports.is_empty() {
        println!("No serial ports found.");
    }
    for port in ports {
        match port.port_type {
            serialport::SerialPortType::UsbPort(usb) => println!(
                "{}\tUSB {:04x}:{:04x} {}",
                port.port_name,
                usb.vid,
                usb.pid,
                usb.product.unwrap_or_default()
            ),
            other => println!("{}\t{:?}", port.port_name, other),
        }
    }
    Ok(())
}

fn tail(
    config: &Config,
    count: Option<usize>,
    duration: Option<Duration>,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader = Arc::new(LineReader::open(config.serial.to_reader_config())?);

    // Wakes early when the loop ends so the watchdog does not outlive it.
    let (done_tx, done_rx) = mpsc::channel::<()>();
    if let Some(limit) = duration {
        let reader = Arc::clone(&reader);
        thread::Builder::new()
            .name("tail-watchdog".into())
            .spawn(move || {
                if done_rx.recv_timeout(limit).is_err() {
                    info!(?limit, "duration elapsed, closing");
                    let _ = reader.close();
                }
            })?;
    }

    let worker = {
        let reader = Arc::clone(&reader);
        thread::Builder::new().name("tail-reader".into()).spawn(move || {
            let stdout = std::io::stdout();
            let mut seen = 0usize;
            let mut failure: Option<ReaderError> = None;
            reader.read_lines_loop(
                |line| {
                    let mut out = stdout.lock();
                    let _ = out.write_all(line);
                    let _ = out.write_all(b"\n");
                    let _ = out.flush();
                    seen += 1;
                    if count.is_some_and(|n| seen >= n) {
                        let _ = reader.close();
                    }
                },
                |err| failure = Some(err),
            );
            failure
        })?
    };

    let failure = worker.join().map_err(|_| "reader thread panicked")?;
    drop(done_tx);
    reader.close()?;

    match failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn send(config: &Config, text: &str, terminator: &str) -> Result<(), Box<dyn std::error::Error>> {
    let reader = LineReader::open(config.serial.to_reader_config())?;
    reader.write_line(text.as_bytes(), terminator.as_bytes())?;
    reader.close()?;
    Ok(())
}
