//! Raw-mode configuration of a TTY device.

use super::baud::BaudRate;
use crate::error::{ReaderError, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::mem::MaybeUninit;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, BorrowedFd, RawFd};
use std::path::Path;
use tracing::debug;

/// Open `path` read-write and drive it into raw 8N1 mode at `baud`.
///
/// The device is opened non-blocking so the open itself cannot hang on
/// modem-control lines, then switched back to blocking once the attribute
/// block has been committed. Reads return as soon as one byte is available
/// (`VMIN = 1`, `VTIME = 0`).
///
/// On any failure the descriptor is closed before returning.
pub(crate) fn open_raw(path: &Path, baud: BaudRate) -> Result<File> {
    let device = OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
        .open(path)
        .map_err(|source| ReaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    let fd = device.as_raw_fd();

    let mut termios = get_attributes(fd).map_err(ReaderError::GetAttributes)?;
    make_raw(&mut termios, baud).map_err(ReaderError::SetAttributes)?;
    set_attributes(fd, &termios).map_err(ReaderError::SetAttributes)?;
    set_nonblocking(fd, false).map_err(ReaderError::BlockingMode)?;

    debug!(device = %path.display(), baud = baud.bps(), "configured raw mode");
    Ok(device)
}

fn make_raw(termios: &mut libc::termios, baud: BaudRate) -> io::Result<()> {
    use libc::{BRKINT, ICRNL, IGNBRK, IGNCR, INLCR, ISTRIP, IXON, PARMRK}; // iflags
    use libc::{CLOCAL, CREAD, CS8, CSIZE, PARENB}; // cflags
    use libc::{ECHO, ECHONL, ICANON, IEXTEN, ISIG}; // lflags
    use libc::{OPOST, VMIN, VTIME};

    termios.c_iflag &= !(IGNBRK | BRKINT | PARMRK | ISTRIP | INLCR | IGNCR | ICRNL | IXON);
    termios.c_oflag &= !OPOST;
    termios.c_lflag &= !(ECHO | ECHONL | ICANON | ISIG | IEXTEN);
    termios.c_cflag &= !(CSIZE | PARENB);
    termios.c_cflag |= CS8 | CREAD | CLOCAL;

    termios.c_cc[VMIN] = 1;
    termios.c_cc[VTIME] = 0;

    // SAFETY: `termios` is a valid, initialised attribute block.
    let rc = unsafe { libc::cfsetispeed(termios, baud.speed()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above.
    let rc = unsafe { libc::cfsetospeed(termios, baud.speed()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn get_attributes(fd: RawFd) -> io::Result<libc::termios> {
    let mut termios = MaybeUninit::<libc::termios>::uninit();
    // SAFETY: tcgetattr fully initialises the struct when it returns 0.
    let rc = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: checked rc above.
    Ok(unsafe { termios.assume_init() })
}

fn set_attributes(fd: RawFd, termios: &libc::termios) -> io::Result<()> {
    // SAFETY: `termios` points to a valid attribute block for the call's duration.
    let rc = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Make writes on `device` fail instead of waiting, and discard queued output.
///
/// A writer already sleeping in the kernel for buffer space wakes, sees the
/// non-blocking flag and returns `EAGAIN`.
pub(crate) fn abort_output(device: BorrowedFd<'_>) -> io::Result<()> {
    let fd = device.as_raw_fd();
    set_nonblocking(fd, true)?;
    // SAFETY: tcflush only discards queued data on a valid descriptor.
    if unsafe { libc::tcflush(fd, libc::TCOFLUSH) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn set_nonblocking(fd: RawFd, nonblocking: bool) -> io::Result<()> {
    // SAFETY: F_GETFL/F_SETFL only read and write descriptor status flags.
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        let flags = if nonblocking {
            flags | libc::O_NONBLOCK
        } else {
            flags & !libc::O_NONBLOCK
        };
        if libc::fcntl(fd, libc::F_SETFL, flags) < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}
