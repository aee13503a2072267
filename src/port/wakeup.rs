//! Self-pipe used to interrupt a blocked readiness wait.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

/// A pipe pair that carries cancellation only, never payload.
///
/// Both ends are non-blocking and close-on-exec. Writing one byte makes the
/// read end readable, which any `poll` including it observes immediately.
#[derive(Debug)]
pub(crate) struct WakeupSignal {
    read: File,
    write: File,
}

impl WakeupSignal {
    pub(crate) fn new() -> io::Result<Self> {
        let mut fds: [RawFd; 2] = [-1; 2];
        // SAFETY: `fds` has room for the two descriptors pipe() writes.
        if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: pipe() succeeded, so both descriptors are open and owned by us.
        let (read, write) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };
        set_nonblocking_cloexec(read.as_raw_fd())?;
        set_nonblocking_cloexec(write.as_raw_fd())?;

        Ok(Self {
            read: File::from(read),
            write: File::from(write),
        })
    }

    /// Make the read end ready. A full pipe already counts as signalled.
    pub(crate) fn notify(&self) -> io::Result<()> {
        match (&self.write).write(&[1]) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Consume one pending notification, if any.
    pub(crate) fn drain(&self) -> io::Result<()> {
        let mut byte = [0u8; 1];
        match (&self.read).read(&mut byte) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// The end registered with the readiness wait.
    pub(crate) fn as_fd(&self) -> BorrowedFd<'_> {
        self.read.as_fd()
    }

    /// Split into (read end, write end) for ordered teardown.
    pub(crate) fn into_parts(self) -> (OwnedFd, OwnedFd) {
        (OwnedFd::from(self.read), OwnedFd::from(self.write))
    }
}

fn set_nonblocking_cloexec(fd: RawFd) -> io::Result<()> {
    // SAFETY: only descriptor and status flags of an owned descriptor are touched.
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags < 0 || libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
            return Err(io::Error::last_os_error());
        }
        let fd_flags = libc::fcntl(fd, libc::F_GETFD);
        if fd_flags < 0 || libc::fcntl(fd, libc::F_SETFD, fd_flags | libc::FD_CLOEXEC) < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}
