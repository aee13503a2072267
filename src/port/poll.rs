//! Two-source readiness wait: the device and the wakeup signal.

use std::io;
use std::os::unix::io::{AsRawFd, BorrowedFd};
use std::time::{Duration, Instant};

/// Which sources became ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Readiness {
    /// The device has data, or has hung up / errored (a read will tell which).
    pub device: bool,
    /// A shutdown notification is pending.
    pub wakeup: bool,
}

/// Block until the device or the wakeup signal is ready.
///
/// `None` waits indefinitely. Returns `Ok(None)` if the timeout elapsed with
/// neither source ready. Interrupted waits are restarted with whatever is left
/// of the timeout.
pub(crate) fn wait(
    device: BorrowedFd<'_>,
    wakeup: BorrowedFd<'_>,
    timeout: Option<Duration>,
) -> io::Result<Option<Readiness>> {
    let mut fds = [
        libc::pollfd {
            fd: device.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        },
        libc::pollfd {
            fd: wakeup.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        },
    ];
    let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

    let ready = loop {
        let timeout_ms = poll_timeout(remaining(timeout, deadline, Instant::now()));
        // SAFETY: `fds` is a valid array of two pollfd entries whose descriptors
        // are kept open by the borrows for the duration of the call.
        let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
        if rc >= 0 {
            break rc;
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    };

    if ready == 0 {
        return Ok(None);
    }

    if fds.iter().any(|p| p.revents & libc::POLLNVAL != 0) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "descriptor is not open",
        ));
    }

    let readable = libc::POLLIN | libc::POLLHUP | libc::POLLERR;
    Ok(Some(Readiness {
        device: fds[0].revents & readable != 0,
        wakeup: fds[1].revents & readable != 0,
    }))
}

/// Time left before `deadline`. A timeout too large to form a deadline waits indefinitely.
fn remaining(
    timeout: Option<Duration>,
    deadline: Option<Instant>,
    now: Instant,
) -> Option<Duration> {
    match (timeout, deadline) {
        (Some(_), Some(deadline)) => Some(deadline.saturating_duration_since(now)),
        _ => None,
    }
}

/// Convert a timeout to poll's milliseconds, rounding sub-millisecond waits up.
fn poll_timeout(timeout: Option<Duration>) -> libc::c_int {
    match timeout {
        None => -1,
        Some(d) => {
            let mut ms = d.as_millis();
            if ms == 0 && !d.is_zero() {
                ms = 1;
            }
            ms.min(libc::c_int::MAX as u128) as libc::c_int
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_timeout_conversion() {
        assert_eq!(poll_timeout(None), -1);
        assert_eq!(poll_timeout(Some(Duration::ZERO)), 0);
        assert_eq!(poll_timeout(Some(Duration::from_micros(10))), 1);
        assert_eq!(poll_timeout(Some(Duration::from_millis(1500))), 1500);
        assert_eq!(
            poll_timeout(Some(Duration::from_secs(u64::MAX))),
            libc::c_int::MAX
        );
    }

    #[test]
    fn test_restarted_wait_uses_remaining_time() {
        let start = Instant::now();
        let timeout = Some(Duration::from_millis(100));
        let deadline = start.checked_add(Duration::from_millis(100));

        assert_eq!(remaining(timeout, deadline, start), timeout);
        assert_eq!(
            remaining(timeout, deadline, start + Duration::from_millis(60)),
            Some(Duration::from_millis(40))
        );
        // Past the deadline the restarted poll must not block at all.
        assert_eq!(
            remaining(timeout, deadline, start + Duration::from_millis(250)),
            Some(Duration::ZERO)
        );
        assert_eq!(poll_timeout(Some(Duration::ZERO)), 0);
        assert_eq!(remaining(None, None, start), None);
    }
}
