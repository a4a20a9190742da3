/// File descriptor closure for freshly forked workers
///
/// A forked worker inherits every descriptor the supervisor process had open,
/// including channel ends of other workers. Keeping them open would hide
/// end-of-channel from those workers' supervisors, so the worker closes
/// everything except stdio and its own channel.
/// - Prefer close_range
/// - Fallback to iterating /proc/self/fd
use crate::config::types::{ArenaError, Result};
use std::fs;
use std::os::unix::io::RawFd;

use nix::unistd::close;

/// Close every descriptor above stderr except `keep`.
pub fn close_inherited_fds(keep: RawFd) -> Result<()> {
    #[cfg(target_os = "linux")]
    {
        if try_close_range(keep) {
            return Ok(());
        }
    }

    close_fds_via_proc(keep)
}

#[cfg(target_os = "linux")]
fn try_close_range(keep: RawFd) -> bool {
    use std::os::raw::{c_int, c_uint};

    // close_range(2), Linux 5.9+
    const SYS_CLOSE_RANGE: libc::c_long = 436;

    let close_range = |first: c_uint, last: c_uint| -> bool {
        if first > last {
            return true;
        }
        unsafe { libc::syscall(SYS_CLOSE_RANGE, first, last, 0 as c_int) == 0 }
    };

    if keep < 3 {
        return close_range(3, c_uint::MAX);
    }
    let keep = keep as c_uint;
    close_range(3, keep - 1) && close_range(keep + 1, c_uint::MAX)
}

fn close_fds_via_proc(keep: RawFd) -> Result<()> {
    let mut failed = Vec::new();

    for fd in get_open_fds()? {
        if fd <= 2 || fd == keep {
            continue;
        }
        match close(fd) {
            Ok(()) | Err(nix::errno::Errno::EBADF) => {}
            Err(e) => failed.push(format!("fd {fd}: {e}")),
        }
    }

    if !failed.is_empty() {
        return Err(ArenaError::Process(format!(
            "Failed to close {} inherited FD(s): {}",
            failed.len(),
            failed.join(", ")
        )));
    }
    Ok(())
}

/// Get list of open file descriptors
pub fn get_open_fds() -> Result<Vec<i32>> {
    let fd_dir = "/proc/self/fd";

    let entries = fs::read_dir(fd_dir)
        .map_err(|e| ArenaError::Process(format!("Failed to read {}: {}", fd_dir, e)))?;

    let mut fds: Vec<i32> = entries
        .flatten()
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter_map(|name| name.parse::<i32>().ok())
        .collect();

    fds.sort();
    Ok(fds)
}
