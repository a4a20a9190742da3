//! Worker process primitives: forking, group setup, non-cooperative kill, reaping.
//!
//! The supervisor never asks a worker to unwind. Termination is SIGKILL to
//! the worker's process group followed by a blocking reap, so anything the
//! bot spawned goes down with it.

use crate::config::types::{ArenaError, Result};
use crate::core::types::KillReport;
use crate::utils::fd_closure::close_inherited_fds;
use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, setpgid, ForkResult, Pid};
use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

fn to_process_error(prefix: &str, err: impl std::fmt::Display) -> ArenaError {
    ArenaError::Process(format!("{prefix}: {err}"))
}

/// Which side of a fork the caller is on.
pub enum Forked {
    Parent(Pid),
    Child,
}

/// Fork the current process.
///
/// # Safety
/// The child must restrict itself to the worker routine and leave through
/// [`exit_child`]; it must never return into the caller's stack frames.
pub unsafe fn fork_worker() -> Result<Forked> {
    match fork().map_err(|e| to_process_error("fork(worker)", e))? {
        ForkResult::Parent { child } => {
            // Both sides set the group so a kill issued before the child
            // runs still reaches it.
            let _ = setpgid(child, child);
            Ok(Forked::Parent(child))
        }
        ForkResult::Child => Ok(Forked::Child),
    }
}

/// Child-side setup: own process group, die with the parent, drop every
/// inherited descriptor except `channel_fd`, and keep bot panics off the
/// shared stderr (they are reported over the channel instead).
pub fn prepare_worker_process(channel_fd: RawFd) {
    let _ = setpgid(Pid::from_raw(0), Pid::from_raw(0));
    let _ = setup_parent_death_signal();
    let _ = close_inherited_fds(channel_fd);
    std::panic::set_hook(Box::new(|_| {}));
}

/// Leave a forked child without running the parent's exit handlers.
pub fn exit_child(code: i32) -> ! {
    unsafe { libc::_exit(code) }
}

/// PR_SET_PDEATHSIG: the kernel SIGKILLs the worker if the thread that
/// forked it goes away.
pub fn setup_parent_death_signal() -> Result<()> {
    #[cfg(target_os = "linux")]
    {
        use nix::sys::prctl;

        prctl::set_pdeathsig(Signal::SIGKILL)
            .map_err(|e| to_process_error("Failed to set parent death signal", e))?;
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    {
        Ok(())
    }
}

/// Wait up to `timeout` for `pid` to exit on its own. Returns true once the
/// process has exited (or is already gone).
///
/// The exited worker is left as a zombie so its pid, and with it the process
/// group id, stays reserved until [`kill_worker_group`] has signalled the
/// group and reaped it.
pub fn wait_for_exit(pid: Pid, timeout: Duration) -> bool {
    let started = Instant::now();
    loop {
        match peek_exit(pid) {
            Ok(true) => return true,
            Ok(false) => {
                if started.elapsed() >= timeout {
                    return false;
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => return true,
            Err(e) => {
                log::warn!("waitid({}) failed: {}", pid, e);
                return false;
            }
        }
    }
}

/// Non-blocking, non-reaping exit check (`waitid` with `WNOWAIT`).
fn peek_exit(pid: Pid) -> std::result::Result<bool, Errno> {
    let mut info: libc::siginfo_t = unsafe { std::mem::zeroed() };
    let rc = unsafe {
        libc::waitid(
            libc::P_PID,
            pid.as_raw() as libc::id_t,
            &mut info,
            libc::WEXITED | libc::WNOHANG | libc::WNOWAIT,
        )
    };
    if rc == -1 {
        return Err(Errno::last());
    }
    // WNOHANG leaves si_pid zeroed while the child is still running.
    Ok(unsafe { info.si_pid() } != 0)
}

fn reap_blocking(pid: Pid) -> std::result::Result<(), Errno> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, _)) | Ok(WaitStatus::Signaled(_, _, _)) => return Ok(()),
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => return Ok(()),
            Err(e) => return Err(e),
        }
    }
}

/// SIGKILL the worker's process group, falling back to the single pid, then
/// reap the worker.
///
/// The worker must not have been reaped yet: its pid names the group, and
/// only an unreaped leader keeps that id from being handed to another
/// process. `leader_exited` marks a worker that already left on its own;
/// the group is still killed to take down anything it spawned, but the
/// report does not count it as a forced kill.
pub fn kill_worker_group(pid: Pid, leader_exited: bool) -> KillReport {
    let mut report = KillReport::default();
    let start = Instant::now();

    match killpg(pid, Signal::SIGKILL) {
        Ok(()) => {
            report.kill_sent = !leader_exited;
            report.group_kill = true;
        }
        Err(Errno::ESRCH) if leader_exited => {}
        Err(group_err) => match kill(pid, Signal::SIGKILL) {
            Ok(()) => {
                report.kill_sent = !leader_exited;
                report
                    .notes
                    .push(format!("group SIGKILL fallback used: {group_err}"));
            }
            Err(Errno::ESRCH) => {}
            Err(e) => report.notes.push(format!("SIGKILL failed: {e}")),
        },
    }

    match reap_blocking(pid) {
        Ok(()) => report.reaped = true,
        Err(e) => report.notes.push(format!("waitpid(worker) failed: {e}")),
    }

    report.waited_ms = start.elapsed().as_millis() as u64;
    report
}

/// Signal-0 probe. A reaped worker reports false.
pub fn is_process_alive(pid: i32) -> bool {
    match kill(Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}
