use crate::bots::{BotRegistry, BotSettings};
use crate::config::types::{ArenaError, Result, SandboxLimits};
use crate::core::channel::{spawn_reader, write_message, ChannelEvent};
use crate::core::types::{KillReport, Request};
use crate::core::worker::run_worker_main;
use crate::kernel::process::{
    exit_child, fork_worker, kill_worker_group, prepare_worker_process, wait_for_exit, Forked,
};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use nix::unistd::Pid;
use serde_json::Value;
use std::os::unix::io::AsRawFd;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Exclusive ownership of one live worker: its pid and our end of the channel.
struct WorkerHandle {
    pid: Pid,
    writer: UnixStream,
    events: Receiver<ChannelEvent>,
    started: Instant,
}

/// Runs one bot in a forked worker process and talks to it over a private
/// socket pair.
///
/// Calls are strictly sequential. A call that times out kills the worker;
/// the supervisor never retries it.
pub struct Supervisor {
    bot_name: String,
    settings: BotSettings,
    registry: Arc<BotRegistry>,
    limits: SandboxLimits,
    handle: Option<WorkerHandle>,
    last_worker_pid: Option<i32>,
    last_kill_report: Option<KillReport>,
}

impl Supervisor {
    pub fn new(
        bot_name: &str,
        settings: BotSettings,
        registry: Arc<BotRegistry>,
        limits: SandboxLimits,
    ) -> Self {
        Self {
            bot_name: bot_name.to_string(),
            settings,
            registry,
            limits,
            handle: None,
            last_worker_pid: None,
            last_kill_report: None,
        }
    }

    pub fn bot_name(&self) -> &str {
        &self.bot_name
    }

    pub fn is_alive(&self) -> bool {
        self.handle.is_some()
    }

    /// Pid of the current worker, or of the most recent one after it is gone.
    pub fn worker_pid(&self) -> Option<i32> {
        self.handle
            .as_ref()
            .map(|h| h.pid.as_raw())
            .or(self.last_worker_pid)
    }

    pub fn last_kill_report(&self) -> Option<&KillReport> {
        self.last_kill_report.as_ref()
    }

    /// Fork a fresh worker and wait for its readiness message.
    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }

        let (parent_end, child_end) = UnixStream::pair()?;

        let pid = match unsafe { fork_worker()? } {
            Forked::Child => {
                drop(parent_end);
                prepare_worker_process(child_end.as_raw_fd());
                let code = run_worker_main(child_end, &self.registry, &self.bot_name, &self.settings);
                exit_child(code);
            }
            Forked::Parent(pid) => pid,
        };
        drop(child_end);
        self.last_worker_pid = Some(pid.as_raw());

        let reader = match parent_end.try_clone() {
            Ok(reader) => reader,
            Err(e) => {
                self.last_kill_report = Some(kill_worker_group(pid, false));
                return Err(e.into());
            }
        };
        let events = match spawn_reader(reader) {
            Ok(events) => events,
            Err(e) => {
                self.last_kill_report = Some(kill_worker_group(pid, false));
                return Err(e);
            }
        };

        log::debug!("worker {} forked for bot '{}'", pid, self.bot_name);

        let failure = match events.recv_timeout(self.limits.start_timeout) {
            Ok(ChannelEvent::Message(msg)) if msg.ok => None,
            Ok(ChannelEvent::Message(msg)) => Some(ArenaError::StartupError(format!(
                "Bot '{}' failed to start:\n{}",
                self.bot_name,
                msg.error.unwrap_or_else(|| "unknown error".to_string())
            ))),
            Ok(ChannelEvent::Malformed(detail)) => Some(ArenaError::StartupError(format!(
                "Bot '{}' failed to start:\n{}",
                self.bot_name, detail
            ))),
            Ok(ChannelEvent::Closed) | Err(RecvTimeoutError::Disconnected) => {
                Some(ArenaError::StartupError(format!(
                    "Bot '{}' failed to start:\nworker exited before reporting readiness",
                    self.bot_name
                )))
            }
            Err(RecvTimeoutError::Timeout) => Some(ArenaError::StartupTimeout(format!(
                "Bot '{}' failed to start in time",
                self.bot_name
            ))),
        };

        if let Some(err) = failure {
            log::warn!("worker {} for bot '{}' did not start: {}", pid, self.bot_name, err);
            self.last_kill_report = Some(kill_worker_group(pid, false));
            return Err(err);
        }

        log::info!("worker {} ready for bot '{}'", pid, self.bot_name);
        self.handle = Some(WorkerHandle {
            pid,
            writer: parent_end,
            events,
            started: Instant::now(),
        });
        Ok(())
    }

    /// Invoke `method` on the bot and wait up to `timeout` for its answer.
    pub fn call(&mut self, method: &str, args: Vec<Value>, timeout: Duration) -> Result<Value> {
        let handle = self.handle.as_mut().ok_or(ArenaError::NotStarted)?;

        log::debug!("worker {} <- {}()", handle.pid, method);
        if let Err(e) = write_message(&mut handle.writer, &Request::call(method, args)) {
            self.kill();
            return Err(self.call_error(method, format!("failed to send request: {e}")));
        }

        match handle.events.recv_timeout(timeout) {
            Ok(ChannelEvent::Message(msg)) if msg.ok => Ok(msg.result.unwrap_or(Value::Null)),
            Ok(ChannelEvent::Message(msg)) => Err(self.call_error(
                method,
                msg.error.unwrap_or_else(|| "Unknown error".to_string()),
            )),
            Ok(ChannelEvent::Malformed(detail)) => {
                self.kill();
                Err(self.call_error(method, format!("malformed response: {detail}")))
            }
            Ok(ChannelEvent::Closed) | Err(RecvTimeoutError::Disconnected) => {
                self.kill();
                Err(self.call_error(method, "worker exited unexpectedly".to_string()))
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "bot '{}' timed out after {:?} in {}(); killing worker",
                    self.bot_name,
                    timeout,
                    method
                );
                self.kill();
                Err(ArenaError::CallTimeout {
                    bot: self.bot_name.clone(),
                    method: method.to_string(),
                })
            }
        }
    }

    /// Call with the configured per-call timeout.
    pub fn call_default(&mut self, method: &str, args: Vec<Value>) -> Result<Value> {
        let timeout = self.limits.call_timeout;
        self.call(method, args, timeout)
    }

    /// Ask the worker to exit, give it `stop_timeout`, then kill and reap it.
    /// Safe to call repeatedly; never fails.
    pub fn stop(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };

        let exited = match write_message(&mut handle.writer, &Request::Stop) {
            Ok(()) => wait_for_exit(handle.pid, self.limits.stop_timeout),
            Err(e) => {
                log::debug!("stop request to worker {} failed: {}", handle.pid, e);
                false
            }
        };

        let report = kill_worker_group(handle.pid, exited);
        log::info!(
            "worker {} for bot '{}' stopped after {:?} (graceful: {})",
            handle.pid,
            self.bot_name,
            handle.started.elapsed(),
            exited
        );
        self.last_kill_report = Some(report);
    }

    /// Non-cooperative termination of the current worker.
    fn kill(&mut self) {
        if let Some(handle) = self.handle.take() {
            let report = kill_worker_group(handle.pid, false);
            if !report.notes.is_empty() {
                log::warn!("forced kill of worker {}: {}", handle.pid, report.notes.join("; "));
            }
            self.last_kill_report = Some(report);
        }
    }

    fn call_error(&self, method: &str, message: String) -> ArenaError {
        ArenaError::CallError {
            bot: self.bot_name.clone(),
            method: method.to_string(),
            message,
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("bot_name", &self.bot_name)
            .field("worker_pid", &self.worker_pid())
            .field("alive", &self.is_alive())
            .finish()
    }
}
