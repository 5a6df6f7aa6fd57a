// src/invoke/process.rs

//! Live child process plus the parent's ends of its three pipes.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tokio::net::unix::pipe;
use tokio::process::Child;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Owns everything one invocation acquired from the OS.
///
/// - `stdin` is the write end of the child's input pipe. It is closed once all
///   input has been sent, which the child sees as end of input.
/// - `stdout` and `side` are the read ends of the text and binary channels.
///   Each is dropped when it reports end of stream.
/// - `exit_status` is set exactly once, when the child is reaped.
///
/// Dropping the handle closes any descriptor still open and, through
/// `kill_on_drop`, kills a child that was never reaped.
#[derive(Debug)]
pub struct ProcessHandle {
    pub(crate) program: String,
    pub(crate) pid: Option<u32>,
    pub(crate) child: Child,
    pub(crate) stdin: Option<pipe::Sender>,
    pub(crate) stdout: Option<pipe::Receiver>,
    pub(crate) side: Option<pipe::Receiver>,
    pub(crate) exit_status: Option<ExitStatus>,
}

impl ProcessHandle {
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    /// Number of the three descriptors still open.
    pub fn open_descriptors(&self) -> usize {
        usize::from(self.stdin.is_some())
            + usize::from(self.stdout.is_some())
            + usize::from(self.side.is_some())
    }

    /// Close the input pipe. Returns `true` only for the call that closed it.
    pub(crate) fn close_stdin(&mut self) -> bool {
        if self.stdin.take().is_some() {
            debug!(pid = self.pid, "closed tool stdin");
            true
        } else {
            false
        }
    }

    /// Drop every descriptor that is still open.
    pub(crate) fn close_all(&mut self) {
        let open = self.open_descriptors();
        self.stdin = None;
        self.stdout = None;
        self.side = None;
        if open > 0 {
            debug!(pid = self.pid, open, "closed remaining tool descriptors");
        }
    }

    pub(crate) fn record_exit(&mut self, status: ExitStatus) {
        if self.exit_status.is_none() {
            debug!(pid = self.pid, %status, "tool process reaped");
            self.exit_status = Some(status);
        }
    }

    /// Non-blocking check for child exit, reaping it if it has.
    pub(crate) fn poll_exit(&mut self) -> io::Result<Option<ExitStatus>> {
        if self.exit_status.is_some() {
            return Ok(self.exit_status);
        }
        if let Some(status) = self.child.try_wait()? {
            self.record_exit(status);
        }
        Ok(self.exit_status)
    }

    /// Wait (bounded by `limit`) for a child that is expected to exit on its
    /// own.
    pub(crate) async fn reap(&mut self, limit: Duration) -> io::Result<ExitStatus> {
        if let Some(status) = self.exit_status {
            return Ok(status);
        }
        match timeout(limit, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                self.record_exit(status);
                Ok(status)
            }
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("tool process was not reaped within {limit:?}"),
            )),
        }
    }

    /// Graceful-then-forced termination: SIGTERM, up to `grace` to exit,
    /// SIGKILL, then up to `reap_limit` to be reaped. Not retried.
    pub(crate) async fn terminate(
        &mut self,
        grace: Duration,
        reap_limit: Duration,
    ) -> io::Result<ExitStatus> {
        if let Some(status) = self.poll_exit()? {
            return Ok(status);
        }

        if let Some(raw) = self.pid {
            info!(pid = raw, program = %self.program, "sending SIGTERM to tool process");
            match kill(Pid::from_raw(raw as i32), Signal::SIGTERM) {
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(e) => warn!(pid = raw, error = %e, "failed to send SIGTERM"),
            }
        }

        if let Ok(status) = timeout(grace, self.child.wait()).await {
            let status = status?;
            self.record_exit(status);
            return Ok(status);
        }

        warn!(
            pid = self.pid,
            grace = ?grace,
            "tool ignored SIGTERM; sending SIGKILL"
        );
        self.child.start_kill()?;
        self.reap(reap_limit).await
    }
}
