// src/invoke/launcher.rs

//! Pipe setup and spawning of the tool process.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::process::Stdio;

use nix::fcntl::{FcntlArg, FdFlag, OFlag, fcntl};
use nix::unistd::{dup2, pipe2};
use tokio::net::unix::pipe;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::InvocationError;
use crate::invoke::process::ProcessHandle;
use crate::invoke::request::{InvocationRequest, fd_path};

/// Spawn the tool described by `request`.
///
/// All three pipes are created close-on-exec, so a concurrent invocation in
/// the same process can never inherit them. The side-channel write end is
/// made inheritable only inside the forked child, just before exec. Every
/// descriptor opened here is owned, so an early return closes it.
pub fn launch(request: &InvocationRequest) -> Result<ProcessHandle, InvocationError> {
    let program = request.program().to_string();
    let spawn_error = |source: io::Error| InvocationError::Spawn {
        program: program.clone(),
        source,
    };

    if program.is_empty() {
        return Err(spawn_error(io::Error::new(
            io::ErrorKind::InvalidInput,
            "argv is empty",
        )));
    }

    let (stdin_read, stdin_write) = cloexec_pipe().map_err(spawn_error)?;
    let (stdout_read, stdout_write) = cloexec_pipe().map_err(spawn_error)?;
    let (side_read, side_write) = cloexec_pipe().map_err(spawn_error)?;
    let side_write = above_stdio(side_write).map_err(spawn_error)?;

    let side_fd = side_write.as_raw_fd();
    let argv = request.resolve_argv(&fd_path(side_fd));
    let merge_stderr = request.merge_stderr();

    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..])
        .stdin(Stdio::from(stdin_read))
        .stdout(Stdio::from(stdout_write))
        .kill_on_drop(true);
    if !merge_stderr {
        cmd.stderr(Stdio::inherit());
    }

    // SAFETY: the closure only calls fcntl(2) and dup2(2), both
    // async-signal-safe, and allocates nothing.
    unsafe {
        cmd.pre_exec(move || inherit_in_child(side_fd, merge_stderr));
    }

    let child = cmd.spawn().map_err(spawn_error)?;
    let pid = child.id();

    // The child holds its own copies now. Dropping ours is what lets the
    // parent see end of stream once the child exits.
    drop(cmd);
    drop(side_write);

    let stdin = pipe::Sender::from_owned_fd(stdin_write).map_err(spawn_error)?;
    let stdout = pipe::Receiver::from_owned_fd(stdout_read).map_err(spawn_error)?;
    let side = pipe::Receiver::from_owned_fd(side_read).map_err(spawn_error)?;

    info!(
        program = %program,
        pid,
        side_channel = %fd_path(side_fd),
        kind = %request.side_channel_kind(),
        input_bytes = request.input().len(),
        "spawned tool process"
    );
    debug!(?argv, "resolved tool argv");

    Ok(ProcessHandle {
        program,
        pid,
        child,
        stdin: Some(stdin),
        stdout: Some(stdout),
        side: Some(side),
        exit_status: None,
    })
}

/// `(read, write)` pipe with `O_CLOEXEC` set atomically on both ends.
fn cloexec_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    pipe2(OFlag::O_CLOEXEC).map_err(io::Error::from)
}

/// The child's stdio setup would clobber a side-channel descriptor numbered
/// 0..=2 (possible when the parent runs with closed stdio).
fn above_stdio(fd: OwnedFd) -> io::Result<OwnedFd> {
    if fd.as_raw_fd() > 2 {
        return Ok(fd);
    }
    let raw = fcntl(fd.as_raw_fd(), FcntlArg::F_DUPFD_CLOEXEC(3)).map_err(io::Error::from)?;
    // SAFETY: F_DUPFD_CLOEXEC returned a fresh descriptor nobody else owns.
    Ok(unsafe { OwnedFd::from_raw_fd(raw) })
}

/// Runs in the forked child between fork and exec.
fn inherit_in_child(side_fd: RawFd, merge_stderr: bool) -> io::Result<()> {
    fcntl(side_fd, FcntlArg::F_SETFD(FdFlag::empty())).map_err(io::Error::from)?;
    if merge_stderr {
        dup2(1, 2).map_err(io::Error::from)?;
    }
    Ok(())
}
