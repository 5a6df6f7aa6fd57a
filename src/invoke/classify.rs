// src/invoke/classify.rs

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

/// Final verdict on one invocation, decided once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    ToolFailure { exit_code: i32 },
    TimeoutExceeded,
    SpawnError,
}

/// Shell-style exit code: the process's own code, or `128 + signal` for a
/// child that was killed by a signal.
pub fn exit_code(status: &ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => -1,
    }
}

/// Classify a finished invocation.
///
/// `exit_code` is `None` when the child never started. A watchdog expiry
/// wins over whatever status the terminated child reported.
pub fn classify(exit_code: Option<i32>, watchdog_fired: bool) -> Classification {
    match (exit_code, watchdog_fired) {
        (None, _) => Classification::SpawnError,
        (Some(_), true) => Classification::TimeoutExceeded,
        (Some(0), false) => Classification::Success,
        (Some(code), false) => Classification::ToolFailure { exit_code: code },
    }
}
