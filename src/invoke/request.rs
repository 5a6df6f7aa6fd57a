// src/invoke/request.rs

use std::os::fd::RawFd;
use std::time::Duration;

/// Argv placeholder replaced by the `/dev/fd/<n>` path of the side channel.
pub const SIDE_CHANNEL_PLACEHOLDER: &str = "{side_channel}";

/// Argv placeholder replaced by the request's side-channel kind tag.
pub const SIDE_CHANNEL_KIND_PLACEHOLDER: &str = "{side_channel_kind}";

/// Path through which a child reaches an inherited descriptor.
pub fn fd_path(fd: RawFd) -> String {
    format!("/dev/fd/{fd}")
}

/// One tool invocation: what to run, what to feed it, and how long to wait.
///
/// Built once by the caller with the `with_*` methods and never mutated by
/// the engine afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    argv: Vec<String>,
    input: Vec<u8>,
    timeout: Option<Duration>,
    max_runtime: Option<Duration>,
    side_channel_kind: String,
    merge_stderr: bool,
}

impl InvocationRequest {
    /// Start a request from an argv template. Element 0 is the program.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            input: Vec::new(),
            timeout: None,
            max_runtime: None,
            side_channel_kind: String::new(),
            merge_stderr: false,
        }
    }

    pub fn with_input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = input.into();
        self
    }

    /// Watchdog budget: how long the tool may go without transferring a
    /// single byte before it is considered hung. `None` waits forever.
    pub fn with_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.timeout = timeout.into();
        self
    }

    /// Absolute cap on wall-clock runtime, regardless of progress.
    pub fn with_max_runtime(mut self, max_runtime: impl Into<Option<Duration>>) -> Self {
        self.max_runtime = max_runtime.into();
        self
    }

    pub fn with_side_channel_kind(mut self, kind: impl Into<String>) -> Self {
        self.side_channel_kind = kind.into();
        self
    }

    /// Redirect the child's stderr onto the text channel.
    pub fn with_merge_stderr(mut self, merge: bool) -> Self {
        self.merge_stderr = merge;
        self
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Program name (argv[0]), or `""` for an empty template.
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }

    pub fn input(&self) -> &[u8] {
        &self.input
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn max_runtime(&self) -> Option<Duration> {
        self.max_runtime
    }

    pub fn side_channel_kind(&self) -> &str {
        &self.side_channel_kind
    }

    pub fn merge_stderr(&self) -> bool {
        self.merge_stderr
    }

    /// Whether any argument mentions [`SIDE_CHANNEL_PLACEHOLDER`].
    pub fn references_side_channel(&self) -> bool {
        self.argv
            .iter()
            .any(|arg| arg.contains(SIDE_CHANNEL_PLACEHOLDER))
    }

    /// Substitute the placeholders in every argument.
    pub fn resolve_argv(&self, side_channel_path: &str) -> Vec<String> {
        self.argv
            .iter()
            .map(|arg| {
                arg.replace(SIDE_CHANNEL_PLACEHOLDER, side_channel_path)
                    .replace(SIDE_CHANNEL_KIND_PLACEHOLDER, &self.side_channel_kind)
            })
            .collect()
    }
}

/// Successful outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    /// Text channel, decoded as UTF-8 with invalid sequences replaced.
    pub text: String,
    /// Side channel bytes, exactly as the tool wrote them.
    pub binary: Vec<u8>,
    pub exit_code: i32,
}

/// Engine tuning knobs. These are not part of a request because they do not
/// change what is run, only how the engine waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Upper bound on a single readiness wait, so child exit is observed
    /// promptly even without a timeout.
    pub poll_interval: Duration,
    /// How long a child gets between SIGTERM and SIGKILL.
    pub kill_grace: Duration,
    /// How long to wait for the child to be reaped before giving up with a
    /// cleanup failure.
    pub reap_limit: Duration,
    /// Size of a single read from either output channel.
    pub read_chunk: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            kill_grace: Duration::from_millis(200),
            reap_limit: Duration::from_secs(5),
            read_chunk: 64 * 1024,
        }
    }
}
