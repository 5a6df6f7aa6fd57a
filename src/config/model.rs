// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{Result, SidepipeError};
use crate::invoke::request::{EngineOptions, InvocationRequest};
use crate::presets::GhostscriptOptions;
use crate::types::parse_duration;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// timeout = "10s"
/// kill_grace = "200ms"
///
/// [tool.raw]
/// argv = ["sh", "-c", "cat > \"$1\"", "sh", "{side_channel}"]
/// side_channel_kind = "raw"
///
/// [tool.ps]
/// ghostscript = { format = "png", dpi = 150, papersize = "a4" }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Engine defaults from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tool profiles from `[tool.<name>]`, keyed by profile name.
    #[serde(default)]
    pub tool: BTreeMap<String, ToolConfig>,
}

/// Validated configuration. Only obtainable through
/// `ConfigFile::try_from(RawConfigFile)`, so every duration string in it is
/// known to parse.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub tool: BTreeMap<String, ToolConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, tool: BTreeMap<String, ToolConfig>) -> Self {
        Self { config, tool }
    }

    /// Engine tuning derived from `[config]`.
    pub fn engine_options(&self) -> EngineOptions {
        let defaults = EngineOptions::default();
        EngineOptions {
            poll_interval: parse_or(&self.config.poll_interval, defaults.poll_interval),
            kill_grace: parse_or(&self.config.kill_grace, defaults.kill_grace),
            reap_limit: parse_or(&self.config.reap_limit, defaults.reap_limit),
            read_chunk: self.config.read_chunk,
        }
    }

    /// Global watchdog budget for tools that do not set their own.
    pub fn default_timeout(&self) -> Option<Duration> {
        optional_duration(self.config.timeout.as_deref())
    }

    pub fn default_max_runtime(&self) -> Option<Duration> {
        optional_duration(self.config.max_runtime.as_deref())
    }

    /// Build the request for profile `name`, feeding it `input`.
    pub fn request_for(&self, name: &str, input: &[u8]) -> Result<InvocationRequest> {
        let tool = self
            .tool
            .get(name)
            .ok_or_else(|| SidepipeError::ToolNotFound(name.to_string()))?;

        let request = match (&tool.argv, &tool.ghostscript) {
            (Some(argv), None) => InvocationRequest::new(argv.iter().cloned()).with_input(input),
            (None, Some(gs)) => gs.build_request(input).map_err(SidepipeError::ConfigError)?,
            _ => {
                return Err(SidepipeError::ConfigError(format!(
                    "tool '{name}' must set exactly one of `argv` or `ghostscript`"
                )));
            }
        };

        let mut request = request
            .with_timeout(
                optional_duration(tool.timeout.as_deref()).or_else(|| self.default_timeout()),
            )
            .with_max_runtime(
                optional_duration(tool.max_runtime.as_deref())
                    .or_else(|| self.default_max_runtime()),
            )
            .with_merge_stderr(tool.merge_stderr);
        if let Some(ref kind) = tool.side_channel_kind {
            request = request.with_side_channel_kind(kind.clone());
        }
        Ok(request)
    }
}

fn parse_or(s: &str, fallback: Duration) -> Duration {
    parse_duration(s).unwrap_or(fallback)
}

fn optional_duration(s: Option<&str>) -> Option<Duration> {
    s.and_then(|s| parse_duration(s).ok())
}

/// `[config]` section: engine defaults shared by every tool.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Default watchdog budget (e.g. `"10s"`); unset means wait forever.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Default absolute runtime cap.
    #[serde(default)]
    pub max_runtime: Option<String>,

    /// Time between SIGTERM and SIGKILL.
    #[serde(default = "default_kill_grace")]
    pub kill_grace: String,

    /// Upper bound on a single readiness wait.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// How long to wait for a killed tool to be reaped.
    #[serde(default = "default_reap_limit")]
    pub reap_limit: String,

    /// Bytes per read from either output channel.
    #[serde(default = "default_read_chunk")]
    pub read_chunk: usize,
}

fn default_kill_grace() -> String {
    "200ms".to_string()
}

fn default_poll_interval() -> String {
    "100ms".to_string()
}

fn default_reap_limit() -> String {
    "5s".to_string()
}

fn default_read_chunk() -> usize {
    64 * 1024
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            timeout: None,
            max_runtime: None,
            kill_grace: default_kill_grace(),
            poll_interval: default_poll_interval(),
            reap_limit: default_reap_limit(),
            read_chunk: default_read_chunk(),
        }
    }
}

/// `[tool.<name>]` section.
///
/// Exactly one of `argv` and `ghostscript` must be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolConfig {
    /// Argv template; `{side_channel}` and `{side_channel_kind}` are
    /// substituted at launch.
    #[serde(default)]
    pub argv: Option<Vec<String>>,

    /// Use the Ghostscript preset instead of a literal argv.
    #[serde(default)]
    pub ghostscript: Option<GhostscriptOptions>,

    /// Tag describing what the tool writes to the side channel.
    #[serde(default)]
    pub side_channel_kind: Option<String>,

    /// Per-tool watchdog budget, overriding `[config].timeout`.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Per-tool runtime cap, overriding `[config].max_runtime`.
    #[serde(default)]
    pub max_runtime: Option<String>,

    /// Send the tool's stderr to the text channel.
    #[serde(default)]
    pub merge_stderr: bool,
}
