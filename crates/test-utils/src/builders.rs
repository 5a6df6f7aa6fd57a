#![allow(dead_code)]

use std::collections::BTreeMap;

use sidepipe::config::{ConfigFile, ConfigSection, RawConfigFile, ToolConfig};
use sidepipe::invoke::InvocationRequest;
use sidepipe::presets::GhostscriptOptions;

/// Request running `script` under `sh -c`, with the side-channel path as `$1`
/// and the side-channel kind as `$2`.
pub fn shell_request(script: &str) -> InvocationRequest {
    InvocationRequest::new([
        "sh",
        "-c",
        script,
        "sh",
        "{side_channel}",
        "{side_channel_kind}",
    ])
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                tool: BTreeMap::new(),
            },
        }
    }

    pub fn with_tool(mut self, name: &str, tool: ToolConfig) -> Self {
        self.config.tool.insert(name.to_string(), tool);
        self
    }

    pub fn with_default_timeout(mut self, timeout: &str) -> Self {
        self.config.config.timeout = Some(timeout.to_string());
        self
    }

    pub fn with_default_max_runtime(mut self, max_runtime: &str) -> Self {
        self.config.config.max_runtime = Some(max_runtime.to_string());
        self
    }

    pub fn with_kill_grace(mut self, grace: &str) -> Self {
        self.config.config.kill_grace = grace.to_string();
        self
    }

    pub fn with_read_chunk(mut self, chunk: usize) -> Self {
        self.config.config.read_chunk = chunk;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ToolConfig`.
pub struct ToolConfigBuilder {
    tool: ToolConfig,
}

impl ToolConfigBuilder {
    pub fn argv(argv: &[&str]) -> Self {
        Self {
            tool: ToolConfig {
                argv: Some(argv.iter().map(|s| s.to_string()).collect()),
                ..ToolConfig::default()
            },
        }
    }

    pub fn ghostscript(options: GhostscriptOptions) -> Self {
        Self {
            tool: ToolConfig {
                ghostscript: Some(options),
                ..ToolConfig::default()
            },
        }
    }

    pub fn kind(mut self, kind: &str) -> Self {
        self.tool.side_channel_kind = Some(kind.to_string());
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.tool.timeout = Some(timeout.to_string());
        self
    }

    pub fn max_runtime(mut self, max_runtime: &str) -> Self {
        self.tool.max_runtime = Some(max_runtime.to_string());
        self
    }

    pub fn merge_stderr(mut self, merge: bool) -> Self {
        self.tool.merge_stderr = merge;
        self
    }

    pub fn build(self) -> ToolConfig {
        self.tool
    }
}
