// src/config/validate.rs

use crate::config::model::{ConfigFile, ConfigSection, RawConfigFile, ToolConfig};
use crate::errors::{Result, SidepipeError};
use crate::invoke::request::SIDE_CHANNEL_PLACEHOLDER;
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SidepipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.tool))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tools(cfg)?;
    validate_global_config(&cfg.config)?;
    for (name, tool) in cfg.tool.iter() {
        validate_tool(name, tool)?;
    }
    Ok(())
}

fn ensure_has_tools(cfg: &RawConfigFile) -> Result<()> {
    if cfg.tool.is_empty() {
        return Err(SidepipeError::ConfigError(
            "config must contain at least one [tool.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(section: &ConfigSection) -> Result<()> {
    check_duration("[config].timeout", section.timeout.as_deref())?;
    check_duration("[config].max_runtime", section.max_runtime.as_deref())?;
    check_nonzero_duration("[config].kill_grace", &section.kill_grace)?;
    check_nonzero_duration("[config].poll_interval", &section.poll_interval)?;
    check_nonzero_duration("[config].reap_limit", &section.reap_limit)?;

    if section.read_chunk == 0 {
        return Err(SidepipeError::ConfigError(
            "[config].read_chunk must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_tool(name: &str, tool: &ToolConfig) -> Result<()> {
    match (&tool.argv, &tool.ghostscript) {
        (Some(argv), None) => validate_argv(name, argv)?,
        (None, Some(gs)) => gs
            .validate()
            .map_err(|e| SidepipeError::ConfigError(format!("tool '{name}': {e}")))?,
        (Some(_), Some(_)) => {
            return Err(SidepipeError::ConfigError(format!(
                "tool '{name}' sets both `argv` and `ghostscript`; pick one"
            )));
        }
        (None, None) => {
            return Err(SidepipeError::ConfigError(format!(
                "tool '{name}' needs either `argv` or `ghostscript`"
            )));
        }
    }

    check_duration(&format!("[tool.{name}].timeout"), tool.timeout.as_deref())?;
    check_duration(
        &format!("[tool.{name}].max_runtime"),
        tool.max_runtime.as_deref(),
    )?;
    Ok(())
}

fn validate_argv(name: &str, argv: &[String]) -> Result<()> {
    match argv.first() {
        None => {
            return Err(SidepipeError::ConfigError(format!(
                "tool '{name}' has an empty `argv`"
            )));
        }
        Some(program) if program.trim().is_empty() => {
            return Err(SidepipeError::ConfigError(format!(
                "tool '{name}' has an empty program name in `argv`"
            )));
        }
        Some(_) => {}
    }

    // Without the placeholder the tool has no way to reach the side channel.
    if !argv.iter().any(|a| a.contains(SIDE_CHANNEL_PLACEHOLDER)) {
        return Err(SidepipeError::ConfigError(format!(
            "tool '{name}' never references {SIDE_CHANNEL_PLACEHOLDER} in `argv`"
        )));
    }
    Ok(())
}

fn check_duration(field: &str, value: Option<&str>) -> Result<()> {
    if let Some(s) = value {
        parse_duration(s)
            .map_err(|e| SidepipeError::ConfigError(format!("{field}: {e}")))?;
    }
    Ok(())
}

fn check_nonzero_duration(field: &str, value: &str) -> Result<()> {
    let d = parse_duration(value)
        .map_err(|e| SidepipeError::ConfigError(format!("{field}: {e}")))?;
    if d.is_zero() {
        return Err(SidepipeError::ConfigError(format!(
            "{field} must be greater than zero"
        )));
    }
    Ok(())
}
