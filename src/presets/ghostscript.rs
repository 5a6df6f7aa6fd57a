// src/presets/ghostscript.rs

//! Ghostscript invocation preset.
//!
//! Ghostscript prints diagnostics and anything the program writes with
//! `print`/`==` on stdout, so rendered pages go to the side channel through
//! `-sOutputFile`. `-dBATCH` stops it from reading stdin implicitly, which is
//! why `/dev/stdin` is named explicitly as the input file.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::invoke::request::{InvocationRequest, SIDE_CHANNEL_PLACEHOLDER};
use crate::types::GraphicsFormat;

static DIMENSIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)[x×:](\d+)$").expect("valid papersize regex"));

static NAMED_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("valid paper name regex"));

/// Options for a Ghostscript render, as found under `ghostscript = { ... }`
/// in a tool profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GhostscriptOptions {
    #[serde(default)]
    pub format: GraphicsFormat,

    /// Output resolution in pixels per inch; Ghostscript's default (72) when
    /// unset.
    #[serde(default)]
    pub dpi: Option<u32>,

    /// A predefined size (`a4`, `letter`, ...) or explicit dimensions in
    /// points (`595x842`).
    #[serde(default)]
    pub papersize: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaperSize {
    Named(String),
    Points { width: u32, height: u32 },
}

pub fn parse_papersize(s: &str) -> Result<PaperSize, String> {
    let s = s.trim();
    if let Some(caps) = DIMENSIONS.captures(s) {
        let width = caps[1]
            .parse()
            .map_err(|e| format!("invalid paper width '{}': {}", &caps[1], e))?;
        let height = caps[2]
            .parse()
            .map_err(|e| format!("invalid paper height '{}': {}", &caps[2], e))?;
        return Ok(PaperSize::Points { width, height });
    }
    if NAMED_SIZE.is_match(s) {
        return Ok(PaperSize::Named(s.to_lowercase()));
    }
    Err(format!(
        "invalid papersize '{s}'; expected a name like \"a4\" or dimensions like \"595x842\""
    ))
}

impl GhostscriptOptions {
    pub fn validate(&self) -> Result<(), String> {
        if self.dpi == Some(0) {
            return Err("ghostscript dpi must be >= 1".to_string());
        }
        if let Some(ref size) = self.papersize {
            parse_papersize(size)?;
        }
        Ok(())
    }

    pub fn argv(&self) -> Result<Vec<String>, String> {
        let mut argv = vec![
            "gs".to_string(),
            "-q".to_string(),
            "-dBATCH".to_string(),
            "-dNOPROMPT".to_string(),
            format!("-sDEVICE={}", self.format.device()),
            format!("-sOutputFile={SIDE_CHANNEL_PLACEHOLDER}"),
        ];
        if let Some(dpi) = self.dpi {
            argv.push(format!("-r{dpi}x{dpi}"));
        }
        if let Some(PaperSize::Named(name)) = self.paper()? {
            argv.push(format!("-sPAPERSIZE={name}"));
        }
        argv.push("/dev/stdin".to_string());
        Ok(argv)
    }

    /// PostScript to run ahead of the caller's program. Explicit dimensions
    /// cannot be expressed with `-sPAPERSIZE`, so they become a
    /// `setpagedevice` call instead.
    pub fn prelude(&self) -> Result<String, String> {
        match self.paper()? {
            Some(PaperSize::Points { width, height }) => Ok(format!(
                "<</PageSize [{width} {height}] /ImagingBBox null>> setpagedevice\n"
            )),
            _ => Ok(String::new()),
        }
    }

    /// Full request for rendering `program`.
    pub fn build_request(&self, program: &[u8]) -> Result<InvocationRequest, String> {
        self.validate()?;
        let mut input = self.prelude()?.into_bytes();
        input.extend_from_slice(program);
        Ok(InvocationRequest::new(self.argv()?)
            .with_input(input)
            .with_side_channel_kind(self.format.device()))
    }

    fn paper(&self) -> Result<Option<PaperSize>, String> {
        self.papersize.as_deref().map(parse_papersize).transpose()
    }
}
