// src/types.rs

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Graphics format produced on the side channel by the Ghostscript preset.
///
/// - `Png`: 24-bit colour PNG (`png16m` device), the default.
/// - `Pdf`: PDF (`pdfwrite` device).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsFormat {
    Png,
    Pdf,
}

impl GraphicsFormat {
    /// Ghostscript output device for this format.
    pub fn device(self) -> &'static str {
        match self {
            GraphicsFormat::Png => "png16m",
            GraphicsFormat::Pdf => "pdfwrite",
        }
    }
}

impl Default for GraphicsFormat {
    fn default() -> Self {
        GraphicsFormat::Png
    }
}

impl FromStr for GraphicsFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(GraphicsFormat::Png),
            "pdf" => Ok(GraphicsFormat::Pdf),
            other => Err(format!(
                "invalid graphics format: {other} (expected \"png\" or \"pdf\")"
            )),
        }
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{unit}'; expected ms, s, m, or h"
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: '{s}'"))
}
