// src/output.rs

//! Hands a finished invocation's channels to their destinations: text to a
//! writer (stdout in production), the binary payload to a file.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::{info, warn};

pub fn write_text<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    out.write_all(text.as_bytes())?;
    out.flush()
}

/// Write `binary` to `path`. Returns whether anything was written.
///
/// An empty payload never creates a file. A non-empty payload with nowhere to
/// go is logged and dropped.
pub fn write_binary(path: Option<&Path>, binary: &[u8]) -> io::Result<bool> {
    if binary.is_empty() {
        return Ok(false);
    }
    match path {
        Some(path) => {
            fs::write(path, binary)?;
            info!(path = %path.display(), bytes = binary.len(), "wrote side-channel payload");
            Ok(true)
        }
        None => {
            warn!(
                bytes = binary.len(),
                "side-channel payload discarded; pass --binary-out to keep it"
            );
            Ok(false)
        }
    }
}
