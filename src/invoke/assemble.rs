// src/invoke/assemble.rs

//! Packaging of accumulated channel bytes into results.

use crate::errors::PartialOutput;
use crate::invoke::request::InvocationResult;

/// Decode the text channel. Tools are not guaranteed to emit valid UTF-8, so
/// invalid sequences become U+FFFD instead of failing the invocation.
pub fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

pub fn assemble(text: &[u8], binary: Vec<u8>, exit_code: i32) -> InvocationResult {
    InvocationResult {
        text: decode_text(text),
        binary,
        exit_code,
    }
}

pub fn partial(text: &[u8], binary: Vec<u8>) -> PartialOutput {
    PartialOutput {
        text: decode_text(text),
        binary,
    }
}
