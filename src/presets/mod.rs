// src/presets/mod.rs

//! Ready-made request builders for specific tools.

pub mod ghostscript;

pub use ghostscript::{GhostscriptOptions, PaperSize, parse_papersize};
