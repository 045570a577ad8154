/// Auto-detection of coverage artifact formats.
///
/// Strategy:
///   1. Ask each parser whether the extension / leading bytes look familiar
///   2. Fall back to the CLI --format override (handled by caller)
use std::path::Path;

use crate::error::CovlensError;
use crate::parsers::clover::CloverParser;
use crate::parsers::instrumentation::InstrumentationParser;
use crate::parsers::CoverageParser;

/// Supported artifact formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Clover,
    Instrumentation,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Clover => "clover",
            Format::Instrumentation => "instrumentation",
        }
    }
}

impl std::str::FromStr for Format {
    type Err = CovlensError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clover" => Ok(Format::Clover),
            "instrumentation" | "json" => Ok(Format::Instrumentation),
            _ => Err(CovlensError::Other(format!(
                "Unknown format: '{s}'. Supported: clover, instrumentation"
            ))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the artifact format from filename and content.
pub fn detect_format(path: &Path, content: &[u8]) -> Option<Format> {
    let clover = CloverParser::default();
    if clover.can_parse(path, content) {
        return Some(clover.format());
    }
    if InstrumentationParser.can_parse(path, content) {
        return Some(InstrumentationParser.format());
    }
    None
}
