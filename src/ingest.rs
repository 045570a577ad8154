use std::path::Path;

use log::debug;

use crate::detect::{detect_format, Format};
use crate::error::{CovlensError, Result};
use crate::model::CoverageReport;
use crate::parsers::clover::CloverParser;
use crate::parsers::instrumentation::InstrumentationParser;
use crate::parsers::CoverageParser;

/// Parse a Clover XML artifact, keeping files under `include_prefixes`.
pub fn parse(artifact_path: &Path, include_prefixes: &[String]) -> Result<CoverageReport> {
    let content = read_artifact(artifact_path)?;
    CloverParser::new(include_prefixes.iter().cloned()).parse(&content)
}

/// Read an artifact, auto-detect its format (or use the override) and parse it.
/// Returns the report and the format it was parsed as.
pub fn ingest(
    artifact_path: &Path,
    format_override: Option<&str>,
    include_prefixes: &[String],
) -> Result<(CoverageReport, Format)> {
    let content = read_artifact(artifact_path)?;

    let format = if let Some(fmt_str) = format_override {
        fmt_str.parse::<Format>()?
    } else {
        detect_format(artifact_path, &content).ok_or(CovlensError::UnknownFormat)?
    };
    debug!("parsing {} as {format}", artifact_path.display());

    let report = match format {
        Format::Clover => CloverParser::new(include_prefixes.iter().cloned()).parse(&content)?,
        Format::Instrumentation => InstrumentationParser.parse(&content)?,
    };
    Ok((report, format))
}

fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(CovlensError::FileNotFound(path.to_path_buf()));
    }
    std::fs::read(path).map_err(|source| CovlensError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    })
}
