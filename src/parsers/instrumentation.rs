//! Ingestion of live instrumentation results.
//!
//! An instrumentation engine reports, per source file, the classes and traits
//! it saw together with a record per method. Unlike Clover, methods are
//! attached to their own class, so no file-scoping applies. The JSON dump
//! accepted by [`InstrumentationParser`] mirrors that shape:
//!
//! ```json
//! {"files": [{"path": "/p/app/User.php",
//!             "classes": [{"name": "User", "namespace": "App",
//!                          "methods": {"isAdmin": {"executableLines": 3, "executedLines": 1,
//!                                                  "startLine": 10, "endLine": 14,
//!                                                  "visibility": "public"}}}],
//!             "traits": []}]}
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use super::CoverageParser;
use crate::detect::Format;
use crate::error::{CovlensError, Result};
use crate::model::{ClassCoverage, CoverageReport, MethodCoverage, RawMethod};
use crate::parsers::clover::{is_anonymous, resolve_class_name};

/// Per-method record produced by the instrumentation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentedMethod {
    pub executable_lines: u32,
    pub executed_lines: u32,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(default = "default_visibility")]
    pub visibility: String,
}

fn default_visibility() -> String {
    "public".to_string()
}

impl RawMethod for InstrumentedMethod {
    fn executable_lines(&self) -> u32 {
        self.executable_lines
    }

    fn executed_lines(&self) -> u32 {
        self.executed_lines
    }

    fn start_line(&self) -> u32 {
        self.start_line
    }

    fn end_line(&self) -> u32 {
        self.end_line
    }

    fn visibility(&self) -> &str {
        &self.visibility
    }
}

/// A class or trait as seen by the instrumentation engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentedUnit {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Methods in the order the engine reported them.
    #[serde(default)]
    pub methods: IndexMap<String, InstrumentedMethod>,
}

impl InstrumentedUnit {
    /// A name that already carries a namespace separator is taken as-is.
    pub fn fqcn(&self) -> String {
        if self.name.contains('\\') {
            self.name.clone()
        } else {
            resolve_class_name(&self.namespace, &self.name)
        }
    }
}

/// One instrumented source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentedFile {
    pub path: String,
    #[serde(default)]
    pub classes: Vec<InstrumentedUnit>,
    #[serde(default)]
    pub traits: Vec<InstrumentedUnit>,
}

/// The whole instrumentation result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentationReport {
    #[serde(default)]
    pub files: Vec<InstrumentedFile>,
}

/// Build a coverage report from instrumentation results. Traits are folded
/// into the same map as classes; methods without executable lines are
/// dropped, and so is any unit left with no methods.
pub fn analyze(files: &[InstrumentedFile]) -> CoverageReport {
    let mut classes: BTreeMap<String, ClassCoverage> = BTreeMap::new();

    for file in files {
        for unit in file.classes.iter().chain(&file.traits) {
            if unit.name.is_empty() || is_anonymous(&unit.name) {
                debug!("skipping unnamed unit in {}", file.path);
                continue;
            }
            let fqcn = unit.fqcn();
            let methods: Vec<MethodCoverage> = unit
                .methods
                .iter()
                .filter(|(_, m)| m.executable_lines > 0)
                .map(|(name, m)| MethodCoverage::resolve(name.clone(), m))
                .collect();
            if methods.is_empty() {
                debug!("skipping {fqcn}: no executable methods");
                continue;
            }
            classes.insert(
                fqcn.clone(),
                ClassCoverage::new(fqcn, file.path.clone(), methods),
            );
        }
    }

    CoverageReport::new(classes.into_values())
}

/// Parser for JSON dumps of an instrumentation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstrumentationParser;

impl CoverageParser for InstrumentationParser {
    fn format(&self) -> Format {
        Format::Instrumentation
    }

    fn can_parse(&self, path: &Path, content: &[u8]) -> bool {
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            return true;
        }
        let head = super::sniff_head(content);
        head.trim_start().starts_with('{') && head.contains("\"files\"")
    }

    fn parse(&self, input: &[u8]) -> Result<CoverageReport> {
        let report: InstrumentationReport = serde_json::from_slice(input)
            .map_err(|e| CovlensError::MalformedDocument(e.to_string()))?;
        Ok(analyze(&report.files))
    }
}
