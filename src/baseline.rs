//! Persisted coverage snapshots used as the reference point for diffs.
//!
//! The file is a JSON object keyed by FQCN:
//!
//! ```json
//! {"App\\Models\\User": {"coverage": 50.0, "lineCoverage": 62.5,
//!                        "methods": {"isAdmin": 100.0, "getFullName": 0.0}}}
//! ```
//!
//! Only `coverage` feeds the diff today; the other fields are kept for
//! forward compatibility.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::model::CoverageReport;

/// File name used when no explicit baseline path is configured.
pub const DEFAULT_BASELINE_FILE: &str = ".covlens-baseline.json";

/// Persisted record for one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSnapshot {
    pub coverage: f64,
    pub line_coverage: f64,
    #[serde(default)]
    pub methods: BTreeMap<String, f64>,
}

/// Full baseline file contents.
pub type Snapshot = BTreeMap<String, ClassSnapshot>;

/// Baseline reduced to FQCN -> coverage percentage.
pub type Baseline = BTreeMap<String, f64>;

/// Capture the persisted form of a report.
pub fn snapshot(report: &CoverageReport) -> Snapshot {
    report
        .classes()
        .map(|class| {
            let methods = class
                .methods()
                .iter()
                .map(|m| (m.name.clone(), m.coverage_percentage()))
                .collect();
            (
                class.class_name().to_string(),
                ClassSnapshot {
                    coverage: class.coverage_percentage(),
                    line_coverage: class.line_coverage_percentage(),
                    methods,
                },
            )
        })
        .collect()
}

/// Reduce a snapshot to the map the diff engine consumes.
pub fn reduce(snapshot: &Snapshot) -> Baseline {
    snapshot
        .iter()
        .map(|(fqcn, class)| (fqcn.clone(), class.coverage))
        .collect()
}

/// Decode baseline JSON leniently. Anything that is not a JSON object yields
/// an empty baseline; a class entry without a numeric `coverage` counts as 0.
pub fn decode(content: &str) -> Baseline {
    let value: Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            warn!("ignoring corrupt baseline: {e}");
            return Baseline::new();
        }
    };
    let Value::Object(entries) = value else {
        warn!("ignoring baseline: top level is not an object");
        return Baseline::new();
    };
    entries
        .into_iter()
        .map(|(fqcn, class)| {
            let coverage = class.get("coverage").and_then(Value::as_f64).unwrap_or(0.0);
            (fqcn, coverage)
        })
        .collect()
}

/// Baseline file at an explicit location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineStore {
    path: PathBuf,
}

impl Default for BaselineStore {
    /// `.covlens-baseline.json` relative to the working directory.
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE_FILE)
    }
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store using the default file name inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(DEFAULT_BASELINE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write the report's snapshot as pretty-printed JSON.
    pub fn save(&self, report: &CoverageReport) -> Result<()> {
        let json = serde_json::to_string_pretty(&snapshot(report))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Load the reduced baseline. A missing or unreadable file is empty.
    pub fn load(&self) -> Baseline {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => decode(&content),
            Err(e) => {
                if self.exists() {
                    warn!("could not read baseline {}: {e}", self.path.display());
                }
                Baseline::new()
            }
        }
    }

    /// Load the full per-class records.
    pub fn load_snapshot(&self) -> Result<Snapshot> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
