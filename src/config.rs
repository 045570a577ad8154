//! Run configuration, built once from the command line and read-only
//! afterwards.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::baseline::{BaselineStore, DEFAULT_BASELINE_FILE};
use crate::model::CoverageReport;
use crate::parsers::clover::DEFAULT_INCLUDE_PREFIXES;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Directory prefixes a Clover `<file>` path must contain.
    pub include_prefixes: Vec<String>,
    /// Keep only classes whose FQCN starts with this prefix.
    pub namespace_filter: Option<String>,
    /// Drop classes whose FQCN starts with this prefix.
    pub namespace_exclude: Option<String>,
    /// Minimum per-class coverage percentage.
    pub min_coverage: Option<f64>,
    pub show_methods: bool,
    pub show_covered: bool,
    pub baseline_path: PathBuf,
    /// Precomputed complexity facts (JSON) for risk scoring.
    pub complexity_facts: Option<PathBuf>,
    /// Precomputed type-declaration facts (JSON).
    pub type_facts: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_prefixes: DEFAULT_INCLUDE_PREFIXES.iter().map(|p| p.to_string()).collect(),
            namespace_filter: None,
            namespace_exclude: None,
            min_coverage: None,
            show_methods: false,
            show_covered: false,
            baseline_path: PathBuf::from(DEFAULT_BASELINE_FILE),
            complexity_facts: None,
            type_facts: None,
        }
    }
}

impl Config {
    /// Apply the namespace filter, then the exclusion.
    pub fn apply_filters(&self, report: &CoverageReport) -> CoverageReport {
        let filtered = match &self.namespace_filter {
            Some(prefix) => report.filter_by_namespace(prefix),
            None => report.clone(),
        };
        match &self.namespace_exclude {
            Some(prefix) => filtered.exclude_namespace(prefix),
            None => filtered,
        }
    }

    pub fn baseline_store(&self) -> BaselineStore {
        BaselineStore::new(self.baseline_path.clone())
    }
}
