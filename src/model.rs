//! Canonical per-class coverage model. Every ingestion path resolves its raw
//! method facts into `MethodCoverage` records once, at the boundary, and
//! everything downstream works on `ClassCoverage` / `CoverageReport`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Round to one decimal place, half away from zero.
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Compute a percentage rounded to one decimal, returning 100.0 when the
/// total is zero (nothing to cover counts as covered).
#[must_use]
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        round1(part as f64 / total as f64 * 100.0)
    }
}

/// Uniform accessors over whatever shape an upstream method record has.
pub trait RawMethod {
    fn executable_lines(&self) -> u32;
    fn executed_lines(&self) -> u32;
    fn start_line(&self) -> u32;
    fn end_line(&self) -> u32;
    fn visibility(&self) -> &str;
}

/// Coverage facts for a single method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCoverage {
    pub name: String,
    pub start_line: u32,
    pub end_line: u32,
    pub executable_lines: u32,
    pub executed_lines: u32,
    pub visibility: String,
}

impl MethodCoverage {
    /// Resolve an upstream method record into the canonical form.
    pub fn resolve(name: impl Into<String>, raw: &impl RawMethod) -> Self {
        Self {
            name: name.into(),
            start_line: raw.start_line(),
            end_line: raw.end_line(),
            executable_lines: raw.executable_lines(),
            executed_lines: raw.executed_lines(),
            visibility: raw.visibility().to_string(),
        }
    }

    #[must_use]
    pub fn is_covered(&self) -> bool {
        self.executed_lines > 0
    }

    #[must_use]
    pub fn coverage_percentage(&self) -> f64 {
        percentage(
            u64::from(self.executed_lines),
            u64::from(self.executable_lines),
        )
    }

    /// Formats as `name():L10-25`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}():L{}-{}", self.name, self.start_line, self.end_line)
    }
}

/// Coverage for one class (or trait), keyed by its fully-qualified name.
///
/// Method names are unique; the first occurrence of a name fixes its
/// position and a later record with the same name replaces its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCoverage {
    class_name: String,
    file_path: String,
    methods: Vec<MethodCoverage>,
}

impl ClassCoverage {
    pub fn new(
        class_name: impl Into<String>,
        file_path: impl Into<String>,
        methods: impl IntoIterator<Item = MethodCoverage>,
    ) -> Self {
        let mut unique: Vec<MethodCoverage> = Vec::new();
        for method in methods {
            match unique.iter_mut().find(|m| m.name == method.name) {
                Some(existing) => *existing = method,
                None => unique.push(method),
            }
        }
        Self {
            class_name: class_name.into(),
            file_path: file_path.into(),
            methods: unique,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn methods(&self) -> &[MethodCoverage] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&MethodCoverage> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// True when there are no methods or every method was executed.
    #[must_use]
    pub fn is_fully_covered(&self) -> bool {
        self.methods.iter().all(MethodCoverage::is_covered)
    }

    /// True when there is at least one method and none was executed.
    /// A class without methods is never fully uncovered.
    #[must_use]
    pub fn is_fully_uncovered(&self) -> bool {
        !self.methods.is_empty() && !self.methods.iter().any(MethodCoverage::is_covered)
    }

    pub fn covered_methods(&self) -> Vec<&MethodCoverage> {
        self.methods.iter().filter(|m| m.is_covered()).collect()
    }

    pub fn uncovered_methods(&self) -> Vec<&MethodCoverage> {
        self.methods.iter().filter(|m| !m.is_covered()).collect()
    }

    /// Share of methods executed at least once.
    #[must_use]
    pub fn coverage_percentage(&self) -> f64 {
        percentage(
            self.covered_methods().len() as u64,
            self.methods.len() as u64,
        )
    }

    /// Executed lines over executable lines, pooled across all methods.
    #[must_use]
    pub fn line_coverage_percentage(&self) -> f64 {
        let (executed, executable) = self.methods.iter().fold((0u64, 0u64), |(ed, ex), m| {
            (ed + u64::from(m.executed_lines), ex + u64::from(m.executable_lines))
        });
        percentage(executed, executable)
    }
}

/// An immutable report of class coverage, sorted ascending by FQCN.
///
/// Derived reports share the underlying `ClassCoverage` values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageReport {
    classes: BTreeMap<String, Arc<ClassCoverage>>,
}

impl CoverageReport {
    /// Build a report; on a duplicate FQCN the last class wins.
    pub fn new(classes: impl IntoIterator<Item = ClassCoverage>) -> Self {
        let classes = classes
            .into_iter()
            .map(|c| (c.class_name.clone(), Arc::new(c)))
            .collect();
        Self { classes }
    }

    pub(crate) fn from_shared(classes: BTreeMap<String, Arc<ClassCoverage>>) -> Self {
        Self { classes }
    }

    pub(crate) fn shared(&self) -> impl Iterator<Item = (&String, &Arc<ClassCoverage>)> {
        self.classes.iter()
    }

    /// Classes in ascending FQCN order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassCoverage> {
        self.classes.values().map(Arc::as_ref)
    }

    pub fn get(&self, fqcn: &str) -> Option<&ClassCoverage> {
        self.classes.get(fqcn).map(Arc::as_ref)
    }

    pub fn contains(&self, fqcn: &str) -> bool {
        self.classes.contains_key(fqcn)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Distinct source files referenced by the report, in first-seen order.
    pub fn file_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        for class in self.classes() {
            if !paths.iter().any(|p| p == class.file_path()) {
                paths.push(class.file_path().to_string());
            }
        }
        paths
    }
}
