//! Complexity-weighted risk scoring.
//!
//! Cyclomatic complexity comes from an external calculator through
//! [`ComplexitySource`]; this module only cross-references those facts with
//! the coverage model.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{round1, CoverageReport};

/// Methods at or above this complexity are candidates for high risk.
pub const HIGH_RISK_COMPLEXITY: u32 = 10;

/// Methods strictly below this coverage are candidates for high risk.
pub const HIGH_RISK_COVERAGE: f64 = 50.0;

/// One symbol reported by the complexity calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityFact {
    /// Symbol name, possibly qualified as `Type::method`.
    pub name: String,
    pub is_method: bool,
    #[serde(alias = "complexity")]
    pub cyclomatic_complexity: u32,
}

/// Supplies complexity facts for a source file.
pub trait ComplexitySource {
    fn complexity_for_file(&self, path: &Path) -> Result<Vec<ComplexityFact>>;
}

/// Precomputed facts keyed by file path, e.g. loaded from a JSON export:
///
/// ```json
/// {"/p/app/Cart.php": [{"name": "App\\Cart::total", "isMethod": true, "complexity": 4}]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonComplexityFacts {
    files: HashMap<String, Vec<ComplexityFact>>,
}

impl JsonComplexityFacts {
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(input)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_slice(&std::fs::read(path)?)
    }
}

impl ComplexitySource for JsonComplexityFacts {
    fn complexity_for_file(&self, path: &Path) -> Result<Vec<ComplexityFact>> {
        let key = path.to_string_lossy();
        Ok(self.files.get(key.as_ref()).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodComplexity {
    pub name: String,
    pub cyclomatic_complexity: u32,
    pub coverage_percentage: f64,
}

impl MethodComplexity {
    /// Complexity weighted by the uncovered share; zero when fully covered.
    #[must_use]
    pub fn risk_score(&self) -> f64 {
        if self.coverage_percentage >= 100.0 {
            return 0.0;
        }
        round1(f64::from(self.cyclomatic_complexity) * (1.0 - self.coverage_percentage / 100.0))
    }

    #[must_use]
    pub fn is_high_risk(&self) -> bool {
        self.cyclomatic_complexity >= HIGH_RISK_COMPLEXITY
            && self.coverage_percentage < HIGH_RISK_COVERAGE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassComplexity {
    pub class_name: String,
    pub file_path: String,
    pub methods: Vec<MethodComplexity>,
}

impl ClassComplexity {
    pub fn max_complexity(&self) -> u32 {
        self.methods
            .iter()
            .map(|m| m.cyclomatic_complexity)
            .max()
            .unwrap_or(0)
    }

    pub fn average_complexity(&self) -> f64 {
        if self.methods.is_empty() {
            return 0.0;
        }
        round1(f64::from(self.total_complexity()) / self.methods.len() as f64)
    }

    pub fn total_complexity(&self) -> u32 {
        self.methods.iter().map(|m| m.cyclomatic_complexity).sum()
    }

    pub fn high_risk_methods(&self) -> Vec<&MethodComplexity> {
        self.methods.iter().filter(|m| m.is_high_risk()).collect()
    }
}

/// Complexity results keyed by FQCN, ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComplexityReport {
    pub classes: BTreeMap<String, ClassComplexity>,
}

impl ComplexityReport {
    /// High-risk methods across all classes, keyed `FQCN::method`.
    pub fn high_risk_methods(&self) -> BTreeMap<String, &MethodComplexity> {
        self.classes
            .iter()
            .flat_map(|(fqcn, class)| {
                class
                    .high_risk_methods()
                    .into_iter()
                    .map(move |m| (format!("{fqcn}::{}", m.name), m))
            })
            .collect()
    }

    /// Mean over every method of every class, not a mean of class means.
    pub fn average_complexity(&self) -> f64 {
        let (total, count) = self.classes.values().fold((0u64, 0usize), |(t, n), c| {
            (t + u64::from(c.total_complexity()), n + c.methods.len())
        });
        if count == 0 {
            return 0.0;
        }
        round1(total as f64 / count as f64)
    }

    pub fn max_complexity(&self) -> u32 {
        self.classes
            .values()
            .map(ClassComplexity::max_complexity)
            .max()
            .unwrap_or(0)
    }

    pub fn total_classes(&self) -> usize {
        self.classes.len()
    }
}

/// Strip a `Type::` qualifier, leaving the bare method name.
pub fn bare_method_name(symbol: &str) -> &str {
    match symbol.rfind("::") {
        Some(idx) => &symbol[idx + 2..],
        None => symbol,
    }
}

/// Score every class in `coverage` whose file is listed in `file_paths` and
/// exists on disk. Classes that fail either check, or whose source cannot
/// supply facts, are skipped.
pub fn analyze(
    file_paths: &[String],
    coverage: &CoverageReport,
    source: &dyn ComplexitySource,
) -> ComplexityReport {
    let mut classes = BTreeMap::new();

    for class in coverage.classes() {
        let file_path = class.file_path();
        if !file_paths.iter().any(|p| p == file_path) {
            continue;
        }
        let path = Path::new(file_path);
        if !path.exists() {
            debug!("skipping {}: {file_path} not found", class.class_name());
            continue;
        }

        let facts = match source.complexity_for_file(path) {
            Ok(facts) => facts,
            Err(e) => {
                warn!("no complexity facts for {file_path}: {e}");
                continue;
            }
        };

        let mut methods: Vec<MethodComplexity> = Vec::new();
        for fact in facts.iter().filter(|f| f.is_method) {
            let name = bare_method_name(&fact.name);
            let coverage_percentage = class
                .method(name)
                .map(|m| m.coverage_percentage())
                .unwrap_or(0.0);
            let scored = MethodComplexity {
                name: name.to_string(),
                cyclomatic_complexity: fact.cyclomatic_complexity,
                coverage_percentage,
            };
            match methods.iter_mut().find(|m| m.name == scored.name) {
                Some(existing) => *existing = scored,
                None => methods.push(scored),
            }
        }

        if methods.is_empty() {
            continue;
        }
        classes.insert(
            class.class_name().to_string(),
            ClassComplexity {
                class_name: class.class_name().to_string(),
                file_path: file_path.to_string(),
                methods,
            },
        );
    }

    ComplexityReport { classes }
}
