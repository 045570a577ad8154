/// Compare a stored baseline against a fresh coverage report.
///
/// Every FQCN in either side lands in at most one bucket: regressed,
/// improved, new or removed. A class whose percentage is unchanged lands in
/// none.
use std::collections::BTreeMap;

use serde::Serialize;

use crate::baseline::Baseline;
use crate::model::CoverageReport;

/// A before/after pair of coverage percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Change {
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageDiff {
    pub regressed_classes: BTreeMap<String, Change>,
    pub improved_classes: BTreeMap<String, Change>,
    pub new_classes: BTreeMap<String, f64>,
    pub removed_classes: BTreeMap<String, f64>,
}

impl CoverageDiff {
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.regressed_classes.is_empty()
            || !self.improved_classes.is_empty()
            || !self.new_classes.is_empty()
            || !self.removed_classes.is_empty()
    }

    pub fn total_regressions(&self) -> usize {
        self.regressed_classes.len()
    }

    pub fn total_improvements(&self) -> usize {
        self.improved_classes.len()
    }

    pub fn total_new(&self) -> usize {
        self.new_classes.len()
    }

    pub fn total_removed(&self) -> usize {
        self.removed_classes.len()
    }
}

/// Classify each class of `current` and `baseline`.
pub fn calculate(baseline: &Baseline, current: &CoverageReport) -> CoverageDiff {
    let mut diff = CoverageDiff::default();

    for class in current.classes() {
        let fqcn = class.class_name();
        let to = class.coverage_percentage();

        let Some(&from) = baseline.get(fqcn) else {
            diff.new_classes.insert(fqcn.to_string(), to);
            continue;
        };

        if to < from {
            diff.regressed_classes
                .insert(fqcn.to_string(), Change { from, to });
        } else if to > from {
            diff.improved_classes
                .insert(fqcn.to_string(), Change { from, to });
        }
    }

    for (fqcn, &percentage) in baseline {
        if !current.contains(fqcn) {
            diff.removed_classes.insert(fqcn.clone(), percentage);
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::{reduce, snapshot};
    use crate::model::{ClassCoverage, MethodCoverage};

    /// A class whose method coverage lands on `pct` (multiples of 10).
    fn class_at(fqcn: &str, pct: u32) -> ClassCoverage {
        let covered = pct / 10;
        let methods = (0..10).map(|i| MethodCoverage {
            name: format!("m{i}"),
            start_line: i,
            end_line: i,
            executable_lines: 1,
            executed_lines: u32::from(i < covered),
            visibility: "public".to_string(),
        });
        ClassCoverage::new(fqcn, "/p/src/x.php", methods)
    }

    fn baseline(entries: &[(&str, f64)]) -> Baseline {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_calculate_all_buckets() {
        let base = baseline(&[("A", 100.0), ("B", 50.0), ("C", 80.0)]);
        let current = CoverageReport::new(vec![
            class_at("A", 60),
            class_at("B", 90),
            class_at("D", 70),
        ]);
        let diff = calculate(&base, &current);

        assert_eq!(diff.regressed_classes["A"], Change { from: 100.0, to: 60.0 });
        assert_eq!(diff.improved_classes["B"], Change { from: 50.0, to: 90.0 });
        assert_eq!(diff.new_classes["D"], 70.0);
        assert_eq!(diff.removed_classes["C"], 80.0);
        assert_eq!(diff.total_regressions(), 1);
        assert_eq!(diff.total_improvements(), 1);
        assert_eq!(diff.total_new(), 1);
        assert_eq!(diff.total_removed(), 1);
        assert!(diff.has_changes());
    }

    #[test]
    fn test_tie_is_unchanged() {
        let base = baseline(&[("A", 40.0)]);
        let current = CoverageReport::new(vec![class_at("A", 40)]);
        let diff = calculate(&base, &current);
        assert!(!diff.has_changes());
    }

    #[test]
    fn test_self_diff_has_no_changes() {
        let current = CoverageReport::new(vec![class_at("A", 30), class_at("B", 100)]);
        let base = reduce(&snapshot(&current));
        assert!(!calculate(&base, &current).has_changes());
    }

    #[test]
    fn test_empty_baseline_marks_everything_new() {
        let current = CoverageReport::new(vec![class_at("A", 30)]);
        let diff = calculate(&Baseline::new(), &current);
        assert_eq!(diff.total_new(), 1);
        assert_eq!(diff.total_removed(), 0);
    }
}
