//! Read-only queries over a [`CoverageReport`]. Nothing here mutates the
//! source report; filters return new reports sharing the same classes.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::model::{ClassCoverage, CoverageReport};

/// Which bucket a class falls into. Every class has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    FullyCovered,
    PartiallyCovered,
    Uncovered,
}

impl ClassCoverage {
    pub fn category(&self) -> Category {
        if self.is_fully_covered() {
            Category::FullyCovered
        } else if self.is_fully_uncovered() {
            Category::Uncovered
        } else {
            Category::PartiallyCovered
        }
    }
}

/// Category counts for a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total_classes: usize,
    pub fully_covered: usize,
    pub partially_covered: usize,
    pub uncovered: usize,
}

impl CoverageReport {
    fn in_category(&self, category: Category) -> Vec<&ClassCoverage> {
        self.classes().filter(|c| c.category() == category).collect()
    }

    /// Classes with no methods, or whose methods were all executed.
    pub fn fully_covered_classes(&self) -> Vec<&ClassCoverage> {
        self.in_category(Category::FullyCovered)
    }

    /// Classes with at least one method and none executed.
    pub fn fully_uncovered_classes(&self) -> Vec<&ClassCoverage> {
        self.in_category(Category::Uncovered)
    }

    pub fn partially_covered_classes(&self) -> Vec<&ClassCoverage> {
        self.in_category(Category::PartiallyCovered)
    }

    pub fn total_classes(&self) -> usize {
        self.len()
    }

    pub fn total_fully_covered(&self) -> usize {
        self.fully_covered_classes().len()
    }

    pub fn total_uncovered(&self) -> usize {
        self.fully_uncovered_classes().len()
    }

    pub fn total_partially_covered(&self) -> usize {
        self.partially_covered_classes().len()
    }

    /// All category counts in a single pass.
    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            total_classes: self.len(),
            ..Default::default()
        };
        for class in self.classes() {
            match class.category() {
                Category::FullyCovered => summary.fully_covered += 1,
                Category::PartiallyCovered => summary.partially_covered += 1,
                Category::Uncovered => summary.uncovered += 1,
            }
        }
        summary
    }

    fn retain(&self, keep: impl Fn(&str) -> bool) -> CoverageReport {
        let classes: BTreeMap<String, Arc<ClassCoverage>> = self
            .shared()
            .filter(|(fqcn, _)| keep(fqcn))
            .map(|(fqcn, class)| (fqcn.clone(), Arc::clone(class)))
            .collect();
        CoverageReport::from_shared(classes)
    }

    /// Classes whose FQCN starts with `prefix` (literal, case-sensitive).
    pub fn filter_by_namespace(&self, prefix: &str) -> CoverageReport {
        self.retain(|fqcn| fqcn.starts_with(prefix))
    }

    /// Classes whose FQCN does not start with `prefix`.
    pub fn exclude_namespace(&self, prefix: &str) -> CoverageReport {
        self.retain(|fqcn| !fqcn.starts_with(prefix))
    }

    /// Classes strictly below `threshold`; a class exactly at it passes.
    pub fn classes_below_threshold(&self, threshold: f64) -> Vec<&ClassCoverage> {
        self.classes()
            .filter(|c| c.coverage_percentage() < threshold)
            .collect()
    }
}

/// `(FQCN, percentage)` for each class below `min_coverage`.
pub fn threshold_failures(report: &CoverageReport, min_coverage: f64) -> Vec<(String, f64)> {
    report
        .classes_below_threshold(min_coverage)
        .into_iter()
        .map(|c| (c.class_name().to_string(), c.coverage_percentage()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MethodCoverage;

    fn method(name: &str, covered: bool) -> MethodCoverage {
        MethodCoverage {
            name: name.to_string(),
            start_line: 1,
            end_line: 2,
            executable_lines: 1,
            executed_lines: u32::from(covered),
            visibility: "public".to_string(),
        }
    }

    fn class(fqcn: &str, covered: &[bool]) -> ClassCoverage {
        ClassCoverage::new(
            fqcn,
            format!("/p/app/{fqcn}.php"),
            covered
                .iter()
                .enumerate()
                .map(|(i, &c)| method(&format!("m{i}"), c)),
        )
    }

    fn sample() -> CoverageReport {
        CoverageReport::new(vec![
            class("App\\Models\\User", &[true, true]),
            class("App\\Services\\Invoice", &[false, false, false]),
            class("App\\Services\\Payment", &[true, true, false]),
            class("Support\\Empty", &[]),
        ])
    }

    #[test]
    fn test_categories() {
        let report = sample();
        let names = |v: Vec<&ClassCoverage>| -> Vec<String> {
            v.iter().map(|c| c.class_name().to_string()).collect()
        };
        assert_eq!(
            names(report.fully_covered_classes()),
            vec!["App\\Models\\User", "Support\\Empty"]
        );
        assert_eq!(
            names(report.fully_uncovered_classes()),
            vec!["App\\Services\\Invoice"]
        );
        assert_eq!(
            names(report.partially_covered_classes()),
            vec!["App\\Services\\Payment"]
        );
    }

    #[test]
    fn test_summary_matches_totals() {
        let report = sample();
        let summary = report.summary();
        assert_eq!(summary.total_classes, 4);
        assert_eq!(summary.fully_covered, report.total_fully_covered());
        assert_eq!(summary.partially_covered, report.total_partially_covered());
        assert_eq!(summary.uncovered, report.total_uncovered());
    }

    #[test]
    fn test_filter_and_exclude() {
        let report = sample();
        let services = report.filter_by_namespace("App\\Services");
        assert_eq!(services.total_classes(), 2);
        let rest = report.exclude_namespace("App\\Services");
        assert_eq!(rest.total_classes(), 2);
        assert!(rest.get("App\\Models\\User").is_some());
        // case-sensitive
        assert!(report.filter_by_namespace("app\\").is_empty());
        // source untouched
        assert_eq!(report.total_classes(), 4);
    }

    #[test]
    fn test_threshold_is_strict() {
        let report = sample();
        // Payment sits at 66.7
        let below: Vec<_> = report
            .classes_below_threshold(66.7)
            .iter()
            .map(|c| c.class_name().to_string())
            .collect();
        assert_eq!(below, vec!["App\\Services\\Invoice"]);

        let failures = threshold_failures(&report, 80.0);
        assert_eq!(
            failures,
            vec![
                ("App\\Services\\Invoice".to_string(), 0.0),
                ("App\\Services\\Payment".to_string(), 66.7),
            ]
        );
        assert!(threshold_failures(&report, 0.0).is_empty());
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use crate::model::MethodCoverage;
    use proptest::prelude::*;

    fn build(specs: &[(u8, Vec<bool>)]) -> CoverageReport {
        CoverageReport::new(specs.iter().enumerate().map(|(i, (ns, covered))| {
            let fqcn = format!("Ns{}\\C{i}", ns % 3);
            let methods = covered.iter().enumerate().map(|(j, &c)| MethodCoverage {
                name: format!("m{j}"),
                start_line: 1,
                end_line: 1,
                executable_lines: 2,
                executed_lines: if c { 1 } else { 0 },
                visibility: "public".to_string(),
            });
            ClassCoverage::new(fqcn, "f.php", methods)
        }))
    }

    fn report_strategy() -> impl Strategy<Value = Vec<(u8, Vec<bool>)>> {
        prop::collection::vec((any::<u8>(), prop::collection::vec(any::<bool>(), 0..6)), 0..20)
    }

    proptest! {
        #[test]
        fn categories_reconcile_with_total(specs in report_strategy()) {
            let report = build(&specs);
            prop_assert_eq!(
                report.total_fully_covered() + report.total_partially_covered() + report.total_uncovered(),
                report.total_classes()
            );
        }

        #[test]
        fn coverage_monotonic_in_covered_methods(total in 1usize..30, covered in 0usize..30) {
            let covered = covered.min(total - 1);
            let make = |n: usize| {
                let flags: Vec<bool> = (0..total).map(|i| i < n).collect();
                let report = build(&[(0, flags)]);
                report.get("Ns0\\C0").map(ClassCoverage::coverage_percentage)
            };
            prop_assert!(make(covered) <= make(covered + 1));
        }

        #[test]
        fn filter_and_exclude_partition(specs in report_strategy(), ns in 0u8..3) {
            let report = build(&specs);
            let prefix = format!("Ns{ns}\\");
            let kept = report.filter_by_namespace(&prefix);
            let dropped = report.exclude_namespace(&prefix);
            prop_assert_eq!(kept.len() + dropped.len(), report.len());
            for class in kept.classes() {
                prop_assert!(!dropped.contains(class.class_name()));
            }
        }

        #[test]
        fn threshold_widens_monotonically(specs in report_strategy(), a in 0.0f64..100.0, b in 0.0f64..100.0) {
            let report = build(&specs);
            let (low, high) = if a < b { (a, b) } else { (b, a) };
            let wide: Vec<&str> = report.classes_below_threshold(high).iter().map(|c| c.class_name()).collect();
            for class in report.classes_below_threshold(low) {
                prop_assert!(wide.contains(&class.class_name()));
            }
        }
    }
}
