//! Command handler functions for the covlens CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::baseline::BaselineStore;
use crate::complexity::{self, JsonComplexityFacts};
use crate::config::Config;
use crate::model::{ClassCoverage, CoverageReport};
use crate::query::threshold_failures;
use crate::types::{self, JsonTypeFacts};
use crate::{diff, ingest};

/// Ingest an artifact and apply the configured namespace filters.
pub fn load_report(artifact: &Path, format: Option<&str>, config: &Config) -> Result<CoverageReport> {
    let (report, _format) = ingest::ingest(artifact, format, &config.include_prefixes)
        .with_context(|| format!("Failed to load coverage from {}", artifact.display()))?;
    Ok(config.apply_filters(&report))
}

fn write_class(out: &mut String, class: &ClassCoverage, show_methods: bool) {
    writeln!(
        out,
        "  {:<60} {:>6.1}%  (lines {:.1}%)",
        class.class_name(),
        class.coverage_percentage(),
        class.line_coverage_percentage()
    )
    .unwrap();

    if show_methods {
        for method in class.methods() {
            let marker = if method.is_covered() { "✓" } else { "✗" };
            writeln!(out, "      {marker} {}", method.label()).unwrap();
        }
    } else {
        let uncovered: Vec<&str> = class
            .uncovered_methods()
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        if !uncovered.is_empty() && !class.is_fully_uncovered() {
            writeln!(out, "      uncovered: {}()", uncovered.join("(), ")).unwrap();
        }
    }
}

pub fn cmd_summary(report: &CoverageReport, config: &Config) -> String {
    if report.is_empty() {
        return "No classes found in coverage report matching the given filters.\n".to_string();
    }

    let mut out = String::new();
    let sections = [
        ("Fully uncovered", report.fully_uncovered_classes(), true),
        ("Partially covered", report.partially_covered_classes(), true),
        ("Fully covered", report.fully_covered_classes(), config.show_covered),
    ];
    for (title, classes, shown) in sections {
        if !shown || classes.is_empty() {
            continue;
        }
        writeln!(out, "{title}:").unwrap();
        for class in classes {
            write_class(&mut out, class, config.show_methods);
        }
        out.push('\n');
    }

    let summary = report.summary();
    writeln!(out, "Classes:    {}", summary.total_classes).unwrap();
    writeln!(out, "Covered:    {}", summary.fully_covered).unwrap();
    writeln!(out, "Partial:    {}", summary.partially_covered).unwrap();
    writeln!(out, "Uncovered:  {}", summary.uncovered).unwrap();
    out
}

/// Returns the output and whether any class fell below `min_coverage`.
pub fn cmd_check(report: &CoverageReport, min_coverage: f64) -> (String, bool) {
    let failures = threshold_failures(report, min_coverage);
    if failures.is_empty() {
        return (
            format!("All classes meet the minimum coverage of {min_coverage:.1}%\n"),
            false,
        );
    }

    let mut out = String::new();
    writeln!(
        out,
        "{} class(es) below minimum coverage threshold of {min_coverage:.1}%:",
        failures.len()
    )
    .unwrap();
    for (fqcn, pct) in &failures {
        writeln!(out, "  {fqcn} ({pct:.1}%)").unwrap();
    }
    (out, true)
}

pub fn cmd_save_baseline(report: &CoverageReport, store: &BaselineStore) -> Result<String> {
    store
        .save(report)
        .with_context(|| format!("Failed to write baseline {}", store.path().display()))?;
    Ok(format!(
        "Baseline saved to {} ({} classes)\n",
        store.path().display(),
        report.len()
    ))
}

pub fn cmd_diff(report: &CoverageReport, store: &BaselineStore) -> String {
    if !store.exists() {
        return "No baseline found. Run save-baseline first.\n".to_string();
    }

    let diff = diff::calculate(&store.load(), report);
    if !diff.has_changes() {
        return "No coverage changes since baseline.\n".to_string();
    }

    let mut out = String::new();
    for (fqcn, change) in &diff.regressed_classes {
        writeln!(out, "  ↓ {fqcn}  {:.1}% → {:.1}%", change.from, change.to).unwrap();
    }
    for (fqcn, change) in &diff.improved_classes {
        writeln!(out, "  ↑ {fqcn}  {:.1}% → {:.1}%", change.from, change.to).unwrap();
    }
    for (fqcn, pct) in &diff.new_classes {
        writeln!(out, "  + {fqcn}  {pct:.1}%").unwrap();
    }
    for (fqcn, pct) in &diff.removed_classes {
        writeln!(out, "  - {fqcn}  (was {pct:.1}%)").unwrap();
    }
    writeln!(
        out,
        "\n{} regressed, {} improved, {} new, {} removed",
        diff.total_regressions(),
        diff.total_improvements(),
        diff.total_new(),
        diff.total_removed()
    )
    .unwrap();
    out
}

pub fn cmd_complexity(report: &CoverageReport, facts_path: &Path) -> Result<String> {
    let facts = JsonComplexityFacts::load(facts_path)
        .with_context(|| format!("Failed to read complexity facts {}", facts_path.display()))?;
    let result = complexity::analyze(&report.file_paths(), report, &facts);

    if result.classes.is_empty() {
        return Ok("No complexity data for the covered classes.\n".to_string());
    }

    let mut out = String::new();
    writeln!(
        out,
        "{:<60} {:>6} {:>6} {:>6}",
        "CLASS", "MAX", "AVG", "TOTAL"
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(81)).unwrap();
    for class in result.classes.values() {
        writeln!(
            out,
            "{:<60} {:>6} {:>6.1} {:>6}",
            class.class_name,
            class.max_complexity(),
            class.average_complexity(),
            class.total_complexity()
        )
        .unwrap();
    }

    let risky = result.high_risk_methods();
    if !risky.is_empty() {
        writeln!(out, "\nHigh-risk methods:").unwrap();
        for (key, method) in &risky {
            writeln!(
                out,
                "  {key}  complexity {}  coverage {:.1}%  risk {:.1}",
                method.cyclomatic_complexity,
                method.coverage_percentage,
                method.risk_score()
            )
            .unwrap();
        }
    }

    writeln!(
        out,
        "\nAverage complexity: {:.1}  Max: {}",
        result.average_complexity(),
        result.max_complexity()
    )
    .unwrap();
    Ok(out)
}

pub fn cmd_types(report: &CoverageReport, facts_path: &Path) -> Result<String> {
    let facts = JsonTypeFacts::load(facts_path)
        .with_context(|| format!("Failed to read type facts {}", facts_path.display()))?;
    let result = types::analyze_types(&report.file_paths(), &facts);

    if result.classes.is_empty() {
        return Ok("No type data for the covered classes.\n".to_string());
    }

    let mut out = String::new();
    for class in result.classes.values().filter(|c| !c.is_fully_typed()) {
        writeln!(
            out,
            "  {:<60} {:>6.1}%",
            class.class_name,
            class.coverage_percentage()
        )
        .unwrap();
        for missing in &class.missing_types {
            writeln!(out, "      {}", missing.label()).unwrap();
        }
    }
    writeln!(
        out,
        "\nFully typed: {}  Partial: {}  Untyped: {}  Overall: {:.1}%",
        result.total_fully_typed(),
        result.total_partially_typed(),
        result.total_untyped(),
        result.overall_percentage()
    )
    .unwrap();
    Ok(out)
}
