mod common;

use covlens::detect::Format;
use covlens::error::CovlensError;
use covlens::ingest;

#[test]
fn parse_scenario_with_default_prefixes() {
    let report = ingest::parse(
        &common::fixture("clover_scenario.xml"),
        &common::default_prefixes(),
    )
    .unwrap();

    assert_eq!(report.total_classes(), 3);
    assert_eq!(report.total_fully_covered(), 1);
    assert_eq!(report.total_partially_covered(), 1);
    assert_eq!(report.total_uncovered(), 1);
    assert!(!report.contains("Acme\\Support\\Helper"));

    let invoice = report.get("App\\Services\\InvoiceService").unwrap();
    assert!(invoice.is_fully_uncovered());
    let names: Vec<_> = invoice.methods().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["cancel", "refund", "generateInvoice"]);
    assert_eq!(invoice.method("generateInvoice").unwrap().visibility, "private");

    let payment = report.get("App\\Services\\PaymentService").unwrap();
    assert_eq!(payment.coverage_percentage(), 66.7);
    let uncovered: Vec<_> = payment
        .uncovered_methods()
        .iter()
        .map(|m| m.label())
        .collect();
    assert_eq!(uncovered, vec!["refund():L24-27"]);

    let user = report.get("App\\Models\\User").unwrap();
    assert!(user.is_fully_covered());
    assert_eq!(user.file_path(), "/var/www/shop/app/Models/User.php");
}

#[test]
fn parse_scenario_with_vendor_prefix() {
    let report = ingest::parse(
        &common::fixture("clover_scenario.xml"),
        &common::prefixes(&["vendor/"]),
    )
    .unwrap();

    assert_eq!(report.total_classes(), 1);
    let helper = report.get("Acme\\Support\\Helper").unwrap();
    assert!(helper.is_fully_covered());
}

#[test]
fn parse_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.xml");

    let err = ingest::parse(&missing, &common::default_prefixes()).unwrap_err();
    assert!(matches!(err, CovlensError::FileNotFound(ref p) if p == &missing));
    assert!(err.to_string().contains("nope.xml"));
}

#[test]
fn parse_unreadable_path() {
    // A directory exists but cannot be read as a file.
    let dir = tempfile::tempdir().unwrap();

    let err = ingest::parse(dir.path(), &common::default_prefixes()).unwrap_err();
    assert!(
        matches!(err, CovlensError::FileUnreadable { ref path, .. } if path == dir.path()),
        "{err}"
    );
}

#[test]
fn parse_malformed_document() {
    let err = ingest::parse(
        &common::fixture("malformed_clover.xml"),
        &common::default_prefixes(),
    )
    .unwrap_err();

    assert!(matches!(err, CovlensError::MalformedDocument(_)));
    assert!(err.to_string().starts_with("Failed to parse coverage XML: "));
}

#[test]
fn parse_empty_file_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clover.xml");
    std::fs::write(&path, b"").unwrap();

    let err = ingest::parse(&path, &common::default_prefixes()).unwrap_err();
    assert!(matches!(err, CovlensError::MalformedDocument(ref msg) if msg == "Document is empty"));
}

#[test]
fn ingest_clover_auto_detect() {
    let (_dir, path) = common::stage_fixture("clover_scenario.xml", "coverage.xml");

    let (report, format) = ingest::ingest(&path, None, &common::default_prefixes()).unwrap();
    assert_eq!(format, Format::Clover);
    assert_eq!(report.len(), 3);
}

#[test]
fn ingest_instrumentation_auto_detect() {
    let (_dir, path) = common::stage_fixture("instrumentation.json", "coverage.json");

    let (report, format) = ingest::ingest(&path, None, &common::default_prefixes()).unwrap();
    assert_eq!(format, Format::Instrumentation);

    // `Blank` has no methods and is dropped.
    assert_eq!(report.len(), 2);

    let cart = report.get("Shop\\Cart").unwrap();
    assert_eq!(cart.methods().len(), 2);
    assert!(cart.method("__construct").is_none());
    // Any executed line marks a method covered; line coverage stays partial.
    assert!(cart.is_fully_covered());
    assert_eq!(cart.line_coverage_percentage(), 70.0);

    let concern = report.get("Shop\\Concerns\\HasTotals").unwrap();
    assert!(concern.is_fully_uncovered());
    assert_eq!(concern.method("sum").unwrap().visibility, "protected");
}

#[test]
fn ingest_with_format_override() {
    // Instrumentation JSON under a name that would not be detected by extension.
    let (_dir, path) = common::stage_fixture("instrumentation.json", "coverage.dump");

    let (report, format) =
        ingest::ingest(&path, Some("instrumentation"), &common::default_prefixes()).unwrap();
    assert_eq!(format, Format::Instrumentation);
    assert!(report.contains("Shop\\Cart"));

    let err = ingest::ingest(&path, Some("cobertura"), &common::default_prefixes()).unwrap_err();
    assert!(err.to_string().contains("Unknown format"));
}

#[test]
fn ingest_unknown_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"just some text").unwrap();

    let err = ingest::ingest(&path, None, &common::default_prefixes()).unwrap_err();
    assert!(matches!(err, CovlensError::UnknownFormat));
}
