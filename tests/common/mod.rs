#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Copy a fixture into a fresh temporary directory under `file_name`.
/// The caller must hold onto `TempDir` to keep the temp directory alive.
pub fn stage_fixture(name: &str, file_name: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(file_name);
    std::fs::copy(fixture(name), &path).unwrap();
    (dir, path)
}

pub fn prefixes(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub fn default_prefixes() -> Vec<String> {
    prefixes(&covlens::parsers::clover::DEFAULT_INCLUDE_PREFIXES)
}
