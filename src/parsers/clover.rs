/// Parser for Clover XML coverage reports.
///
/// Only the subset below is meaningful; every other element and attribute
/// is ignored:
///
///   <coverage>
///     <project>
///       <file name="/abs/path/app/Models/User.php">
///         <class name="User" namespace="App\Models"/>
///         <line num="12" type="method" name="getFullName" visibility="public" count="3"/>
///         <line num="13" type="stmt" count="3"/>
///       </file>
///     </project>
///   </coverage>
///
/// `<file>` elements may also sit inside `<package>` wrappers.
///
/// Clover does not nest `<line>` elements inside `<class>`, so method facts
/// are file-scoped: every class declared in a file receives the same
/// method set.
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use log::debug;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use super::{attr_map, CoverageParser};
use crate::detect::Format;
use crate::error::{CovlensError, Result};
use crate::model::{ClassCoverage, CoverageReport, MethodCoverage, RawMethod};

/// Directory prefixes included when the caller does not supply any.
pub const DEFAULT_INCLUDE_PREFIXES: [&str; 2] = ["app/", "src/"];

/// Name PHPUnit gives to anonymous classes.
const ANONYMOUS_CLASS: &str = "{anonymous}";

/// Clover XML format parser.
#[derive(Debug, Clone)]
pub struct CloverParser {
    include_prefixes: Vec<String>,
}

impl Default for CloverParser {
    fn default() -> Self {
        Self::new(DEFAULT_INCLUDE_PREFIXES.iter().map(|p| p.to_string()))
    }
}

impl CloverParser {
    pub fn new(include_prefixes: impl IntoIterator<Item = String>) -> Self {
        Self {
            include_prefixes: include_prefixes.into_iter().collect(),
        }
    }

    pub fn include_prefixes(&self) -> &[String] {
        &self.include_prefixes
    }
}

impl CoverageParser for CloverParser {
    fn format(&self) -> Format {
        Format::Clover
    }

    fn can_parse(&self, _path: &Path, content: &[u8]) -> bool {
        let head = super::sniff_head(content);
        let trimmed = head.trim_start();
        (trimmed.starts_with("<?xml") || trimmed.starts_with('<')) && head.contains("<coverage")
    }

    fn parse(&self, input: &[u8]) -> Result<CoverageReport> {
        parse(input, &self.include_prefixes)
    }
}

/// True when the normalized path contains `/{prefix}` for any prefix.
///
/// This is a substring match, not a leading-prefix match, so artifacts
/// recorded under different absolute roots still select the same files.
pub fn should_include_file(file_path: &str, include_prefixes: &[String]) -> bool {
    let normalized = file_path.replace('\\', "/");
    include_prefixes.iter().any(|prefix| {
        let prefix = prefix.replace('\\', "/");
        normalized.contains(&format!("/{prefix}"))
    })
}

/// Resolve `namespace\name`, treating an empty or `global` namespace as none.
pub fn resolve_class_name(namespace: &str, name: &str) -> String {
    if !namespace.is_empty() && namespace != "global" {
        format!("{namespace}\\{name}")
    } else {
        name.to_string()
    }
}

pub(crate) fn is_anonymous(name: &str) -> bool {
    name == ANONYMOUS_CLASS || name.contains("@anonymous")
}

/// A `<line type="method">` entry.
#[derive(Debug)]
struct MethodLine {
    name: String,
    /// Absent when the `num` attribute is missing or not a number.
    num: Option<u32>,
    end: u32,
    count: u64,
    visibility: String,
}

impl RawMethod for MethodLine {
    fn executable_lines(&self) -> u32 {
        1
    }

    fn executed_lines(&self) -> u32 {
        u32::from(self.count > 0)
    }

    fn start_line(&self) -> u32 {
        self.num.unwrap_or(0)
    }

    fn end_line(&self) -> u32 {
        self.end
    }

    fn visibility(&self) -> &str {
        &self.visibility
    }
}

/// Everything collected between `<file>` and `</file>`.
#[derive(Debug, Default)]
struct FileState {
    path: String,
    included: bool,
    classes: Vec<String>,
    methods: Vec<MethodLine>,
    line_numbers: Vec<u32>,
}

impl FileState {
    /// Build the method set shared by every class in this file.
    fn into_parts(mut self) -> (String, Vec<String>, Vec<MethodCoverage>) {
        self.line_numbers.sort_unstable();
        let starts: Vec<u32> = self.methods.iter().filter_map(|m| m.num).collect();

        for method in &mut self.methods {
            let Some(num) = method.num else {
                continue;
            };
            let next_start = starts
                .iter()
                .copied()
                .filter(|&s| s > num)
                .min()
                .unwrap_or(u32::MAX);
            method.end = self
                .line_numbers
                .iter()
                .copied()
                .filter(|&n| n >= num && n < next_start)
                .max()
                .unwrap_or(num);
        }

        let methods = self
            .methods
            .iter()
            .map(|m| MethodCoverage::resolve(m.name.clone(), m))
            .collect();
        (self.path, self.classes, methods)
    }
}

/// Parse Clover XML bytes, keeping only files under `include_prefixes`.
pub fn parse(input: &[u8], include_prefixes: &[String]) -> Result<CoverageReport> {
    let mut xml = Reader::from_reader(input);
    xml.trim_text(true);
    let mut buf = Vec::new();

    let mut errors: Vec<String> = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut saw_root = false;

    let mut classes: BTreeMap<String, ClassCoverage> = BTreeMap::new();
    let mut current_file: Option<FileState> = None;

    loop {
        let event = xml.read_event_into(&mut buf);
        let is_start = matches!(event, Ok(Event::Start(_)));
        match event {
            Err(e) => {
                errors.push(format!("{e} at position {}", xml.buffer_position()));
                break;
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                saw_root = true;
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match name.as_str() {
                    "file" if is_start => {
                        let attrs = attr_map(e, &mut errors);
                        let path = attrs.get("name").cloned().unwrap_or_default();
                        let included =
                            !path.is_empty() && should_include_file(&path, include_prefixes);
                        if !included {
                            debug!("skipping {path:?}: outside include prefixes");
                        }
                        current_file = Some(FileState {
                            path,
                            included,
                            ..Default::default()
                        });
                    }
                    "class" => {
                        let attrs = attr_map(e, &mut errors);
                        if let Some(file) = current_file.as_mut().filter(|f| f.included) {
                            let class_name = attrs.get("name").map(String::as_str).unwrap_or("");
                            let namespace =
                                attrs.get("namespace").map(String::as_str).unwrap_or("");
                            if class_name.is_empty() || is_anonymous(class_name) {
                                debug!("skipping unnamed class in {}", file.path);
                            } else {
                                file.classes.push(resolve_class_name(namespace, class_name));
                            }
                        }
                    }
                    "line" => {
                        let attrs = attr_map(e, &mut errors);
                        if let Some(file) = current_file.as_mut().filter(|f| f.included) {
                            collect_line(file, &attrs);
                        }
                    }
                    _ => {}
                }
                if is_start {
                    open.push(name);
                }
            }
            Ok(Event::End(ref e)) => {
                open.pop();
                if e.name().as_ref() == b"file" {
                    if let Some(file) = current_file.take() {
                        finish_file(file, &mut classes);
                    }
                }
            }
            _ => {}
        }
        buf.clear();
    }

    if errors.is_empty() {
        if !saw_root {
            errors.push("Document is empty".to_string());
        }
        if let Some(tag) = open.last() {
            errors.push(format!("Premature end of data in tag {tag}"));
        }
    }

    if !errors.is_empty() {
        return Err(CovlensError::MalformedDocument(errors.join(", ")));
    }

    Ok(CoverageReport::new(classes.into_values()))
}

fn collect_line(file: &mut FileState, attrs: &HashMap<String, String>) {
    let line_type = attrs.get("type").map(String::as_str);
    if !matches!(line_type, Some("stmt") | Some("method")) {
        return;
    }
    let num = attrs.get("num").and_then(|v| v.parse::<u32>().ok());
    if let Some(num) = num {
        file.line_numbers.push(num);
    }

    if line_type != Some("method") {
        return;
    }
    let name = attrs.get("name").cloned().unwrap_or_default();
    if name.is_empty() {
        return;
    }
    let count = attrs
        .get("count")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    let visibility = attrs
        .get("visibility")
        .cloned()
        .unwrap_or_else(|| "public".to_string());
    file.methods.push(MethodLine {
        name,
        num,
        end: num.unwrap_or(0),
        count,
        visibility,
    });
}

fn finish_file(file: FileState, classes: &mut BTreeMap<String, ClassCoverage>) {
    if !file.included || file.classes.is_empty() {
        return;
    }
    let (path, names, methods) = file.into_parts();
    if methods.is_empty() {
        debug!("skipping classes in {path}: no method lines");
        return;
    }
    for fqcn in names {
        // Last write wins across files.
        classes.insert(
            fqcn.clone(),
            ClassCoverage::new(fqcn, path.clone(), methods.clone()),
        );
    }
}
