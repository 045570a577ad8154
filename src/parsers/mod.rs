pub mod clover;
pub mod instrumentation;

use std::collections::HashMap;
use std::path::Path;

use quick_xml::events::BytesStart;

use crate::detect::Format;
use crate::error::Result;
use crate::model::CoverageReport;

/// Every artifact format implements this trait.
pub trait CoverageParser {
    /// The format this parser handles.
    fn format(&self) -> Format;

    /// Cheap sniff of the path and leading bytes.
    fn can_parse(&self, path: &Path, content: &[u8]) -> bool;

    /// Parse the artifact bytes into a coverage report.
    fn parse(&self, input: &[u8]) -> Result<CoverageReport>;
}

/// Decode the first few KB of a file for format sniffing.
pub(crate) fn sniff_head(content: &[u8]) -> String {
    let head_len = content.len().min(4096);
    String::from_utf8_lossy(&content[..head_len]).into_owned()
}

/// Collect an element's attributes, recording malformed ones in `errors`
/// instead of silently dropping them.
pub(crate) fn attr_map(e: &BytesStart, errors: &mut Vec<String>) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for attr in e.attributes() {
        match attr {
            Ok(attr) => {
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                match attr.unescape_value() {
                    Ok(value) => {
                        attrs.insert(key, value.into_owned());
                    }
                    Err(err) => errors.push(format!("attribute '{key}': {err}")),
                }
            }
            Err(err) => errors.push(err.to_string()),
        }
    }
    attrs
}
