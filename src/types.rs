//! Type-declaration coverage: how many parameters, return types and
//! properties carry an explicit type. Declaration facts come from an
//! external analyzer through [`TypeFactSource`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::percentage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Return,
    Param,
    Property,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeclarationKind::Return => "return",
            DeclarationKind::Param => "param",
            DeclarationKind::Property => "property",
        })
    }
}

/// A declaration lacking a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingTypeInfo {
    pub kind: DeclarationKind,
    pub name: String,
    pub line: u32,
    /// Enclosing method (or property owner) name.
    pub context: String,
}

impl MissingTypeInfo {
    /// Formats as `param $id in find() L12`.
    pub fn label(&self) -> String {
        format!("{} {} in {}() L{}", self.kind, self.name, self.context, self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassTypeCoverage {
    pub class_name: String,
    pub file_path: String,
    pub total_declarations: u32,
    pub typed_declarations: u32,
    #[serde(default)]
    pub missing_types: Vec<MissingTypeInfo>,
}

impl ClassTypeCoverage {
    pub fn is_fully_typed(&self) -> bool {
        self.missing_types.is_empty()
    }

    pub fn coverage_percentage(&self) -> f64 {
        percentage(
            u64::from(self.typed_declarations),
            u64::from(self.total_declarations),
        )
    }

    pub fn missing_count(&self) -> usize {
        self.missing_types.len()
    }

    fn missing_of(&self, kind: DeclarationKind) -> Vec<&MissingTypeInfo> {
        self.missing_types.iter().filter(|m| m.kind == kind).collect()
    }

    pub fn missing_return_types(&self) -> Vec<&MissingTypeInfo> {
        self.missing_of(DeclarationKind::Return)
    }

    pub fn missing_param_types(&self) -> Vec<&MissingTypeInfo> {
        self.missing_of(DeclarationKind::Param)
    }

    pub fn missing_property_types(&self) -> Vec<&MissingTypeInfo> {
        self.missing_of(DeclarationKind::Property)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeCoverageReport {
    pub classes: BTreeMap<String, ClassTypeCoverage>,
}

impl TypeCoverageReport {
    pub fn fully_typed_classes(&self) -> Vec<&ClassTypeCoverage> {
        self.classes.values().filter(|c| c.is_fully_typed()).collect()
    }

    pub fn partially_typed_classes(&self) -> Vec<&ClassTypeCoverage> {
        self.classes
            .values()
            .filter(|c| !c.is_fully_typed() && c.typed_declarations > 0)
            .collect()
    }

    pub fn untyped_classes(&self) -> Vec<&ClassTypeCoverage> {
        self.classes
            .values()
            .filter(|c| c.typed_declarations == 0 && c.total_declarations > 0)
            .collect()
    }

    pub fn total_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn total_fully_typed(&self) -> usize {
        self.fully_typed_classes().len()
    }

    pub fn total_partially_typed(&self) -> usize {
        self.partially_typed_classes().len()
    }

    pub fn total_untyped(&self) -> usize {
        self.untyped_classes().len()
    }

    /// Typed over total declarations, pooled across classes.
    pub fn overall_percentage(&self) -> f64 {
        let (typed, total) = self.classes.values().fold((0u64, 0u64), |(t, n), c| {
            (
                t + u64::from(c.typed_declarations),
                n + u64::from(c.total_declarations),
            )
        });
        percentage(typed, total)
    }
}

/// Supplies per-class declaration facts for a source file.
pub trait TypeFactSource {
    fn types_for_file(&self, path: &Path) -> Result<Vec<ClassTypeCoverage>>;
}

/// Precomputed declaration facts keyed by source file path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonTypeFacts {
    files: HashMap<String, Vec<ClassTypeCoverage>>,
}

impl JsonTypeFacts {
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(input)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_slice(&std::fs::read(path)?)
    }
}

impl TypeFactSource for JsonTypeFacts {
    fn types_for_file(&self, path: &Path) -> Result<Vec<ClassTypeCoverage>> {
        let key = path.to_string_lossy();
        Ok(self.files.get(key.as_ref()).cloned().unwrap_or_default())
    }
}

/// Collect type coverage for `file_paths`; files the source cannot handle
/// are skipped.
pub fn analyze_types(file_paths: &[String], source: &dyn TypeFactSource) -> TypeCoverageReport {
    let mut classes = BTreeMap::new();
    for file_path in file_paths {
        match source.types_for_file(Path::new(file_path)) {
            Ok(found) => {
                for class in found {
                    classes.insert(class.class_name.clone(), class);
                }
            }
            Err(e) => warn!("no type facts for {file_path}: {e}"),
        }
    }
    TypeCoverageReport { classes }
}
