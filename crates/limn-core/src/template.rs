//! Template keys, template specifications and shape descriptors.
//!
//! A template is one reusable visual definition inside a template library.
//! Templates are addressed by a [`TemplateKey`], written `library!name` in
//! configuration.

use std::{fmt, path::PathBuf, str::FromStr};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

/// Identifies one template inside one template library.
///
/// # Examples
///
/// ```
/// use limn_core::template::TemplateKey;
///
/// let key: TemplateKey = "basic!Rectangle".parse().unwrap();
/// assert_eq!(key.library(), "basic");
/// assert_eq!(key.name(), "Rectangle");
/// assert_eq!(key.to_string(), "basic!Rectangle");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    library: String,
    name: String,
}

impl TemplateKey {
    pub fn new(library: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            name: name.into(),
        }
    }

    /// Returns the key of the library holding the template.
    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", self.library, self.name)
    }
}

/// Error returned when a `library!name` string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid template reference `{0}`, expected `library!name`")]
pub struct TemplateKeyError(pub String);

impl FromStr for TemplateKey {
    type Err = TemplateKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (library, name) = s
            .split_once('!')
            .ok_or_else(|| TemplateKeyError(s.to_string()))?;
        let (library, name) = (library.trim(), name.trim());
        if library.is_empty() || name.is_empty() {
            return Err(TemplateKeyError(s.to_string()));
        }
        Ok(Self::new(library, name))
    }
}

/// One template as listed by a loaded library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInfo {
    library: String,
    name: String,
    universal_name: String,
}

impl TemplateInfo {
    pub fn new(
        library: impl Into<String>,
        name: impl Into<String>,
        universal_name: impl Into<String>,
    ) -> Self {
        Self {
            library: library.into(),
            name: name.into(),
            universal_name: universal_name.into(),
        }
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    /// Returns the localized display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the locale-independent name templates are indexed by.
    pub fn universal_name(&self) -> &str {
        &self.universal_name
    }

    pub fn key(&self) -> TemplateKey {
        TemplateKey::new(&self.library, &self.universal_name)
    }
}

/// How template names are matched when indexing a library.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum MatchMode {
    /// Exact, case-sensitive match.
    #[default]
    #[serde(rename = "strict")]
    Strict,
    #[serde(rename = "caseInsensitive", alias = "case_insensitive")]
    CaseInsensitive,
}

impl MatchMode {
    /// Folds a template name into the form used as index key.
    pub fn index_key(self, name: &str) -> String {
        match self {
            Self::Strict => name.to_string(),
            Self::CaseInsensitive => name.to_lowercase(),
        }
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "caseinsensitive" | "case_insensitive" | "case-insensitive" => {
                Ok(Self::CaseInsensitive)
            }
            other => Err(format!("unknown match mode `{other}`")),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::CaseInsensitive => write!(f, "caseInsensitive"),
        }
    }
}

/// A template library to open, under the key mappings refer to it by.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LibrarySpec {
    key: String,
    path: PathBuf,
}

impl LibrarySpec {
    pub fn new(key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn set_path(&mut self, path: PathBuf) {
        self.path = path;
    }
}

/// Declarative description of the templates one session uses.
///
/// Mapping targets and the fallback are `library!name` strings; they are
/// checked when the resolver is prepared, not when the configuration is parsed.
///
/// # Examples
///
/// ```
/// use limn_core::template::{LibrarySpec, MatchMode, TemplateSpec};
///
/// let spec = TemplateSpec::default()
///     .with_library(LibrarySpec::new("basic", "basic.toml"))
///     .with_mapping("process", "basic!Rectangle")
///     .with_fallback("basic!Rectangle")
///     .with_match_mode(MatchMode::CaseInsensitive);
///
/// assert_eq!(spec.libraries().len(), 1);
/// assert_eq!(spec.shape_mapping().get("process").map(String::as_str), Some("basic!Rectangle"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemplateSpec {
    #[serde(alias = "templatePath")]
    template_path: Option<PathBuf>,
    libraries: Vec<LibrarySpec>,
    #[serde(alias = "shapeMapping")]
    shape_mapping: IndexMap<String, String>,
    #[serde(alias = "themeName")]
    theme_name: Option<String>,
    #[serde(alias = "themePath")]
    theme_path: Option<PathBuf>,
    #[serde(alias = "themeVariant")]
    theme_variant: Option<u8>,
    fallback: Option<String>,
    #[serde(alias = "matchMode")]
    match_mode: MatchMode,
}

impl TemplateSpec {
    /// Document the session starts from instead of a blank one.
    pub fn template_path(&self) -> Option<&PathBuf> {
        self.template_path.as_ref()
    }

    pub fn libraries(&self) -> &[LibrarySpec] {
        &self.libraries
    }

    pub fn libraries_mut(&mut self) -> &mut Vec<LibrarySpec> {
        &mut self.libraries
    }

    /// Logical type to `library!name`, in declaration order.
    pub fn shape_mapping(&self) -> &IndexMap<String, String> {
        &self.shape_mapping
    }

    pub fn theme_name(&self) -> Option<&str> {
        self.theme_name.as_deref()
    }

    pub fn theme_path(&self) -> Option<&PathBuf> {
        self.theme_path.as_ref()
    }

    pub fn theme_variant(&self) -> Option<u8> {
        self.theme_variant
    }

    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    pub fn with_template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    pub fn set_template_path(&mut self, path: Option<PathBuf>) {
        self.template_path = path;
    }

    pub fn with_library(mut self, library: LibrarySpec) -> Self {
        self.libraries.push(library);
        self
    }

    pub fn with_mapping(mut self, logical_type: impl Into<String>, target: impl Into<String>) -> Self {
        self.shape_mapping.insert(logical_type.into(), target.into());
        self
    }

    pub fn with_theme(mut self, name: impl Into<String>) -> Self {
        self.theme_name = Some(name.into());
        self
    }

    pub fn with_theme_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.theme_path = Some(path.into());
        self
    }

    pub fn set_theme_path(&mut self, path: Option<PathBuf>) {
        self.theme_path = path;
    }

    pub fn with_theme_variant(mut self, variant: u8) -> Self {
        self.theme_variant = Some(variant);
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }
}

/// Result of looking up a shape key in a shape catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeDescriptor {
    key: String,
    library: Option<String>,
    properties: IndexMap<String, String>,
}

impl ShapeDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            library: None,
            properties: IndexMap::new(),
        }
    }

    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Returns the shape key the descriptor resolves to.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn library(&self) -> Option<&str> {
        self.library.as_deref()
    }

    pub fn properties(&self) -> &IndexMap<String, String> {
        &self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_key_parse() {
        let key: TemplateKey = " flow ! Decision ".parse().unwrap();
        assert_eq!(key, TemplateKey::new("flow", "Decision"));

        assert!("Decision".parse::<TemplateKey>().is_err());
        assert!("!Decision".parse::<TemplateKey>().is_err());
        assert!("flow!".parse::<TemplateKey>().is_err());
    }

    #[test]
    fn test_template_key_error_message() {
        let err = "nope".parse::<TemplateKey>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid template reference `nope`, expected `library!name`"
        );
    }

    #[test]
    fn test_match_mode_index_key() {
        assert_eq!(MatchMode::Strict.index_key("Process"), "Process");
        assert_eq!(MatchMode::CaseInsensitive.index_key("Process"), "process");
        assert_eq!(
            "caseInsensitive".parse::<MatchMode>().unwrap(),
            MatchMode::CaseInsensitive
        );
        assert!("fuzzy".parse::<MatchMode>().is_err());
    }

    #[test]
    fn test_template_info_key_uses_universal_name() {
        let info = TemplateInfo::new("basic", "Rechteck", "Rectangle");
        assert_eq!(info.key(), TemplateKey::new("basic", "Rectangle"));
    }

    #[test]
    fn test_shape_descriptor_builder() {
        let descriptor = ShapeDescriptor::new("Rectangle")
            .with_library("basic")
            .with_property("rounding", "4");

        assert_eq!(descriptor.library(), Some("basic"));
        assert_eq!(
            descriptor.properties().get("rounding").map(String::as_str),
            Some("4")
        );
    }
}
