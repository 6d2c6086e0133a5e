//! Template libraries stored as TOML files.
//!
//! ```toml
//! [[template]]
//! name = "Prozess"
//! universal_name = "Process"
//! shape = "rounded_rectangle"
//! width = 140.0
//! height = 70.0
//! ```

use std::{fs, path::Path};

use serde::Deserialize;

use limn_core::{geometry::Size, template::TemplateInfo};

use crate::automation::{BasicShape, SessionError};

/// Size of a dropped template that declares none.
const DEFAULT_TEMPLATE_SIZE: Size = Size::new(120.0, 60.0);

#[derive(Debug, Deserialize)]
struct LibraryFile {
    #[serde(default, rename = "template")]
    templates: Vec<TemplateEntry>,
}

/// One template of a library file.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateEntry {
    name: String,
    universal_name: Option<String>,
    #[serde(default)]
    shape: BasicShape,
    width: Option<f32>,
    height: Option<f32>,
}

impl TemplateEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Locale-independent name; the local name when none is given.
    pub fn universal_name(&self) -> &str {
        self.universal_name.as_deref().unwrap_or(&self.name)
    }

    pub fn shape(&self) -> BasicShape {
        self.shape
    }

    /// Size the template is dropped with.
    pub fn size(&self) -> Size {
        Size::new(
            self.width.unwrap_or(DEFAULT_TEMPLATE_SIZE.width()),
            self.height.unwrap_or(DEFAULT_TEMPLATE_SIZE.height()),
        )
        .or_dimensions_of(DEFAULT_TEMPLATE_SIZE)
    }
}

/// An opened template library.
#[derive(Debug, Clone)]
pub struct SketchLibrary {
    name: String,
    templates: Vec<TemplateEntry>,
}

impl SketchLibrary {
    /// Reads a library file. The library is named after the file stem.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let open_error = |reason: String| SessionError::Open {
            path: path.display().to_string(),
            reason,
        };
        let content = fs::read_to_string(path).map_err(|err| open_error(err.to_string()))?;
        let file: LibraryFile = toml::from_str(&content).map_err(|err| open_error(err.to_string()))?;

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            templates: file.templates,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template descriptions in file order.
    pub fn infos(&self) -> Vec<TemplateInfo> {
        self.templates
            .iter()
            .map(|entry| TemplateInfo::new(&self.name, entry.name(), entry.universal_name()))
            .collect()
    }

    /// Finds a template by its universal name.
    pub fn find(&self, universal_name: &str) -> Option<&TemplateEntry> {
        self.templates
            .iter()
            .find(|entry| entry.universal_name() == universal_name)
    }
}
