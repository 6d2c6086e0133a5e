//! Loading diagram models from JSON files.
//!
//! The file is an envelope with camelCase fields:
//!
//! ```json
//! {
//!   "schemaVersion": "1.0",
//!   "nodes": [
//!     { "id": "api", "label": "API", "type": "service", "size": { "width": 140, "height": 70 } }
//!   ],
//!   "edges": [
//!     { "sourceId": "api", "targetId": "db", "label": "reads", "directed": true }
//!   ],
//!   "metadata": { "owner": "platform" }
//! }
//! ```
//!
//! Edges without an `id` are named `source->target`.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use limn::{
    LimnError,
    cancel::CancellationToken,
    color::Color,
    geometry::Size,
    model::{DiagramModel, Edge, Node},
    provider::ModelProvider,
    style::{LinePattern, ShapeStyle},
};

/// Schema version understood by the loader.
const SCHEMA_VERSION: &str = "1.0";

/// Errors raised while loading a JSON model.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to read model `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema version `{0}`, expected `{SCHEMA_VERSION}`")]
    UnsupportedSchema(String),

    #[error("model has no nodes")]
    NoNodes,

    #[error("{owner}: invalid {field} `{value}`: {reason}")]
    InvalidStyle {
        owner: String,
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("node `{0}` has a negative size")]
    NegativeSize(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelFile {
    schema_version: Option<String>,
    nodes: Vec<NodeEntry>,
    #[serde(default)]
    edges: Vec<EdgeEntry>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeEntry {
    id: String,
    label: String,
    #[serde(rename = "type")]
    shape_type: Option<String>,
    size: Option<SizeEntry>,
    style: Option<StyleEntry>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EdgeEntry {
    id: Option<String>,
    source_id: String,
    target_id: String,
    label: Option<String>,
    #[serde(default = "directed_by_default")]
    directed: bool,
    style: Option<StyleEntry>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

fn directed_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct SizeEntry {
    width: f32,
    height: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StyleEntry {
    fill: Option<String>,
    stroke: Option<String>,
    line_pattern: Option<String>,
}

impl StyleEntry {
    fn to_style(&self, owner: &str) -> Result<ShapeStyle, ModelLoadError> {
        let invalid = |field, value: &str, reason: String| ModelLoadError::InvalidStyle {
            owner: owner.to_string(),
            field,
            value: value.to_string(),
            reason,
        };

        let mut style = ShapeStyle::default();
        if let Some(fill) = &self.fill {
            let color = Color::new(fill).map_err(|reason| invalid("fill", fill.as_str(), reason))?;
            style.set_fill(Some(color));
        }
        if let Some(stroke) = &self.stroke {
            let color = Color::new(stroke).map_err(|reason| invalid("stroke", stroke.as_str(), reason))?;
            style.set_stroke(Some(color));
        }
        if let Some(pattern) = &self.line_pattern {
            let pattern: LinePattern = pattern
                .parse()
                .map_err(|reason| invalid("line pattern", pattern.as_str(), reason))?;
            style.set_line_pattern(Some(pattern));
        }
        Ok(style)
    }
}

/// Metadata values are kept as strings; strings are taken verbatim, other
/// values in their JSON form.
fn metadata_pairs(metadata: Map<String, Value>) -> impl Iterator<Item = (String, String)> {
    metadata.into_iter().map(|(key, value)| {
        let value = match value {
            Value::String(text) => text,
            other => other.to_string(),
        };
        (key, value)
    })
}

/// Parses a JSON model document.
///
/// # Errors
///
/// Returns a [`ModelLoadError`] for malformed JSON, an unsupported schema
/// version, an empty node list and invalid sizes or styles. Ids are not
/// checked here; the build pipeline validates them.
pub fn parse_model(source: &str) -> Result<DiagramModel, ModelLoadError> {
    let file: ModelFile = serde_json::from_str(source)?;

    if let Some(version) = &file.schema_version {
        if !version.trim().eq_ignore_ascii_case(SCHEMA_VERSION) {
            return Err(ModelLoadError::UnsupportedSchema(version.clone()));
        }
    }
    if file.nodes.is_empty() {
        return Err(ModelLoadError::NoNodes);
    }

    let mut model = DiagramModel::new();
    for entry in file.nodes {
        let mut node = Node::new(&entry.id, entry.label);
        if let Some(shape_type) = entry.shape_type {
            node = node.with_shape_type(shape_type);
        }
        if let Some(size) = entry.size {
            let size = Size::new(size.width, size.height);
            if !size.is_non_negative() {
                return Err(ModelLoadError::NegativeSize(entry.id));
            }
            node = node.with_size(size);
        }
        if let Some(style) = &entry.style {
            node = node.with_style(style.to_style(&format!("node `{}`", entry.id))?);
        }
        for (key, value) in metadata_pairs(entry.metadata) {
            node = node.with_metadata(key, value);
        }
        model.add_node(node);
    }

    for entry in file.edges {
        let id = entry
            .id
            .unwrap_or_else(|| format!("{}->{}", entry.source_id, entry.target_id));
        let mut edge = Edge::new(&id, entry.source_id, entry.target_id).with_directed(entry.directed);
        if let Some(label) = entry.label {
            edge = edge.with_label(label);
        }
        if let Some(style) = &entry.style {
            edge = edge.with_style(style.to_style(&format!("edge `{id}`"))?);
        }
        for (key, value) in metadata_pairs(entry.metadata) {
            edge = edge.with_metadata(key, value);
        }
        model.add_edge(edge);
    }

    for (key, value) in metadata_pairs(file.metadata) {
        model.metadata_mut().insert(key, value);
    }

    Ok(model)
}

/// Reads the model from a JSON file on every call.
#[derive(Debug, Clone)]
pub struct JsonModelProvider {
    path: PathBuf,
}

impl JsonModelProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<DiagramModel, ModelLoadError> {
        let source = fs::read_to_string(&self.path).map_err(|source| ModelLoadError::Read {
            path: self.path.clone(),
            source,
        })?;
        let model = parse_model(&source)?;
        debug!(
            path = self.path.display().to_string(),
            nodes = model.nodes().len(),
            edges = model.edges().len();
            "Model loaded"
        );
        Ok(model)
    }
}

impl ModelProvider for JsonModelProvider {
    fn model(&self, cancel: &CancellationToken) -> Result<DiagramModel, LimnError> {
        if cancel.is_cancelled() {
            return Err(LimnError::Cancelled);
        }
        self.load().map_err(LimnError::provider)
    }
}
