//! Drawing commands.
//!
//! Rendering lowers a layout into a stream of [`DrawCommand`] values that a
//! drawing surface applies in order. Commands are plain values; building one
//! never touches the model or the layout it was derived from.

use std::fmt;

use crate::{
    geometry::{Point, Size},
    style::ShapeStyle,
};

/// One drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Place the shape of a node.
    Shape(DrawShape),
    /// Place the connector of an edge.
    Connector(DrawConnector),
    /// Replace the text of an already placed node or edge.
    Text(SetText),
}

impl DrawCommand {
    /// Returns the node or edge id the command targets.
    pub fn target_id(&self) -> &str {
        match self {
            Self::Shape(shape) => shape.node_id(),
            Self::Connector(connector) => connector.edge_id(),
            Self::Text(text) => text.target_id(),
        }
    }

    /// Returns a short name of the command kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Shape(_) => "shape",
            Self::Connector(_) => "connector",
            Self::Text(_) => "text",
        }
    }
}

impl fmt::Display for DrawCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.target_id())
    }
}

impl From<DrawShape> for DrawCommand {
    fn from(shape: DrawShape) -> Self {
        Self::Shape(shape)
    }
}

impl From<DrawConnector> for DrawCommand {
    fn from(connector: DrawConnector) -> Self {
        Self::Connector(connector)
    }
}

impl From<SetText> for DrawCommand {
    fn from(text: SetText) -> Self {
        Self::Text(text)
    }
}

/// Draws the shape of one node with its top-left corner at `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawShape {
    node_id: String,
    position: Point,
    size: Size,
    style: ShapeStyle,
    text: Option<String>,
    shape_type: Option<String>,
}

impl DrawShape {
    pub fn new(node_id: impl Into<String>, position: Point, size: Size) -> Self {
        Self {
            node_id: node_id.into(),
            position,
            size,
            style: ShapeStyle::default(),
            text: None,
            shape_type: None,
        }
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the logical shape type the surface resolves to a template.
    pub fn with_shape_type(mut self, shape_type: impl Into<String>) -> Self {
        self.shape_type = Some(shape_type.into());
        self
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Returns the center of the shape.
    pub fn center(&self) -> Point {
        self.position.to_bounds(self.size).center()
    }

    pub fn style(&self) -> &ShapeStyle {
        &self.style
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn shape_type(&self) -> Option<&str> {
        self.shape_type.as_deref()
    }
}

/// Draws the connector of one edge along `points`.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawConnector {
    edge_id: String,
    points: Vec<Point>,
    style: ShapeStyle,
    text: Option<String>,
    ends: Option<(String, String)>,
    directed: bool,
}

impl DrawConnector {
    pub fn new(edge_id: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            edge_id: edge_id.into(),
            points,
            style: ShapeStyle::default(),
            text: None,
            ends: None,
            directed: true,
        }
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Names the source and target nodes so a surface can glue the connector.
    pub fn with_ends(mut self, source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        self.ends = Some((source_id.into(), target_id.into()));
        self
    }

    pub fn with_directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    pub fn edge_id(&self) -> &str {
        &self.edge_id
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn style(&self) -> &ShapeStyle {
        &self.style
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Returns `(source_id, target_id)` when known.
    pub fn ends(&self) -> Option<(&str, &str)> {
        self.ends
            .as_ref()
            .map(|(source, target)| (source.as_str(), target.as_str()))
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }
}

/// Sets or replaces the text of a placed node or edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetText {
    target_id: String,
    text: String,
}

impl SetText {
    pub fn new(target_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            text: text.into(),
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
