//! Diagram model: nodes, edges and the model that owns them.
//!
//! The model is plain data. Identifiers are kept exactly as given; nodes and
//! edges share one case-insensitive identifier namespace, which the build
//! pipeline checks before layout.
//!
//! # Examples
//!
//! ```
//! use limn_core::model::{DiagramModel, Edge, Node};
//!
//! let mut model = DiagramModel::new();
//! model.add_node(Node::new("A", "Client"));
//! model.add_node(Node::new("B", "Server").with_shape_type("process"));
//! model.add_edge(Edge::new("A->B", "A", "B").with_label("calls"));
//!
//! assert_eq!(model.nodes().len(), 2);
//! assert!(model.node("a").is_some());
//! ```

use std::collections::HashMap;

use crate::{
    geometry::Size,
    metadata::{self, Metadata},
    style::ShapeStyle,
};

/// A diagram node, drawn as one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: String,
    label: String,
    shape_type: Option<String>,
    size: Option<Size>,
    style: ShapeStyle,
    metadata: Metadata,
}

impl Node {
    /// Creates a node with a default style, no type and no explicit size.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            shape_type: None,
            size: None,
            style: ShapeStyle::default(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_shape_type(mut self, shape_type: impl Into<String>) -> Self {
        self.shape_type = Some(shape_type.into());
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key, value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Returns the logical shape kind used for template resolution.
    pub fn shape_type(&self) -> Option<&str> {
        self.shape_type.as_deref()
    }

    pub fn set_shape_type(&mut self, shape_type: Option<String>) {
        self.shape_type = shape_type;
    }

    /// Returns the explicit size; `None` lets the layout engine pick one.
    pub fn size(&self) -> Option<Size> {
        self.size
    }

    pub fn set_size(&mut self, size: Option<Size>) {
        self.size = size;
    }

    pub fn style(&self) -> &ShapeStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

/// A connector between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    id: String,
    source_id: String,
    target_id: String,
    label: Option<String>,
    directed: bool,
    style: ShapeStyle,
    metadata: Metadata,
}

impl Edge {
    /// Creates a directed, unlabeled edge with a default style.
    pub fn new(
        id: impl Into<String>,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            label: None,
            directed: true,
            style: ShapeStyle::default(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key, value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn style(&self) -> &ShapeStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

/// Ordered nodes and edges plus model-level metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    metadata: Metadata,
}

impl DiagramModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a model from node and edge collections, keeping their order.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = Node>,
        edges: impl IntoIterator<Item = Edge>,
    ) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
            edges: edges.into_iter().collect(),
            metadata: Metadata::new(),
        }
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.nodes
    }

    pub fn edges_mut(&mut self) -> &mut Vec<Edge> {
        &mut self.edges
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Finds a node by id, ignoring case.
    ///
    /// This scans the nodes; use [`DiagramModel::index`] for repeated lookups.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| same_id(node.id(), id))
    }

    /// Finds an edge by id, ignoring case.
    ///
    /// This scans the edges; use [`DiagramModel::index`] for repeated lookups.
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| same_id(edge.id(), id))
    }

    /// Builds a case-insensitive lookup table over the current nodes and edges.
    pub fn index(&self) -> ModelIndex<'_> {
        ModelIndex::new(self)
    }
}

/// Case-insensitive id lookup over a borrowed model.
///
/// When ids collide the first node or edge in model order wins, the same one
/// [`DiagramModel::node`] and [`DiagramModel::edge`] return.
#[derive(Debug, Clone)]
pub struct ModelIndex<'a> {
    nodes: HashMap<String, &'a Node>,
    edges: HashMap<String, &'a Edge>,
}

impl<'a> ModelIndex<'a> {
    fn new(model: &'a DiagramModel) -> Self {
        let mut nodes = HashMap::with_capacity(model.nodes.len());
        for node in &model.nodes {
            nodes.entry(metadata::fold(node.id())).or_insert(node);
        }
        let mut edges = HashMap::with_capacity(model.edges.len());
        for edge in &model.edges {
            edges.entry(metadata::fold(edge.id())).or_insert(edge);
        }
        Self { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&'a Node> {
        self.nodes.get(&metadata::fold(id)).copied()
    }

    pub fn edge(&self, id: &str) -> Option<&'a Edge> {
        self.edges.get(&metadata::fold(id)).copied()
    }
}

/// Compares two identifiers in the shared case-insensitive namespace.
pub fn same_id(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}
