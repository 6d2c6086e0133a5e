//! Layout results and layout options.
//!
//! A [`LayoutResult`] is produced once per pipeline run by a layout engine and
//! is read-only afterwards. Node layouts and edge routes keep the order in
//! which the engine inserted them, which is the order drawing commands are
//! emitted in.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::geometry::{Bounds, Point, Size};

/// Resolved position and size of one node.
///
/// The position is the top-left corner of the node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    node_id: String,
    position: Point,
    size: Size,
}

impl NodeLayout {
    pub fn new(node_id: impl Into<String>, position: Point, size: Size) -> Self {
        Self {
            node_id: node_id.into(),
            position,
            size,
        }
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

    pub fn bounds(&self) -> Bounds {
        self.position.to_bounds(self.size)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }
}

/// Routed polyline of one edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRoute {
    edge_id: String,
    points: Vec<Point>,
}

impl EdgeRoute {
    /// Creates a route. A route handed to the pipeline must contain at least one point.
    pub fn new(edge_id: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            edge_id: edge_id.into(),
            points,
        }
    }

    pub fn edge_id(&self) -> &str {
        &self.edge_id
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

/// Positions for nodes and routes for edges, keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutResult {
    nodes: IndexMap<String, NodeLayout>,
    edges: IndexMap<String, EdgeRoute>,
}

impl LayoutResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node layout, replacing any previous layout with the same id.
    pub fn insert_node(&mut self, layout: NodeLayout) -> Option<NodeLayout> {
        self.nodes.insert(layout.node_id.clone(), layout)
    }

    /// Inserts an edge route, replacing any previous route with the same id.
    pub fn insert_edge(&mut self, route: EdgeRoute) -> Option<EdgeRoute> {
        self.edges.insert(route.edge_id.clone(), route)
    }

    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&EdgeRoute> {
        self.edges.get(id)
    }

    /// Node layouts in insertion order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &NodeLayout> {
        self.nodes.values()
    }

    /// Edge routes in insertion order.
    pub fn edges(&self) -> impl ExactSizeIterator<Item = &EdgeRoute> {
        self.edges.values()
    }

    pub fn nodes_len(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges_len(&self) -> usize {
        self.edges.len()
    }

    /// Returns the bounds covering every node and route point.
    pub fn bounds(&self) -> Option<Bounds> {
        let node_bounds = self.nodes.values().map(NodeLayout::bounds);
        let route_bounds = self
            .edges
            .values()
            .filter_map(|route| Bounds::from_points(route.points()));
        node_bounds.chain(route_bounds).reduce(Bounds::merge)
    }
}

/// Options consumed by layout engines.
///
/// Deserializes from configuration with every field optional.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    horizontal_spacing: f32,
    vertical_spacing: f32,
    default_node_size: Size,
    columns: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            horizontal_spacing: 42.0,
            vertical_spacing: 42.0,
            default_node_size: Size::new(120.0, 60.0),
            columns: 4,
        }
    }
}

impl LayoutOptions {
    pub fn horizontal_spacing(&self) -> f32 {
        self.horizontal_spacing
    }

    pub fn vertical_spacing(&self) -> f32 {
        self.vertical_spacing
    }

    /// Size given to nodes without an explicit size.
    pub fn default_node_size(&self) -> Size {
        self.default_node_size
    }

    /// Number of grid columns; never less than one.
    pub fn columns(&self) -> usize {
        self.columns.max(1)
    }

    pub fn with_spacing(mut self, horizontal: f32, vertical: f32) -> Self {
        self.horizontal_spacing = horizontal;
        self.vertical_spacing = vertical;
        self
    }

    pub fn with_default_node_size(mut self, size: Size) -> Self {
        self.default_node_size = size;
        self
    }

    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_node_layout_center() {
        let layout = NodeLayout::new("A", Point::new(0.0, 0.0), Size::new(120.0, 60.0));

        assert_approx_eq!(f32, layout.center().x(), 60.0);
        assert_approx_eq!(f32, layout.center().y(), 30.0);
    }

    #[test]
    fn test_result_keeps_insertion_order() {
        let mut result = LayoutResult::new();
        result.insert_node(NodeLayout::new("b", Point::default(), Size::default()));
        result.insert_node(NodeLayout::new("a", Point::default(), Size::default()));

        let ids: Vec<_> = result.nodes().map(NodeLayout::node_id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_result_bounds() {
        let mut result = LayoutResult::new();
        assert!(result.bounds().is_none());

        result.insert_node(NodeLayout::new(
            "a",
            Point::new(10.0, 10.0),
            Size::new(20.0, 20.0),
        ));
        result.insert_edge(EdgeRoute::new(
            "e",
            vec![Point::new(0.0, 50.0), Point::new(5.0, 5.0)],
        ));

        let bounds = result.bounds().unwrap();
        assert_approx_eq!(f32, bounds.min_x(), 0.0);
        assert_approx_eq!(f32, bounds.min_y(), 5.0);
        assert_approx_eq!(f32, bounds.max_x(), 30.0);
        assert_approx_eq!(f32, bounds.max_y(), 50.0);
    }

    #[test]
    fn test_layout_options_defaults() {
        let options = LayoutOptions::default();

        assert_approx_eq!(f32, options.horizontal_spacing(), 42.0);
        assert_approx_eq!(f32, options.vertical_spacing(), 42.0);
        assert_eq!(options.default_node_size(), Size::new(120.0, 60.0));
        assert_eq!(options.with_columns(0).columns(), 1);
    }
}
