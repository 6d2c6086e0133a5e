//! Layout engines.
//!
//! A [`LayoutEngine`] computes a [`LayoutResult`] for a [`DiagramModel`]. The
//! pipeline does not trust engines blindly: every result is checked with
//! [`verify_result`] before it is stored.
//!
//! # Engines
//!
//! - [`GridLayout`] - row-major grid in input order, straight edges between centers

mod grid;

use thiserror::Error;

use limn_core::model::DiagramModel;

use crate::cancel::CancellationToken;

pub use grid::GridLayout;
pub use limn_core::layout::{EdgeRoute, LayoutOptions, LayoutResult, NodeLayout};

/// Errors raised by layout engines or by the check of their results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("edge `{edge}` references unknown node `{node}`")]
    MissingEndpoint { edge: String, node: String },

    #[error("layout engine `{engine}` returned an invalid result: {reason}")]
    InvalidResult { engine: String, reason: String },

    #[error("layout engine `{engine}` failed: {reason}")]
    Failed { engine: String, reason: String },

    #[error("layout cancelled")]
    Cancelled,
}

/// Computes node positions and edge routes.
///
/// Implementations must place every node of the model exactly once with a
/// non-negative size, and route every edge exactly once with at least one
/// point. Results must not mention ids absent from the model.
pub trait LayoutEngine {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Lays out `model`.
    ///
    /// # Errors
    ///
    /// Engine-specific; [`LayoutError::Cancelled`] when the engine observes
    /// cancellation.
    fn apply(
        &self,
        model: &DiagramModel,
        options: &LayoutOptions,
        cancel: &CancellationToken,
    ) -> Result<LayoutResult, LayoutError>;
}

impl<E: LayoutEngine + ?Sized> LayoutEngine for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn apply(
        &self,
        model: &DiagramModel,
        options: &LayoutOptions,
        cancel: &CancellationToken,
    ) -> Result<LayoutResult, LayoutError> {
        (**self).apply(model, options, cancel)
    }
}

/// Checks that `result` honors the engine contract for `model`.
///
/// # Errors
///
/// Returns [`LayoutError::InvalidResult`] describing the first violation.
pub fn verify_result(
    engine: &str,
    model: &DiagramModel,
    result: &LayoutResult,
) -> Result<(), LayoutError> {
    let invalid = |reason: String| LayoutError::InvalidResult {
        engine: engine.to_string(),
        reason,
    };

    for node in model.nodes() {
        let Some(layout) = result.node(node.id()) else {
            return Err(invalid(format!("node `{}` has no layout", node.id())));
        };
        if !layout.size().is_non_negative() {
            return Err(invalid(format!("node `{}` has a negative size", node.id())));
        }
    }
    // Every id found a layout, so a short result means repeated model ids.
    if result.nodes_len() < model.nodes().len() {
        return Err(invalid(format!(
            "expected {} node layouts, got {}",
            model.nodes().len(),
            result.nodes_len()
        )));
    }
    if result.nodes_len() > model.nodes().len() {
        let index = model.index();
        let unknown = result
            .nodes()
            .find(|layout| index.node(layout.node_id()).is_none())
            .map_or("?", |layout| layout.node_id());
        return Err(invalid(format!("layout for unknown node `{unknown}`")));
    }

    for edge in model.edges() {
        let Some(route) = result.edge(edge.id()) else {
            return Err(invalid(format!("edge `{}` has no route", edge.id())));
        };
        if route.points().is_empty() {
            return Err(invalid(format!("edge `{}` has an empty route", edge.id())));
        }
    }
    if result.edges_len() < model.edges().len() {
        return Err(invalid(format!(
            "expected {} edge routes, got {}",
            model.edges().len(),
            result.edges_len()
        )));
    }
    if result.edges_len() > model.edges().len() {
        let index = model.index();
        let unknown = result
            .edges()
            .find(|route| index.edge(route.edge_id()).is_none())
            .map_or("?", |route| route.edge_id());
        return Err(invalid(format!("route for unknown edge `{unknown}`")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use limn_core::{
        geometry::{Point, Size},
        model::{Edge, Node},
    };

    use super::*;

    fn model() -> DiagramModel {
        DiagramModel::from_parts(
            [Node::new("a", "A"), Node::new("b", "B")],
            [Edge::new("a->b", "a", "b")],
        )
    }

    fn valid() -> LayoutResult {
        let mut result = LayoutResult::new();
        result.insert_node(NodeLayout::new("a", Point::default(), Size::new(1.0, 1.0)));
        result.insert_node(NodeLayout::new("b", Point::default(), Size::new(1.0, 1.0)));
        result.insert_edge(EdgeRoute::new("a->b", vec![Point::default()]));
        result
    }

    #[test]
    fn test_verify_accepts_valid_result() {
        verify_result("test", &model(), &valid()).unwrap();
    }

    #[test]
    fn test_verify_rejects_missing_node() {
        let mut result = LayoutResult::new();
        result.insert_node(NodeLayout::new("a", Point::default(), Size::default()));

        let err = verify_result("test", &model(), &result).unwrap_err();
        assert!(err.to_string().contains("node `b` has no layout"));
    }

    #[test]
    fn test_verify_rejects_unknown_node() {
        let mut result = valid();
        result.insert_node(NodeLayout::new("ghost", Point::default(), Size::default()));

        let err = verify_result("test", &model(), &result).unwrap_err();
        assert!(err.to_string().contains("`ghost`"));
    }

    #[test]
    fn test_verify_reports_count_for_repeated_ids() {
        let model = DiagramModel::from_parts([Node::new("A", "1"), Node::new("A", "2")], []);
        let mut result = LayoutResult::new();
        result.insert_node(NodeLayout::new("A", Point::default(), Size::default()));

        let err = verify_result("test", &model, &result).unwrap_err();
        assert!(err.to_string().contains("expected 2 node layouts, got 1"));
        assert!(!err.to_string().contains("unknown"));
    }

    #[test]
    fn test_verify_reports_count_for_repeated_edge_ids() {
        let model = DiagramModel::from_parts(
            [Node::new("a", "A"), Node::new("b", "B")],
            [Edge::new("a->b", "a", "b"), Edge::new("a->b", "b", "a")],
        );

        let err = verify_result("test", &model, &valid()).unwrap_err();
        assert!(err.to_string().contains("expected 2 edge routes, got 1"));
    }

    #[test]
    fn test_verify_rejects_negative_size() {
        let mut result = valid();
        result.insert_node(NodeLayout::new("a", Point::default(), Size::new(-1.0, 1.0)));

        assert!(matches!(
            verify_result("test", &model(), &result),
            Err(LayoutError::InvalidResult { .. })
        ));
    }

    #[test]
    fn test_verify_rejects_empty_route() {
        let mut result = valid();
        result.insert_edge(EdgeRoute::new("a->b", Vec::new()));

        let err = verify_result("test", &model(), &result).unwrap_err();
        assert!(err.to_string().contains("empty route"));
    }
}
