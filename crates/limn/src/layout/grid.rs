//! Grid layout engine.

use log::debug;

use limn_core::{
    geometry::{Point, Size},
    layout::{EdgeRoute, LayoutOptions, LayoutResult, NodeLayout},
    model::DiagramModel,
};

use super::{LayoutEngine, LayoutError};
use crate::cancel::CancellationToken;

/// Places nodes on a row-major grid in model order.
///
/// All cells share one size: the default node size, grown to fit the
/// largest explicitly sized node. Node `i` goes to column `i % columns` and
/// row `i / columns`, with its top-left corner at the cell origin. Edges are
/// straight two-point routes between the centers of their endpoints.
///
/// The result only depends on the model and the options.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridLayout;

impl GridLayout {
    pub fn new() -> Self {
        Self
    }

    fn cell_size(model: &DiagramModel, options: &LayoutOptions) -> Size {
        model
            .nodes()
            .iter()
            .filter_map(|node| node.size())
            .map(|size| size.or_dimensions_of(options.default_node_size()))
            .fold(options.default_node_size(), Size::max)
    }
}

impl LayoutEngine for GridLayout {
    fn name(&self) -> &str {
        "grid"
    }

    fn apply(
        &self,
        model: &DiagramModel,
        options: &LayoutOptions,
        cancel: &CancellationToken,
    ) -> Result<LayoutResult, LayoutError> {
        if cancel.is_cancelled() {
            return Err(LayoutError::Cancelled);
        }

        let columns = options.columns();
        let cell = Self::cell_size(model, options);
        let step_x = cell.width() + options.horizontal_spacing();
        let step_y = cell.height() + options.vertical_spacing();

        let mut result = LayoutResult::new();
        for (index, node) in model.nodes().iter().enumerate() {
            let column = (index % columns) as f32;
            let row = (index / columns) as f32;
            let size = node
                .size()
                .unwrap_or_default()
                .or_dimensions_of(options.default_node_size());
            result.insert_node(NodeLayout::new(
                node.id(),
                Point::new(column * step_x, row * step_y),
                size,
            ));
        }

        let index = model.index();
        for edge in model.edges() {
            let center_of = |id: &str| {
                index
                    .node(id)
                    .and_then(|node| result.node(node.id()))
                    .map(NodeLayout::center)
                    .ok_or_else(|| LayoutError::MissingEndpoint {
                        edge: edge.id().to_string(),
                        node: id.to_string(),
                    })
            };
            let points = vec![center_of(edge.source_id())?, center_of(edge.target_id())?];
            result.insert_edge(EdgeRoute::new(edge.id(), points));
        }

        debug!(
            nodes = result.nodes_len(),
            edges = result.edges_len(),
            columns;
            "Grid layout computed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use proptest::prelude::*;

    use limn_core::model::{Edge, Node};

    use super::*;
    use crate::layout::verify_result;

    fn layout(model: &DiagramModel) -> LayoutResult {
        GridLayout::new()
            .apply(model, &LayoutOptions::default(), &CancellationToken::new())
            .unwrap()
    }

    #[test]
    fn test_two_nodes_and_an_edge() {
        let model = DiagramModel::from_parts(
            [Node::new("A", "A"), Node::new("B", "B")],
            [Edge::new("A->B", "A", "B")],
        );
        let result = layout(&model);

        let a = result.node("A").unwrap();
        let b = result.node("B").unwrap();
        assert_approx_eq!(f32, a.position().x(), 0.0);
        assert_approx_eq!(f32, a.position().y(), 0.0);
        assert_approx_eq!(f32, b.position().x(), 162.0);
        assert_approx_eq!(f32, b.position().y(), 0.0);
        assert_eq!(a.size(), Size::new(120.0, 60.0));

        let route = result.edge("A->B").unwrap();
        assert_eq!(
            route.points(),
            &[Point::new(60.0, 30.0), Point::new(222.0, 30.0)]
        );
    }

    #[test]
    fn test_wraps_after_column_count() {
        let model = DiagramModel::from_parts((0..5).map(|i| Node::new(format!("n{i}"), "")), []);
        let result = layout(&model);

        let fifth = result.node("n4").unwrap();
        assert_approx_eq!(f32, fifth.position().x(), 0.0);
        assert_approx_eq!(f32, fifth.position().y(), 102.0);
    }

    #[test]
    fn test_cell_grows_to_largest_node() {
        let model = DiagramModel::from_parts(
            [
                Node::new("big", "").with_size(Size::new(200.0, 100.0)),
                Node::new("small", ""),
            ],
            [],
        );
        let result = layout(&model);

        let small = result.node("small").unwrap();
        assert_approx_eq!(f32, small.position().x(), 242.0);
        assert_eq!(small.size(), Size::new(120.0, 60.0));
        assert_eq!(result.node("big").unwrap().size(), Size::new(200.0, 100.0));
    }

    #[test]
    fn test_non_positive_size_uses_default() {
        let model = DiagramModel::from_parts(
            [Node::new("n", "").with_size(Size::new(0.0, -5.0))],
            [],
        );
        assert_eq!(layout(&model).node("n").unwrap().size(), Size::new(120.0, 60.0));
    }

    #[test]
    fn test_endpoints_match_ignoring_case() {
        let model = DiagramModel::from_parts(
            [Node::new("Api", ""), Node::new("Db", "")],
            [Edge::new("e", "api", "DB")],
        );
        assert_eq!(layout(&model).edge("e").unwrap().points().len(), 2);
    }

    #[test]
    fn test_missing_endpoint_fails() {
        let model = DiagramModel::from_parts([Node::new("a", "")], [Edge::new("e", "a", "z")]);
        let err = GridLayout::new()
            .apply(&model, &LayoutOptions::default(), &CancellationToken::new())
            .unwrap_err();

        assert_eq!(
            err,
            LayoutError::MissingEndpoint {
                edge: "e".to_string(),
                node: "z".to_string()
            }
        );
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = GridLayout::new().apply(&DiagramModel::new(), &LayoutOptions::default(), &cancel);
        assert_eq!(result, Err(LayoutError::Cancelled));
    }

    proptest! {
        #[test]
        fn prop_one_entry_per_element_and_deterministic(
            node_count in 1usize..30,
            edge_seeds in prop::collection::vec((0usize..30, 0usize..30), 0..30),
            columns in 1usize..8,
        ) {
            let nodes: Vec<_> = (0..node_count).map(|i| Node::new(format!("n{i}"), "")).collect();
            let edges: Vec<_> = edge_seeds
                .iter()
                .enumerate()
                .map(|(i, (s, t))| {
                    Edge::new(format!("e{i}"), format!("n{}", s % node_count), format!("n{}", t % node_count))
                })
                .collect();
            let model = DiagramModel::from_parts(nodes, edges);
            let options = LayoutOptions::default().with_columns(columns);
            let cancel = CancellationToken::new();

            let first = GridLayout::new().apply(&model, &options, &cancel).unwrap();
            let second = GridLayout::new().apply(&model, &options, &cancel).unwrap();

            prop_assert_eq!(first.nodes_len(), model.nodes().len());
            prop_assert_eq!(first.edges_len(), model.edges().len());
            prop_assert!(first.nodes().all(|node| node.size().is_non_negative()));
            prop_assert!(verify_result("grid", &model, &first).is_ok());
            prop_assert_eq!(first, second);
        }
    }
}
