//! The built-in pipeline steps.

use std::collections::HashMap;

use log::{debug, info, trace, warn};

use limn_core::{
    command::{DrawCommand, DrawConnector, DrawShape},
    layout::LayoutOptions,
    metadata,
};

use super::{PipelineContext, PipelineStep};
use crate::{
    cancel::CancellationToken,
    error::{LimnError, ModelError},
    layout::{LayoutEngine, verify_result},
};

/// Checks that node and edge ids are non-empty and unique.
///
/// Nodes and edges share one case-insensitive id namespace. The check stops
/// at the first violation and never modifies the model.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateModel;

impl ValidateModel {
    /// Validates the ids of a model.
    ///
    /// # Errors
    ///
    /// Returns the first [`ModelError`] found, nodes before edges.
    pub fn check(model: &limn_core::model::DiagramModel) -> Result<(), ModelError> {
        let mut seen: HashMap<String, &'static str> = HashMap::new();
        let ids = model
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| ("node", index, node.id()))
            .chain(
                model
                    .edges()
                    .iter()
                    .enumerate()
                    .map(|(index, edge)| ("edge", index, edge.id())),
            );

        for (kind, index, id) in ids {
            if id.trim().is_empty() {
                return Err(ModelError::EmptyId { kind, index });
            }
            if let Some(first_kind) = seen.insert(metadata::fold(id), kind) {
                return Err(ModelError::DuplicateId {
                    id: id.to_string(),
                    kind,
                    first_kind,
                });
            }
        }
        Ok(())
    }
}

impl PipelineStep for ValidateModel {
    fn name(&self) -> &str {
        "validate"
    }

    fn execute(
        &self,
        ctx: &mut PipelineContext<'_>,
        _cancel: &CancellationToken,
    ) -> Result<(), LimnError> {
        Self::check(ctx.model())?;
        debug!(
            nodes = ctx.model().nodes().len(),
            edges = ctx.model().edges().len();
            "Model validated"
        );
        Ok(())
    }
}

/// Runs a layout engine and stores its checked result on the context.
#[derive(Debug, Clone, Default)]
pub struct RunLayout<E> {
    engine: E,
    options: LayoutOptions,
}

impl<E: LayoutEngine> RunLayout<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            options: LayoutOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LayoutOptions) -> Self {
        self.options = options;
        self
    }
}

impl<E: LayoutEngine> PipelineStep for RunLayout<E> {
    fn name(&self) -> &str {
        "layout"
    }

    fn execute(
        &self,
        ctx: &mut PipelineContext<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), LimnError> {
        let result = self.engine.apply(ctx.model(), &self.options, cancel)?;
        verify_result(self.engine.name(), ctx.model(), &result)?;
        info!(
            engine = self.engine.name(),
            nodes = result.nodes_len(),
            edges = result.edges_len();
            "Layout computed"
        );
        ctx.set_layout(result);
        Ok(())
    }
}

/// Lowers the layout into drawing commands, then flushes the surface.
///
/// Emits one [`DrawShape`] per laid out node followed by one
/// [`DrawConnector`] per routed edge, in layout order. Without a layout the
/// step does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Render;

impl PipelineStep for Render {
    fn name(&self) -> &str {
        "render"
    }

    fn execute(
        &self,
        ctx: &mut PipelineContext<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), LimnError> {
        let (model, layout, surface, catalog) = ctx.render_parts();
        let Some(layout) = layout else {
            warn!("No layout computed, skipping render");
            return Ok(());
        };

        let index = model.index();
        for node_layout in layout.nodes() {
            let mut command = DrawShape::new(
                node_layout.node_id(),
                node_layout.position(),
                node_layout.size(),
            );
            if let Some(node) = index.node(node_layout.node_id()) {
                command = command.with_style(node.style().clone());
                if !node.label().is_empty() {
                    command = command.with_text(node.label());
                }
                if let Some(shape_type) = node.shape_type() {
                    let resolved = catalog.and_then(|catalog| catalog.resolve(shape_type));
                    command = match resolved {
                        Some(descriptor) => command.with_shape_type(descriptor.key()),
                        None => command.with_shape_type(shape_type),
                    };
                }
            }
            trace!(node = node_layout.node_id(); "Emitting shape");
            surface.apply(DrawCommand::Shape(command), cancel)?;
        }

        for route in layout.edges() {
            let mut command = DrawConnector::new(route.edge_id(), route.points().to_vec());
            if let Some(edge) = index.edge(route.edge_id()) {
                command = command
                    .with_style(edge.style().clone())
                    .with_ends(edge.source_id(), edge.target_id())
                    .with_directed(edge.is_directed());
                if let Some(label) = edge.label().filter(|label| !label.is_empty()) {
                    command = command.with_text(label);
                }
            }
            trace!(edge = route.edge_id(); "Emitting connector");
            surface.apply(DrawCommand::Connector(command), cancel)?;
        }

        surface.flush(cancel)?;
        debug!(
            shapes = layout.nodes_len(),
            connectors = layout.edges_len();
            "Render completed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use limn_core::{
        color::Color,
        geometry::{Point, Size},
        layout::{EdgeRoute, LayoutResult, NodeLayout},
        model::{DiagramModel, Edge, Node},
        style::ShapeStyle,
        template::ShapeDescriptor,
    };

    use super::*;
    use crate::{catalog::MapCatalog, layout::GridLayout, surface::RecordingSurface};

    fn run(model: DiagramModel, steps: &[&dyn PipelineStep]) -> (RecordingSurface, Option<bool>) {
        let mut surface = RecordingSurface::new();
        let mut ctx = PipelineContext::new(model, &mut surface);
        let cancel = CancellationToken::new();
        for step in steps {
            step.execute(&mut ctx, &cancel).unwrap();
        }
        let has_layout = ctx.layout().map(|_| true);
        drop(ctx);
        (surface, has_layout)
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let model = DiagramModel::from_parts([Node::new("", "blank")], []);
        assert_eq!(
            ValidateModel::check(&model),
            Err(ModelError::EmptyId {
                kind: "node",
                index: 0
            })
        );
    }

    #[test]
    fn test_validate_edge_colliding_with_node() {
        let model = DiagramModel::from_parts(
            [Node::new("X", "x"), Node::new("Y", "y")],
            [Edge::new("X", "X", "Y")],
        );
        let err = ValidateModel::check(&model).unwrap_err();

        assert_eq!(err.id(), Some("X"));
        assert!(matches!(
            err,
            ModelError::DuplicateId {
                kind: "edge",
                first_kind: "node",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_ignores_case() {
        let model = DiagramModel::from_parts([Node::new("api", ""), Node::new("API", "")], []);
        assert!(ValidateModel::check(&model).is_err());
    }

    #[test]
    fn test_render_without_layout_is_noop() {
        let model = DiagramModel::from_parts([Node::new("A", "A")], []);
        let (surface, has_layout) = run(model, &[&Render]);

        assert!(has_layout.is_none());
        assert!(surface.commands().is_empty());
        assert_eq!(surface.flush_count(), 0);
    }

    #[test]
    fn test_render_emits_shapes_then_connectors() {
        let model = DiagramModel::from_parts(
            [Node::new("A", "A"), Node::new("B", "B")],
            [Edge::new("A->B", "A", "B").with_label("calls")],
        );
        let (surface, _) = run(model, &[&RunLayout::new(GridLayout::new()), &Render]);

        let commands = surface.commands();
        assert_eq!(commands.len(), 3);
        assert_eq!(surface.flush_count(), 1);

        let DrawCommand::Shape(a) = &commands[0] else {
            panic!("expected a shape, got {}", commands[0]);
        };
        assert_eq!(a.node_id(), "A");
        assert_eq!(a.position(), Point::new(0.0, 0.0));
        assert_eq!(a.text(), Some("A"));

        let DrawCommand::Shape(b) = &commands[1] else {
            panic!("expected a shape, got {}", commands[1]);
        };
        assert_eq!(b.position(), Point::new(162.0, 0.0));

        let DrawCommand::Connector(edge) = &commands[2] else {
            panic!("expected a connector, got {}", commands[2]);
        };
        assert_eq!(edge.edge_id(), "A->B");
        assert_eq!(edge.points(), &[Point::new(60.0, 30.0), Point::new(222.0, 30.0)]);
        assert_eq!(edge.ends(), Some(("A", "B")));
        assert_eq!(edge.text(), Some("calls"));
    }

    #[test]
    fn test_render_carries_style_and_size() {
        let style = ShapeStyle::default().with_fill(Color::new("gold").unwrap());
        let model = DiagramModel::from_parts(
            [Node::new("A", "")
                .with_size(Size::new(80.0, 40.0))
                .with_style(style.clone())],
            [],
        );
        let (surface, _) = run(model, &[&RunLayout::new(GridLayout::new()), &Render]);

        let DrawCommand::Shape(shape) = &surface.commands()[0] else {
            panic!("expected a shape");
        };
        assert_eq!(shape.size(), Size::new(80.0, 40.0));
        assert_eq!(shape.style(), &style);
        assert_eq!(shape.text(), None);
    }

    #[test]
    fn test_render_translates_types_through_catalog() {
        let catalog = MapCatalog::new()
            .with_entry("service", ShapeDescriptor::new("process").with_library("basic"));
        let model = DiagramModel::from_parts(
            [
                Node::new("a", "").with_shape_type("service"),
                Node::new("b", "").with_shape_type("queue"),
            ],
            [],
        );

        let mut surface = RecordingSurface::new();
        let mut ctx = PipelineContext::new(model, &mut surface).with_catalog(&catalog);
        let cancel = CancellationToken::new();
        RunLayout::new(GridLayout::new()).execute(&mut ctx, &cancel).unwrap();
        Render.execute(&mut ctx, &cancel).unwrap();
        drop(ctx);

        let types: Vec<_> = surface
            .commands()
            .iter()
            .map(|command| match command {
                DrawCommand::Shape(shape) => shape.shape_type().map(str::to_string),
                _ => None,
            })
            .collect();
        assert_eq!(
            types,
            vec![Some("process".to_string()), Some("queue".to_string())]
        );
    }

    #[test]
    fn test_render_does_not_touch_model_or_layout() {
        let model = DiagramModel::from_parts(
            [Node::new("A", "A"), Node::new("B", "B")],
            [Edge::new("e", "A", "B")],
        );
        let expected = model.clone();

        let mut surface = RecordingSurface::new();
        let mut ctx = PipelineContext::new(model, &mut surface);
        let cancel = CancellationToken::new();
        RunLayout::new(GridLayout::new()).execute(&mut ctx, &cancel).unwrap();
        let layout_before = ctx.layout().cloned();
        Render.execute(&mut ctx, &cancel).unwrap();

        assert_eq!(ctx.model(), &expected);
        assert_eq!(ctx.layout().cloned(), layout_before);
    }

    #[test]
    fn test_render_matches_layout_ids_ignoring_case() {
        let model = DiagramModel::from_parts(
            [Node::new("Api", "API"), Node::new("db", "Database")],
            [Edge::new("Reads", "Api", "db").with_label("reads")],
        );
        let mut layout = LayoutResult::new();
        layout.insert_node(NodeLayout::new("API", Point::default(), Size::new(1.0, 1.0)));
        layout.insert_node(NodeLayout::new("DB", Point::default(), Size::new(1.0, 1.0)));
        layout.insert_edge(EdgeRoute::new("reads", vec![Point::default()]));

        let mut surface = RecordingSurface::new();
        let mut ctx = PipelineContext::new(model, &mut surface);
        ctx.set_layout(layout);
        Render.execute(&mut ctx, &CancellationToken::new()).unwrap();
        drop(ctx);

        let texts: Vec<_> = surface
            .commands()
            .iter()
            .map(|command| match command {
                DrawCommand::Shape(shape) => shape.text(),
                DrawCommand::Connector(connector) => connector.text(),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec![Some("API"), Some("Database"), Some("reads")]);
    }

    #[test]
    fn test_render_large_model_keeps_labels() {
        let count = 3000;
        let nodes: Vec<_> = (0..count)
            .map(|i| Node::new(format!("n{i}"), format!("label {i}")))
            .collect();
        let edges: Vec<_> = (1..count)
            .map(|i| {
                Edge::new(format!("e{i}"), format!("n{}", i - 1), format!("n{i}"))
                    .with_label(format!("edge {i}"))
            })
            .collect();
        let (surface, _) = run(
            DiagramModel::from_parts(nodes, edges),
            &[&RunLayout::new(GridLayout::new()), &Render],
        );

        let commands = surface.commands();
        assert_eq!(commands.len(), 2 * count - 1);
        let DrawCommand::Shape(last) = &commands[count - 1] else {
            panic!("expected a shape");
        };
        assert_eq!(last.text(), Some("label 2999"));
        let DrawCommand::Connector(last) = &commands[2 * count - 2] else {
            panic!("expected a connector");
        };
        assert_eq!(last.text(), Some("edge 2999"));
        assert_eq!(last.ends(), Some(("n2998", "n2999")));
    }

    fn id_strategy() -> impl Strategy<Value = String> {
        "[a-c]{1,3}"
    }

    proptest! {
        #[test]
        fn prop_unique_ids_validate(count in 0usize..20) {
            let nodes: Vec<_> = (0..count).map(|i| Node::new(format!("node-{i}"), "")).collect();
            let edges: Vec<_> = (0..count).map(|i| Edge::new(format!("edge-{i}"), "x", "y")).collect();
            prop_assert!(ValidateModel::check(&DiagramModel::from_parts(nodes, edges)).is_ok());
        }

        #[test]
        fn prop_duplicates_are_reported_by_id(ids in prop::collection::vec(id_strategy(), 1..12)) {
            let nodes: Vec<_> = ids.iter().map(|id| Node::new(id.to_uppercase(), "")).collect();
            let mut folded = std::collections::HashSet::new();
            let duplicate = ids.iter().find(|id| !folded.insert(id.to_lowercase())).cloned();

            let result = ValidateModel::check(&DiagramModel::from_parts(nodes, []));
            match duplicate {
                None => prop_assert!(result.is_ok()),
                Some(id) => {
                    let err = result.unwrap_err();
                    let upper = id.to_uppercase();
                    prop_assert_eq!(err.id(), Some(upper.as_str()));
                }
            }
        }

        #[test]
        fn prop_render_emits_one_command_per_element(node_count in 1usize..15, edge_count in 0usize..15) {
            let nodes: Vec<_> = (0..node_count).map(|i| Node::new(format!("n{i}"), "")).collect();
            let edges: Vec<_> = (0..edge_count)
                .map(|i| Edge::new(format!("e{i}"), format!("n{}", i % node_count), "n0"))
                .collect();
            let (surface, _) = run(
                DiagramModel::from_parts(nodes, edges),
                &[&RunLayout::new(GridLayout::new()), &Render],
            );

            let shapes = surface.commands().iter().filter(|c| matches!(c, DrawCommand::Shape(_))).count();
            let connectors = surface.commands().iter().filter(|c| matches!(c, DrawCommand::Connector(_))).count();
            prop_assert_eq!(shapes, node_count);
            prop_assert_eq!(connectors, edge_count);
            prop_assert_eq!(surface.flush_count(), 1);
        }
    }
}
