use limn_core::{layout::LayoutResult, model::DiagramModel};

use crate::{catalog::ShapeCatalog, surface::DrawingSurface};

/// State shared by the steps of one pipeline run.
///
/// The context owns the model for the duration of the run and only hands out
/// shared references to it. The layout result is stored once by the layout
/// step.
pub struct PipelineContext<'a> {
    model: DiagramModel,
    layout: Option<LayoutResult>,
    surface: &'a mut dyn DrawingSurface,
    catalog: Option<&'a dyn ShapeCatalog>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(model: DiagramModel, surface: &'a mut dyn DrawingSurface) -> Self {
        Self {
            model,
            layout: None,
            surface,
            catalog: None,
        }
    }

    /// Translates node shape types through `catalog` while rendering.
    pub fn with_catalog(mut self, catalog: &'a dyn ShapeCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn model(&self) -> &DiagramModel {
        &self.model
    }

    pub fn layout(&self) -> Option<&LayoutResult> {
        self.layout.as_ref()
    }

    pub(crate) fn set_layout(&mut self, layout: LayoutResult) {
        self.layout = Some(layout);
    }

    /// Everything the render step needs, borrowed at once.
    pub(crate) fn render_parts(
        &mut self,
    ) -> (
        &DiagramModel,
        Option<&LayoutResult>,
        &mut (dyn DrawingSurface + 'a),
        Option<&'a dyn ShapeCatalog>,
    ) {
        (
            &self.model,
            self.layout.as_ref(),
            &mut *self.surface,
            self.catalog,
        )
    }

    /// Ends the run and returns the layout, if one was computed.
    pub fn into_layout(self) -> Option<LayoutResult> {
        self.layout
    }
}

impl std::fmt::Debug for PipelineContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("nodes", &self.model.nodes().len())
            .field("edges", &self.model.edges().len())
            .field("has_layout", &self.layout.is_some())
            .field("has_catalog", &self.catalog.is_some())
            .finish()
    }
}
