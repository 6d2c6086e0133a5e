//! Limn - builds diagrams through a drawing application's automation interface.
//!
//! A diagram model is validated, laid out and lowered into drawing commands
//! by a [`pipeline::Pipeline`]. The commands go to a
//! [`surface::DrawingSurface`]; the automation surface runs each of them as a
//! job on an [`automation::AutomationHost`], the single thread allowed to
//! touch the application.

pub mod automation;
pub mod cancel;
pub mod catalog;
pub mod config;
pub mod layout;
pub mod pipeline;
pub mod provider;
pub mod sketch;
pub mod surface;
pub mod templates;

mod error;

pub use limn_core::{color, command, geometry, metadata, model, style, template};

pub use error::{LimnError, ModelError};

use std::path::PathBuf;

use log::{debug, info};

use automation::{AutomationHost, Session, SessionError};
use cancel::CancellationToken;
use catalog::ShapeCatalog;
use config::AppConfig;
use layout::{GridLayout, LayoutEngine, LayoutError, LayoutResult};
use pipeline::{Pipeline, PipelineContext, Render, RunLayout, ValidateModel};
use provider::ModelProvider;
use surface::{DrawingSurface, HostSurface};

/// Entry point for building diagrams.
///
/// Holds the configuration and wires the pipeline, the automation host and
/// the surfaces together.
///
/// # Examples
///
/// ```
/// use limn::{
///     DiagramBuilder,
///     cancel::CancellationToken,
///     config::AppConfig,
///     model::{DiagramModel, Edge, Node},
///     provider::StaticModelProvider,
///     surface::RecordingSurface,
/// };
///
/// let model = DiagramModel::from_parts(
///     [Node::new("A", "Client"), Node::new("B", "Server")],
///     [Edge::new("A->B", "A", "B")],
/// );
///
/// let builder = DiagramBuilder::new(AppConfig::default());
/// let mut surface = RecordingSurface::new();
/// let layout = builder
///     .build(
///         &StaticModelProvider::new(model),
///         &mut surface,
///         None,
///         &CancellationToken::new(),
///     )
///     .unwrap();
///
/// assert_eq!(layout.nodes_len(), 2);
/// assert_eq!(surface.commands().len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct DiagramBuilder {
    config: AppConfig,
}

impl DiagramBuilder {
    /// Create a new diagram builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the standard validate, layout and render pipeline around `engine`.
    pub fn pipeline<E: LayoutEngine + 'static>(&self, engine: E) -> Pipeline {
        Pipeline::new()
            .add(ValidateModel)
            .add(RunLayout::new(engine).with_options(*self.config.layout()))
            .add(Render)
    }

    /// Builds a diagram with the grid layout.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the provider or of a pipeline step.
    pub fn build(
        &self,
        provider: &dyn ModelProvider,
        surface: &mut dyn DrawingSurface,
        catalog: Option<&dyn ShapeCatalog>,
        cancel: &CancellationToken,
    ) -> Result<LayoutResult, LimnError> {
        self.build_with(GridLayout::new(), provider, surface, catalog, cancel)
    }

    /// Builds a diagram with a custom layout engine.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the provider or of a pipeline step.
    pub fn build_with<E: LayoutEngine + 'static>(
        &self,
        engine: E,
        provider: &dyn ModelProvider,
        surface: &mut dyn DrawingSurface,
        catalog: Option<&dyn ShapeCatalog>,
        cancel: &CancellationToken,
    ) -> Result<LayoutResult, LimnError> {
        let engine_name = engine.name().to_string();
        let model = provider.model(cancel)?;
        info!(
            nodes = model.nodes().len(),
            edges = model.edges().len();
            "Building diagram"
        );

        let pipeline = self.pipeline(engine);
        let mut ctx = PipelineContext::new(model, surface);
        if let Some(catalog) = catalog {
            ctx = ctx.with_catalog(catalog);
        }
        pipeline.run(&mut ctx, cancel)?;

        let layout = ctx.into_layout().ok_or_else(|| LayoutError::Failed {
            engine: engine_name,
            reason: "pipeline finished without a layout".to_string(),
        })?;
        Ok(layout)
    }

    /// Starts an automation host and prepares the configured templates on it.
    ///
    /// Relative template paths are also looked up in `search_dirs`.
    ///
    /// # Errors
    ///
    /// Returns an automation error when the session cannot be opened and a
    /// resolution error when template preparation fails. The host is shut
    /// down before a preparation failure is returned.
    pub fn start_host<S, F>(
        &self,
        connect: F,
        search_dirs: Vec<PathBuf>,
    ) -> Result<AutomationHost<S>, LimnError>
    where
        S: Session + 'static,
        F: FnOnce() -> Result<S, SessionError> + Send + 'static,
    {
        let host = AutomationHost::start_with(connect, search_dirs)?;
        if let Some(spec) = self.config.templates().cloned() {
            debug!(
                libraries = spec.libraries().len(),
                mappings = spec.shape_mapping().len();
                "Preparing templates"
            );
            host.invoke(move |workbench| workbench.prepare_templates(&spec))?;
        }
        Ok(host)
    }

    /// Returns a surface drawing through `host` with the configured default shape.
    pub fn host_surface<'h, S: Session + 'static>(
        &self,
        host: &'h AutomationHost<S>,
    ) -> HostSurface<'h, S> {
        HostSurface::new(host).with_default_shape(self.config.render().default_shape())
    }
}
