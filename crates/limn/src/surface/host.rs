use std::{collections::HashMap, fmt};

use log::{debug, trace};

use limn_core::{command::DrawCommand, metadata};

use super::DrawingSurface;
use crate::{
    automation::{AutomationHost, BasicShape, Session, ShapeId},
    cancel::CancellationToken,
    error::LimnError,
};

/// Surface that runs every command as one job on an [`AutomationHost`].
///
/// Shape ids of drawn nodes and connectors are remembered by their
/// case-folded id, so later connectors can glue to their end shapes and
/// [`SetText`](limn_core::command::SetText) can address earlier shapes.
/// `flush` runs [`Workbench::flush`](crate::automation::Workbench::flush) as
/// a job of its own.
pub struct HostSurface<'h, S: Session + 'static> {
    host: &'h AutomationHost<S>,
    default_shape: BasicShape,
    shapes: HashMap<String, ShapeId>,
    connectors: HashMap<String, ShapeId>,
}

impl<'h, S: Session + 'static> HostSurface<'h, S> {
    pub fn new(host: &'h AutomationHost<S>) -> Self {
        Self {
            host,
            default_shape: BasicShape::default(),
            shapes: HashMap::new(),
            connectors: HashMap::new(),
        }
    }

    /// Basic shape drawn for nodes whose type names neither a template nor
    /// a basic shape.
    pub fn with_default_shape(mut self, shape: BasicShape) -> Self {
        self.default_shape = shape;
        self
    }

    /// Shape id drawn for a node, looked up ignoring case.
    pub fn shape_of(&self, node_id: &str) -> Option<ShapeId> {
        self.shapes.get(&metadata::fold(node_id)).copied()
    }

    /// Shape id drawn for an edge, looked up ignoring case.
    pub fn connector_of(&self, edge_id: &str) -> Option<ShapeId> {
        self.connectors.get(&metadata::fold(edge_id)).copied()
    }

    fn target(&self, id: &str) -> Option<ShapeId> {
        self.shape_of(id).or_else(|| self.connector_of(id))
    }
}

impl<S: Session + 'static> DrawingSurface for HostSurface<'_, S> {
    fn apply(&mut self, command: DrawCommand, _cancel: &CancellationToken) -> Result<(), LimnError> {
        trace!(command:% = command; "Dispatching command to automation host");
        match command {
            DrawCommand::Shape(shape) => {
                let key = metadata::fold(shape.node_id());
                let default_shape = self.default_shape;
                let id = self
                    .host
                    .invoke_with_result(move |workbench| workbench.draw_shape(&shape, default_shape))?;
                self.shapes.insert(key, id);
            }
            DrawCommand::Connector(connector) => {
                let key = metadata::fold(connector.edge_id());
                let ends = connector.ends().and_then(|(source, target)| {
                    Some((self.shape_of(source)?, self.shape_of(target)?))
                });
                if ends.is_none() {
                    debug!(edge = connector.edge_id(); "Connector drawn without glued ends");
                }
                let id = self
                    .host
                    .invoke_with_result(move |workbench| workbench.draw_connector(&connector, ends))?;
                self.connectors.insert(key, id);
            }
            DrawCommand::Text(text) => {
                let id = self
                    .target(text.target_id())
                    .ok_or_else(|| LimnError::UnknownTarget(text.target_id().to_string()))?;
                self.host
                    .invoke(move |workbench| workbench.set_text(id, text.text()))?;
            }
        }
        Ok(())
    }

    fn flush(&mut self, _cancel: &CancellationToken) -> Result<(), LimnError> {
        self.host.invoke(|workbench| workbench.flush())?;
        debug!(
            shapes = self.shapes.len(),
            connectors = self.connectors.len();
            "Automation surface flushed"
        );
        Ok(())
    }
}

impl<S: Session + 'static> fmt::Debug for HostSurface<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostSurface")
            .field("default_shape", &self.default_shape)
            .field("shapes", &self.shapes.len())
            .field("connectors", &self.connectors.len())
            .finish()
    }
}
