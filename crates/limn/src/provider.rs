//! Model providers, where the build pipeline gets its diagram model from.

use limn_core::model::DiagramModel;

use crate::{cancel::CancellationToken, error::LimnError};

/// Supplies the diagram model of one build.
pub trait ModelProvider {
    /// Produces the model.
    ///
    /// # Errors
    ///
    /// Provider failures are returned to the caller of the build unchanged,
    /// usually as [`LimnError::Provider`].
    fn model(&self, cancel: &CancellationToken) -> Result<DiagramModel, LimnError>;
}

/// Provider that hands out clones of a fixed model.
#[derive(Debug, Clone, Default)]
pub struct StaticModelProvider {
    model: DiagramModel,
}

impl StaticModelProvider {
    pub fn new(model: DiagramModel) -> Self {
        Self { model }
    }
}

impl From<DiagramModel> for StaticModelProvider {
    fn from(model: DiagramModel) -> Self {
        Self::new(model)
    }
}

impl ModelProvider for StaticModelProvider {
    fn model(&self, cancel: &CancellationToken) -> Result<DiagramModel, LimnError> {
        if cancel.is_cancelled() {
            return Err(LimnError::Cancelled);
        }
        Ok(self.model.clone())
    }
}

impl<F> ModelProvider for F
where
    F: Fn(&CancellationToken) -> Result<DiagramModel, LimnError>,
{
    fn model(&self, cancel: &CancellationToken) -> Result<DiagramModel, LimnError> {
        self(cancel)
    }
}
