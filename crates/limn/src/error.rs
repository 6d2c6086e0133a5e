//! Error types for Limn operations.
//!
//! This module provides the main error type [`LimnError`] which wraps the
//! error of every stage a diagram passes through on its way to a document.

use std::io;

use thiserror::Error;

use crate::{automation::AutomationError, layout::LayoutError, templates::ResolutionError};

/// A malformed diagram model, detected before layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{kind} at position {index} has an empty id")]
    EmptyId { kind: &'static str, index: usize },

    #[error("duplicate id `{id}`: {kind} collides with an earlier {first_kind}")]
    DuplicateId {
        id: String,
        kind: &'static str,
        first_kind: &'static str,
    },
}

impl ModelError {
    /// Returns the offending id, if the error names one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::EmptyId { .. } => None,
            Self::DuplicateId { id, .. } => Some(id),
        }
    }
}

/// The main error type for Limn operations.
#[derive(Debug, Error)]
pub enum LimnError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Template error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Automation error: {0}")]
    Automation(AutomationError),

    #[error("Model provider error: {0}")]
    Provider(Box<dyn std::error::Error + Send + Sync>),

    #[error("no shape has been drawn for `{0}`")]
    UnknownTarget(String),

    #[error("build cancelled")]
    Cancelled,
}

impl From<AutomationError> for LimnError {
    fn from(err: AutomationError) -> Self {
        match err {
            AutomationError::Resolution(err) => Self::Resolution(err),
            err => Self::Automation(err),
        }
    }
}

impl LimnError {
    /// Wraps an error raised by a model provider.
    pub fn provider(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Provider(err.into())
    }
}
