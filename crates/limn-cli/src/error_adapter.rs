//! Error adapter for converting CLI errors to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. Every error gets
//! a `limn::*` code; some get a hint on how to fix the input.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use limn::{
    LimnError, ModelError,
    automation::AutomationError,
    templates::ResolutionError,
};

use crate::{config::ConfigError, error::CliError, model_json::ModelLoadError};

/// Adapter rendering a [`CliError`] as a miette diagnostic.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            CliError::Config(_) => "limn::config",
            CliError::Limn(err) => match err {
                LimnError::Io(_) => "limn::io",
                LimnError::Model(_) => "limn::model",
                LimnError::Layout(_) => "limn::layout",
                LimnError::Resolution(_) => "limn::template",
                LimnError::Automation(_) => "limn::automation",
                LimnError::Provider(_) => "limn::provider",
                LimnError::UnknownTarget(_) => "limn::target",
                LimnError::Cancelled => "limn::cancelled",
            },
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.0 {
            CliError::Config(ConfigError::MissingFile(_)) => {
                "pass an existing file with --config, or omit it to use the defaults"
            }
            CliError::Config(_) => return None,
            CliError::Limn(err) => help_for(err)?,
        };
        Some(Box::new(help))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

fn help_for(err: &LimnError) -> Option<&'static str> {
    match err {
        LimnError::Model(ModelError::DuplicateId { .. }) => {
            Some("node and edge ids are compared case-insensitively and must all differ")
        }
        LimnError::Model(ModelError::EmptyId { .. }) => Some("give every node and edge an id"),
        LimnError::Resolution(ResolutionError::MissingTemplate { .. }) => {
            Some("run with --list-templates to see the templates of each library")
        }
        LimnError::Resolution(ResolutionError::FileNotFound { .. }) => {
            Some("relative template paths are resolved against the configuration file")
        }
        LimnError::Automation(AutomationError::Start(_)) => {
            Some("make sure the drawing application is installed and can be started")
        }
        LimnError::Provider(source) => match source.downcast_ref::<ModelLoadError>() {
            Some(ModelLoadError::NoNodes) => Some("add at least one entry to `nodes`"),
            Some(ModelLoadError::UnsupportedSchema(_)) => {
                Some("set `schemaVersion` to \"1.0\" or leave it out")
            }
            _ => None,
        },
        _ => None,
    }
}
