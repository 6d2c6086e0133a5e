//! Errors of a CLI run and the process exit codes they map to.

use thiserror::Error;

use limn::{
    LimnError,
    automation::{AutomationError, SessionError},
    layout::LayoutError,
};

use crate::config::ConfigError;

/// Exit code for invalid arguments or configuration.
pub const EXIT_USAGE: i32 = 64;
/// Exit code for an invalid model or template setup.
pub const EXIT_DATA: i32 = 65;
/// Exit code when the drawing application cannot be reached.
pub const EXIT_UNAVAILABLE: i32 = 69;
/// Exit code for everything else.
pub const EXIT_SOFTWARE: i32 = 70;

/// The error of a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Limn(#[from] LimnError),
}

impl From<AutomationError> for CliError {
    fn from(err: AutomationError) -> Self {
        Self::Limn(err.into())
    }
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => EXIT_USAGE,
            Self::Limn(err) => match err {
                LimnError::Model(_)
                | LimnError::Provider(_)
                | LimnError::Resolution(_)
                | LimnError::Layout(LayoutError::MissingEndpoint { .. }) => EXIT_DATA,
                LimnError::Automation(
                    AutomationError::Start(_)
                    | AutomationError::Spawn(_)
                    | AutomationError::ShutDown
                    | AutomationError::Session(SessionError::Unavailable(_)),
                ) => EXIT_UNAVAILABLE,
                _ => EXIT_SOFTWARE,
            },
        }
    }
}
