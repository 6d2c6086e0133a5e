//! Single-threaded automation of the external drawing application.
//!
//! - [`AutomationHost`]: worker thread plus blocking FIFO job queue.
//! - [`Session`]: the boundary to the application, implemented per backend.
//! - [`Workbench`]: what a job gets to work on, the session and its
//!   [`TemplateResolver`](crate::templates::TemplateResolver).
//! - [`Handle`], [`Scoped`] and [`using`]: release discipline for
//!   application-owned handles.

mod handle;
mod host;
mod session;
mod workbench;

use std::io;

use thiserror::Error;

pub use handle::{Handle, HandleId, HandleKind, Scoped, release_quietly, using};
pub use host::{AutomationHost, Pending};
pub use session::{BasicShape, Capability, OpenMode, Session, SessionError, ShapeId};
pub use workbench::Workbench;

use crate::templates::ResolutionError;

/// Errors raised by the automation host or by a job running on it.
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("automation host has shut down")]
    ShutDown,

    #[error("jobs cannot be submitted from the automation worker thread")]
    Reentrant,

    #[error("automation worker exited before completing the job")]
    WorkerLost,

    #[error("failed to open automation session: {0}")]
    Start(#[source] SessionError),

    #[error("failed to spawn automation worker: {0}")]
    Spawn(#[source] io::Error),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
