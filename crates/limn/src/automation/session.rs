//! The boundary to the external drawing application.
//!
//! A [`Session`] is one live connection to the application. It is created
//! and used on the automation worker thread only; every call that yields
//! application-owned state returns a [`Handle`] the caller must release.

use std::{fmt, path::Path};

use serde::Deserialize;
use thiserror::Error;

use limn_core::{
    geometry::{Bounds, Point, Size},
    style::ShapeStyle,
    template::TemplateInfo,
};

use super::handle::{Handle, HandleId, HandleKind};

/// Identifier of a placed shape, stable for the life of its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub u32);

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Optional features a session may or may not offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Applying a named or file-based theme to a page.
    Themes,
    /// Selecting one of the four variants of an applied theme.
    ThemeVariants,
    /// Fitting the active window to the page.
    FitView,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Themes => write!(f, "themes"),
            Self::ThemeVariants => write!(f, "theme variants"),
            Self::FitView => write!(f, "fit view"),
        }
    }
}

/// How a document is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// A drawing template; becomes the active document.
    Template,
    /// A template library, opened read-only and hidden.
    Library,
}

/// Shapes a session can draw without a template.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasicShape {
    #[default]
    Rectangle,
    RoundedRectangle,
    Ellipse,
}

impl fmt::Display for BasicShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rectangle => write!(f, "rectangle"),
            Self::RoundedRectangle => write!(f, "rounded_rectangle"),
            Self::Ellipse => write!(f, "ellipse"),
        }
    }
}

impl BasicShape {
    /// Maps a logical shape type onto a basic shape, if it names one.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "rectangle" | "rect" | "box" => Some(Self::Rectangle),
            "rounded_rectangle" | "roundedrectangle" | "rounded" => Some(Self::RoundedRectangle),
            "ellipse" | "oval" | "circle" => Some(Self::Ellipse),
            _ => None,
        }
    }
}

/// Errors raised by a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("automation session unavailable: {0}")]
    Unavailable(String),

    #[error("failed to open `{path}`: {reason}")]
    Open { path: String, reason: String },

    #[error("no live handle {0}")]
    UnknownHandle(HandleId),

    #[error("handle {id} is a {actual}, expected a {expected}")]
    WrongKind {
        id: HandleId,
        expected: HandleKind,
        actual: HandleKind,
    },

    #[error("template `{name}` not found in library `{library}`")]
    UnknownTemplate { library: String, name: String },

    #[error("no shape with id {0} on the page")]
    UnknownShape(ShapeId),

    #[error("no active document")]
    NoDocument,

    #[error("session does not support {0}")]
    Unsupported(Capability),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Backend(String),
}

/// One live connection to the external drawing application.
///
/// Methods returning a [`Handle`] transfer ownership of that handle to the
/// caller. Methods returning `Option<Handle>` report a missing resource as
/// `None` instead of failing.
pub trait Session {
    /// Suffix every saved document gets, without the leading dot.
    fn document_extension(&self) -> &str;

    fn supports(&self, capability: Capability) -> bool;

    /// Opens a document. A [`OpenMode::Library`] document yields a library handle.
    fn open_document(&mut self, path: &Path, mode: OpenMode) -> Result<Handle, SessionError>;

    /// Lists the templates of an open library.
    fn library_templates(&mut self, library: &Handle) -> Result<Vec<TemplateInfo>, SessionError>;

    fn active_page(&mut self) -> Result<Option<Handle>, SessionError>;

    /// Adds a page to the active document, creating a blank document if none is open.
    fn add_page(&mut self) -> Result<Handle, SessionError>;

    /// Applies a theme given by name or by theme file path.
    fn apply_theme(&mut self, page: &Handle, theme: &str) -> Result<(), SessionError>;

    /// Applies variant `index` (zero-based) of the page's theme.
    fn apply_theme_variant(&mut self, page: &Handle, index: u8) -> Result<(), SessionError>;

    fn draw_basic(
        &mut self,
        page: &Handle,
        shape: BasicShape,
        bounds: Bounds,
    ) -> Result<Handle, SessionError>;

    /// Drops template `name` of `library` centered at `center`.
    fn drop_template(
        &mut self,
        page: &Handle,
        library: &Handle,
        name: &str,
        center: Point,
    ) -> Result<Handle, SessionError>;

    fn resize_shape(&mut self, shape: &Handle, size: Size) -> Result<(), SessionError>;

    fn shape_by_id(&mut self, page: &Handle, id: ShapeId) -> Result<Handle, SessionError>;

    fn shape_id(&mut self, shape: &Handle) -> Result<ShapeId, SessionError>;

    fn set_text(&mut self, shape: &Handle, text: &str) -> Result<(), SessionError>;

    fn apply_style(&mut self, shape: &Handle, style: &ShapeStyle) -> Result<(), SessionError>;

    /// Draws a connector along `points`, glued to `ends` when given.
    fn draw_connector(
        &mut self,
        page: &Handle,
        points: &[Point],
        ends: Option<(ShapeId, ShapeId)>,
        directed: bool,
    ) -> Result<Handle, SessionError>;

    fn active_window(&mut self) -> Result<Option<Handle>, SessionError>;

    fn fit_view(&mut self, window: &Handle) -> Result<(), SessionError>;

    /// Saves the active document to `path` as given.
    fn save_document(&mut self, path: &Path) -> Result<(), SessionError>;

    /// Gives a handle back. Each handle is released exactly once.
    fn release(&mut self, handle: Handle) -> Result<(), SessionError>;

    /// Closes the session; called once on the worker before it exits.
    fn close(&mut self) -> Result<(), SessionError>;
}
