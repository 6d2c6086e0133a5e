//! An in-process [`Session`] that draws into memory and saves SVG.
//!
//! `SketchSession` stands in for the desktop application wherever one is not
//! available: the CLI uses it to produce a preview document and the tests use
//! it to observe what the automation layer did. It keeps the same contract a
//! real binding has to honor:
//!
//! - every handle it hands out is tracked until released, and releasing an
//!   unknown or already released handle fails;
//! - template libraries are TOML files (see [`library`]);
//! - themes are recorded on the page; theme variants and windows are not
//!   supported, so fit view is always skipped;
//! - [`Session::save_document`] writes SVG, and the document extension is
//!   always `svg`.

mod library;
mod render;

use std::{collections::HashMap, fs, path::Path};

use log::debug;

use limn_core::{
    geometry::{Bounds, Point, Size},
    style::ShapeStyle,
    template::TemplateInfo,
};

use crate::automation::{
    BasicShape, Capability, Handle, HandleId, HandleKind, OpenMode, Session, SessionError, ShapeId,
};

pub use library::{SketchLibrary, TemplateEntry};

/// A placed node shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SketchShape {
    id: ShapeId,
    kind: BasicShape,
    bounds: Bounds,
    text: Option<String>,
    style: ShapeStyle,
    template: Option<String>,
}

impl SketchShape {
    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn kind(&self) -> BasicShape {
        self.kind
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn style(&self) -> &ShapeStyle {
        &self.style
    }

    /// `library!name` of the template the shape was dropped from.
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }
}

/// A placed connector.
#[derive(Debug, Clone, PartialEq)]
pub struct SketchConnector {
    id: ShapeId,
    points: Vec<Point>,
    ends: Option<(ShapeId, ShapeId)>,
    directed: bool,
    text: Option<String>,
    style: ShapeStyle,
}

impl SketchConnector {
    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Shapes the connector is glued to.
    pub fn ends(&self) -> Option<(ShapeId, ShapeId)> {
        self.ends
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn style(&self) -> &ShapeStyle {
        &self.style
    }
}

/// One page of the sketch document.
#[derive(Debug, Clone, Default)]
pub struct SketchPage {
    theme: Option<String>,
    shapes: Vec<SketchShape>,
    connectors: Vec<SketchConnector>,
}

impl SketchPage {
    pub fn theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }

    pub fn shapes(&self) -> &[SketchShape] {
        &self.shapes
    }

    pub fn connectors(&self) -> &[SketchConnector] {
        &self.connectors
    }
}

/// What a live handle points at.
#[derive(Debug)]
enum Target {
    Document,
    Library(SketchLibrary),
    Page(usize),
    Shape(ShapeId),
}

impl Target {
    fn kind(&self) -> HandleKind {
        match self {
            Self::Document => HandleKind::Document,
            Self::Library(_) => HandleKind::Library,
            Self::Page(_) => HandleKind::Page,
            Self::Shape(_) => HandleKind::Shape,
        }
    }
}

/// In-memory drawing session backed by SVG output.
///
/// # Examples
///
/// ```
/// use limn::{automation::{BasicShape, Scoped, Session}, sketch::SketchSession};
/// use limn_core::geometry::{Bounds, Point, Size};
///
/// let mut session = SketchSession::new();
/// {
///     let mut page = Scoped::acquire(&mut session, |s| s.add_page()).unwrap();
///     let (session, page) = page.parts();
///     let bounds = Bounds::new_from_top_left(Point::default(), Size::new(10.0, 10.0));
///     let shape = session.draw_basic(page, BasicShape::Ellipse, bounds).unwrap();
///     session.release(shape).unwrap();
/// }
///
/// assert_eq!(session.page_count(), 1);
/// assert_eq!(session.live_handles(), 0);
/// ```
#[derive(Debug, Default)]
pub struct SketchSession {
    handles: HashMap<HandleId, Target>,
    next_handle: u64,
    next_shape: u32,
    pages: Vec<SketchPage>,
    template: Option<String>,
    closed: bool,
}

impl SketchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles handed out and not yet released.
    pub fn live_handles(&self) -> usize {
        self.handles.len()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[SketchPage] {
        &self.pages
    }

    /// Finds a node shape on any page.
    pub fn page_shape(&self, id: ShapeId) -> Option<&SketchShape> {
        self.pages
            .iter()
            .flat_map(|page| page.shapes.iter())
            .find(|shape| shape.id == id)
    }

    /// Finds a connector on any page.
    pub fn page_connector(&self, id: ShapeId) -> Option<&SketchConnector> {
        self.pages
            .iter()
            .flat_map(|page| page.connectors.iter())
            .find(|connector| connector.id == id)
    }

    /// Shapes a connector is glued to.
    pub fn connector_ends(&self, id: ShapeId) -> Option<(ShapeId, ShapeId)> {
        self.page_connector(id).and_then(SketchConnector::ends)
    }

    /// Path of the template document the drawing is based on.
    pub fn template_document(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Renders the document without saving it.
    pub fn to_svg(&self) -> String {
        render::render_document(&self.pages, self.template.as_deref()).to_string()
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Unavailable("session is closed".to_string()));
        }
        Ok(())
    }

    fn issue(&mut self, target: Target) -> Handle {
        self.next_handle += 1;
        let handle = Handle::new(HandleId(self.next_handle), target.kind());
        self.handles.insert(handle.id(), target);
        handle
    }

    fn target(&self, handle: &Handle, expected: HandleKind) -> Result<&Target, SessionError> {
        let target = self
            .handles
            .get(&handle.id())
            .ok_or(SessionError::UnknownHandle(handle.id()))?;
        if target.kind() != expected {
            return Err(SessionError::WrongKind {
                id: handle.id(),
                expected,
                actual: target.kind(),
            });
        }
        Ok(target)
    }

    fn page_index(&self, page: &Handle) -> Result<usize, SessionError> {
        match self.target(page, HandleKind::Page)? {
            Target::Page(index) => Ok(*index),
            _ => Err(SessionError::UnknownHandle(page.id())),
        }
    }

    fn shape_target(&self, shape: &Handle) -> Result<ShapeId, SessionError> {
        match self.target(shape, HandleKind::Shape)? {
            Target::Shape(id) => Ok(*id),
            _ => Err(SessionError::UnknownHandle(shape.id())),
        }
    }

    fn next_shape_id(&mut self) -> ShapeId {
        self.next_shape += 1;
        ShapeId(self.next_shape)
    }

    fn shape_mut(&mut self, id: ShapeId) -> Option<&mut SketchShape> {
        self.pages
            .iter_mut()
            .flat_map(|page| page.shapes.iter_mut())
            .find(|shape| shape.id == id)
    }

    fn connector_mut(&mut self, id: ShapeId) -> Option<&mut SketchConnector> {
        self.pages
            .iter_mut()
            .flat_map(|page| page.connectors.iter_mut())
            .find(|connector| connector.id == id)
    }

    fn place_shape(
        &mut self,
        page: &Handle,
        kind: BasicShape,
        bounds: Bounds,
        template: Option<String>,
    ) -> Result<Handle, SessionError> {
        let index = self.page_index(page)?;
        let id = self.next_shape_id();
        self.pages[index].shapes.push(SketchShape {
            id,
            kind,
            bounds,
            text: None,
            style: ShapeStyle::default(),
            template,
        });
        Ok(self.issue(Target::Shape(id)))
    }
}

impl Session for SketchSession {
    fn document_extension(&self) -> &str {
        "svg"
    }

    fn supports(&self, capability: Capability) -> bool {
        matches!(capability, Capability::Themes)
    }

    fn open_document(&mut self, path: &Path, mode: OpenMode) -> Result<Handle, SessionError> {
        self.ensure_open()?;
        match mode {
            OpenMode::Template => {
                fs::metadata(path).map_err(|err| SessionError::Open {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                })?;
                self.template = Some(path.display().to_string());
                debug!(path = path.display().to_string(); "Template document opened");
                Ok(self.issue(Target::Document))
            }
            OpenMode::Library => {
                let library = SketchLibrary::load(path)?;
                debug!(
                    library = library.name(),
                    templates = library.infos().len();
                    "Template library opened"
                );
                Ok(self.issue(Target::Library(library)))
            }
        }
    }

    fn library_templates(&mut self, library: &Handle) -> Result<Vec<TemplateInfo>, SessionError> {
        match self.target(library, HandleKind::Library)? {
            Target::Library(library) => Ok(library.infos()),
            _ => Err(SessionError::UnknownHandle(library.id())),
        }
    }

    fn active_page(&mut self) -> Result<Option<Handle>, SessionError> {
        self.ensure_open()?;
        match self.pages.len() {
            0 => Ok(None),
            len => Ok(Some(self.issue(Target::Page(len - 1)))),
        }
    }

    fn add_page(&mut self) -> Result<Handle, SessionError> {
        self.ensure_open()?;
        self.pages.push(SketchPage::default());
        debug!(pages = self.pages.len(); "Page added");
        Ok(self.issue(Target::Page(self.pages.len() - 1)))
    }

    fn apply_theme(&mut self, page: &Handle, theme: &str) -> Result<(), SessionError> {
        let index = self.page_index(page)?;
        self.pages[index].theme = Some(theme.to_string());
        Ok(())
    }

    fn apply_theme_variant(&mut self, _page: &Handle, _index: u8) -> Result<(), SessionError> {
        Err(SessionError::Unsupported(Capability::ThemeVariants))
    }

    fn draw_basic(
        &mut self,
        page: &Handle,
        shape: BasicShape,
        bounds: Bounds,
    ) -> Result<Handle, SessionError> {
        self.place_shape(page, shape, bounds, None)
    }

    fn drop_template(
        &mut self,
        page: &Handle,
        library: &Handle,
        name: &str,
        center: Point,
    ) -> Result<Handle, SessionError> {
        let (kind, size, key) = match self.target(library, HandleKind::Library)? {
            Target::Library(library) => {
                let entry = library
                    .find(name)
                    .ok_or_else(|| SessionError::UnknownTemplate {
                        library: library.name().to_string(),
                        name: name.to_string(),
                    })?;
                (
                    entry.shape(),
                    entry.size(),
                    format!("{}!{}", library.name(), entry.universal_name()),
                )
            }
            _ => return Err(SessionError::UnknownHandle(library.id())),
        };
        self.place_shape(page, kind, Bounds::new_from_center(center, size), Some(key))
    }

    fn resize_shape(&mut self, shape: &Handle, size: Size) -> Result<(), SessionError> {
        let id = self.shape_target(shape)?;
        let placed = self.shape_mut(id).ok_or(SessionError::UnknownShape(id))?;
        placed.bounds = Bounds::new_from_center(placed.bounds.center(), size);
        Ok(())
    }

    fn shape_by_id(&mut self, page: &Handle, id: ShapeId) -> Result<Handle, SessionError> {
        let index = self.page_index(page)?;
        let page = &self.pages[index];
        let found = page.shapes.iter().any(|shape| shape.id == id)
            || page.connectors.iter().any(|connector| connector.id == id);
        if !found {
            return Err(SessionError::UnknownShape(id));
        }
        Ok(self.issue(Target::Shape(id)))
    }

    fn shape_id(&mut self, shape: &Handle) -> Result<ShapeId, SessionError> {
        self.shape_target(shape)
    }

    fn set_text(&mut self, shape: &Handle, text: &str) -> Result<(), SessionError> {
        let id = self.shape_target(shape)?;
        if let Some(placed) = self.shape_mut(id) {
            placed.text = Some(text.to_string());
        } else if let Some(connector) = self.connector_mut(id) {
            connector.text = Some(text.to_string());
        } else {
            return Err(SessionError::UnknownShape(id));
        }
        Ok(())
    }

    fn apply_style(&mut self, shape: &Handle, style: &ShapeStyle) -> Result<(), SessionError> {
        let id = self.shape_target(shape)?;
        if let Some(placed) = self.shape_mut(id) {
            placed.style = style.clone();
        } else if let Some(connector) = self.connector_mut(id) {
            connector.style = style.clone();
        } else {
            return Err(SessionError::UnknownShape(id));
        }
        Ok(())
    }

    fn draw_connector(
        &mut self,
        page: &Handle,
        points: &[Point],
        ends: Option<(ShapeId, ShapeId)>,
        directed: bool,
    ) -> Result<Handle, SessionError> {
        let index = self.page_index(page)?;
        if let Some((source, target)) = ends {
            for end in [source, target] {
                if self.page_shape(end).is_none() {
                    return Err(SessionError::UnknownShape(end));
                }
            }
        }
        let id = self.next_shape_id();
        self.pages[index].connectors.push(SketchConnector {
            id,
            points: points.to_vec(),
            ends,
            directed,
            text: None,
            style: ShapeStyle::default(),
        });
        Ok(self.issue(Target::Shape(id)))
    }

    fn active_window(&mut self) -> Result<Option<Handle>, SessionError> {
        Ok(None)
    }

    fn fit_view(&mut self, _window: &Handle) -> Result<(), SessionError> {
        Err(SessionError::Unsupported(Capability::FitView))
    }

    fn save_document(&mut self, path: &Path) -> Result<(), SessionError> {
        self.ensure_open()?;
        let document = render::render_document(&self.pages, self.template.as_deref());
        svg::save(path, &document)?;
        Ok(())
    }

    fn release(&mut self, handle: Handle) -> Result<(), SessionError> {
        let (id, _) = handle.into_raw();
        match self.handles.remove(&id) {
            Some(_) => Ok(()),
            None => Err(SessionError::UnknownHandle(id)),
        }
    }

    fn close(&mut self) -> Result<(), SessionError> {
        if !self.handles.is_empty() {
            debug!(live = self.handles.len(); "Closing session with live handles");
        }
        self.closed = true;
        Ok(())
    }
}
