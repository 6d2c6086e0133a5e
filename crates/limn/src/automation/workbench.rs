//! The state a job works on: the session and its template resolver.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, trace, warn};

use limn_core::{
    command::{DrawConnector, DrawShape},
    geometry::Bounds,
    style::ShapeStyle,
    template::TemplateSpec,
};

use super::{
    AutomationError,
    handle::{Handle, Scoped, using},
    session::{BasicShape, Capability, Session, SessionError, ShapeId},
};
use crate::templates::TemplateResolver;

/// Session plus template resolver, owned by the automation worker.
///
/// Jobs receive `&mut Workbench`; nothing else ever touches the session.
#[derive(Debug)]
pub struct Workbench<S: Session> {
    session: S,
    templates: TemplateResolver,
}

impl<S: Session> Workbench<S> {
    pub fn new(session: S) -> Self {
        Self::with_resolver(session, TemplateResolver::new())
    }

    /// Uses a resolver configured with search directories.
    pub fn with_resolver(session: S, templates: TemplateResolver) -> Self {
        Self { session, templates }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn templates(&self) -> &TemplateResolver {
        &self.templates
    }

    /// Prepares the template resolver against this session.
    pub fn prepare_templates(&mut self, spec: &TemplateSpec) -> Result<(), AutomationError> {
        self.templates.prepare(&mut self.session, spec)?;
        Ok(())
    }

    /// Draws one node shape and returns its shape id.
    ///
    /// A shape type that resolves to a template is dropped from its library
    /// and resized; anything else is drawn as a basic shape, `default_shape`
    /// unless the type names a basic shape itself.
    pub fn draw_shape(
        &mut self,
        command: &DrawShape,
        default_shape: BasicShape,
    ) -> Result<ShapeId, AutomationError> {
        let template = match command.shape_type() {
            Some(shape_type) if self.templates.is_prepared() => {
                self.templates.try_resolve_master(shape_type)?
            }
            _ => None,
        };

        let Self { session, templates } = self;
        let page = active_page(session)?;
        let mut page = Scoped::new(&mut *session, page);
        let (session, page) = page.parts();

        let shape = match template {
            Some(key) => {
                let library = templates.library_handle(key.library())?;
                trace!(node = command.node_id(), template:% = key; "Dropping template");
                let shape = session.drop_template(page, library, key.name(), command.center())?;
                let mut shape = Scoped::new(&mut *session, shape);
                let (session, handle) = shape.parts();
                session.resize_shape(handle, command.size())?;
                shape
            }
            None => {
                let basic = command
                    .shape_type()
                    .and_then(BasicShape::from_type_name)
                    .unwrap_or(default_shape);
                trace!(node = command.node_id(), shape:% = basic; "Drawing basic shape");
                let bounds = Bounds::new_from_top_left(command.position(), command.size());
                let shape = session.draw_basic(page, basic, bounds)?;
                Scoped::new(&mut *session, shape)
            }
        };
        finish_shape(shape, command.text(), command.style())
    }

    /// Draws one connector and returns its shape id.
    pub fn draw_connector(
        &mut self,
        command: &DrawConnector,
        ends: Option<(ShapeId, ShapeId)>,
    ) -> Result<ShapeId, AutomationError> {
        let session = &mut self.session;
        let page = active_page(session)?;
        let mut page = Scoped::new(&mut *session, page);
        let (session, page) = page.parts();

        let connector =
            session.draw_connector(page, command.points(), ends, command.is_directed())?;
        trace!(edge = command.edge_id(), points = command.points().len(); "Connector drawn");
        finish_shape(
            Scoped::new(&mut *session, connector),
            command.text(),
            command.style(),
        )
    }

    /// Replaces the text of an already drawn shape.
    pub fn set_text(&mut self, shape: ShapeId, text: &str) -> Result<(), AutomationError> {
        let session = &mut self.session;
        let page = active_page(session)?;
        let mut page = Scoped::new(&mut *session, page);
        let (session, page) = page.parts();
        using(
            session,
            |s| s.shape_by_id(page, shape),
            |s, handle| -> Result<(), AutomationError> {
                s.set_text(handle, text)?;
                Ok(())
            },
        )
    }

    /// Fits the active window to the page, if there is one to fit.
    pub fn flush(&mut self) -> Result<(), AutomationError> {
        if !self.session.supports(Capability::FitView) {
            debug!("Session cannot fit the view, skipping");
            return Ok(());
        }
        match self.session.active_window()? {
            Some(window) => {
                let mut window = Scoped::new(&mut self.session, window);
                let (session, window) = window.parts();
                session.fit_view(window)?;
                debug!("View fitted to page");
            }
            None => debug!("No active window, skipping fit view"),
        }
        Ok(())
    }

    /// Saves the active document, forcing the session's document extension.
    ///
    /// Missing parent directories are created. Returns the path written.
    pub fn save_document(&mut self, path: &Path) -> Result<PathBuf, AutomationError> {
        let path = path.with_extension(self.session.document_extension());
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        self.session.save_document(&path)?;
        debug!(path = path.display().to_string(); "Document saved");
        Ok(path)
    }

    /// Releases the templates and closes the session. Failures are logged.
    pub(crate) fn close(mut self) {
        self.templates.dispose(&mut self.session);
        if let Err(err) = self.session.close() {
            warn!(err:% = err; "Failed to close automation session");
        }
    }
}

/// Returns the active page, adding one when the document has none.
fn active_page<S: Session>(session: &mut S) -> Result<Handle, SessionError> {
    match session.active_page()? {
        Some(page) => Ok(page),
        None => session.add_page(),
    }
}

/// Applies text and style to a freshly drawn shape and returns its id.
fn finish_shape<S: Session>(
    mut shape: Scoped<'_, S>,
    text: Option<&str>,
    style: &ShapeStyle,
) -> Result<ShapeId, AutomationError> {
    let (session, handle) = shape.parts();
    if let Some(text) = text.filter(|text| !text.is_empty()) {
        session.set_text(handle, text)?;
    }
    if !style.is_default() {
        session.apply_style(handle, style)?;
    }
    Ok(session.shape_id(handle)?)
}

impl<S: Session> Drop for Workbench<S> {
    fn drop(&mut self) {
        if self.templates.is_prepared() {
            self.templates.dispose(&mut self.session);
        }
    }
}

#[cfg(test)]
mod tests {
    use limn_core::geometry::{Point, Size};

    use super::*;
    use crate::sketch::SketchSession;

    #[test]
    fn test_draw_shape_without_templates_uses_default_shape() {
        let mut workbench = Workbench::new(SketchSession::new());
        let command = DrawShape::new("A", Point::new(0.0, 0.0), Size::new(120.0, 60.0))
            .with_text("Client")
            .with_shape_type("database");

        let id = workbench
            .draw_shape(&command, BasicShape::Ellipse)
            .unwrap();

        assert_eq!(id, ShapeId(1));
        let shape = workbench.session().page_shape(id).unwrap();
        assert_eq!(shape.kind(), BasicShape::Ellipse);
        assert_eq!(shape.text(), Some("Client"));
        assert_eq!(workbench.session().live_handles(), 0);
    }

    #[test]
    fn test_set_text_on_unknown_shape_fails() {
        let mut workbench = Workbench::new(SketchSession::new());
        let err = workbench.set_text(ShapeId(42), "x").unwrap_err();

        assert!(matches!(
            err,
            AutomationError::Session(SessionError::UnknownShape(ShapeId(42)))
        ));
        assert_eq!(workbench.session().live_handles(), 0);
    }

    #[test]
    fn test_save_normalizes_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut workbench = Workbench::new(SketchSession::new());
        workbench
            .draw_shape(
                &DrawShape::new("A", Point::default(), Size::new(10.0, 10.0)),
                BasicShape::Rectangle,
            )
            .unwrap();

        let saved = workbench
            .save_document(&dir.path().join("nested").join("out.vsdx"))
            .unwrap();

        assert_eq!(saved, dir.path().join("nested").join("out.svg"));
        assert!(saved.is_file());
    }

    #[test]
    fn test_flush_without_window_is_ok() {
        let mut workbench = Workbench::new(SketchSession::new());
        workbench.flush().unwrap();
    }
}
