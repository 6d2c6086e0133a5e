//! Externally owned resource handles and their release discipline.
//!
//! A [`Handle`] refers to state owned by the automation session: an open
//! document, a library, a page, a window or a placed shape. Every handle
//! must be given back through [`Session::release`] exactly once.
//!
//! Handles are neither `Send` nor `Clone`, so a handle cannot leave the
//! worker thread it was acquired on and always has a single owner. Jobs
//! acquire handles through [`Scoped`] or [`using`], which release on every
//! exit path, including early returns and unwinding. Release failures are
//! logged at warning level and never reach the caller.

use std::{fmt, marker::PhantomData, mem, thread};

use log::{debug, warn};

use super::session::{Session, SessionError};

/// Identifier of a handle within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Document,
    Library,
    Page,
    Window,
    Shape,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Document => "document",
            Self::Library => "library",
            Self::Page => "page",
            Self::Window => "window",
            Self::Shape => "shape",
        };
        f.write_str(name)
    }
}

/// An opaque reference to session-owned state.
///
/// Dropping a handle without releasing it leaks the underlying resource and
/// logs a warning.
#[must_use = "handles must be released through `Session::release`"]
pub struct Handle {
    id: HandleId,
    kind: HandleKind,
    _not_send: PhantomData<*const ()>,
}

impl Handle {
    /// Creates a handle. Called by session implementations only.
    pub fn new(id: HandleId, kind: HandleKind) -> Self {
        Self {
            id,
            kind,
            _not_send: PhantomData,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    /// Consumes the handle without the leak warning.
    ///
    /// Session implementations call this from `release` once the
    /// underlying resource has been given back.
    pub fn into_raw(self) -> (HandleId, HandleKind) {
        let raw = (self.id, self.kind);
        mem::forget(self);
        raw
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({} {})", self.kind, self.id)
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if !thread::panicking() {
            warn!(handle:% = self.id, kind:% = self.kind; "Handle dropped without release");
        }
    }
}

/// Releases a handle, logging instead of returning a failure.
pub fn release_quietly<S: Session + ?Sized>(session: &mut S, handle: Handle) {
    let (id, kind) = (handle.id(), handle.kind());
    match session.release(handle) {
        Ok(()) => debug!(handle:% = id, kind:% = kind; "Handle released"),
        Err(err) => warn!(handle:% = id, kind:% = kind, err:% = err; "Failed to release handle"),
    }
}

/// A handle bound to the session it came from, released when dropped.
///
/// # Examples
///
/// ```
/// use limn::{
///     automation::{HandleKind, Scoped, Session},
///     sketch::SketchSession,
/// };
///
/// let mut session = SketchSession::new();
/// {
///     let mut page = Scoped::acquire(&mut session, |s| s.add_page()).unwrap();
///     let (_session, handle) = page.parts();
///     assert_eq!(handle.kind(), HandleKind::Page);
/// }
/// assert_eq!(session.live_handles(), 0);
/// ```
pub struct Scoped<'s, S: Session + ?Sized> {
    session: &'s mut S,
    handle: Option<Handle>,
}

impl<'s, S: Session + ?Sized> Scoped<'s, S> {
    /// Takes ownership of an already acquired handle.
    pub fn new(session: &'s mut S, handle: Handle) -> Self {
        Self {
            session,
            handle: Some(handle),
        }
    }

    /// Acquires a handle and binds it to the session.
    pub fn acquire<F>(session: &'s mut S, acquire: F) -> Result<Self, SessionError>
    where
        F: FnOnce(&mut S) -> Result<Handle, SessionError>,
    {
        let handle = acquire(session)?;
        Ok(Self::new(session, handle))
    }

    pub fn handle(&self) -> &Handle {
        match &self.handle {
            Some(handle) => handle,
            None => unreachable!("scoped handle is only taken on drop"),
        }
    }

    /// Splits into the session and the handle, for calls that need both.
    pub fn parts(&mut self) -> (&mut S, &Handle) {
        match &self.handle {
            Some(handle) => (&mut *self.session, handle),
            None => unreachable!("scoped handle is only taken on drop"),
        }
    }
}

impl<S: Session + ?Sized> Drop for Scoped<'_, S> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            release_quietly(self.session, handle);
        }
    }
}

/// Acquires a handle, runs `body` with it and releases it on every exit path.
///
/// The result of `body` is returned unchanged; a failing release is logged
/// and does not replace it.
pub fn using<S, T, E, A, B>(session: &mut S, acquire: A, body: B) -> Result<T, E>
where
    S: Session + ?Sized,
    E: From<SessionError>,
    A: FnOnce(&mut S) -> Result<Handle, SessionError>,
    B: FnOnce(&mut S, &Handle) -> Result<T, E>,
{
    let mut scoped = Scoped::acquire(session, acquire)?;
    let (session, handle) = scoped.parts();
    body(session, handle)
}
