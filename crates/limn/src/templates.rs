//! Template resolution.
//!
//! The [`TemplateResolver`] turns a node's logical type into a
//! [`TemplateKey`] and keeps the template libraries it needs open for the
//! life of an automation session. It is prepared once from a
//! [`TemplateSpec`]: every declared library is opened and indexed, and every
//! shape mapping is checked against those indexes before anything is drawn.
//!
//! Libraries stay open until [`TemplateResolver::dispose`] releases them;
//! callers never close a library themselves.

use std::{
    collections::HashMap,
    env,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::{debug, info, warn};
use thiserror::Error;

use limn_core::template::{MatchMode, TemplateInfo, TemplateKey, TemplateSpec};

use crate::automation::{
    Capability, Handle, OpenMode, Scoped, Session, SessionError, release_quietly,
};

/// Maximum number of parent directories of the executable searched for files.
const EXE_PARENT_DEPTH: usize = 8;

/// Errors raised while preparing or consulting a [`TemplateResolver`].
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("template resolver is already prepared")]
    AlreadyPrepared,

    #[error("template resolver is not prepared")]
    NotPrepared,

    #[error("shape mapping `{logical_type}` must be `library!name`, got `{target}`")]
    InvalidMapping {
        logical_type: String,
        target: String,
    },

    #[error(
        "template `{target}` not found for logical type `{logical_type}`; loaded libraries: {loaded}"
    )]
    MissingTemplate {
        logical_type: String,
        target: String,
        loaded: String,
    },

    #[error("template library `{0}` is declared more than once")]
    DuplicateLibrary(String),

    #[error("template library `{0}` is not loaded")]
    UnknownLibrary(String),

    #[error("file not found: `{}`; tried: {}", .path.display(), display_paths(.tried))]
    FileNotFound { path: PathBuf, tried: Vec<PathBuf> },

    #[error(transparent)]
    Session(#[from] SessionError),
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "nothing".to_string();
    }
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One opened library and its template index.
#[derive(Debug)]
struct LoadedLibrary {
    key: String,
    handle: Handle,
    match_mode: MatchMode,
    templates: IndexMap<String, TemplateInfo>,
}

impl LoadedLibrary {
    fn find(&self, name: &str) -> Option<&TemplateInfo> {
        self.templates.get(&self.match_mode.index_key(name))
    }
}

/// Everything opened by a successful `prepare`.
#[derive(Debug, Default)]
struct Prepared {
    document: Option<Handle>,
    libraries: IndexMap<String, LoadedLibrary>,
    mapping: HashMap<String, TemplateKey>,
    fallback: Option<TemplateKey>,
}

impl Prepared {
    fn library(&self, key: &str) -> Option<&LoadedLibrary> {
        self.libraries.get(&key.to_lowercase())
    }

    fn loaded_keys(&self) -> String {
        let mut keys: Vec<_> = self.libraries.values().map(|lib| lib.key.as_str()).collect();
        keys.sort_unstable();
        keys.join(", ")
    }

    /// Checks a `library!name` reference and returns its canonical key.
    fn canonical_key(&self, target: &str) -> Option<TemplateKey> {
        let key: TemplateKey = target.parse().ok()?;
        let library = self.library(key.library())?;
        let info = library.find(key.name())?;
        Some(TemplateKey::new(&library.key, info.universal_name()))
    }

    fn release<S: Session + ?Sized>(self, session: &mut S) {
        for (_, library) in self.libraries {
            release_quietly(session, library.handle);
        }
        if let Some(document) = self.document {
            release_quietly(session, document);
        }
    }
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Fresh,
    Prepared(Prepared),
    Disposed,
}

/// Resolves logical shape types to templates for one session.
///
/// # Examples
///
/// ```
/// use limn::{sketch::SketchSession, templates::TemplateResolver};
/// use limn_core::template::TemplateSpec;
///
/// let mut session = SketchSession::new();
/// let mut resolver = TemplateResolver::new();
/// resolver.prepare(&mut session, &TemplateSpec::default()).unwrap();
///
/// assert_eq!(resolver.try_resolve_master("process").unwrap(), None);
/// resolver.dispose(&mut session);
/// ```
#[derive(Debug, Default)]
pub struct TemplateResolver {
    search_dirs: Vec<PathBuf>,
    state: State,
}

impl TemplateResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory relative template paths are resolved against.
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    pub fn is_prepared(&self) -> bool {
        matches!(self.state, State::Prepared(_))
    }

    /// Opens the template document and libraries of `spec` and checks its mapping.
    ///
    /// Can be called once per resolver. On failure every handle opened so far
    /// is released and the resolver stays unprepared.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::AlreadyPrepared`] on a second call, and a
    /// [`ResolutionError::MissingTemplate`] when a mapping targets a template
    /// its library does not contain.
    pub fn prepare<S: Session + ?Sized>(
        &mut self,
        session: &mut S,
        spec: &TemplateSpec,
    ) -> Result<(), ResolutionError> {
        if !matches!(self.state, State::Fresh) {
            return Err(ResolutionError::AlreadyPrepared);
        }

        let mut prepared = Prepared::default();
        match self.load(session, spec, &mut prepared) {
            Ok(()) => {
                info!(
                    libraries = prepared.libraries.len(),
                    mappings = prepared.mapping.len(),
                    fallback = prepared.fallback.is_some();
                    "Templates prepared"
                );
                self.state = State::Prepared(prepared);
                Ok(())
            }
            Err(err) => {
                prepared.release(session);
                Err(err)
            }
        }
    }

    fn load<S: Session + ?Sized>(
        &self,
        session: &mut S,
        spec: &TemplateSpec,
        prepared: &mut Prepared,
    ) -> Result<(), ResolutionError> {
        if let Some(path) = spec.template_path() {
            let path = resolve_existing_file(path, &self.search_dirs)?;
            debug!(path = path.display().to_string(); "Opening template document");
            prepared.document = Some(session.open_document(&path, OpenMode::Template)?);
        }

        self.prepare_page(session, spec)?;

        for library in spec.libraries() {
            let folded = library.key().to_lowercase();
            if prepared.libraries.contains_key(&folded) {
                return Err(ResolutionError::DuplicateLibrary(library.key().to_string()));
            }

            let path = resolve_existing_file(library.path(), &self.search_dirs)?;
            let handle = session.open_document(&path, OpenMode::Library)?;
            // Owned by `prepared` from here on, so a failure below still releases it.
            let loaded = prepared.libraries.entry(folded).or_insert(LoadedLibrary {
                key: library.key().to_string(),
                handle,
                match_mode: spec.match_mode(),
                templates: IndexMap::new(),
            });

            for info in session.library_templates(&loaded.handle)? {
                let index_key = loaded.match_mode.index_key(info.universal_name());
                if loaded.templates.contains_key(&index_key) {
                    debug!(
                        library = loaded.key.as_str(),
                        template = info.universal_name();
                        "Duplicate template name, keeping first"
                    );
                    continue;
                }
                // Listed under the configured key, not the file the session opened.
                let info = TemplateInfo::new(&loaded.key, info.name(), info.universal_name());
                loaded.templates.insert(index_key, info);
            }
            debug!(
                library = loaded.key.as_str(),
                templates = loaded.templates.len();
                "Template library loaded"
            );
        }

        for (logical_type, target) in spec.shape_mapping() {
            if target.parse::<TemplateKey>().is_err() {
                return Err(ResolutionError::InvalidMapping {
                    logical_type: logical_type.clone(),
                    target: target.clone(),
                });
            }
            let key = prepared.canonical_key(target).ok_or_else(|| {
                ResolutionError::MissingTemplate {
                    logical_type: logical_type.clone(),
                    target: target.clone(),
                    loaded: prepared.loaded_keys(),
                }
            })?;
            prepared.mapping.insert(logical_type.clone(), key);
        }

        if let Some(fallback) = spec.fallback() {
            match prepared.canonical_key(fallback) {
                Some(key) => prepared.fallback = Some(key),
                None => warn!(fallback; "Fallback template not found, ignoring"),
            }
        }

        Ok(())
    }

    /// Makes sure a page exists and applies the requested theme to it.
    fn prepare_page<S: Session + ?Sized>(
        &self,
        session: &mut S,
        spec: &TemplateSpec,
    ) -> Result<(), ResolutionError> {
        let page = match session.active_page()? {
            Some(page) => page,
            None => session.add_page()?,
        };
        let mut page = Scoped::new(session, page);
        let (session, page) = page.parts();

        let Some(theme) = self.theme(spec) else {
            return Ok(());
        };
        if !session.supports(Capability::Themes) {
            warn!(theme = theme.as_str(); "Session does not support themes, skipping");
            return Ok(());
        }
        session.apply_theme(page, &theme)?;
        debug!(theme = theme.as_str(); "Theme applied");

        match spec.theme_variant() {
            None => {}
            Some(variant @ 1..=4) => {
                if session.supports(Capability::ThemeVariants) {
                    session.apply_theme_variant(page, variant - 1)?;
                } else {
                    debug!(variant; "Session does not support theme variants, skipping");
                }
            }
            Some(variant) => warn!(variant; "Theme variant out of range 1..=4, ignoring"),
        }
        Ok(())
    }

    /// Picks the theme file if it exists, else the theme name.
    fn theme(&self, spec: &TemplateSpec) -> Option<String> {
        if let Some(path) = spec.theme_path() {
            match resolve_existing_file(path, &self.search_dirs) {
                Ok(path) => return Some(path.display().to_string()),
                Err(err) => warn!(err:% = err; "Theme file not found, ignoring"),
            }
        }
        spec.theme_name()
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
    }

    /// Looks up the template mapped to `logical_type`, falling back to the
    /// configured fallback template.
    ///
    /// A miss without fallback is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::NotPrepared`] before a successful `prepare`.
    pub fn try_resolve_master(
        &self,
        logical_type: &str,
    ) -> Result<Option<TemplateKey>, ResolutionError> {
        let State::Prepared(prepared) = &self.state else {
            return Err(ResolutionError::NotPrepared);
        };
        Ok(prepared
            .mapping
            .get(logical_type)
            .or(prepared.fallback.as_ref())
            .cloned())
    }

    /// Returns the open handle of the library a key points into.
    pub fn library_handle(&self, library: &str) -> Result<&Handle, ResolutionError> {
        let State::Prepared(prepared) = &self.state else {
            return Err(ResolutionError::NotPrepared);
        };
        prepared
            .library(library)
            .map(|loaded| &loaded.handle)
            .ok_or_else(|| ResolutionError::UnknownLibrary(library.to_string()))
    }

    /// Lists up to `take` templates of every loaded library, for diagnostics.
    pub fn list_templates(&self, take: usize) -> Vec<TemplateInfo> {
        let State::Prepared(prepared) = &self.state else {
            return Vec::new();
        };
        prepared
            .libraries
            .values()
            .flat_map(|library| library.templates.values().take(take))
            .cloned()
            .collect()
    }

    /// Releases every library and document handle. Safe to call repeatedly.
    pub fn dispose<S: Session + ?Sized>(&mut self, session: &mut S) {
        if let State::Prepared(prepared) = std::mem::replace(&mut self.state, State::Disposed) {
            debug!(libraries = prepared.libraries.len(); "Disposing template libraries");
            prepared.release(session);
        }
    }
}

/// Finds an existing file for a possibly relative path.
///
/// Absolute paths are used as given. Relative paths are tried against the
/// working directory, then each of `base_dirs`, then the directory of the
/// running executable and up to eight of its parents.
///
/// # Errors
///
/// Returns [`ResolutionError::FileNotFound`] listing every candidate tried.
pub fn resolve_existing_file(
    raw: &Path,
    base_dirs: &[PathBuf],
) -> Result<PathBuf, ResolutionError> {
    let trimmed = raw.to_string_lossy();
    let trimmed = trimmed.trim().trim_matches('"');
    let path = PathBuf::from(trimmed);

    let mut tried = Vec::new();
    if trimmed.is_empty() {
        return Err(ResolutionError::FileNotFound { path, tried });
    }
    if path.is_absolute() {
        if path.is_file() {
            return Ok(path);
        }
        tried.push(path.clone());
        return Err(ResolutionError::FileNotFound { path, tried });
    }

    let mut roots = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        roots.push(cwd);
    }
    roots.extend(base_dirs.iter().cloned());
    if let Some(exe_dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.extend(exe_dir.ancestors().take(EXE_PARENT_DEPTH + 1).map(Path::to_path_buf));
    }

    for root in roots {
        let candidate = root.join(&path);
        if tried.contains(&candidate) {
            continue;
        }
        if candidate.is_file() {
            return Ok(candidate);
        }
        tried.push(candidate);
    }

    Err(ResolutionError::FileNotFound { path, tried })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use limn_core::template::LibrarySpec;

    use super::*;
    use crate::sketch::SketchSession;

    const BASIC: &str = r#"
[[template]]
name = "Rectangle"
shape = "rectangle"

[[template]]
name = "Prozess"
universal_name = "Process"
shape = "rounded_rectangle"

[[template]]
name = "Decision"
shape = "ellipse"
"#;

    fn library_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("basic.toml"), BASIC).unwrap();
        dir
    }

    fn spec(dir: &Path) -> TemplateSpec {
        TemplateSpec::default().with_library(LibrarySpec::new("Basic", dir.join("basic.toml")))
    }

    #[test]
    fn test_mapping_resolves_to_canonical_key() {
        let dir = library_dir();
        let mut session = SketchSession::new();
        let mut resolver = TemplateResolver::new();

        let spec = spec(dir.path())
            .with_mapping("service", "basic!process")
            .with_match_mode(MatchMode::CaseInsensitive);
        resolver.prepare(&mut session, &spec).unwrap();

        let key = resolver.try_resolve_master("service").unwrap().unwrap();
        assert_eq!(key, TemplateKey::new("Basic", "Process"));
        assert!(resolver.library_handle("BASIC").is_ok());

        resolver.dispose(&mut session);
        assert_eq!(session.live_handles(), 0);
    }

    #[test]
    fn test_missing_template_fails_prepare_and_releases_handles() {
        let dir = library_dir();
        let mut session = SketchSession::new();
        let mut resolver = TemplateResolver::new();

        let spec = spec(dir.path()).with_mapping("service", "Basic!Cylinder");
        let err = resolver.prepare(&mut session, &spec).unwrap_err();

        match err {
            ResolutionError::MissingTemplate {
                logical_type,
                target,
                loaded,
            } => {
                assert_eq!(logical_type, "service");
                assert_eq!(target, "Basic!Cylinder");
                assert_eq!(loaded, "Basic");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!resolver.is_prepared());
        assert_eq!(session.live_handles(), 0);
    }

    #[test]
    fn test_strict_mode_is_case_sensitive() {
        let dir = library_dir();
        let mut session = SketchSession::new();
        let mut resolver = TemplateResolver::new();

        let spec = spec(dir.path()).with_mapping("service", "Basic!process");
        let err = resolver.prepare(&mut session, &spec).unwrap_err();
        assert!(matches!(err, ResolutionError::MissingTemplate { .. }));
    }

    #[test]
    fn test_invalid_mapping_is_rejected() {
        let dir = library_dir();
        let mut session = SketchSession::new();
        let mut resolver = TemplateResolver::new();

        let spec = spec(dir.path()).with_mapping("service", "Process");
        let err = resolver.prepare(&mut session, &spec).unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidMapping { .. }));
        assert_eq!(session.live_handles(), 0);
    }

    #[test]
    fn test_unmapped_type_uses_fallback() {
        let dir = library_dir();
        let mut session = SketchSession::new();
        let mut resolver = TemplateResolver::new();

        let spec = spec(dir.path())
            .with_mapping("decision", "Basic!Decision")
            .with_fallback("Basic!Rectangle");
        resolver.prepare(&mut session, &spec).unwrap();

        assert_eq!(
            resolver.try_resolve_master("decision").unwrap(),
            Some(TemplateKey::new("Basic", "Decision"))
        );
        assert_eq!(
            resolver.try_resolve_master("anything").unwrap(),
            Some(TemplateKey::new("Basic", "Rectangle"))
        );
        resolver.dispose(&mut session);
    }

    #[test]
    fn test_unmapped_type_without_fallback_is_not_found() {
        let dir = library_dir();
        let mut session = SketchSession::new();
        let mut resolver = TemplateResolver::new();

        let spec = spec(dir.path()).with_fallback("Basic!Cylinder");
        resolver.prepare(&mut session, &spec).unwrap();

        assert_eq!(resolver.try_resolve_master("anything").unwrap(), None);
        resolver.dispose(&mut session);
    }

    #[test]
    fn test_prepare_twice_fails() {
        let mut session = SketchSession::new();
        let mut resolver = TemplateResolver::new();

        resolver.prepare(&mut session, &TemplateSpec::default()).unwrap();
        let err = resolver.prepare(&mut session, &TemplateSpec::default());
        assert!(matches!(err, Err(ResolutionError::AlreadyPrepared)));

        resolver.dispose(&mut session);
        let err = resolver.prepare(&mut session, &TemplateSpec::default());
        assert!(matches!(err, Err(ResolutionError::AlreadyPrepared)));
    }

    #[test]
    fn test_resolve_before_prepare_fails() {
        let resolver = TemplateResolver::new();
        assert!(matches!(
            resolver.try_resolve_master("x"),
            Err(ResolutionError::NotPrepared)
        ));
        assert!(resolver.list_templates(10).is_empty());
    }

    #[test]
    fn test_duplicate_library_key_is_rejected() {
        let dir = library_dir();
        let mut session = SketchSession::new();
        let mut resolver = TemplateResolver::new();

        let spec = spec(dir.path()).with_library(LibrarySpec::new("BASIC", dir.path().join("basic.toml")));
        let err = resolver.prepare(&mut session, &spec).unwrap_err();
        assert!(matches!(err, ResolutionError::DuplicateLibrary(key) if key == "BASIC"));
        assert_eq!(session.live_handles(), 0);
    }

    #[test]
    fn test_case_insensitive_collision_keeps_first() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("dupes.toml"),
            "[[template]]\nname = \"Box\"\nshape = \"rectangle\"\n\n[[template]]\nname = \"BOX\"\nshape = \"ellipse\"\n",
        )
        .unwrap();
        let mut session = SketchSession::new();
        let mut resolver = TemplateResolver::new();

        let spec = TemplateSpec::default()
            .with_library(LibrarySpec::new("d", dir.path().join("dupes.toml")))
            .with_mapping("thing", "d!box")
            .with_match_mode(MatchMode::CaseInsensitive);
        resolver.prepare(&mut session, &spec).unwrap();

        assert_eq!(
            resolver.try_resolve_master("thing").unwrap(),
            Some(TemplateKey::new("d", "Box"))
        );
        assert_eq!(resolver.list_templates(10).len(), 1);
        resolver.dispose(&mut session);
    }

    #[test]
    fn test_list_templates_honors_take() {
        let dir = library_dir();
        let mut session = SketchSession::new();
        let mut resolver = TemplateResolver::new();
        resolver.prepare(&mut session, &spec(dir.path())).unwrap();

        let listed = resolver.list_templates(2);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].name(), "Prozess");
        assert_eq!(listed[1].universal_name(), "Process");
        resolver.dispose(&mut session);
    }

    #[test]
    fn test_listed_templates_carry_configured_key() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("basic_v2.toml"), BASIC).unwrap();
        let mut session = SketchSession::new();
        let mut resolver = TemplateResolver::new();

        let spec = TemplateSpec::default()
            .with_library(LibrarySpec::new("Basic", dir.path().join("basic_v2.toml")));
        resolver.prepare(&mut session, &spec).unwrap();

        let listed = resolver.list_templates(1);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].library(), "Basic");
        assert_eq!(listed[0].name(), "Rectangle");
        resolver.dispose(&mut session);
    }

    #[test]
    fn test_relative_paths_use_search_dirs() {
        let dir = library_dir();
        let mut session = SketchSession::new();
        let mut resolver = TemplateResolver::new().with_search_dir(dir.path());

        let spec = TemplateSpec::default()
            .with_library(LibrarySpec::new("basic", "basic.toml"))
            .with_mapping("box", "basic!Rectangle");
        resolver.prepare(&mut session, &spec).unwrap();
        assert!(resolver.is_prepared());
        resolver.dispose(&mut session);
    }

    #[test]
    fn test_file_not_found_lists_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_existing_file(
            Path::new("no-such-library.toml"),
            &[dir.path().to_path_buf()],
        )
        .unwrap_err();

        match err {
            ResolutionError::FileNotFound { path, tried } => {
                assert_eq!(path, PathBuf::from("no-such-library.toml"));
                assert!(tried.contains(&dir.path().join("no-such-library.toml")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let dir = library_dir();
        let mut session = SketchSession::new();
        let mut resolver = TemplateResolver::new();
        resolver.prepare(&mut session, &spec(dir.path())).unwrap();

        resolver.dispose(&mut session);
        resolver.dispose(&mut session);
        assert_eq!(session.live_handles(), 0);
        assert!(matches!(
            resolver.try_resolve_master("x"),
            Err(ResolutionError::NotPrepared)
        ));
    }
}
