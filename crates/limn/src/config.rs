//! Configuration types for Limn builds.
//!
//! All types implement [`serde::Deserialize`] with every field optional, so
//! a configuration file only needs to name what it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`LayoutOptions`] - Grid spacing, default node size and column count (`[layout]`).
//! - [`RenderConfig`] - How nodes without a template are drawn (`[render]`).
//! - [`TemplateSpec`] - Template document, libraries and shape mapping (`[templates]`).
//!
//! # Example
//!
//! ```
//! # use limn::config::AppConfig;
//! let config: AppConfig = toml::from_str(
//!     r#"
//!     [layout]
//!     columns = 3
//!
//!     [render]
//!     default_shape = "ellipse"
//!
//!     [templates]
//!     fallback = "basic!Rectangle"
//!     libraries = [{ key = "basic", path = "basic.toml" }]
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.layout().columns(), 3);
//! assert!(config.templates().is_some());
//! ```

use std::path::Path;

use serde::Deserialize;

use limn_core::{layout::LayoutOptions, template::TemplateSpec};

use crate::automation::BasicShape;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutOptions,

    /// Render configuration section.
    #[serde(default)]
    render: RenderConfig,

    /// Template configuration section. Templates are not used when absent.
    #[serde(default)]
    templates: Option<TemplateSpec>,
}

impl AppConfig {
    pub fn new(layout: LayoutOptions, render: RenderConfig) -> Self {
        Self {
            layout,
            render,
            templates: None,
        }
    }

    pub fn with_templates(mut self, templates: TemplateSpec) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Returns the layout options.
    pub fn layout(&self) -> &LayoutOptions {
        &self.layout
    }

    /// Returns the render configuration.
    pub fn render(&self) -> &RenderConfig {
        &self.render
    }

    /// Returns the template specification, if templates are configured.
    pub fn templates(&self) -> Option<&TemplateSpec> {
        self.templates.as_ref()
    }

    /// Makes every relative template path absolute against `base_dir`.
    ///
    /// Used for files loaded from disk, whose paths are relative to the
    /// directory the file lives in. Absolute paths are left untouched.
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        let Some(templates) = self.templates.as_mut() else {
            return;
        };
        let rebase = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            }
        };

        let template_path = templates.template_path().map(|path| rebase(path));
        templates.set_template_path(template_path);
        let theme_path = templates.theme_path().map(|path| rebase(path));
        templates.set_theme_path(theme_path);
        for library in templates.libraries_mut() {
            let path = rebase(library.path());
            library.set_path(path);
        }
    }
}

/// Render configuration.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RenderConfig {
    /// Basic shape for nodes whose type names no template and no basic shape.
    #[serde(default)]
    default_shape: BasicShape,
}

impl RenderConfig {
    pub fn new(default_shape: BasicShape) -> Self {
        Self { default_shape }
    }

    /// Returns the default basic shape.
    pub fn default_shape(&self) -> BasicShape {
        self.default_shape
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use float_cmp::assert_approx_eq;

    use limn_core::{geometry::Size, template::MatchMode};

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();

        assert_eq!(config.layout(), &LayoutOptions::default());
        assert_eq!(config.render().default_shape(), BasicShape::Rectangle);
        assert!(config.templates().is_none());
    }

    #[test]
    fn test_full_config() {
        let config: AppConfig = toml::from_str(
            r#"
            [layout]
            horizontal_spacing = 10.0
            default_node_size = { width = 80.0, height = 40.0 }

            [render]
            default_shape = "rounded_rectangle"

            [templates]
            template_path = "base.toml"
            theme_name = "Linear"
            theme_variant = 2
            match_mode = "caseInsensitive"
            libraries = [{ key = "flow", path = "flow.toml" }]

            [templates.shape_mapping]
            service = "flow!Process"
            "#,
        )
        .unwrap();

        assert_approx_eq!(f32, config.layout().horizontal_spacing(), 10.0);
        assert_approx_eq!(f32, config.layout().vertical_spacing(), 42.0);
        assert_eq!(config.layout().default_node_size(), Size::new(80.0, 40.0));
        assert_eq!(config.render().default_shape(), BasicShape::RoundedRectangle);

        let templates = config.templates().unwrap();
        assert_eq!(templates.theme_name(), Some("Linear"));
        assert_eq!(templates.theme_variant(), Some(2));
        assert_eq!(templates.match_mode(), MatchMode::CaseInsensitive);
        assert_eq!(
            templates.shape_mapping().get("service").map(String::as_str),
            Some("flow!Process")
        );
    }

    #[test]
    fn test_resolve_paths_rebases_relative_paths() {
        let mut config: AppConfig = toml::from_str(
            r#"
            [templates]
            template_path = "base.toml"
            libraries = [
                { key = "flow", path = "libs/flow.toml" },
                { key = "abs", path = "/opt/limn/abs.toml" },
            ]
            "#,
        )
        .unwrap();

        config.resolve_paths(Path::new("/etc/limn"));
        let templates = config.templates().unwrap();

        assert_eq!(
            templates.template_path(),
            Some(&PathBuf::from("/etc/limn/base.toml"))
        );
        assert_eq!(
            templates.libraries()[0].path(),
            &PathBuf::from("/etc/limn/libs/flow.toml")
        );
        assert_eq!(
            templates.libraries()[1].path(),
            &PathBuf::from("/opt/limn/abs.toml")
        );
        assert!(templates.theme_path().is_none());
    }
}
