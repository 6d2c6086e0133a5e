//! Shape and connector styling.
//!
//! # Overview
//!
//! - [`ShapeStyle`]: fill color, stroke color and line pattern, each optional.
//!   A style with nothing set is the *default* style and leaves the
//!   backend's own styling untouched.
//! - [`LinePattern`]: line patterns (solid, dashed, dotted, ...)
//!
//! Both shapes and connectors use [`ShapeStyle`]; a connector ignores `fill`.

use std::{fmt, str::FromStr};

use crate::color::Color;

/// Defines the dash pattern of a stroke.
///
/// # SVG Mapping
///
/// Each variant maps to specific SVG `stroke-dasharray` values:
/// - `Solid`: No dasharray attribute
/// - `Dashed`: "5,5"
/// - `Dotted`: "2,3"
/// - `DashDot`: "10,5,2,5"
/// - `DashDotDot`: "10,5,2,5,2,5"
/// - `Custom(pattern)`: Uses the provided pattern string
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub enum LinePattern {
    /// Solid continuous line (default)
    #[default]
    Solid,
    /// Dashed line with equal dash and gap lengths
    Dashed,
    /// Dotted line with small dots
    Dotted,
    /// Dash-dot pattern
    DashDot,
    /// Dash-dot-dot pattern
    DashDotDot,
    /// Custom dasharray pattern, a comma or space-separated list of dash/gap lengths
    Custom(String),
}

impl FromStr for LinePattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Err("line pattern must not be empty".to_string()),
            "solid" => Ok(Self::Solid),
            "dashed" | "dash" => Ok(Self::Dashed),
            "dotted" | "dot" => Ok(Self::Dotted),
            "dash-dot" | "dashdot" => Ok(Self::DashDot),
            "dash-dot-dot" | "dashdotdot" => Ok(Self::DashDotDot),
            // Any other value is treated as a custom dasharray pattern
            _ => Ok(Self::Custom(s.trim().to_string())),
        }
    }
}

impl LinePattern {
    /// Returns the SVG dasharray value for this pattern, or None for solid lines
    pub fn to_svg_value(&self) -> Option<String> {
        match self {
            Self::Solid => None,
            Self::Dashed => Some("5,5".to_string()),
            Self::Dotted => Some("2,3".to_string()),
            Self::DashDot => Some("10,5,2,5".to_string()),
            Self::DashDotDot => Some("10,5,2,5,2,5".to_string()),
            Self::Custom(pattern) => Some(pattern.clone()),
        }
    }
}

impl fmt::Display for LinePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solid => write!(f, "solid"),
            Self::Dashed => write!(f, "dashed"),
            Self::Dotted => write!(f, "dotted"),
            Self::DashDot => write!(f, "dash-dot"),
            Self::DashDotDot => write!(f, "dash-dot-dot"),
            Self::Custom(pattern) => write!(f, "{pattern}"),
        }
    }
}

/// Visual styling of a node or an edge.
///
/// # Examples
///
/// ```
/// use limn_core::{color::Color, style::{LinePattern, ShapeStyle}};
///
/// assert!(ShapeStyle::default().is_default());
///
/// let style = ShapeStyle::default()
///     .with_fill(Color::new("lightblue").unwrap())
///     .with_line_pattern(LinePattern::Dashed);
/// assert!(!style.is_default());
/// assert!(style.stroke().is_none());
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ShapeStyle {
    fill: Option<Color>,
    stroke: Option<Color>,
    line_pattern: Option<LinePattern>,
}

impl ShapeStyle {
    /// Returns `true` when no property is set.
    pub fn is_default(&self) -> bool {
        self.fill.is_none() && self.stroke.is_none() && self.line_pattern.is_none()
    }

    /// Returns the fill color, if set.
    pub fn fill(&self) -> Option<Color> {
        self.fill
    }

    /// Returns the stroke color, if set.
    pub fn stroke(&self) -> Option<Color> {
        self.stroke
    }

    /// Returns the line pattern, if set.
    pub fn line_pattern(&self) -> Option<&LinePattern> {
        self.line_pattern.as_ref()
    }

    pub fn with_fill(mut self, fill: Color) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_stroke(mut self, stroke: Color) -> Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn with_line_pattern(mut self, pattern: LinePattern) -> Self {
        self.line_pattern = Some(pattern);
        self
    }

    /// Sets or clears the fill color.
    pub fn set_fill(&mut self, fill: Option<Color>) {
        self.fill = fill;
    }

    /// Sets or clears the stroke color.
    pub fn set_stroke(&mut self, stroke: Option<Color>) {
        self.stroke = stroke;
    }

    /// Sets or clears the line pattern.
    pub fn set_line_pattern(&mut self, pattern: Option<LinePattern>) {
        self.line_pattern = pattern;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_pattern_from_str() {
        assert_eq!("solid".parse::<LinePattern>().unwrap(), LinePattern::Solid);
        assert_eq!("Dashed".parse::<LinePattern>().unwrap(), LinePattern::Dashed);
        assert_eq!(
            "dash-dot".parse::<LinePattern>().unwrap(),
            LinePattern::DashDot
        );
        assert_eq!(
            "4 2".parse::<LinePattern>().unwrap(),
            LinePattern::Custom("4 2".to_string())
        );
        assert!("  ".parse::<LinePattern>().is_err());
    }

    #[test]
    fn test_line_pattern_svg_value() {
        assert_eq!(LinePattern::Solid.to_svg_value(), None);
        assert_eq!(LinePattern::Dotted.to_svg_value().as_deref(), Some("2,3"));
        assert_eq!(
            LinePattern::Custom("8,2".to_string()).to_svg_value().as_deref(),
            Some("8,2")
        );
    }

    #[test]
    fn test_style_default_detection() {
        let mut style = ShapeStyle::default();
        assert!(style.is_default());

        style.set_stroke(Some(Color::new("red").unwrap()));
        assert!(!style.is_default());

        style.set_stroke(None);
        assert!(style.is_default());
    }
}
