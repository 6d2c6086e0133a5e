//! SVG rendering of a sketch document.

use svg::{self, node::element as svg_element};

use limn_core::{
    geometry::{Bounds, Point},
    style::ShapeStyle,
};

use super::{SketchConnector, SketchPage, SketchShape};
use crate::automation::BasicShape;

/// Space around the drawing.
const MARGIN: f32 = 20.0;
/// Vertical gap between stacked pages.
const PAGE_GAP: f32 = 40.0;
const CORNER_RADIUS: f32 = 8.0;
const FONT_SIZE: f32 = 14.0;
const ARROW_MARKER_ID: &str = "limn-arrow";

/// Renders every page, stacked top to bottom, into one SVG document.
pub(super) fn render_document(pages: &[SketchPage], template: Option<&str>) -> svg::Document {
    let mut content = svg_element::Group::new();
    let mut offset_y = 0.0_f32;
    let mut width = 0.0_f32;

    for (index, page) in pages.iter().enumerate() {
        let bounds = page.bounds().unwrap_or_default();
        let mut group = svg_element::Group::new()
            .set("data-page", index + 1)
            .set(
                "transform",
                format!("translate({}, {})", -bounds.min_x(), offset_y - bounds.min_y()),
            );
        if let Some(theme) = page.theme() {
            group = group.set("data-theme", theme);
        }
        for shape in page.shapes() {
            group = group.add(render_shape(shape));
        }
        for connector in page.connectors() {
            group = group.add(render_connector(connector));
        }
        content = content.add(group);

        width = width.max(bounds.width());
        offset_y += bounds.height() + PAGE_GAP;
    }
    let height = (offset_y - PAGE_GAP).max(0.0);

    let total_width = width + 2.0 * MARGIN;
    let total_height = height + 2.0 * MARGIN;
    let mut doc = svg::Document::new()
        .set("viewBox", format!("0 0 {total_width} {total_height}"))
        .set("width", total_width)
        .set("height", total_height);
    if let Some(template) = template {
        doc = doc.set("data-template", template);
    }

    doc.add(svg_element::Definitions::new().add(arrow_marker()))
        .add(content.set("transform", format!("translate({MARGIN}, {MARGIN})")))
}

fn render_shape(shape: &SketchShape) -> svg_element::Group {
    let bounds = shape.bounds();
    let mut group = svg_element::Group::new().set("data-shape-id", shape.id().0);
    match shape.kind() {
        BasicShape::Rectangle | BasicShape::RoundedRectangle => {
            let mut rect = svg_element::Rectangle::new()
                .set("x", bounds.min_x())
                .set("y", bounds.min_y())
                .set("width", bounds.width())
                .set("height", bounds.height());
            if shape.kind() == BasicShape::RoundedRectangle {
                rect = rect.set("rx", CORNER_RADIUS);
            }
            group = group.add(apply_style(rect, shape.style(), "white"));
        }
        BasicShape::Ellipse => {
            let center = bounds.center();
            let ellipse = svg_element::Ellipse::new()
                .set("cx", center.x())
                .set("cy", center.y())
                .set("rx", bounds.width() / 2.0)
                .set("ry", bounds.height() / 2.0);
            group = group.add(apply_style(ellipse, shape.style(), "white"));
        }
    }

    if let Some(template) = shape.template() {
        group = group.set("data-template", template);
    }
    if let Some(text) = shape.text() {
        group = group.add(render_text(text, bounds.center()));
    }
    group
}

fn render_connector(connector: &SketchConnector) -> svg_element::Group {
    let points = connector
        .points()
        .iter()
        .map(|point| format!("{},{}", point.x(), point.y()))
        .collect::<Vec<_>>()
        .join(" ");
    let mut line = apply_style(
        svg_element::Polyline::new().set("points", points),
        connector.style(),
        "none",
    );
    if connector.is_directed() {
        line = line.set("marker-end", format!("url(#{ARROW_MARKER_ID})"));
    }

    let mut group = svg_element::Group::new()
        .set("data-shape-id", connector.id().0)
        .add(line);
    if let Some(text) = connector.text() {
        if let Some(anchor) = label_anchor(connector.points()) {
            group = group.add(render_text(text, anchor));
        }
    }
    group
}

fn render_text(text: &str, center: Point) -> svg_element::Text {
    svg_element::Text::new(text)
        .set("x", center.x())
        .set("y", center.y())
        .set("text-anchor", "middle")
        .set("dominant-baseline", "middle")
        .set("font-family", "sans-serif")
        .set("font-size", FONT_SIZE)
}

/// Midpoint of the middle segment of a polyline, the lower one of the two
/// middle segments when the segment count is even.
fn label_anchor(points: &[Point]) -> Option<Point> {
    match points {
        [] => None,
        [single] => Some(*single),
        _ => {
            let index = (points.len() - 2) / 2;
            Some(points[index].midpoint(points[index + 1]))
        }
    }
}

fn apply_style<T>(element: T, style: &ShapeStyle, default_fill: &str) -> T
where
    T: svg::Node,
{
    let mut element = element;
    match style.fill() {
        Some(fill) => element.assign("fill", &fill),
        None => element.assign("fill", default_fill),
    }
    let stroke = style.stroke().unwrap_or_default();
    element.assign("stroke", &stroke);
    element.assign("stroke-width", 1.5_f32);
    if let Some(dasharray) = style.line_pattern().and_then(|pattern| pattern.to_svg_value()) {
        element.assign("stroke-dasharray", dasharray);
    }
    element
}

fn arrow_marker() -> svg_element::Marker {
    svg_element::Marker::new()
        .set("id", ARROW_MARKER_ID)
        .set("viewBox", "0 0 10 10")
        .set("refX", 9)
        .set("refY", 5)
        .set("markerWidth", 6)
        .set("markerHeight", 6)
        .set("orient", "auto")
        .add(
            svg_element::Path::new()
                .set("d", "M 0 0 L 10 5 L 0 10 z")
                .set("fill", "context-stroke"),
        )
}

impl SketchPage {
    /// Bounds of every shape and connector point on the page.
    fn bounds(&self) -> Option<Bounds> {
        let shapes = self.shapes().iter().map(SketchShape::bounds);
        let connectors = self
            .connectors()
            .iter()
            .filter_map(|connector| Bounds::from_points(connector.points()));
        shapes.chain(connectors).reduce(Bounds::merge)
    }
}
