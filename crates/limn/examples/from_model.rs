//! Example: Building a diagram from an in-memory model
//!
//! Builds a three-tier diagram programmatically, draws it through an
//! automation host over the offline sketch session and saves the result.

use limn::{
    DiagramBuilder,
    cancel::CancellationToken,
    color::Color,
    config::AppConfig,
    model::{DiagramModel, Edge, Node},
    provider::StaticModelProvider,
    sketch::SketchSession,
    style::{LinePattern, ShapeStyle},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Building diagram from model...\n");

    let accent = ShapeStyle::default().with_fill(Color::new("#dbeafe")?);
    let model = DiagramModel::from_parts(
        [
            Node::new("client", "Web Client").with_style(accent.clone()),
            Node::new("server", "API Server").with_shape_type("rounded_rectangle"),
            Node::new("database", "Database").with_shape_type("ellipse"),
            Node::new("cache", "Cache").with_style(accent),
        ],
        [
            Edge::new("client->server", "client", "server").with_label("HTTPS"),
            Edge::new("server->database", "server", "database").with_label("SQL"),
            Edge::new("server->cache", "server", "cache").with_style(
                ShapeStyle::default().with_line_pattern(LinePattern::Dashed),
            ),
        ],
    );
    println!(
        "Model has {} nodes and {} edges",
        model.nodes().len(),
        model.edges().len()
    );

    let builder = DiagramBuilder::new(AppConfig::default());
    let host = builder.start_host(|| Ok(SketchSession::new()), Vec::new())?;
    let mut surface = builder.host_surface(&host);

    let layout = builder.build(
        &StaticModelProvider::new(model),
        &mut surface,
        None,
        &CancellationToken::new(),
    )?;
    for node in layout.nodes() {
        println!(
            "  {:<10} at ({}, {})",
            node.node_id(),
            node.position().x(),
            node.position().y()
        );
    }

    let output = std::env::temp_dir().join("limn_from_model");
    let saved = host.invoke_with_result(move |workbench| workbench.save_document(&output))?;
    host.shutdown();

    println!("\nDiagram saved to {}", saved.display());
    Ok(())
}
