//! Limn CLI library
//!
//! This module contains the core CLI logic for the Limn diagram tool: load a
//! JSON model, draw it through an automation host and save the document.

pub mod error_adapter;
pub mod model_json;

mod args;
mod config;
mod error;

pub use args::Args;
pub use config::ConfigError;
pub use error::{CliError, EXIT_DATA, EXIT_SOFTWARE, EXIT_UNAVAILABLE, EXIT_USAGE};

use std::path::{Path, PathBuf};

use log::info;

use limn::{
    DiagramBuilder,
    automation::AutomationHost,
    cancel::CancellationToken,
    sketch::SketchSession,
    surface::RecordingSurface,
};

use model_json::JsonModelProvider;

/// Run the Limn CLI application
///
/// Loads the model from `args.input`, builds it on an automation host over
/// the offline sketch session and saves the document next to `args.output`
/// with the session's file extension. With `--dry-run` the draw commands are
/// only logged.
///
/// # Errors
///
/// Returns a [`CliError`] for configuration, model, template, layout and
/// automation failures; [`CliError::exit_code`] maps it to a process exit code.
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing diagram"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let builder = DiagramBuilder::new(app_config);
    let provider = JsonModelProvider::new(&args.input);
    let cancel = CancellationToken::new();

    if args.dry_run {
        let mut surface = RecordingSurface::new();
        let layout = builder.build(&provider, &mut surface, None, &cancel)?;
        for command in surface.commands() {
            info!(command:% = command; "Dry run");
        }
        info!(nodes = layout.nodes_len(), edges = layout.edges_len(); "Dry run finished");
        return Ok(());
    }

    let search_dirs = Path::new(&args.input)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .into_iter()
        .collect();
    let host = builder.start_host(|| Ok(SketchSession::new()), search_dirs)?;

    if let Some(take) = args.list_templates {
        list_templates(&host, take)?;
    }

    let mut surface = builder.host_surface(&host);
    builder.build(&provider, &mut surface, None, &cancel)?;

    let output = PathBuf::from(&args.output);
    let saved = host.invoke_with_result(move |workbench| workbench.save_document(&output))?;
    host.shutdown();

    info!(output_file = saved.display().to_string(); "Document saved");

    Ok(())
}

fn list_templates(host: &AutomationHost<SketchSession>, take: usize) -> Result<(), CliError> {
    let templates =
        host.invoke_with_result(move |workbench| Ok(workbench.templates().list_templates(take)))?;
    if templates.is_empty() {
        info!("No templates loaded");
    }
    for template in &templates {
        info!(
            library = template.library(),
            name = template.name(),
            universal_name = template.universal_name();
            "Template"
        );
    }
    Ok(())
}
