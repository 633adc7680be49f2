//! Route Drawer - Command Line Front End
//!
//! Drives the route editing core headlessly: loads a GPX file into a
//! [`RouteEditor`], prints a summary, and can write the normalised route back.

mod settings;
mod summary;

pub use settings::Settings;
pub use summary::{RouteSummary, WaypointSummary};

use route_drawer_lib::{EditorConfig, RouteEditor, RouteError, gpx_io};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Install the log subscriber: `RUST_LOG` when set, `info` otherwise, `debug` when verbose
pub fn setup_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load, optionally export, and render the summary for `settings`
pub fn run(settings: &Settings) -> Result<String, CliError> {
    let config = EditorConfig {
        marker_interval: settings.marker_interval,
        ..Default::default()
    };
    let mut editor = RouteEditor::new(config);

    tracing::info!("Loading {}", settings.gpx_file.display());
    editor.load_document(gpx_io::parse_gpx_file(&settings.gpx_file)?);

    if let Some(output) = &settings.output {
        std::fs::write(output, editor.export_gpx()?)?;
        tracing::info!("Wrote {}", output.display());
    }

    let summary = RouteSummary::from_editor(&editor);
    Ok(if settings.json {
        serde_json::to_string_pretty(&summary)?
    } else {
        summary.to_string()
    })
}
