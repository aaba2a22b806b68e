//! Command-line surface for slimgen
//!
//! Turns a code snippet into a compiled artifact: the snippet is wrapped
//! into a class, compiled against the `Source/` corpus with unused files
//! pruned, and written to `Output/`.

pub mod cli;
pub mod layout;
pub mod request;
pub mod source;

use std::path::PathBuf;

use anyhow::{Context, Result};
use slimgen_core::{BuildError, Builder};
use slimgen_frontend::LiteFrontend;
use tracing::info;

pub use cli::Cli;
pub use layout::Layout;
pub use request::{build_request, RequestError, BUILD_FAILURE, OUTPUT_FAILURE};

/// Run one invocation and return the path of the written artifact
pub fn run(cli: &Cli) -> Result<PathBuf> {
    let layout = match &cli.root {
        Some(root) => Layout::new(root),
        None => Layout::from_executable()
            .map_err(|e| RequestError::Directories(e.to_string()))?,
    };
    info!("Using layout rooted at {}", layout.root().display());

    let request = build_request(cli, &layout)?;
    let output = Builder::new(LiteFrontend::new()).compile(&request)?;

    let output_directory = layout.output_directory();
    std::fs::create_dir_all(&output_directory).with_context(|| {
        format!("Failed to create output directory {}", output_directory.display())
    })?;
    let path = output_directory.join(&cli.file);
    std::fs::write(&path, &output.bytes)
        .with_context(|| format!("Failed to write artifact {}", path.display()))?;
    info!(
        assembly = %output.report.assembly_name,
        bytes = output.bytes.len(),
        retained = output.report.retained_files.len(),
        dropped = output.report.dropped_files.len(),
        "Wrote {}",
        path.display()
    );

    if let Some(report_path) = &cli.report {
        let json = serde_json::to_string_pretty(&output.report)
            .context("Failed to serialize build report")?;
        std::fs::write(report_path, json)
            .with_context(|| format!("Failed to write report {}", report_path.display()))?;
        info!("Wrote build report to {}", report_path.display());
    }

    Ok(path)
}

/// Process exit code for a failed [`run`]
pub fn exit_code(error: &anyhow::Error) -> u8 {
    if let Some(request) = error.downcast_ref::<RequestError>() {
        request.exit_code()
    } else if error.downcast_ref::<BuildError>().is_some() {
        BUILD_FAILURE
    } else {
        OUTPUT_FAILURE
    }
}
