//! Building a [`CompilationRequest`] from command-line options
//!
//! Each step validates one option group and fails with its own
//! [`RequestError`] variant, so every failure maps to a distinct exit code.

use regex::Regex;
use slimgen_core::request::{load_embedded_resources, load_references};
use slimgen_core::{CompilationRequest, OutputKind, Platform, TargetVersion};
use thiserror::Error;
use tracing::debug;

use crate::cli::Cli;
use crate::layout::Layout;
use crate::source::{random_class_name, wrap_source};

/// Exit code for a build that failed to bind or emit
pub const BUILD_FAILURE: u8 = 10;

/// Exit code for an artifact or report that could not be written
pub const OUTPUT_FAILURE: u8 = 11;

const IDENTIFIER_PATTERN: &str = "^[a-zA-Z_][a-zA-Z0-9]*$";

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Unable to specify CompilationRequest directories: {0}")]
    Directories(String),

    #[error("Invalid DotNetVersion specified: {0}")]
    DotNetVersion(String),

    #[error("Invalid OutputKind specified: {0}")]
    OutputKind(String),

    #[error("Invalid Platform specified: {0}")]
    Platform(String),

    #[error("Invalid AssemblyName specified: {0}")]
    AssemblyName(String),

    #[error("Unable to set CompilationRequest references: {0}")]
    References(String),

    #[error("Unable to set CompilationRequest resources: {0}")]
    Resources(String),

    #[error("Unable to create source code for request: {0}")]
    Source(String),
}

impl RequestError {
    pub fn exit_code(&self) -> u8 {
        match self {
            RequestError::Directories(_) => 1,
            RequestError::DotNetVersion(_) => 2,
            RequestError::OutputKind(_) => 3,
            RequestError::Platform(_) => 4,
            RequestError::AssemblyName(_) => 6,
            RequestError::References(_) => 7,
            RequestError::Resources(_) => 8,
            RequestError::Source(_) => 9,
        }
    }
}

/// Assemble and validate the request for one invocation
pub fn build_request(cli: &Cli, layout: &Layout) -> Result<CompilationRequest, RequestError> {
    let mut request = CompilationRequest::default();

    set_directories(&mut request, layout)?;

    if let Some(version) = &cli.dotnet_framework {
        request.target_version = version
            .parse::<TargetVersion>()
            .map_err(RequestError::DotNetVersion)?;
    }

    request.output_kind = output_kind(cli.output_kind.as_deref(), &cli.file)?;

    if let Some(platform) = &cli.platform {
        request.platform = platform.parse::<Platform>().map_err(RequestError::Platform)?;
    }

    request.optimize = !cli.no_optimization;

    let identifier = identifier_regex()?;
    if let Some(name) = &cli.assembly_name {
        if !identifier.is_match(name) {
            return Err(RequestError::AssemblyName(name.clone()));
        }
        request.assembly_name = Some(name.clone());
    }

    request.references = load_references(&layout.references_config())
        .map_err(|e| RequestError::References(e.to_string()))?;
    request.embedded_resources = load_embedded_resources(&layout.resources_config())
        .map_err(|e| RequestError::Resources(e.to_string()))?;

    let class_name = match &cli.class_name {
        Some(name) if identifier.is_match(name) => name.clone(),
        Some(name) => return Err(RequestError::Source(format!("invalid class name {}", name))),
        None => random_class_name(),
    };
    let code = read_code(cli)?;
    request.source = wrap_source(&code, &class_name, request.output_kind);

    debug!(
        target_version = %request.target_version,
        output_kind = ?request.output_kind,
        platform = ?request.platform,
        optimize = request.optimize,
        references = request.references.len(),
        resources = request.embedded_resources.len(),
        "Built compilation request"
    );
    Ok(request)
}

fn set_directories(request: &mut CompilationRequest, layout: &Layout) -> Result<(), RequestError> {
    let directories = [
        layout.source_directory(),
        layout.references_directory(),
        layout.resources_directory(),
    ];
    if let Some(missing) = directories.iter().find(|d| !d.is_dir()) {
        return Err(RequestError::Directories(format!(
            "{} is not a directory",
            missing.display()
        )));
    }
    let [source, references, resources] = directories;
    request.source_directory = source;
    request.reference_directory = references;
    request.resource_directory = resources;
    Ok(())
}

/// Output kind from `--output-kind`, else inferred from the output file suffix
pub fn output_kind(option: Option<&str>, file: &str) -> Result<OutputKind, RequestError> {
    if let Some(value) = option {
        return match value.to_ascii_lowercase().as_str() {
            "console" | "consoleapp" | "consoleapplication" | "exe" => {
                Ok(OutputKind::ConsoleApplication)
            }
            "dll" | "dynamicallylinkedlibrary" => Ok(OutputKind::DynamicallyLinkedLibrary),
            _ => Err(RequestError::OutputKind(value.to_string())),
        };
    }

    let lower = file.to_ascii_lowercase();
    if lower.ends_with(".exe") {
        Ok(OutputKind::ConsoleApplication)
    } else {
        Ok(OutputKind::DynamicallyLinkedLibrary)
    }
}

fn identifier_regex() -> Result<Regex, RequestError> {
    Regex::new(IDENTIFIER_PATTERN)
        .map_err(|e| RequestError::Source(format!("invalid identifier pattern: {}", e)))
}

fn read_code(cli: &Cli) -> Result<String, RequestError> {
    if let Some(path) = &cli.source_file {
        return std::fs::read_to_string(path)
            .map_err(|e| RequestError::Source(format!("{}: {}", path.display(), e)));
    }
    let code = cli.code.join(" ");
    if code.trim().is_empty() {
        return Err(RequestError::Source("no source code given".to_string()));
    }
    Ok(code)
}
