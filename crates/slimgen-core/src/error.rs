use thiserror::Error;

use crate::frontend::Diagnostics;

#[derive(Error, Debug)]
pub enum BuildError {
    /// The frontend could not produce a semantic model for a tree set
    #[error("Binding failed: \n{0}")]
    FrontendBinding(Diagnostics),

    /// Binding succeeded but emission reported diagnostics
    #[error("CompilationErrors: \n{0}")]
    Emission(Diagnostics),

    /// A frontend query faulted during analysis
    #[error("Frontend error: {0}")]
    Frontend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl BuildError {
    pub(crate) fn frontend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BuildError::Frontend(Box::new(error))
    }
}
