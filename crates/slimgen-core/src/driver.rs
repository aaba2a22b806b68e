//! Two-pass compilation driver
//!
//! ```text
//! Initial ──(optimize)──> Pruned ──> Emit
//!    └───────────────────────────────> Emit
//! ```
//!
//! The initial compilation binds the full corpus plus the entry unit. With
//! optimization enabled it feeds reachability, pruning and import trimming,
//! and a second, independent compilation is bound from the reduced trees.
//! Symbols never cross from one compilation to the other except as
//! [`TypeSymbol`](crate::symbol::TypeSymbol) keys.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::corpus::{Corpus, EntryUnit, ENTRY_NAME};
use crate::error::BuildError;
use crate::fingerprint::{FingerprintBuilder, SourceFingerprint};
use crate::frontend::{CompilationOptions, Frontend, MetadataReference};
use crate::imports::trim_imports;
use crate::loader::CorpusLoader;
use crate::prune::prune;
use crate::reachability::reachable;
use crate::request::CompilationRequest;

/// What a build produced besides the artifact bytes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub assembly_name: String,
    pub optimized: bool,
    pub retained_files: Vec<PathBuf>,
    pub dropped_files: Vec<PathBuf>,
    pub reachable_types: Vec<String>,
    pub removed_imports: Vec<String>,
    /// For each retained file, the chain of types that pulled it in
    pub explanations: BTreeMap<String, Vec<String>>,
    pub input_fingerprint: Option<SourceFingerprint>,
}

#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub bytes: Vec<u8>,
    pub report: BuildReport,
}

/// Drives one build through a [`Frontend`]
pub struct Builder<F: Frontend> {
    frontend: F,
    loader: CorpusLoader,
}

impl<F: Frontend> Builder<F> {
    pub fn new(frontend: F) -> Self {
        Self {
            frontend,
            loader: CorpusLoader::default(),
        }
    }

    pub fn with_loader(mut self, loader: CorpusLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    /// Load the corpus from `request.source_directory` and build
    pub fn compile(&self, request: &CompilationRequest) -> Result<BuildOutput, BuildError> {
        let files = self.loader.list_source_files(&request.source_directory)?;
        self.compile_sources(request, files)
    }

    /// Build from an already loaded corpus
    pub fn compile_sources(
        &self,
        request: &CompilationRequest,
        files: Vec<(PathBuf, String)>,
    ) -> Result<BuildOutput, BuildError> {
        let mut corpus = Corpus::parse(&self.frontend, files);
        let mut entry = EntryUnit {
            tree: self.frontend.parse(ENTRY_NAME, &request.source),
        };

        let options = CompilationOptions {
            assembly_name: request
                .assembly_name
                .clone()
                .unwrap_or_else(random_assembly_name),
            output_kind: request.output_kind,
            platform: request.platform,
            target: request.target_version,
        };
        let references = request.metadata_references();
        info!(
            assembly = %options.assembly_name,
            corpus = corpus.len(),
            references = references.len(),
            optimize = request.optimize,
            "Compiling source"
        );

        let mut report = BuildReport {
            assembly_name: options.assembly_name.clone(),
            optimized: request.optimize,
            ..Default::default()
        };

        // Initial: full corpus + entry
        let mut compilation = self.bind(&corpus, &entry, &references, &options)?;

        if request.optimize {
            let entry_id = corpus.entry_tree_id();
            let reach = reachable(&self.frontend, &compilation, entry_id, &mut corpus)
                .map_err(BuildError::frontend)?;
            report.reachable_types = reach
                .visited
                .iter()
                .map(|ty| ty.qualified_name().to_string())
                .collect();

            let pruned = prune(&self.frontend, &compilation, &corpus, &reach.visited)
                .map_err(BuildError::frontend)?;
            for index in &pruned.retained {
                let path = corpus.units()[*index].path().to_path_buf();
                if let Some(chain) = reach.graph.explain(*index) {
                    report.explanations.insert(
                        path.display().to_string(),
                        chain.iter().map(|n| n.to_string()).collect(),
                    );
                }
                report.retained_files.push(path);
            }
            report.dropped_files = pruned
                .dropped
                .iter()
                .map(|i| corpus.units()[*i].path().to_path_buf())
                .collect();

            let trimmed = trim_imports(&self.frontend, &compilation, entry_id, &entry)
                .map_err(BuildError::frontend)?;
            report.removed_imports = trimmed.removed;

            info!(
                retained = report.retained_files.len(),
                dropped = report.dropped_files.len(),
                types = report.reachable_types.len(),
                "Compiling optimized source"
            );
            debug!("{}", self.frontend.tree_text(&trimmed.entry.tree));

            // Pruned: reduced corpus + trimmed entry, bound from scratch
            corpus = pruned.corpus;
            entry = trimmed.entry;
            compilation = self.bind(&corpus, &entry, &references, &options)?;
        } else {
            report.retained_files = corpus.units().iter().map(|u| u.path().to_path_buf()).collect();
        }

        report.input_fingerprint = Some(self.fingerprint(&corpus, &entry));

        // Emit
        let resources = request.manifest_resources();
        let bytes = self
            .frontend
            .emit(&compilation, &resources)
            .map_err(|diagnostics| {
                warn!(count = diagnostics.len(), "Emission failed");
                BuildError::Emission(diagnostics)
            })?;
        info!(bytes = bytes.len(), resources = resources.len(), "Emitted artifact");

        Ok(BuildOutput { bytes, report })
    }

    fn bind(
        &self,
        corpus: &Corpus<F::Tree>,
        entry: &EntryUnit<F::Tree>,
        references: &[MetadataReference],
        options: &CompilationOptions,
    ) -> Result<F::Compilation, BuildError> {
        self.frontend
            .bind(corpus.compilation_trees(entry), references, options)
            .map_err(BuildError::FrontendBinding)
    }

    fn fingerprint(&self, corpus: &Corpus<F::Tree>, entry: &EntryUnit<F::Tree>) -> SourceFingerprint {
        let mut builder = FingerprintBuilder::new();
        for unit in corpus.units() {
            builder.add_tree(
                &unit.path().display().to_string(),
                self.frontend.tree_text(&unit.tree),
            );
        }
        builder.add_tree(ENTRY_NAME, self.frontend.tree_text(&entry.tree));
        builder.build()
    }
}

/// A random assembly name shared by both passes of a build
pub fn random_assembly_name() -> String {
    let id = uuid::Uuid::now_v7().simple().to_string();
    format!("a{}", &id[id.len() - 12..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_assembly_name_is_identifier() {
        let name = random_assembly_name();
        assert_eq!(name.len(), 13);
        assert!(name.starts_with('a'));
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_report_json_shape() {
        let mut report = BuildReport {
            assembly_name: "Tasking".to_string(),
            optimized: true,
            retained_files: vec![PathBuf::from("Source/Shell.cs")],
            reachable_types: vec!["Lib.Shell".to_string()],
            ..Default::default()
        };
        report.explanations.insert(
            "Source/Shell.cs".to_string(),
            vec!["<entry>".to_string(), "Lib.Shell".to_string(), "unit#0".to_string()],
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["assembly_name"], "Tasking");
        assert_eq!(json["retained_files"][0], "Source/Shell.cs");
        assert_eq!(json["explanations"]["Source/Shell.cs"][1], "Lib.Shell");
        assert!(json["input_fingerprint"].is_null());

        let back: BuildReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
