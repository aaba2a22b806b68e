//! Emission: final semantic checks and the artifact container
//!
//! ## Layout
//!
//! ```text
//! +----------+----------------+------------------+-----------------+
//! | SLIMGEN\0| manifest len   | manifest (JSON)  | payload         |
//! | 8 bytes  | u32 LE         | len bytes        | sources + resources
//! +----------+----------------+------------------+-----------------+
//! ```
//!
//! Offsets in the manifest are relative to the start of the payload.

use std::fs;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use slimgen_core::frontend::{Diagnostic, Diagnostics, ManifestResource, NodeId, TreeId};
use slimgen_core::request::{OutputKind, Platform, TargetVersion};
use slimgen_core::symbol::Symbol;
use tracing::{debug, warn};

use crate::binder::{syntax_diagnostics, LiteCompilation};
use crate::error::{FrontendError, Result};
use crate::syntax::SyntaxKind;

pub const MAGIC: &[u8; 8] = b"SLIMGEN\0";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadEntry {
    pub name: String,
    pub offset: u64,
    pub length: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub name: String,
    pub public: bool,
    pub offset: u64,
    pub length: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub format_version: u32,
    pub assembly_name: String,
    pub output_kind: OutputKind,
    pub platform: Platform,
    pub target: TargetVersion,
    /// Type declaring the static `Main`, when there is one
    pub entry_point: Option<String>,
    /// Every source-declared type, in qualified-name order
    pub types: Vec<String>,
    pub sources: Vec<PayloadEntry>,
    pub resources: Vec<ResourceEntry>,
}

/// A decoded (or about to be encoded) build artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub manifest: ArtifactManifest,
    pub payload: Vec<u8>,
}

impl Artifact {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let manifest = serde_json::to_vec(&self.manifest)?;
        let length = u32::try_from(manifest.len())
            .map_err(|_| FrontendError::Artifact("manifest exceeds 4 GiB".to_string()))?;

        let mut bytes = Vec::with_capacity(MAGIC.len() + 4 + manifest.len() + self.payload.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&length.to_le_bytes());
        bytes.extend_from_slice(&manifest);
        bytes.extend_from_slice(&self.payload);
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let rest = bytes
            .strip_prefix(MAGIC.as_slice())
            .ok_or_else(|| FrontendError::Artifact("missing SLIMGEN header".to_string()))?;
        if rest.len() < 4 {
            return Err(FrontendError::Artifact("truncated manifest length".to_string()));
        }
        let (length, rest) = rest.split_at(4);
        let length = u32::from_le_bytes([length[0], length[1], length[2], length[3]]) as usize;
        if rest.len() < length {
            return Err(FrontendError::Artifact(format!(
                "manifest claims {} bytes but only {} remain",
                length,
                rest.len()
            )));
        }
        let (manifest, payload) = rest.split_at(length);
        let manifest: ArtifactManifest = serde_json::from_slice(manifest)?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(FrontendError::Artifact(format!(
                "unsupported format version {}",
                manifest.format_version
            )));
        }

        let artifact = Self {
            manifest,
            payload: payload.to_vec(),
        };
        for resource in &artifact.manifest.resources {
            let data = artifact
                .slice(resource.offset, resource.length)
                .ok_or_else(|| FrontendError::Artifact(format!("resource '{}' out of bounds", resource.name)))?;
            if sha256_hex(data) != resource.sha256 {
                return Err(FrontendError::Artifact(format!(
                    "resource '{}' checksum mismatch",
                    resource.name
                )));
            }
        }
        Ok(artifact)
    }

    /// Source text of a compiled tree
    pub fn source(&self, name: &str) -> Option<&str> {
        let entry = self.manifest.sources.iter().find(|s| s.name == name)?;
        std::str::from_utf8(self.slice(entry.offset, entry.length)?).ok()
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.manifest.sources.iter().map(|s| s.name.as_str())
    }

    pub fn resource(&self, name: &str) -> Option<&[u8]> {
        let entry = self.manifest.resources.iter().find(|r| r.name == name)?;
        self.slice(entry.offset, entry.length)
    }

    fn slice(&self, offset: u64, length: u64) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(usize::try_from(length).ok()?)?;
        self.payload.get(start..end)
    }
}

fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Check the compilation and produce the encoded artifact
pub fn emit(
    compilation: &LiteCompilation,
    resources: &[ManifestResource],
) -> std::result::Result<Vec<u8>, Diagnostics> {
    let mut diagnostics = check(compilation);

    let mut payload = Vec::new();
    let mut sources = Vec::new();
    for tree in compilation.trees() {
        sources.push(PayloadEntry {
            name: tree.name().to_string(),
            offset: payload.len() as u64,
            length: tree.text().len() as u64,
        });
        payload.extend_from_slice(tree.text().as_bytes());
    }

    let mut entries = Vec::new();
    for resource in resources {
        match fs::read(&resource.path) {
            Ok(data) => {
                entries.push(ResourceEntry {
                    name: resource.name.clone(),
                    public: resource.public,
                    offset: payload.len() as u64,
                    length: data.len() as u64,
                    sha256: sha256_hex(&data),
                });
                payload.extend_from_slice(&data);
            }
            Err(e) => diagnostics.push(Diagnostic::error(
                "SG1566",
                format!("Error reading resource '{}' -- '{}'", resource.path.display(), e),
            )),
        }
    }

    if diagnostics.has_errors() {
        warn!(count = diagnostics.len(), "Compilation has errors");
        return Err(diagnostics);
    }

    let options = compilation.options();
    let entry_point = compilation
        .declared_types()
        .find(|d| d.declarations.iter().any(|site| site.has_static_main))
        .map(|d| d.symbol.qualified_name().to_string());
    let artifact = Artifact {
        manifest: ArtifactManifest {
            format_version: FORMAT_VERSION,
            assembly_name: options.assembly_name.clone(),
            output_kind: options.output_kind,
            platform: options.platform,
            target: options.target,
            entry_point,
            types: compilation
                .declared_types()
                .map(|d| d.symbol.qualified_name().to_string())
                .collect(),
            sources,
            resources: entries,
        },
        payload,
    };
    debug!(
        sources = artifact.manifest.sources.len(),
        resources = artifact.manifest.resources.len(),
        "Encoding artifact"
    );

    artifact.encode().map_err(|e| {
        Diagnostics::from(vec![Diagnostic::error(
            "SG7038",
            format!("Failed to emit module '{}': {}", options.assembly_name, e),
        )])
    })
}

/// Semantic errors that binding defers to emission
fn check(compilation: &LiteCompilation) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    for tree in compilation.trees() {
        syntax_diagnostics(tree, &mut diagnostics);
    }

    for (t, tree) in compilation.trees().iter().enumerate() {
        for (n, node) in tree.nodes().iter().enumerate() {
            let SyntaxKind::Name(reference) = &node.kind else {
                continue;
            };
            if !reference.context.requires_type() {
                continue;
            }
            let resolved = compilation
                .resolve(TreeId(t), NodeId(n))
                .ok()
                .flatten();
            if !matches!(resolved, Some(Symbol::Type(_) | Symbol::Local(_))) {
                diagnostics.push(
                    Diagnostic::error(
                        "SG0246",
                        format!(
                            "The type or namespace name '{}' could not be found (are you missing a using directive or an assembly reference?)",
                            reference.dotted()
                        ),
                    )
                    .at(tree.location(node.span.start)),
                );
            }
        }
    }

    for declared in compilation.declared_types() {
        let sites = &declared.declarations;
        if sites.len() < 2 || sites.iter().all(|site| site.partial) {
            continue;
        }
        let namespace = match declared.symbol.containing_namespace() {
            "" => "<global namespace>",
            namespace => namespace,
        };
        let duplicate = sites[1].location;
        let location = compilation
            .tree(duplicate.tree)
            .ok()
            .and_then(|tree| Some(tree.location(tree.node(duplicate.node)?.span.start)));
        let mut diagnostic = Diagnostic::error(
            "SG0101",
            format!(
                "The namespace '{}' already contains a definition for '{}'",
                namespace,
                declared.symbol.name()
            ),
        );
        if let Some(location) = location {
            diagnostic = diagnostic.at(location);
        }
        diagnostics.push(diagnostic);
    }

    if compilation.options().output_kind.requires_entry_point()
        && !compilation
            .declared_types()
            .any(|d| d.declarations.iter().any(|site| site.has_static_main))
    {
        diagnostics.push(Diagnostic::error(
            "SG5001",
            "Program does not contain a static 'Main' method suitable for an entry point",
        ));
    }

    diagnostics
}
