//! Build requests and the reference/resource manifests they are assembled from

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::frontend::{ManifestResource, MetadataReference};

/// Framework version a build targets; selects the reference sub-folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetVersion {
    #[default]
    Net35,
    Net40,
}

impl TargetVersion {
    /// Folder under the reference directory holding this version's references
    pub fn folder(&self) -> &'static str {
        match self {
            TargetVersion::Net35 => "net35",
            TargetVersion::Net40 => "net40",
        }
    }
}

impl FromStr for TargetVersion {
    type Err = String;

    /// Accepts anything containing `35` or `40` (`net35`, `Net40`, `40`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains("35") {
            Ok(TargetVersion::Net35)
        } else if s.contains("40") {
            Ok(TargetVersion::Net40)
        } else {
            Err(format!("Unknown target version: {}", s))
        }
    }
}

impl fmt::Display for TargetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.folder())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputKind {
    #[default]
    DynamicallyLinkedLibrary,
    ConsoleApplication,
}

impl OutputKind {
    pub fn requires_entry_point(&self) -> bool {
        matches!(self, OutputKind::ConsoleApplication)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Platform {
    #[default]
    AnyCpu,
    X86,
    X64,
}

impl Platform {
    /// Whether a resource built for `other` can ship in an artifact for `self`
    pub fn accepts(&self, other: Platform) -> bool {
        *self == Platform::AnyCpu || other == Platform::AnyCpu || *self == other
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anycpu" => Ok(Platform::AnyCpu),
            "x86" => Ok(Platform::X86),
            "x64" => Ok(Platform::X64),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

/// An entry of `references.yml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reference {
    pub file: String,
    #[serde(default)]
    pub framework: TargetVersion,
    #[serde(default)]
    pub enabled: bool,
}

/// An entry of `resources.yml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmbeddedResource {
    pub name: String,
    pub file: String,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub enabled: bool,
}

/// Everything one build needs; read-only for the duration of the build
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilationRequest {
    /// Entry snippet, already wrapped into a type by the caller
    pub source: String,
    pub source_directory: PathBuf,
    pub resource_directory: PathBuf,
    pub reference_directory: PathBuf,

    pub target_version: TargetVersion,
    pub output_kind: OutputKind,
    pub platform: Platform,
    #[serde(default = "default_optimize")]
    pub optimize: bool,

    pub assembly_name: Option<String>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub embedded_resources: Vec<EmbeddedResource>,
}

fn default_optimize() -> bool {
    true
}

impl CompilationRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            optimize: true,
            ..Default::default()
        }
    }

    /// Enabled references for the target version, resolved to file paths
    pub fn metadata_references(&self) -> Vec<MetadataReference> {
        let folder = self.reference_directory.join(self.target_version.folder());
        self.references
            .iter()
            .filter(|r| r.framework == self.target_version)
            .filter(|r| r.enabled)
            .map(|r| MetadataReference {
                path: folder.join(&r.file),
            })
            .collect()
    }

    /// Enabled resources compatible with the requested platform
    pub fn manifest_resources(&self) -> Vec<ManifestResource> {
        self.embedded_resources
            .iter()
            .filter(|r| self.platform.accepts(r.platform))
            .filter(|r| r.enabled)
            .map(|r| ManifestResource {
                name: r.name.clone(),
                path: self.resource_directory.join(&r.file),
                public: true,
            })
            .collect()
    }
}

/// Load a `references.yml` manifest
pub fn load_references(path: &Path) -> Result<Vec<Reference>, BuildError> {
    load_yaml_list(path)
}

/// Load a `resources.yml` manifest
pub fn load_embedded_resources(path: &Path) -> Result<Vec<EmbeddedResource>, BuildError> {
    load_yaml_list(path)
}

fn load_yaml_list<T>(path: &Path) -> Result<Vec<T>, BuildError>
where
    T: for<'de> Deserialize<'de>,
{
    let content = std::fs::read_to_string(path).map_err(|e| {
        BuildError::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    // An empty manifest deserializes to unit, not an empty list
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_yaml::from_str(&content)?)
}
