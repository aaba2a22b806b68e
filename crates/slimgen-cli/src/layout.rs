//! On-disk layout of a slimgen root
//!
//! ```text
//! <root>/
//!   Source/                 library corpus (*.cs, recursive)
//!   References/
//!     references.yml
//!     net35/  net40/        reference files per framework version
//!   Resources/
//!     resources.yml
//!   Output/                 artifacts are written here
//! ```

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout rooted next to the running executable
    ///
    /// When the executable lives under a `bin` directory, the root is that
    /// directory's parent.
    pub fn from_executable() -> std::io::Result<Self> {
        let exe = std::env::current_exe()?;
        let dir = exe.parent().unwrap_or(Path::new("."));
        let root = dir
            .ancestors()
            .find(|a| a.file_name().is_some_and(|n| n == "bin"))
            .and_then(Path::parent)
            .unwrap_or(dir);
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_directory(&self) -> PathBuf {
        self.root.join("Source")
    }

    pub fn references_directory(&self) -> PathBuf {
        self.root.join("References")
    }

    pub fn references_config(&self) -> PathBuf {
        self.references_directory().join("references.yml")
    }

    pub fn resources_directory(&self) -> PathBuf {
        self.root.join("Resources")
    }

    pub fn resources_config(&self) -> PathBuf {
        self.resources_directory().join("resources.yml")
    }

    pub fn output_directory(&self) -> PathBuf {
        self.root.join("Output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = Layout::new("/opt/slimgen");
        assert_eq!(layout.source_directory(), PathBuf::from("/opt/slimgen/Source"));
        assert_eq!(
            layout.references_config(),
            PathBuf::from("/opt/slimgen/References/references.yml")
        );
        assert_eq!(
            layout.resources_config(),
            PathBuf::from("/opt/slimgen/Resources/resources.yml")
        );
        assert_eq!(layout.output_directory(), PathBuf::from("/opt/slimgen/Output"));
    }
}
