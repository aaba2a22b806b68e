//! Corpus discovery on disk

use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::BuildError;

/// Enumerates library sources below a directory
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    extension: String,
}

impl Default for CorpusLoader {
    fn default() -> Self {
        Self::new("cs")
    }
}

impl CorpusLoader {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// All matching files under `directory`, recursively, sorted by path
    pub fn list_source_files(&self, directory: &Path) -> Result<Vec<(PathBuf, String)>, BuildError> {
        if !directory.is_dir() {
            return Err(BuildError::Corpus(format!(
                "Source directory {} does not exist",
                directory.display()
            )));
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(directory).follow_links(true) {
            let entry = entry.map_err(|e| BuildError::Corpus(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| ext.eq_ignore_ascii_case(&self.extension));
            if matches {
                paths.push(entry.into_path());
            }
        }
        paths.sort();

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            trace!("Reading corpus file {}", path.display());
            let text = std::fs::read_to_string(&path)?;
            files.push((path, text));
        }

        debug!(
            directory = %directory.display(),
            count = files.len(),
            "Loaded corpus sources"
        );
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_nested_sources_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Execution")).unwrap();
        std::fs::write(dir.path().join("Execution/Shell.cs"), "class Shell {}").unwrap();
        std::fs::write(dir.path().join("Assembly.cs"), "class Assembly {}").unwrap();
        std::fs::write(dir.path().join("README.md"), "# docs").unwrap();

        let files = CorpusLoader::default().list_source_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|(p, _)| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![PathBuf::from("Assembly.cs"), PathBuf::from("Execution/Shell.cs")]
        );
        assert_eq!(files[1].1, "class Shell {}");
    }

    #[test]
    fn test_missing_directory() {
        let result = CorpusLoader::default().list_source_files(Path::new("/nonexistent/slimgen"));
        assert!(matches!(result, Err(BuildError::Corpus(_))));
    }
}
