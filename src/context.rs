use std::path::{Path, PathBuf};

/// Context passed throughout a packaging run
#[derive(Debug, Clone)]
pub struct Context {
    /// Enable verbose output (stream build command output)
    pub verbose: bool,

    /// Path to the Cargo.toml manifest
    pub manifest_path: PathBuf,

    /// Base directory (directory containing Cargo.toml); relative
    /// mapping sources and output folders resolve against it
    pub base_dir: PathBuf,
}

impl Context {
    pub fn new(manifest_path: PathBuf, verbose: bool) -> Self {
        let base_dir = manifest_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            verbose,
            manifest_path,
            base_dir,
        }
    }

    /// Resolve `path` against the base directory unless it is absolute
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.base_dir.join(path)
    }
}
