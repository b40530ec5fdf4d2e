//! Archive writers for the staged package directory.

mod tarball;
mod zipfile;

use crate::result::Result;
use crate::utils;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarGz => "tar.gz",
        }
    }
}

/// Archive the contents of `source_dir` into `output_path`, replacing any
/// existing file. Paths inside the archive are relative to `source_dir`.
pub fn create(format: ArchiveFormat, source_dir: &Path, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        utils::ensure_dir(parent)?;
    }

    match format {
        ArchiveFormat::Zip => zipfile::create_zip_file(source_dir, output_path),
        ArchiveFormat::TarGz => tarball::create_tar_gz_file(source_dir, output_path),
    }
}
