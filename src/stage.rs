//! Incremental staging of resolved copies into the package directory.

use crate::error::Error;
use crate::filter::FilterSet;
use crate::mapping::CopyEntry;
use crate::options::Options;
use crate::result::Result;
use crate::utils;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// What a staging pass did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub copied: usize,
    pub skipped: usize,
    /// Orphan files removed from a previous run
    pub removed: Vec<PathBuf>,
    /// Empty directories removed after cleanup
    pub pruned: Vec<PathBuf>,
}

/// Copies resolved entries into a staging tree and keeps that tree in sync
/// with the mapping across runs.
///
/// `package_dir` is the staging root that gets archived; files are placed
/// under `content_dir`, which lives inside it.
pub struct Stager<'a> {
    options: &'a Options,
    filters: &'a FilterSet,
    package_dir: &'a Path,
    content_dir: &'a Path,
}

impl<'a> Stager<'a> {
    pub fn new(
        options: &'a Options,
        filters: &'a FilterSet,
        package_dir: &'a Path,
        content_dir: &'a Path,
    ) -> Self {
        Self {
            options,
            filters,
            package_dir,
            content_dir,
        }
    }

    pub fn stage(&self, entries: &[CopyEntry]) -> Result<StageReport> {
        let mut report = StageReport::default();

        let mut orphans = if self.options.clean() {
            self.existing_files()?
        } else {
            BTreeSet::new()
        };

        let total = entries.len();
        for (index, entry) in entries.iter().enumerate() {
            let destination = self.content_dir.join(&entry.destination);
            orphans.remove(&destination);

            if !self.options.invalidate_all && is_up_to_date(&entry.source, &destination)? {
                log::debug!("[{}/{}] Up-to-date: {}", index + 1, total, entry.destination.display());
                report.skipped += 1;
                continue;
            }

            log::info!("[{}/{}] Installing: {}", index + 1, total, entry.destination.display());
            self.clear_path(&destination, &mut orphans)?;
            self.install(entry, &destination)?;
            report.copied += 1;
        }

        for orphan in orphans {
            log::info!("Remove excluded: {}", self.display(&orphan));
            utils::remove_file_if_exists(&orphan)?;
            report.removed.push(orphan);
        }

        if !self.options.allow_empty_dir {
            report.pruned = self.prune_empty_dirs()?;
        }

        Ok(report)
    }

    /// Make room for `destination`: a staged file where a directory is now
    /// needed, or a staged directory where a file is now needed, is removed.
    fn clear_path(&self, destination: &Path, orphans: &mut BTreeSet<PathBuf>) -> Result<()> {
        let blocking = destination
            .ancestors()
            .skip(1)
            .take_while(|dir| dir.starts_with(self.package_dir) && *dir != self.package_dir)
            .find(|dir| fs::symlink_metadata(dir).is_ok_and(|meta| !meta.is_dir()));

        if let Some(file) = blocking {
            log::info!("Remove replaced: {}", self.display(file));
            fs::remove_file(file)?;
            orphans.remove(file);
        }

        if fs::symlink_metadata(destination).is_ok_and(|meta| meta.is_dir()) {
            log::info!("Remove replaced: {}", self.display(destination));
            fs::remove_dir_all(destination)?;
            orphans.retain(|path| !path.starts_with(destination));
        }

        Ok(())
    }

    /// Write the staged copy next to its destination and rename it into
    /// place, so a failed copy never leaves a partial file behind.
    fn install(&self, entry: &CopyEntry, destination: &Path) -> Result<()> {
        let parent = destination
            .parent()
            .ok_or_else(|| Error::custom(format!("invalid destination: {}", destination.display())))?;
        fs::create_dir_all(parent)?;

        let mut staged = NamedTempFile::new_in(parent)?;
        match self.filters.get(&entry.key) {
            Some(filter) => {
                let mut source = BufReader::new(File::open(&entry.source)?);
                let mut output = BufWriter::new(staged.as_file_mut());
                filter.transform(&mut source, &mut output)?;
                output.flush()?;
            }
            None => {
                let mut source = File::open(&entry.source)?;
                io::copy(&mut source, staged.as_file_mut())?;
            }
        }

        staged
            .as_file()
            .set_permissions(fs::metadata(&entry.source)?.permissions())?;
        staged.persist(destination).map_err(|e| e.error)?;

        Ok(())
    }

    /// Every file currently under the package directory
    fn existing_files(&self) -> Result<BTreeSet<PathBuf>> {
        let mut files = BTreeSet::new();
        if !self.package_dir.exists() {
            return Ok(files);
        }
        for entry in WalkDir::new(self.package_dir) {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                files.insert(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Remove empty directories bottom-up, keeping the package directory itself
    fn prune_empty_dirs(&self) -> Result<Vec<PathBuf>> {
        let mut pruned = Vec::new();
        if !self.package_dir.exists() {
            return Ok(pruned);
        }
        for entry in WalkDir::new(self.package_dir).min_depth(1).contents_first(true) {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if fs::read_dir(entry.path())?.next().is_none() {
                log::info!("Remove empty: {}", self.display(entry.path()));
                fs::remove_dir(entry.path())?;
                pruned.push(entry.into_path());
            }
        }
        Ok(pruned)
    }

    fn display(&self, path: &Path) -> String {
        path.strip_prefix(self.package_dir)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// A staged copy is up to date when it is a regular file strictly newer than
/// its source. A missing staged copy, or a directory in its place, is out of
/// date.
fn is_up_to_date(source: &Path, destination: &Path) -> Result<bool> {
    let staged = match fs::metadata(destination) {
        Ok(meta) if meta.is_file() => meta.modified()?,
        Ok(_) => return Ok(false),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };
    Ok(modified(source)? < staged)
}

fn modified(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}
