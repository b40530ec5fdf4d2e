//! Expansion of source -> destination mappings into concrete file copies.
//!
//! Mapping rules:
//!
//! - `["path"]` or `["path", "/"]`: copy into the package root
//! - `["file", "new_name"]`: copy the file as `new_name`
//! - `["file", "dir/"]`: copy the file under `dir`
//! - `["dir", "target"]` / `["dir", "target/"]`: copy the directory contents into `target`
//! - `["pattern*", "dir/"]`: copy every match under `dir`
//! - `["root/**/*.ext", "dir/"]`: copy every match under `dir`, keeping the path below `root/`
//!
//! Wildcards never match hidden entries; spell the leading dot (`.*`) to
//! select them.

use crate::context::Context;
use crate::error::Error;
use crate::result::Result;
use glob::MatchOptions;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const RECURSIVE_MARKER: &str = "**";

/// One source pattern and where it lands inside the package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub source: String,
    pub destination: String,
}

impl MappingEntry {
    pub fn new<S: Into<String>, D: Into<String>>(source: S, destination: D) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Copy into the package root
    pub fn to_root<S: Into<String>>(source: S) -> Self {
        Self::new(source, "/")
    }

    fn has_wildcard(&self) -> bool {
        self.source.contains(['*', '?'])
    }

    fn targets_directory(&self) -> bool {
        self.destination.is_empty()
            || self.destination.ends_with('/')
            || self.destination.ends_with(std::path::MAIN_SEPARATOR)
    }
}

/// A single file copy produced by resolving a [`MappingEntry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyEntry {
    /// File to copy
    pub source: PathBuf,
    /// Destination relative to the package content root
    pub destination: PathBuf,
    /// The mapping source this entry came from, used to look up copy filters
    pub key: String,
}

/// Resolve `mapping` into a flat, ordered list of file copies.
///
/// Relative sources are resolved against the context base directory.
/// Glob matches and directory contents are sorted so the result does not
/// depend on filesystem enumeration order.
pub fn resolve(ctx: &Context, mapping: &[MappingEntry]) -> Result<Vec<CopyEntry>> {
    let mut entries = Vec::new();

    for entry in mapping {
        let destination = relative_destination(&entry.destination)?;

        if entry.has_wildcard() {
            if !entry.targets_directory() {
                return Err(Error::GlobDestination(entry.source.clone()));
            }
            resolve_glob(ctx, entry, &destination, &mut entries)?;
            continue;
        }

        let source = ctx.resolve(&entry.source);
        if source.is_dir() {
            unroll_dir(&source, &destination, &entry.source, &mut entries)?;
        } else if source.is_file() {
            let destination = if entry.targets_directory() {
                destination.join(file_name(&source)?)
            } else {
                destination
            };
            entries.push(CopyEntry {
                source,
                destination,
                key: entry.source.clone(),
            });
        } else {
            return Err(Error::SourceNotFound(source));
        }
    }

    Ok(entries)
}

fn resolve_glob(
    ctx: &Context,
    entry: &MappingEntry,
    destination: &Path,
    entries: &mut Vec<CopyEntry>,
) -> Result<()> {
    let pattern = absolute_pattern(ctx, &entry.source);
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };
    let mut matches = glob::glob_with(&pattern, options)?.collect::<std::result::Result<Vec<_>, _>>()?;
    matches.sort();

    if matches.is_empty() {
        log::warn!("No files matched '{}'", entry.source);
    }

    match entry.source.find(RECURSIVE_MARKER) {
        Some(index) => {
            let prefix = ctx.resolve(&entry.source[..index]);
            for path in matches.into_iter().filter(|p| p.is_file()) {
                let relative = path.strip_prefix(&prefix).map_err(|_| {
                    Error::custom(format!(
                        "{} is not below {}",
                        path.display(),
                        prefix.display()
                    ))
                })?;
                entries.push(CopyEntry {
                    destination: destination.join(relative),
                    source: path,
                    key: entry.source.clone(),
                });
            }
        }
        None => {
            for path in matches {
                let target = destination.join(file_name(&path)?);
                if path.is_dir() {
                    unroll_dir(&path, &target, &entry.source, entries)?;
                } else {
                    entries.push(CopyEntry {
                        source: path,
                        destination: target,
                        key: entry.source.clone(),
                    });
                }
            }
        }
    }

    Ok(())
}

/// Add one entry per file below `dir`, keeping its relative path under `destination`
fn unroll_dir(dir: &Path, destination: &Path, key: &str, entries: &mut Vec<CopyEntry>) -> Result<()> {
    for item in WalkDir::new(dir).sort_by_file_name() {
        let item = item?;
        if item.file_type().is_dir() {
            continue;
        }
        let relative = item
            .path()
            .strip_prefix(dir)
            .map_err(|_| Error::custom(format!("{} is not below {}", item.path().display(), dir.display())))?;
        entries.push(CopyEntry {
            source: item.path().to_path_buf(),
            destination: destination.join(relative),
            key: key.to_string(),
        });
    }
    Ok(())
}

/// Build a glob pattern rooted at the base directory; the base directory
/// itself is escaped so only the mapping source is interpreted
fn absolute_pattern(ctx: &Context, source: &str) -> String {
    if Path::new(source).is_absolute() {
        return source.to_string();
    }
    let base = glob::Pattern::escape(&ctx.base_dir.to_string_lossy());
    let separator = std::path::MAIN_SEPARATOR;
    if base.ends_with(separator) {
        format!("{base}{source}")
    } else {
        format!("{base}{separator}{source}")
    }
}

/// Turn a destination pattern into a path relative to the package root,
/// rejecting anything that would land outside of it
fn relative_destination(destination: &str) -> Result<PathBuf> {
    let trimmed = destination.trim_start_matches(['/', '\\']);
    let mut path = PathBuf::new();

    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::DestinationOutsideStaging(destination.to_string()));
            }
        }
    }

    Ok(path)
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name()
        .ok_or_else(|| Error::custom(format!("{} has no file name", path.display())))
}
