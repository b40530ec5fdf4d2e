use crate::error::Error;
use crate::result::Result;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "Cargo.toml";

/// Copy a file or the contents of a directory, merging into an existing
/// destination tree
pub fn copy_recursively(source: &Path, destination: &Path) -> Result<()> {
    if source.is_dir() {
        fs::create_dir_all(destination)?;

        for entry in fs::read_dir(source)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let src_path = entry.path();
            let dst_path = destination.join(entry.file_name());

            if file_type.is_dir() {
                copy_recursively(&src_path, &dst_path)?;
            } else {
                fs::copy(&src_path, &dst_path)?;
            }
        }
    } else {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, destination)?;
    }

    Ok(())
}

/// Find Cargo.toml at `path` (the file itself or its directory), or in the
/// current directory when no path is given
pub fn find_manifest(path: Option<&Path>) -> Result<PathBuf> {
    let base_path = match path {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()?,
    };

    let manifest_path = if base_path.is_file() {
        base_path
    } else {
        base_path.join(MANIFEST_FILE)
    };

    if !manifest_path.is_file() {
        return Err(Error::ManifestNotFound(
            manifest_path.display().to_string(),
        ));
    }

    Ok(manifest_path)
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Remove a file, treating an already missing file as removed
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_manifest_in_directory() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(MANIFEST_FILE), "[package]\n").unwrap();

        let found = find_manifest(Some(temp.path())).unwrap();
        assert_eq!(found, temp.path().join(MANIFEST_FILE));

        let direct = find_manifest(Some(&found)).unwrap();
        assert_eq!(direct, found);
    }

    #[test]
    fn test_find_manifest_missing() {
        let temp = TempDir::new().unwrap();
        let err = find_manifest(Some(temp.path())).unwrap_err();
        assert!(matches!(err, Error::ManifestNotFound(_)));
    }

    #[test]
    fn test_copy_recursively_merges() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        fs::write(src.join("nested/b.txt"), "b").unwrap();

        let dst = temp.path().join("dst");
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("keep.txt"), "keep").unwrap();

        copy_recursively(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dst.join("nested/b.txt")).unwrap(), "b");
        assert!(dst.join("keep.txt").exists());
    }

    #[test]
    fn test_remove_file_if_exists() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("gone.txt");
        remove_file_if_exists(&file).unwrap();

        fs::write(&file, "x").unwrap();
        remove_file_if_exists(&file).unwrap();
        assert!(!file.exists());
    }
}
