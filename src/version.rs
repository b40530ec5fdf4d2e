//! Reading and bumping `[package].version` in a Cargo manifest.

use crate::error::Error;
use crate::result::Result;
use crate::utils;
use semver::Version;
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Value};

/// Version component to increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bump {
    #[default]
    None,
    Major,
    Minor,
    Patch,
}

impl Bump {
    /// Select a bump from independent flags; the most significant set flag wins
    pub fn from_flags(major: bool, minor: bool, patch: bool) -> Self {
        if major {
            Bump::Major
        } else if minor {
            Bump::Minor
        } else if patch {
            Bump::Patch
        } else {
            Bump::None
        }
    }

    /// Apply the bump, zeroing lower components and dropping pre-release
    /// and build metadata
    pub fn apply(self, version: &Version) -> Version {
        match self {
            Bump::None => version.clone(),
            Bump::Major => Version::new(version.major + 1, 0, 0),
            Bump::Minor => Version::new(version.major, version.minor + 1, 0),
            Bump::Patch => Version::new(version.major, version.minor, version.patch + 1),
        }
    }
}

/// Read the package version from a manifest file or a directory containing one
pub fn read(path: &Path) -> Result<String> {
    next(path, Bump::None)
}

/// The version the manifest would carry after `bump`, without writing it.
///
/// With [`Bump::None`] the version string is returned as written and is not
/// validated; any other bump requires a semver version.
pub fn next(path: &Path, bump: Bump) -> Result<String> {
    let (manifest_path, mut doc) = load(path)?;
    let current = version_value(&mut doc, &manifest_path)?
        .as_str()
        .ok_or_else(|| Error::VersionNotFound(manifest_path.clone()))?
        .to_string();

    if bump == Bump::None {
        return Ok(current);
    }

    let parsed = Version::parse(&current).map_err(|source| Error::InvalidVersion {
        version: current.clone(),
        source,
    })?;
    Ok(bump.apply(&parsed).to_string())
}

/// Replace `[package].version`, leaving the rest of the manifest untouched
pub fn write(path: &Path, version: &str) -> Result<()> {
    let (manifest_path, mut doc) = load(path)?;
    let value = version_value(&mut doc, &manifest_path)?;

    let decor = value.decor().clone();
    *value = Value::from(version);
    *value.decor_mut() = decor;

    fs::write(&manifest_path, doc.to_string())?;
    Ok(())
}

/// Read the package version and optionally bump it in place
pub fn bump(path: &Path, bump: Bump) -> Result<String> {
    let version = next(path, bump)?;
    if bump != Bump::None {
        write(path, &version)?;
        log::info!("Bumped version to {}", version);
    }
    Ok(version)
}

fn load(path: &Path) -> Result<(PathBuf, DocumentMut)> {
    let manifest_path = utils::find_manifest(Some(path))?;
    let doc = fs::read_to_string(&manifest_path)?.parse::<DocumentMut>()?;
    Ok((manifest_path, doc))
}

fn version_value<'a>(doc: &'a mut DocumentMut, manifest_path: &Path) -> Result<&'a mut Value> {
    doc.get_mut("package")
        .and_then(|package| package.get_mut("version"))
        .and_then(|version| version.as_value_mut())
        .ok_or_else(|| Error::VersionNotFound(manifest_path.to_path_buf()))
}
