//! `[package.metadata.package-it]` configuration in Cargo.toml.

use crate::cmd;
use crate::context::Context;
use crate::error::Error;
use crate::filter::{FilterSet, PlainTextReplacer};
use crate::mapping::MappingEntry;
use crate::package::Package;
use crate::platform::Platform;
use crate::result::Result;
use crate::tpl::Tpl;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_RESULT_DIR: &str = "dist";

#[derive(Debug, Deserialize, Serialize)]
pub struct CargoToml {
    pub package: PackageSection,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PackageSection {
    pub name: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Metadata {
    #[serde(rename = "package-it", default)]
    pub package_it: Option<PackageItConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct PackageItConfig {
    #[serde(default)]
    pub out_name: Option<String>,

    #[serde(default)]
    pub result_dir: Option<String>,

    #[serde(default)]
    pub build: Vec<String>,

    /// `[source]` or `[source, destination]`
    #[serde(default)]
    pub mapping: Vec<Vec<String>>,

    #[serde(default)]
    pub tree_copy_dirs: Vec<String>,

    #[serde(default)]
    pub archive_copy_dirs: Vec<String>,

    #[serde(default)]
    pub git_tag_prefix: Option<String>,

    /// Mapping source -> list of `[from, to]` literal replacements
    #[serde(default)]
    pub filters: BTreeMap<String, Vec<(String, String)>>,
}

/// Parsed and template-expanded packaging configuration
#[derive(Debug)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    pub out_name: String,
    pub result_dir: PathBuf,
    pub build_commands: Vec<String>,
    pub mapping: Vec<MappingEntry>,
    pub tree_copy_dirs: Vec<PathBuf>,
    pub archive_copy_dirs: Vec<PathBuf>,
    pub git_tag_prefix: Option<String>,
    pub filters: BTreeMap<String, Vec<(String, String)>>,
}

impl Manifest {
    /// Load the manifest at `ctx.manifest_path`. `version` is the (possibly
    /// bumped) package version and `profile` the build profile; both are
    /// available to templates.
    pub fn load(ctx: &Context, version: &str, profile: &str) -> Result<Self> {
        let content = fs::read_to_string(&ctx.manifest_path)?;
        let cargo_toml: CargoToml = toml::from_str(&content)?;

        let config = cargo_toml
            .package
            .metadata
            .and_then(|m| m.package_it)
            .ok_or_else(|| {
                Error::InvalidManifest(
                    "Missing [package.metadata.package-it] section in Cargo.toml".to_string(),
                )
            })?;

        let name = cargo_toml.package.name;

        let mut tpl = Tpl::new();
        tpl.register("NAME", name.as_str());
        tpl.register("VERSION", version);
        tpl.register("PROFILE", profile);
        tpl.register("PLATFORM", Platform::current().as_str());

        let out_name = config
            .out_name
            .map(|n| tpl.parse(&n))
            .unwrap_or_else(|| name.clone());

        let result_dir = PathBuf::from(
            config
                .result_dir
                .map(|d| tpl.parse(&d))
                .unwrap_or_else(|| DEFAULT_RESULT_DIR.to_string()),
        );

        let mapping = config
            .mapping
            .iter()
            .map(|pair| match pair.as_slice() {
                [source] => Ok(MappingEntry::to_root(tpl.parse(source))),
                [source, destination] => Ok(MappingEntry::new(tpl.parse(source), tpl.parse(destination))),
                _ => Err(Error::InvalidManifest(format!(
                    "mapping entries take one or two paths, got {:?}",
                    pair
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        let filters: BTreeMap<String, Vec<(String, String)>> = config
            .filters
            .iter()
            .map(|(key, patterns)| {
                let patterns: Vec<(String, String)> = patterns
                    .iter()
                    .map(|(from, to)| (tpl.parse(from), tpl.parse(to)))
                    .collect();
                (tpl.parse(key), patterns)
            })
            .collect();

        Ok(Manifest {
            name,
            version: version.to_string(),
            out_name,
            result_dir,
            build_commands: tpl.parse_vec(&config.build),
            mapping,
            tree_copy_dirs: tpl
                .parse_vec(&config.tree_copy_dirs)
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            archive_copy_dirs: tpl
                .parse_vec(&config.archive_copy_dirs)
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            git_tag_prefix: config.git_tag_prefix.map(|p| tpl.parse(&p)),
            filters,
        })
    }

    /// Build the packaging job described by this manifest. Build commands
    /// run in order; the first non-zero exit code is reported by the hook.
    pub fn into_package<'a>(self, ctx: &'a Context) -> Package<'a> {
        let mut filters = FilterSet::new();
        for (key, patterns) in self.filters {
            filters.register(key, PlainTextReplacer::new(patterns));
        }

        let commands = self.build_commands;
        let mut package = Package::new(self.out_name, self.version, self.result_dir)
            .mapping(self.mapping)
            .tree_copy_dirs(self.tree_copy_dirs)
            .archive_copy_dirs(self.archive_copy_dirs)
            .filters(filters);

        if let Some(prefix) = self.git_tag_prefix {
            package = package.git_tag_prefix(prefix);
        }

        if !commands.is_empty() {
            package = package.build(move || run_build(ctx, &commands));
        }

        package
    }
}

fn run_build(ctx: &Context, commands: &[String]) -> i32 {
    for command in commands {
        log::info!("Running: {}", command);
        match cmd::run_line(ctx, command) {
            Ok(0) => {}
            Ok(code) => return code,
            Err(e) => {
                log::error!("{}: {}", command, e);
                return 1;
            }
        }
    }
    0
}
