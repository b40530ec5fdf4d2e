//! Stage build artifacts into a versioned directory tree and pack it into a
//! platform archive (`.tar.gz`, or `.zip` on Windows).
//!
//! A run resolves an ordered source -> destination mapping (globs and
//! directories are expanded), copies only what changed since the previous
//! run, removes files the mapping no longer produces and writes
//! `<out_name>-<version><suffix>-<profile>-<platform>-<release>.<ext>`.
//!
//! ```no_run
//! use package_it::{Context, MappingEntry, Options, Package};
//!
//! let ctx = Context::new("Cargo.toml".into(), false);
//! let options = Options::new("release");
//! let version = package_it::version::read(&ctx.manifest_path)?;
//!
//! let result = Package::new("demo", version, "dist")
//!     .mapping([
//!         MappingEntry::new("target/release/demo", "bin/"),
//!         MappingEntry::new("assets/**/*.png", "share/icons/"),
//!         MappingEntry::to_root("README.md"),
//!     ])
//!     .run(&ctx, &options)?;
//!
//! println!("{}", result.archive.display());
//! # Ok::<(), package_it::Error>(())
//! ```

pub mod archive;
pub mod args;
pub mod cmd;
pub mod context;
pub mod error;
pub mod filter;
pub mod manifest;
pub mod mapping;
pub mod options;
pub mod package;
pub mod platform;
pub mod result;
pub mod stage;
pub mod tpl;
pub mod utils;
pub mod version;

pub use context::Context;
pub use error::Error;
pub use filter::{CopyFilter, FilterSet, PlainTextReplacer};
pub use mapping::{CopyEntry, MappingEntry};
pub use options::Options;
pub use package::{Layout, Package, PackageResult};
pub use result::Result;
pub use stage::{StageReport, Stager};
pub use version::Bump;
