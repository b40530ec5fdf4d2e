use crate::options::Options;
use crate::version::Bump;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

/// Command-line arguments for package-it
#[derive(Debug)]
pub struct Args {
    /// Enable verbose output
    pub verbose: bool,

    /// Path to Cargo.toml or directory containing it
    pub path: Option<PathBuf>,

    /// Packaging options
    pub options: Options,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse() -> Self {
        Self::from_matches(&Self::command().get_matches())
    }

    pub fn command() -> Command {
        Command::new("package-it")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Stage build artifacts and pack them into a versioned archive")
            // -V belongs to --version-suffix
            .disable_version_flag(true)
            .arg(
                Arg::new("version")
                    .long("version")
                    .action(ArgAction::Version)
                    .help("Print version"),
            )
            .arg(
                Arg::new("prefix")
                    .required(true)
                    .value_name("PREFIX")
                    .help("Build type prefix, e.g. release"),
            )
            .arg(
                Arg::new("path")
                    .short('p')
                    .long("path")
                    .value_name("PATH")
                    .help("Path to Cargo.toml or directory containing it"),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .action(ArgAction::SetTrue)
                    .help("Enable verbose output"),
            )
            .arg(
                Arg::new("no-archive")
                    .long("no-archive")
                    .action(ArgAction::SetTrue)
                    .help("Do not make archive"),
            )
            .arg(
                Arg::new("no-build")
                    .long("no-build")
                    .action(ArgAction::SetTrue)
                    .help("Do not run build commands"),
            )
            .arg(
                Arg::new("overwrite")
                    .long("overwrite")
                    .action(ArgAction::SetTrue)
                    .help("Overwrite existing archive"),
            )
            .arg(
                Arg::new("invalidate-all")
                    .long("invalidate-all")
                    .action(ArgAction::SetTrue)
                    .help("Copy every file even if the staged copy is up to date"),
            )
            .arg(
                Arg::new("no-clean")
                    .long("no-clean")
                    .action(ArgAction::SetTrue)
                    .help("Keep staged files that are no longer mapped"),
            )
            .arg(
                Arg::new("allow-empty-dir")
                    .long("allow-empty-dir")
                    .action(ArgAction::SetTrue)
                    .help("Keep empty directories in the staging tree"),
            )
            .arg(
                Arg::new("version-suffix")
                    .short('V')
                    .long("version-suffix")
                    .value_name("SUFFIX")
                    .help("String appended to the version number, e.g. rc1"),
            )
            .arg(
                Arg::new("git-tag")
                    .long("git-tag")
                    .action(ArgAction::SetTrue)
                    .help("Tag the git repository after archiving"),
            )
            .arg(
                Arg::new("bump-major")
                    .long("bump-major")
                    .action(ArgAction::SetTrue)
                    .help("Bump major version number"),
            )
            .arg(
                Arg::new("bump-minor")
                    .long("bump-minor")
                    .action(ArgAction::SetTrue)
                    .help("Bump minor version number"),
            )
            .arg(
                Arg::new("bump-patch")
                    .long("bump-patch")
                    .action(ArgAction::SetTrue)
                    .help("Bump patch version number"),
            )
    }

    pub fn from_matches(matches: &ArgMatches) -> Self {
        let options = Options {
            profile: matches
                .get_one::<String>("prefix")
                .cloned()
                .unwrap_or_default(),
            no_archive: matches.get_flag("no-archive"),
            no_build: matches.get_flag("no-build"),
            overwrite: matches.get_flag("overwrite"),
            invalidate_all: matches.get_flag("invalidate-all"),
            no_clean: matches.get_flag("no-clean"),
            allow_empty_dir: matches.get_flag("allow-empty-dir"),
            git_tag: matches.get_flag("git-tag"),
            version_suffix: matches.get_one::<String>("version-suffix").cloned(),
            bump: Bump::from_flags(
                matches.get_flag("bump-major"),
                matches.get_flag("bump-minor"),
                matches.get_flag("bump-patch"),
            ),
        };

        Self {
            verbose: matches.get_flag("verbose"),
            path: matches.get_one::<String>("path").map(PathBuf::from),
            options,
        }
    }
}
