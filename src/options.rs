use crate::version::Bump;

/// Per-run packaging configuration.
///
/// Built once from the command line (or directly by a library caller) and
/// passed by reference to every step that needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Build type prefix, e.g. "release"
    pub profile: String,

    /// Stage files but do not create the archive
    pub no_archive: bool,

    /// Do not run the build hook
    pub no_build: bool,

    /// Replace an existing archive
    pub overwrite: bool,

    /// Copy every file even when the staged copy is newer
    pub invalidate_all: bool,

    /// Keep staged files that the current mapping no longer produces
    pub no_clean: bool,

    /// Keep empty directories in the staging tree
    pub allow_empty_dir: bool,

    /// Tag the git repository after archiving
    pub git_tag: bool,

    /// Appended to the version in archive and tag names, e.g. "rc1"
    pub version_suffix: Option<String>,

    /// Version component to increment before packaging
    pub bump: Bump,
}

impl Options {
    pub fn new<S: Into<String>>(profile: S) -> Self {
        Self {
            profile: profile.into(),
            no_archive: false,
            no_build: false,
            overwrite: false,
            invalidate_all: false,
            no_clean: false,
            allow_empty_dir: false,
            git_tag: false,
            version_suffix: None,
            bump: Bump::None,
        }
    }

    /// Version suffix or an empty string
    pub fn suffix(&self) -> &str {
        self.version_suffix.as_deref().unwrap_or("")
    }

    pub fn clean(&self) -> bool {
        !self.no_clean
    }
}
