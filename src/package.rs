//! End-to-end packaging run: guard, build, resolve, stage, archive, distribute.

use crate::archive::{self, ArchiveFormat};
use crate::cmd;
use crate::context::Context;
use crate::error::Error;
use crate::filter::FilterSet;
use crate::mapping::{self, MappingEntry};
use crate::options::Options;
use crate::platform::Host;
use crate::result::Result;
use crate::stage::{StageReport, Stager};
use crate::utils;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Outputs of a packaging run, for follow-up steps such as uploads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageResult {
    /// Archive path (not written when archiving was skipped)
    pub archive: PathBuf,
    /// Staging directory that is archived
    pub package_dir: PathBuf,
    pub version: String,
    pub stage: StageReport,
}

/// Where a run puts its files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// `<out_name>-<version><suffix>-<profile>-<platform>-<release>`
    pub archive_stem: String,
    /// `<result_dir>/archive/<archive_stem>.<ext>`
    pub archive_path: PathBuf,
    /// `<result_dir>/<platform>-<release>/<out_name>-<profile>`
    pub package_dir: PathBuf,
    /// `<package_dir>/<out_name>`
    pub content_dir: PathBuf,
    pub format: ArchiveFormat,
}

impl Layout {
    pub fn new(result_dir: &Path, out_name: &str, version: &str, options: &Options, host: &Host) -> Self {
        let format = host.platform.archive_format();
        let archive_stem = format!(
            "{}-{}{}-{}-{}",
            out_name,
            version,
            options.suffix(),
            options.profile,
            host.tag()
        );
        let archive_path = result_dir
            .join("archive")
            .join(format!("{}.{}", archive_stem, format.extension()));
        let package_dir = result_dir
            .join(host.tag())
            .join(format!("{}-{}", out_name, options.profile));
        let content_dir = package_dir.join(out_name);

        Self {
            archive_stem,
            archive_path,
            package_dir,
            content_dir,
            format,
        }
    }
}

type BuildHook<'a> = Box<dyn FnMut() -> i32 + 'a>;
type PathHook<'a> = Box<dyn FnMut(&Path) + 'a>;
type StepHook<'a> = Box<dyn FnMut() -> Result<()> + 'a>;

/// A packaging job: what to copy, where the results go and the hooks to run
pub struct Package<'a> {
    out_name: String,
    version: String,
    result_dir: PathBuf,
    mapping: Vec<MappingEntry>,
    tree_copy_dirs: Vec<PathBuf>,
    archive_copy_dirs: Vec<PathBuf>,
    filters: FilterSet,
    git_tag_prefix: Option<String>,
    host: Host,
    build: Option<BuildHook<'a>>,
    after_build: Option<StepHook<'a>>,
    on_package_dir: Option<PathHook<'a>>,
    on_archive_file: Option<PathHook<'a>>,
}

impl<'a> Package<'a> {
    pub fn new<N, V, P>(out_name: N, version: V, result_dir: P) -> Self
    where
        N: Into<String>,
        V: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            out_name: out_name.into(),
            version: version.into(),
            result_dir: result_dir.into(),
            mapping: Vec::new(),
            tree_copy_dirs: Vec::new(),
            archive_copy_dirs: Vec::new(),
            filters: FilterSet::new(),
            git_tag_prefix: None,
            host: Host::current(),
            build: None,
            after_build: None,
            on_package_dir: None,
            on_archive_file: None,
        }
    }

    pub fn mapping<I: IntoIterator<Item = MappingEntry>>(mut self, mapping: I) -> Self {
        self.mapping.extend(mapping);
        self
    }

    /// Also copy the staged tree into each of these directories
    pub fn tree_copy_dirs<I: IntoIterator<Item = PathBuf>>(mut self, dirs: I) -> Self {
        self.tree_copy_dirs.extend(dirs);
        self
    }

    /// Also copy the finished archive into each of these directories
    pub fn archive_copy_dirs<I: IntoIterator<Item = PathBuf>>(mut self, dirs: I) -> Self {
        self.archive_copy_dirs.extend(dirs);
        self
    }

    pub fn filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    pub fn git_tag_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.git_tag_prefix = Some(prefix.into());
        self
    }

    pub fn host(mut self, host: Host) -> Self {
        self.host = host;
        self
    }

    /// Hook run before staging; a non-zero return aborts the run
    pub fn build<F: FnMut() -> i32 + 'a>(mut self, hook: F) -> Self {
        self.build = Some(Box::new(hook));
        self
    }

    /// Called once the archive-exists check passed and the build succeeded
    /// (or was skipped), before anything is staged. An error aborts the run.
    pub fn after_build<F: FnMut() -> Result<()> + 'a>(mut self, hook: F) -> Self {
        self.after_build = Some(Box::new(hook));
        self
    }

    /// Called with the package directory once the archive is written
    pub fn on_package_dir<F: FnMut(&Path) + 'a>(mut self, hook: F) -> Self {
        self.on_package_dir = Some(Box::new(hook));
        self
    }

    /// Called with the archive path once the archive is written
    pub fn on_archive_file<F: FnMut(&Path) + 'a>(mut self, hook: F) -> Self {
        self.on_archive_file = Some(Box::new(hook));
        self
    }

    pub fn layout(&self, ctx: &Context, options: &Options) -> Layout {
        Layout::new(
            &ctx.resolve(&self.result_dir),
            &self.out_name,
            &self.version,
            options,
            &self.host,
        )
    }

    /// Git tag for this version: `[<prefix>-]v<version><suffix>`
    pub fn tag_name(&self, options: &Options) -> String {
        match &self.git_tag_prefix {
            Some(prefix) => format!("{}-v{}{}", prefix, self.version, options.suffix()),
            None => format!("v{}{}", self.version, options.suffix()),
        }
    }

    pub fn run(mut self, ctx: &Context, options: &Options) -> Result<PackageResult> {
        let started = Instant::now();
        let layout = self.layout(ctx, options);

        if !options.overwrite && !options.no_archive && layout.archive_path.exists() {
            return Err(Error::ArchiveExists(layout.archive_path));
        }

        if !options.no_build {
            if let Some(build) = self.build.as_mut() {
                let code = build();
                if code != 0 {
                    return Err(Error::BuildFailed(code));
                }
            }
        }

        if let Some(hook) = self.after_build.as_mut() {
            hook()?;
        }

        let entries = mapping::resolve(ctx, &self.mapping)?;
        let stage = Stager::new(options, &self.filters, &layout.package_dir, &layout.content_dir)
            .stage(&entries)?;
        log::info!(
            "Staged {} ({} copied, {} up-to-date, {} removed)",
            layout.package_dir.display(),
            stage.copied,
            stage.skipped,
            stage.removed.len()
        );

        for dir in &self.tree_copy_dirs {
            distribute("package contents", dir, |dir| {
                utils::copy_recursively(&layout.package_dir, &ctx.resolve(dir))
            });
        }

        let result = PackageResult {
            archive: layout.archive_path.clone(),
            package_dir: layout.package_dir.clone(),
            version: self.version.clone(),
            stage,
        };

        if options.no_archive {
            log::info!("Skipping archive creation");
            log::info!("Done. Packaging took {:.2} seconds", started.elapsed().as_secs_f64());
            return Ok(result);
        }

        log::info!("Archiving output package to {}", layout.archive_path.display());
        archive::create(layout.format, &layout.package_dir, &layout.archive_path)?;

        if let Some(hook) = self.on_package_dir.as_mut() {
            hook(layout.package_dir.as_path());
        }
        if let Some(hook) = self.on_archive_file.as_mut() {
            hook(layout.archive_path.as_path());
        }

        for dir in &self.archive_copy_dirs {
            distribute("archive", dir, |dir| {
                let dir = ctx.resolve(dir);
                utils::ensure_dir(&dir)?;
                let name = layout
                    .archive_path
                    .file_name()
                    .ok_or_else(|| Error::custom("archive path has no file name"))?;
                fs::copy(&layout.archive_path, dir.join(name))?;
                Ok(())
            });
        }

        if options.git_tag {
            let tag = self.tag_name(options);
            log::info!("Tagging git repository with {}", tag);
            if let Err(e) = cmd::execute(ctx, "git", &["tag", &tag]) {
                log::warn!("Failed to create tag {}: {}", tag, e);
            }
        }

        log::info!("Done. Packaging took {:.2} seconds", started.elapsed().as_secs_f64());
        Ok(result)
    }
}

/// Best-effort copy to an extra location; failures are reported and skipped
fn distribute<F>(what: &str, dir: &Path, copy: F)
where
    F: FnOnce(&Path) -> Result<()>,
{
    if dir.as_os_str().is_empty() {
        log::warn!("Skipping empty {} copy directory", what);
        return;
    }
    match copy(dir) {
        Ok(()) => log::info!("Copied {} -> {}", what, dir.display()),
        Err(e) => log::warn!("Failed to copy {} -> {}: {}", what, dir.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use filetime::FileTime;
    use std::cell::RefCell;
    use std::io::Read;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn project() -> (TempDir, Context) {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("target/release")).unwrap();
        fs::write(root.join("target/release/demo"), "binary").unwrap();
        fs::write(root.join("README.md"), "readme for @VERSION@\n").unwrap();
        let ctx = Context::new(root.join("Cargo.toml"), false);
        (temp, ctx)
    }

    fn package<'a>() -> Package<'a> {
        Package::new("demo", "1.2.3", "dist")
            .host(Host::new(Platform::Linux, "6.8.0"))
            .mapping([
                MappingEntry::new("target/release/demo", "bin/"),
                MappingEntry::to_root("README.md"),
            ])
    }

    #[test]
    fn test_layout_naming() {
        let mut options = Options::new("release");
        options.version_suffix = Some("rc1".to_string());
        let layout = Layout::new(
            Path::new("dist"),
            "demo",
            "1.2.3",
            &options,
            &Host::new(Platform::Windows, "10"),
        );

        assert_eq!(layout.archive_stem, "demo-1.2.3rc1-release-windows-10");
        assert_eq!(
            layout.archive_path,
            PathBuf::from("dist/archive/demo-1.2.3rc1-release-windows-10.zip")
        );
        assert_eq!(layout.package_dir, PathBuf::from("dist/windows-10/demo-release"));
        assert_eq!(layout.content_dir, PathBuf::from("dist/windows-10/demo-release/demo"));
    }

    #[test]
    fn test_run_stages_and_archives() {
        let (temp, ctx) = project();
        let options = Options::new("release");
        let result = package().run(&ctx, &options).unwrap();

        let root = temp.path();
        assert_eq!(
            result.archive,
            root.join("dist/archive/demo-1.2.3-release-linux-6.8.0.tar.gz")
        );
        assert_eq!(result.package_dir, root.join("dist/linux-6.8.0/demo-release"));
        assert_eq!(result.version, "1.2.3");
        assert!(result.archive.is_file());
        assert!(result.package_dir.join("demo/bin/demo").is_file());
        assert!(result.package_dir.join("demo/README.md").is_file());
    }

    /// Content of the archived file whose path ends with `name`
    fn archived(archive: &Path, name: &str) -> String {
        let file = fs::File::open(archive).unwrap();
        let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(file));
        let mut entry = tar
            .entries()
            .unwrap()
            .map(|entry| entry.unwrap())
            .find(|entry| entry.path().unwrap().ends_with(name))
            .unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_existing_archive_requires_overwrite() {
        let (temp, ctx) = project();
        let mut options = Options::new("release");
        let first = package().run(&ctx, &options).unwrap();
        assert_eq!(archived(&first.archive, "demo/README.md"), "readme for @VERSION@\n");

        let readme = temp.path().join("README.md");
        fs::write(&readme, "second readme\n").unwrap();
        let future = FileTime::from_system_time(SystemTime::now() + Duration::from_secs(3600));
        filetime::set_file_mtime(&readme, future).unwrap();

        let err = package().run(&ctx, &options).unwrap_err();
        assert!(matches!(err, Error::ArchiveExists(_)));
        assert_eq!(archived(&first.archive, "demo/README.md"), "readme for @VERSION@\n");

        options.overwrite = true;
        let result = package().run(&ctx, &options).unwrap();
        assert_eq!(result.archive, first.archive);
        assert_eq!(archived(&result.archive, "demo/README.md"), "second readme\n");
    }

    #[test]
    fn test_existing_archive_ignored_without_archiving() {
        let (_temp, ctx) = project();
        let mut options = Options::new("release");
        let first = package().run(&ctx, &options).unwrap();

        options.no_archive = true;
        let second = package().run(&ctx, &options).unwrap();
        assert_eq!(first.archive, second.archive);
    }

    #[test]
    fn test_no_archive_skips_archive_and_hooks() {
        let (_temp, ctx) = project();
        let mut options = Options::new("release");
        options.no_archive = true;

        let calls = RefCell::new(0);
        let result = package()
            .on_archive_file(|_| *calls.borrow_mut() += 1)
            .run(&ctx, &options)
            .unwrap();

        assert!(!result.archive.exists());
        assert!(result.package_dir.join("demo/README.md").is_file());
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_build_failure_aborts() {
        let (_temp, ctx) = project();
        let options = Options::new("release");
        let err = package().build(|| 2).run(&ctx, &options).unwrap_err();
        assert!(matches!(err, Error::BuildFailed(2)));
    }

    #[test]
    fn test_after_build_runs_only_when_build_succeeds() {
        let (_temp, ctx) = project();
        let mut options = Options::new("release");
        options.no_archive = true;

        let calls = RefCell::new(0);
        let err = package()
            .build(|| 1)
            .after_build(|| {
                *calls.borrow_mut() += 1;
                Ok(())
            })
            .run(&ctx, &options)
            .unwrap_err();
        assert!(matches!(err, Error::BuildFailed(1)));
        assert_eq!(*calls.borrow(), 0);

        let result = package()
            .build(|| 0)
            .after_build(|| {
                *calls.borrow_mut() += 1;
                Ok(())
            })
            .run(&ctx, &options)
            .unwrap();
        assert_eq!(*calls.borrow(), 1);
        assert!(result.package_dir.join("demo/README.md").is_file());

        let err = package()
            .after_build(|| Err(Error::custom("refused")))
            .run(&ctx, &options)
            .unwrap_err();
        assert!(matches!(err, Error::Custom(_)));
    }

    #[test]
    fn test_after_build_skipped_when_archive_exists() {
        let (_temp, ctx) = project();
        let options = Options::new("release");
        package().run(&ctx, &options).unwrap();

        let called = RefCell::new(false);
        let err = package()
            .after_build(|| {
                *called.borrow_mut() = true;
                Ok(())
            })
            .run(&ctx, &options)
            .unwrap_err();
        assert!(matches!(err, Error::ArchiveExists(_)));
        assert!(!*called.borrow());
    }

    #[test]
    fn test_no_build_skips_hook() {
        let (_temp, ctx) = project();
        let mut options = Options::new("release");
        options.no_build = true;
        options.no_archive = true;

        let built = RefCell::new(false);
        package()
            .build(|| {
                *built.borrow_mut() = true;
                1
            })
            .run(&ctx, &options)
            .unwrap();
        assert!(!*built.borrow());
    }

    #[test]
    fn test_hooks_receive_outputs() {
        let (_temp, ctx) = project();
        let options = Options::new("release");

        let seen = RefCell::new(Vec::new());
        let result = package()
            .build(|| 0)
            .on_package_dir(|dir| seen.borrow_mut().push(dir.to_path_buf()))
            .on_archive_file(|file| seen.borrow_mut().push(file.to_path_buf()))
            .run(&ctx, &options)
            .unwrap();

        assert_eq!(*seen.borrow(), vec![result.package_dir.clone(), result.archive.clone()]);
    }

    #[test]
    fn test_copies_are_distributed() {
        let (temp, ctx) = project();
        let options = Options::new("release");
        let result = package()
            .tree_copy_dirs([PathBuf::from("tree"), PathBuf::new()])
            .archive_copy_dirs([PathBuf::from("uploads")])
            .run(&ctx, &options)
            .unwrap();

        assert!(temp.path().join("tree/demo/bin/demo").is_file());
        let archive_name = result.archive.file_name().unwrap();
        assert!(temp.path().join("uploads").join(archive_name).is_file());
    }

    #[test]
    fn test_filters_apply_by_mapping_key() {
        let (_temp, ctx) = project();
        let mut options = Options::new("release");
        options.no_archive = true;

        let mut filters = FilterSet::new();
        filters.register(
            "README.md",
            crate::filter::PlainTextReplacer::new([("@VERSION@", "1.2.3")]),
        );
        let result = package().filters(filters).run(&ctx, &options).unwrap();

        assert_eq!(
            fs::read_to_string(result.package_dir.join("demo/README.md")).unwrap(),
            "readme for 1.2.3\n"
        );
    }

    #[test]
    fn test_tag_name() {
        let mut options = Options::new("release");
        assert_eq!(package().tag_name(&options), "v1.2.3");

        options.version_suffix = Some("-rc1".to_string());
        assert_eq!(package().git_tag_prefix("demo").tag_name(&options), "demo-v1.2.3-rc1");
    }
}
