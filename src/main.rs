use package_it::args::Args;
use package_it::manifest::Manifest;
use package_it::version::{self, Bump};
use package_it::{Context, Result, utils};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Args {
        verbose,
        path,
        options,
    } = Args::parse();

    init_logging(verbose);

    // Find Cargo.toml
    let manifest_path = utils::find_manifest(path.as_deref())?;
    let ctx = Context::new(manifest_path, verbose);

    cliclack::intro("package-it")?;

    // A bump is only written once the archive check and the build succeed
    let version = version::next(&ctx.manifest_path, options.bump)?;

    let manifest = {
        let spinner = cliclack::spinner();
        spinner.start("Loading manifest...");
        match Manifest::load(&ctx, &version, &options.profile) {
            Ok(m) => {
                spinner.stop(format!("Loaded manifest for {} {}", m.out_name, m.version));
                m
            }
            Err(e) => {
                spinner.error("Failed to load manifest");
                return Err(e);
            }
        }
    };

    let mut package = manifest.into_package(&ctx);
    if options.bump != Bump::None {
        package = package.after_build(|| {
            version::write(&ctx.manifest_path, &version)?;
            cliclack::log::step(format!("Bumped version to {}", version))?;
            Ok(())
        });
    }
    let result = package.run(&ctx, &options)?;

    cliclack::log::info(format!("Staging directory: {}", result.package_dir.display()))?;
    if options.no_archive {
        cliclack::outro("Package staged (archive skipped)")?;
    } else {
        cliclack::outro(format!("Archive created: {}", result.archive.display()))?;
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}
