use crate::result::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::path::Path;
use tar::Builder;

pub fn create_tar_gz_file(source_dir: &Path, output_path: &Path) -> Result<()> {
    let tar_gz = File::create(output_path)?;
    let enc = GzEncoder::new(tar_gz, Compression::default());
    let mut tar = Builder::new(enc);

    tar.append_dir_all(".", source_dir)?;
    tar.into_inner()?.finish()?;

    Ok(())
}
