//! Gzip compression of output files

use crate::domain::Result;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Compresses `path` into `{path}.gz`, leaving the source in place.
///
/// Returns the path of the compressed file.
pub fn gzip_file(path: &Path) -> Result<PathBuf> {
    let mut target = path.as_os_str().to_owned();
    target.push(".gz");
    let target = PathBuf::from(target);

    let mut reader = BufReader::new(File::open(path)?);
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(&target)?), Compression::default());
    let bytes = io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?.into_inner().map_err(|e| e.into_error())?.sync_all()?;

    tracing::debug!(source = %path.display(), target = %target.display(), bytes, "Compressed output file");
    Ok(target)
}
