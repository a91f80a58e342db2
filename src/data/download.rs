//! Materialization of the CIFAR-100 binary distribution.
//!
//! The archive is fetched once into the dataset root and unpacked next to it:
//!
//! ```text
//! <root>/cifar-100-binary.tar.gz
//! <root>/cifar-100-binary/{train.bin, test.bin, fine_label_names.txt, coarse_label_names.txt}
//! ```

use crate::error::{DataError, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

pub const ARCHIVE_URL: &str = "https://www.cs.toronto.edu/~kriz/cifar-100-binary.tar.gz";
pub const ARCHIVE_NAME: &str = "cifar-100-binary.tar.gz";
/// Directory created by unpacking the archive.
pub const BASE_FOLDER: &str = "cifar-100-binary";
pub const TRAIN_FILE: &str = "train.bin";
pub const TEST_FILE: &str = "test.bin";

/// True when both partitions are present under `root`.
pub fn is_materialized(root: &Path) -> bool {
    let dir = root.join(BASE_FOLDER);
    dir.join(TRAIN_FILE).is_file() && dir.join(TEST_FILE).is_file()
}

/// Makes sure the dataset files exist under `root`, downloading and
/// unpacking the archive when they do not. A previously downloaded archive
/// is reused.
pub fn materialize(root: &Path) -> Result<()> {
    if is_materialized(root) {
        log::info!("CIFAR-100 files already present in {}", root.display());
        return Ok(());
    }

    fs::create_dir_all(root)?;
    let archive = root.join(ARCHIVE_NAME);
    if !archive.is_file() {
        fetch(ARCHIVE_URL, &archive)?;
    }
    extract(&archive, root)?;

    if !is_materialized(root) {
        return Err(DataError::Format {
            path: archive,
            reason: format!("archive does not contain {BASE_FOLDER}/{{{TRAIN_FILE},{TEST_FILE}}}"),
        });
    }
    Ok(())
}

/// Downloads `url` to `dest`. The body goes to a `.part` file first, so an
/// interrupted transfer never leaves a truncated archive behind.
pub fn fetch(url: &str, dest: &Path) -> Result<()> {
    log::info!("downloading {url} to {}", dest.display());

    let response = ureq::get(url).call().map_err(|e| DataError::Download {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let partial = dest.with_extension("part");
    let mut file = File::create(&partial)?;
    let bytes = io::copy(&mut response.into_reader(), &mut file)?;
    file.sync_all()?;
    drop(file);
    fs::rename(&partial, dest)?;

    log::info!("downloaded {bytes} bytes");
    Ok(())
}

/// Unpacks a `.tar.gz` archive into `dest`.
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    log::info!("extracting {} to {}", archive.display(), dest.display());
    let file = File::open(archive)?;
    let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    tar.unpack(dest)?;
    Ok(())
}
