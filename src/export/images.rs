//! Dumping encoded images to `<tag>/<step>.png` files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::accumulator::SummarySource;
use crate::error::{ExportError, Result};

pub const IMAGES_DIR: &str = "images";

/// Write every image of every tag to `image_dir/<tag>/<step>.png`, byte for
/// byte. Returns the number of files written.
pub fn export_images<S>(source: &S, tags: &[String], image_dir: &Path) -> Result<usize>
where
    S: SummarySource + ?Sized,
{
    fs::create_dir_all(image_dir).map_err(|e| ExportError::write(image_dir, e))?;

    let mut written = 0;
    for tag in tags {
        let images = source.images(tag)?;
        let tag_dir = tag_dir(image_dir, tag);
        fs::create_dir_all(&tag_dir).map_err(|e| ExportError::write(&tag_dir, e))?;

        for image in images {
            let path = tag_dir.join(format!("{}.png", image.step));
            fs::write(&path, &image.encoded_image).map_err(|e| ExportError::write(&path, e))?;
            written += 1;
        }
    }
    Ok(written)
}

/// Directory for a tag. `/` in tags nests directories; empty, `.` and `..`
/// components are dropped so a tag can never escape `image_dir`.
fn tag_dir(image_dir: &Path, tag: &str) -> PathBuf {
    let mut dir = image_dir.to_path_buf();
    tag.split(['/', '\\'])
        .filter(|part| !matches!(*part, "" | "." | ".."))
        .for_each(|part| dir.push(part));
    dir
}
