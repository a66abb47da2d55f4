/// Raw image reader

use crate::error::{DosError, Result};
use crate::format::geometry_for_size;
use crate::image::DiskImage;
use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read a raw DOS-ordered image from disk
///
/// The file must be a whole number of 16-sector tracks; a standard image is
/// 143,360 bytes (35 tracks).
pub fn read_image<P: AsRef<Path>>(path: P) -> Result<DiskImage> {
    let filename = path.as_ref().display().to_string();

    let mut file = File::open(&path)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;

    let mut image = read_image_bytes(data)?;
    image.filename = Some(filename);
    Ok(image)
}

/// Build an image from bytes, inferring the geometry from their length
pub fn read_image_bytes(data: Vec<u8>) -> Result<DiskImage> {
    let geometry = geometry_for_size(data.len()).ok_or_else(|| {
        DosError::malformed(format!(
            "{} bytes is not a whole number of tracks for a DOS 3.3 image",
            data.len()
        ))
    })?;
    debug!("image of {} bytes read as {}", data.len(), geometry);

    DiskImage::from_bytes(data, geometry)
}
