/// Raw image writer

use crate::error::Result;
use crate::image::DiskImage;
use log::debug;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write the image buffer verbatim to disk
pub fn write_image<P: AsRef<Path>>(image: &DiskImage, path: P) -> Result<()> {
    let mut file = File::create(&path)?;
    file.write_all(&image.data)?;
    file.flush()?;
    debug!(
        "wrote {} bytes to {}",
        image.data.len(),
        path.as_ref().display()
    );
    Ok(())
}
