/// Builder for creating formatted DOS 3.3 images

use crate::error::Result;
use crate::filesystem::vtoc;
use crate::format::{Geometry, DEFAULT_VOLUME};
use crate::image::DiskImage;

/// Builder for constructing initialized DOS 3.3 images
pub struct DiskImageBuilder {
    geometry: Geometry,
    volume: u8,
}

impl DiskImageBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            geometry: Geometry::dos33(),
            volume: DEFAULT_VOLUME,
        }
    }

    /// Set the geometry
    pub fn geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Set the number of tracks
    pub fn num_tracks(mut self, num_tracks: u8) -> Self {
        self.geometry.tracks = num_tracks;
        self
    }

    /// Set the volume number
    pub fn volume(mut self, volume: u8) -> Self {
        self.volume = volume;
        self
    }

    /// Build a blank image and write an empty VTOC and catalog to it
    pub fn build(self) -> Result<DiskImage> {
        let mut image = DiskImage::blank(self.geometry)?;
        vtoc::format(&mut image, self.volume)?;
        Ok(image)
    }
}

impl Default for DiskImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
