/// DOS 3.3 image data structures

/// Image builder for creating formatted images
pub mod builder;

pub use builder::DiskImageBuilder;

use crate::error::{DosError, Result};
use crate::format::{Geometry, TrackSector};
use std::path::Path;

/// A whole disk held as one flat buffer
///
/// Every other structure (VTOC, catalog, track/sector lists, bitmap) is a
/// view over this buffer addressed by [`TrackSector`].
#[derive(Debug, Clone)]
pub struct DiskImage {
    /// Raw image bytes, sectors in track-major order
    pub(crate) data: Vec<u8>,
    /// Geometry of the image
    pub(crate) geometry: Geometry,
    /// Has the image been modified?
    pub(crate) changed: bool,
    /// Original filename if loaded from disk
    pub(crate) filename: Option<String>,
}

impl DiskImage {
    /// Open a raw DOS-ordered image file from disk
    ///
    /// The track count is inferred from the file size.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::io::reader::read_image(path)
    }

    /// Wrap raw image bytes
    pub fn from_bytes(data: Vec<u8>, geometry: Geometry) -> Result<Self> {
        geometry.validate()?;
        let expected = geometry.total_bytes();
        if data.len() < expected {
            return Err(DosError::malformed(format!(
                "image is truncated: expected {} bytes, got {}",
                expected,
                data.len()
            )));
        }
        if data.len() > expected {
            return Err(DosError::invalid_format(format!(
                "image is {} bytes, geometry {} needs {}",
                data.len(),
                geometry,
                expected
            )));
        }

        Ok(Self {
            data,
            geometry,
            changed: false,
            filename: None,
        })
    }

    /// Create a zero-filled, unformatted image
    pub fn blank(geometry: Geometry) -> Result<Self> {
        geometry.validate()?;
        Ok(Self {
            data: vec![0; geometry.total_bytes()],
            geometry,
            changed: true,
            filename: None,
        })
    }

    /// Create a freshly initialized, empty DOS 3.3 volume
    pub fn create(geometry: Geometry) -> Result<Self> {
        DiskImageBuilder::new().geometry(geometry).build()
    }

    /// Create a new builder for constructing images
    pub fn builder() -> DiskImageBuilder {
        DiskImageBuilder::new()
    }

    /// Get the geometry
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Get the raw image bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the original filename if loaded from disk
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Read sector data
    pub fn read_sector(&self, ts: TrackSector) -> Result<&[u8]> {
        let range = self.sector_range(ts)?;
        Ok(&self.data[range])
    }

    /// Write sector data
    ///
    /// Data shorter than a sector is zero padded; longer data is rejected.
    pub fn write_sector(&mut self, ts: TrackSector, data: &[u8]) -> Result<()> {
        let sector_size = self.geometry.sector_size as usize;
        if data.len() > sector_size {
            return Err(DosError::invalid_format(format!(
                "sector data is {} bytes, sector holds {}",
                data.len(),
                sector_size
            )));
        }

        let sector = self.sector_mut(ts)?;
        sector[..data.len()].copy_from_slice(data);
        sector[data.len()..].fill(0);
        Ok(())
    }

    /// Mutable view of one sector
    pub fn sector_mut(&mut self, ts: TrackSector) -> Result<&mut [u8]> {
        let range = self.sector_range(ts)?;
        self.changed = true;
        Ok(&mut self.data[range])
    }

    /// Byte offset of a sector within the image
    pub fn sector_offset(&self, ts: TrackSector) -> Result<usize> {
        if !self.geometry.contains(ts) {
            return Err(DosError::InvalidTrackSector {
                track: ts.track,
                sector: ts.sector,
            });
        }
        Ok(self.geometry.offset(ts))
    }

    fn sector_range(&self, ts: TrackSector) -> Result<std::ops::Range<usize>> {
        let start = self.sector_offset(ts)?;
        Ok(start..start + self.geometry.sector_size as usize)
    }

    /// Save the image to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        crate::io::writer::write_image(self, path)?;
        self.changed = false;
        Ok(())
    }

    /// Check if the image has been modified
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Mark the image as unchanged
    pub fn mark_unchanged(&mut self) {
        self.changed = false;
    }

    /// Get the total capacity of the disk in bytes
    pub fn total_capacity(&self) -> usize {
        self.geometry.total_bytes()
    }

    /// Get the total capacity of the disk in kilobytes
    pub fn total_capacity_kb(&self) -> usize {
        self.total_capacity() / 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::STANDARD_IMAGE_SIZE;

    #[test]
    fn test_blank_image() {
        let image = DiskImage::blank(Geometry::dos33()).unwrap();
        assert_eq!(image.data().len(), STANDARD_IMAGE_SIZE);
        assert!(image.data().iter().all(|&b| b == 0));
        assert_eq!(image.total_capacity_kb(), 140);
    }

    #[test]
    fn test_from_bytes_truncated() {
        let result = DiskImage::from_bytes(vec![0; 1000], Geometry::dos33());
        assert!(matches!(result, Err(DosError::MalformedImage(_))));
    }

    #[test]
    fn test_from_bytes_oversized() {
        let result = DiskImage::from_bytes(vec![0; STANDARD_IMAGE_SIZE + 256], Geometry::dos33());
        assert!(matches!(result, Err(DosError::InvalidFormat(_))));
    }

    #[test]
    fn test_from_bytes_unchanged() {
        let image = DiskImage::from_bytes(vec![0; STANDARD_IMAGE_SIZE], Geometry::dos33()).unwrap();
        assert!(!image.is_changed());
    }

    #[test]
    fn test_read_write_sector() {
        let mut image = DiskImage::blank(Geometry::dos33()).unwrap();
        image.mark_unchanged();

        let ts = TrackSector::new(3, 5);
        image.write_sector(ts, &[0x42; 256]).unwrap();

        let data = image.read_sector(ts).unwrap();
        assert!(data.iter().all(|&b| b == 0x42));
        assert_eq!(image.data()[3 * 4096 + 5 * 256], 0x42);
        assert!(image.is_changed());
    }

    #[test]
    fn test_write_short_sector_pads() {
        let mut image = DiskImage::blank(Geometry::dos33()).unwrap();
        let ts = TrackSector::new(1, 1);
        image.write_sector(ts, &[0xFF; 256]).unwrap();
        image.write_sector(ts, &[1, 2, 3]).unwrap();

        let data = image.read_sector(ts).unwrap();
        assert_eq!(&data[..3], &[1, 2, 3]);
        assert!(data[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_oversized_sector() {
        let mut image = DiskImage::blank(Geometry::dos33()).unwrap();
        let result = image.write_sector(TrackSector::new(1, 1), &[0; 300]);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_invalid_sector() {
        let image = DiskImage::blank(Geometry::dos33()).unwrap();
        let result = image.read_sector(TrackSector::new(35, 0));
        assert!(matches!(
            result,
            Err(DosError::InvalidTrackSector { track: 35, sector: 0 })
        ));
        assert!(image.read_sector(TrackSector::new(0, 16)).is_err());
    }

    #[test]
    fn test_sector_offset() {
        let image = DiskImage::blank(Geometry::dos33()).unwrap();
        assert_eq!(image.sector_offset(TrackSector::new(0, 0)).unwrap(), 0);
        assert_eq!(image.sector_offset(TrackSector::new(34, 15)).unwrap(), 143_104);
        assert!(image.sector_offset(TrackSector::new(35, 0)).is_err());
    }
}
