/// Volume Table of Contents
///
/// The VTOC lives at track 17, sector 0 and holds the catalog head, the
/// volume geometry, the allocation cursor and the free sector bitmap.

use crate::error::Result;
use crate::filesystem::bitmap;
use crate::format::*;
use crate::image::DiskImage;
use log::{info, warn};
use std::fmt;

/// Decoded VTOC header fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vtoc {
    /// First catalog sector
    pub catalog: TrackSector,
    /// DOS release number
    pub release: u8,
    /// Volume number
    pub volume: u8,
    /// Maximum track/sector pairs per list sector
    pub max_pairs: u8,
    /// Track of the last allocation
    pub last_track: u8,
    /// Allocation direction (1 or 0xFF)
    pub direction: u8,
    /// Tracks per disk
    pub tracks: u8,
    /// Sectors per track
    pub sectors: u8,
    /// Bytes per sector
    pub bytes_per_sector: u16,
}

impl Vtoc {
    /// Decode the VTOC of an image
    ///
    /// Disagreement between the VTOC and the buffer geometry is logged but
    /// tolerated; the buffer geometry is what addressing uses.
    pub fn load(image: &DiskImage) -> Result<Self> {
        let geometry = *image.geometry();
        let data = image.read_sector(geometry.vtoc())?;

        let vtoc = Self {
            catalog: TrackSector::new(data[VTOC_CATALOG_TRACK], data[VTOC_CATALOG_SECTOR]),
            release: data[VTOC_RELEASE],
            volume: data[VTOC_VOLUME],
            max_pairs: data[VTOC_MAX_PAIRS],
            last_track: data[VTOC_LAST_TRACK],
            direction: data[VTOC_DIRECTION],
            tracks: data[VTOC_TRACKS],
            sectors: data[VTOC_SECTORS],
            bytes_per_sector: read_u16le(data, VTOC_BYTES_PER_SECTOR),
        };

        if vtoc.tracks != geometry.tracks || vtoc.sectors != geometry.sectors_per_track {
            warn!(
                "VTOC describes {} tracks x {} sectors, image is {}",
                vtoc.tracks, vtoc.sectors, geometry
            );
        }
        if !geometry.contains(vtoc.catalog) {
            warn!("VTOC catalog head {} is outside the disk", vtoc.catalog);
        }

        Ok(vtoc)
    }
}

impl fmt::Display for Vtoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "       Catalog Track: {}", self.catalog.track)?;
        writeln!(f, "      Catalog Sector: {}", self.catalog.sector)?;
        writeln!(f, "      Release Number: {}", self.release)?;
        writeln!(f, "       Volume Number: {}", self.volume)?;
        writeln!(f, "   Max Track/Sectors: {}", self.max_pairs)?;
        writeln!(f, "     Last Used Track: {}", self.last_track)?;
        writeln!(f, " Allocation Direction: {}", self.direction as i8)?;
        writeln!(f, "     Tracks Per Disk: {}", self.tracks)?;
        writeln!(f, "    Sectors Per Track: {}", self.sectors)?;
        write!(f, "    Bytes Per Sector: {}", self.bytes_per_sector)
    }
}

/// Initialize an empty volume: VTOC, free bitmap and an empty catalog chain
///
/// Track 0 and the VTOC track are reserved. The catalog runs from the last
/// sector of the VTOC track down to sector 1.
pub fn format(image: &mut DiskImage, volume: u8) -> Result<()> {
    let geometry = *image.geometry();
    let vtoc_ts = geometry.vtoc();
    let last_sector = geometry.sectors_per_track - 1;

    for sector in 0..geometry.sectors_per_track {
        image.write_sector(TrackSector::new(VTOC_TRACK, sector), &[])?;
    }

    {
        let vtoc = image.sector_mut(vtoc_ts)?;
        vtoc[VTOC_CATALOG_TRACK] = VTOC_TRACK;
        vtoc[VTOC_CATALOG_SECTOR] = last_sector;
        vtoc[VTOC_RELEASE] = DOS_RELEASE;
        vtoc[VTOC_VOLUME] = volume;
        vtoc[VTOC_MAX_PAIRS] = geometry.max_pairs_per_list() as u8;
        vtoc[VTOC_LAST_TRACK] = VTOC_TRACK;
        vtoc[VTOC_DIRECTION] = 1;
        vtoc[VTOC_TRACKS] = geometry.tracks;
        vtoc[VTOC_SECTORS] = geometry.sectors_per_track;
        write_u16le(vtoc, VTOC_BYTES_PER_SECTOR, geometry.sector_size);
    }

    for track in 0..geometry.tracks {
        let map = match track {
            0 | VTOC_TRACK => 0,
            _ => bitmap::full_track_mask(geometry.sectors_per_track),
        };
        bitmap::set_track_map(image, track, map)?;
    }

    for sector in (2..=last_sector).rev() {
        let catalog = image.sector_mut(TrackSector::new(VTOC_TRACK, sector))?;
        catalog[CATALOG_NEXT_TRACK] = VTOC_TRACK;
        catalog[CATALOG_NEXT_SECTOR] = sector - 1;
    }

    info!("initialized volume {} ({})", volume, geometry);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::chain::{CatalogLayout, ChainWalker};

    #[test]
    fn test_format_vtoc_fields() {
        let image = DiskImage::create(Geometry::dos33()).unwrap();
        let vtoc = Vtoc::load(&image).unwrap();

        assert_eq!(vtoc.catalog, TrackSector::new(17, 15));
        assert_eq!(vtoc.release, 3);
        assert_eq!(vtoc.volume, 254);
        assert_eq!(vtoc.max_pairs, 122);
        assert_eq!(vtoc.last_track, 17);
        assert_eq!(vtoc.direction, 1);
        assert_eq!(vtoc.tracks, 35);
        assert_eq!(vtoc.sectors, 16);
        assert_eq!(vtoc.bytes_per_sector, 256);
    }

    #[test]
    fn test_format_catalog_chain() {
        let image = DiskImage::create(Geometry::dos33()).unwrap();
        let vtoc = Vtoc::load(&image).unwrap();

        let nodes: Vec<TrackSector> = ChainWalker::<CatalogLayout>::new(&image, vtoc.catalog)
            .map(|node| node.unwrap().0)
            .collect();

        assert_eq!(nodes.len(), 15);
        assert_eq!(nodes[0], TrackSector::new(17, 15));
        assert_eq!(nodes[14], TrackSector::new(17, 1));
    }

    #[test]
    fn test_format_reserves_system_tracks() {
        let image = DiskImage::create(Geometry::dos33()).unwrap();

        for sector in 0..16 {
            assert!(!bitmap::is_free(&image, TrackSector::new(0, sector)).unwrap());
            assert!(!bitmap::is_free(&image, TrackSector::new(17, sector)).unwrap());
            assert!(bitmap::is_free(&image, TrackSector::new(18, sector)).unwrap());
        }
        assert_eq!(bitmap::free_sector_count(&image).unwrap(), 33 * 16);
    }

    #[test]
    fn test_vtoc_display() {
        let image = DiskImage::create(Geometry::dos33()).unwrap();
        let report = Vtoc::load(&image).unwrap().to_string();

        assert!(report.contains("Catalog Track: 17"));
        assert!(report.contains("Volume Number: 254"));
        assert!(report.contains("Bytes Per Sector: 256"));
    }
}
