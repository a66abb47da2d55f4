/// DOS 3.3 geometry and on-disk layout

/// Layout constants and field helpers
pub mod constants;
/// Geometry configuration and track/sector addressing
pub mod geometry;

pub use constants::*;
pub use geometry::{Geometry, TrackSector};

/// Infer the geometry of a raw image from its size
///
/// Images are a whole number of 16-sector tracks; the track count must be one
/// the VTOC can describe.
pub fn geometry_for_size(size: usize) -> Option<Geometry> {
    let track_size = STANDARD_SECTORS as usize * SECTOR_SIZE;
    if size == 0 || size % track_size != 0 {
        return None;
    }
    let tracks = u8::try_from(size / track_size).ok()?;
    let geometry = Geometry {
        tracks,
        sectors_per_track: STANDARD_SECTORS,
        sector_size: SECTOR_SIZE as u16,
    };
    geometry.validate().ok().map(|_| geometry)
}
