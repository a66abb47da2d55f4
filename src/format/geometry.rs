/// Disk geometry and track/sector addressing

use crate::error::{DosError, Result};
use crate::format::constants::*;
use std::fmt;

/// A (track, sector) coordinate on the disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackSector {
    /// Track number
    pub track: u8,
    /// Sector number within the track
    pub sector: u8,
}

impl TrackSector {
    /// Create a new track/sector pair
    pub const fn new(track: u8, sector: u8) -> Self {
        Self { track, sector }
    }

    /// Read a pair stored as two consecutive bytes
    pub fn read(data: &[u8], offset: usize) -> Self {
        Self::new(data[offset], data[offset + 1])
    }

    /// The (0,0) pair the on-disk format uses as a terminator
    pub fn is_zero(&self) -> bool {
        self.track == 0 && self.sector == 0
    }
}

impl fmt::Display for TrackSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{:02}/S{:02}", self.track, self.sector)
    }
}

/// Disk geometry
///
/// Passed to every component through the owning [`crate::DiskImage`] so the
/// same code serves 35 and 40 track images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Number of tracks
    pub tracks: u8,
    /// Sectors per track
    pub sectors_per_track: u8,
    /// Sector size in bytes
    pub sector_size: u16,
}

impl Geometry {
    /// Create a geometry, validating it against the DOS 3.3 layout
    pub fn new(tracks: u8, sectors_per_track: u8, sector_size: u16) -> Result<Self> {
        let geometry = Self {
            tracks,
            sectors_per_track,
            sector_size,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Standard DOS 3.3 5.25" disk (35 tracks, 16 sectors, 256 bytes)
    pub const fn dos33() -> Self {
        Self {
            tracks: STANDARD_TRACKS,
            sectors_per_track: STANDARD_SECTORS,
            sector_size: SECTOR_SIZE as u16,
        }
    }

    /// 40 track DOS 3.3 disk
    pub const fn dos33_40_track() -> Self {
        Self {
            tracks: 40,
            sectors_per_track: STANDARD_SECTORS,
            sector_size: SECTOR_SIZE as u16,
        }
    }

    /// Check the geometry fits the VTOC and catalog layout
    pub fn validate(&self) -> Result<()> {
        if self.sector_size as usize != SECTOR_SIZE {
            return Err(DosError::invalid_format(format!(
                "sector size must be {} bytes, got {}",
                SECTOR_SIZE, self.sector_size
            )));
        }
        if self.sectors_per_track < 2 || self.sectors_per_track > MAX_SECTORS_PER_TRACK {
            return Err(DosError::invalid_format(format!(
                "sectors per track must be 2-{}, got {}",
                MAX_SECTORS_PER_TRACK, self.sectors_per_track
            )));
        }
        if self.tracks <= VTOC_TRACK || self.tracks > MAX_TRACKS {
            return Err(DosError::invalid_format(format!(
                "track count must be {}-{}, got {}",
                VTOC_TRACK + 1,
                MAX_TRACKS,
                self.tracks
            )));
        }
        Ok(())
    }

    /// Bytes in one track
    pub fn track_size(&self) -> usize {
        self.sectors_per_track as usize * self.sector_size as usize
    }

    /// Bytes in the whole image
    pub fn total_bytes(&self) -> usize {
        self.tracks as usize * self.track_size()
    }

    /// Number of sectors in the whole image
    pub fn total_sectors(&self) -> usize {
        self.tracks as usize * self.sectors_per_track as usize
    }

    /// Track/sector pairs that fit in one list sector
    pub fn max_pairs_per_list(&self) -> usize {
        (self.sector_size as usize - TSLIST_FIRST_PAIR) / 2
    }

    /// Check whether a pair lies within the geometry
    pub fn contains(&self, ts: TrackSector) -> bool {
        ts.track < self.tracks && ts.sector < self.sectors_per_track
    }

    /// Byte offset of a sector in the flat image buffer
    ///
    /// No validation is done here beyond a debug assertion; callers that
    /// handle untrusted pointers check [`Geometry::contains`] first.
    #[inline]
    pub fn offset(&self, ts: TrackSector) -> usize {
        debug_assert!(self.contains(ts), "{} outside geometry", ts);
        ts.sector as usize * self.sector_size as usize + ts.track as usize * self.track_size()
    }

    /// The VTOC location
    pub fn vtoc(&self) -> TrackSector {
        TrackSector::new(VTOC_TRACK, VTOC_SECTOR)
    }

    /// All sectors in track-major, sector-minor order
    pub fn sectors(&self) -> impl Iterator<Item = TrackSector> + '_ {
        (0..self.tracks).flat_map(move |track| {
            (0..self.sectors_per_track).map(move |sector| TrackSector::new(track, sector))
        })
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::dos33()
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tracks x {} sectors x {} bytes",
            self.tracks, self.sectors_per_track, self.sector_size
        )
    }
}
