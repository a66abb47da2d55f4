/// Free sector bitmap
///
/// Each track has a 4-byte entry in the VTOC, read as a big-endian 32-bit
/// word. The sectors occupy the top bits: on a 16-sector disk byte 0 holds
/// sectors 15-8 and byte 1 sectors 7-0. A set bit means the sector is free.
///
/// Track 0 is never handed out: a (0,0) pair ends a track/sector list.

use crate::error::{DosError, Result};
use crate::format::*;
use crate::image::DiskImage;
use log::{debug, warn};

/// Bitmap word with every sector of a track free
pub fn full_track_mask(sectors_per_track: u8) -> u32 {
    if sectors_per_track as u32 >= u32::BITS {
        u32::MAX
    } else {
        !(u32::MAX >> sectors_per_track)
    }
}

/// Bit of a sector within its track's bitmap word
fn sector_bit(geometry: &Geometry, sector: u8) -> u32 {
    1 << (sector as u32 + u32::BITS - geometry.sectors_per_track as u32)
}

fn check(image: &DiskImage, ts: TrackSector) -> Result<()> {
    if image.geometry().contains(ts) {
        Ok(())
    } else {
        Err(DosError::InvalidTrackSector {
            track: ts.track,
            sector: ts.sector,
        })
    }
}

/// Read the bitmap word of a track
pub fn track_map(image: &DiskImage, track: u8) -> Result<u32> {
    let vtoc = image.read_sector(image.geometry().vtoc())?;
    let offset = VTOC_BITMAP + track as usize * BITMAP_BYTES_PER_TRACK;
    Ok(u32::from_be_bytes([
        vtoc[offset],
        vtoc[offset + 1],
        vtoc[offset + 2],
        vtoc[offset + 3],
    ]))
}

/// Overwrite the bitmap word of a track
pub fn set_track_map(image: &mut DiskImage, track: u8, map: u32) -> Result<()> {
    let vtoc_ts = image.geometry().vtoc();
    let vtoc = image.sector_mut(vtoc_ts)?;
    let offset = VTOC_BITMAP + track as usize * BITMAP_BYTES_PER_TRACK;
    vtoc[offset..offset + BITMAP_BYTES_PER_TRACK].copy_from_slice(&map.to_be_bytes());
    Ok(())
}

/// Check whether a sector is marked free
pub fn is_free(image: &DiskImage, ts: TrackSector) -> Result<bool> {
    check(image, ts)?;
    Ok(track_map(image, ts.track)? & sector_bit(image.geometry(), ts.sector) != 0)
}

/// Mark a sector as used
pub fn mark_used(image: &mut DiskImage, ts: TrackSector) -> Result<()> {
    check(image, ts)?;
    let map = track_map(image, ts.track)?;
    let bit = sector_bit(image.geometry(), ts.sector);
    set_track_map(image, ts.track, map & !bit)
}

/// Mark a sector as free
pub fn mark_free(image: &mut DiskImage, ts: TrackSector) -> Result<()> {
    check(image, ts)?;
    let map = track_map(image, ts.track)?;
    let bit = sector_bit(image.geometry(), ts.sector);
    set_track_map(image, ts.track, map | bit)
}

/// Count the free sectors on the disk
pub fn free_sector_count(image: &DiskImage) -> Result<usize> {
    count_free(image, 0)
}

/// Count the free sectors [`allocate_sector`] may hand out
pub fn allocatable_sector_count(image: &DiskImage) -> Result<usize> {
    count_free(image, 1)
}

fn count_free(image: &DiskImage, first_track: u8) -> Result<usize> {
    let geometry = *image.geometry();
    let mask = full_track_mask(geometry.sectors_per_track);
    let mut free = 0;
    for track in first_track..geometry.tracks {
        free += (track_map(image, track)? & mask).count_ones() as usize;
    }
    Ok(free)
}

/// Allocate the next free sector
///
/// The search starts on the VTOC's last-allocated track, scans its sectors
/// from 0 upward, then moves to the following track, wrapping after the last
/// one. Track 0 is skipped. The found sector is marked used and becomes the
/// new cursor track.
pub fn allocate_sector(image: &mut DiskImage) -> Result<TrackSector> {
    let geometry = *image.geometry();
    let vtoc_ts = geometry.vtoc();

    let mut start = image.read_sector(vtoc_ts)?[VTOC_LAST_TRACK];
    if start >= geometry.tracks {
        warn!("VTOC last allocated track {} is outside the disk", start);
        start = VTOC_TRACK;
    }

    for step in 0..geometry.tracks as usize {
        let track = ((start as usize + step) % geometry.tracks as usize) as u8;
        if track == 0 {
            continue;
        }
        let map = track_map(image, track)?;

        let free = (0..geometry.sectors_per_track).find(|&s| map & sector_bit(&geometry, s) != 0);
        if let Some(sector) = free {
            set_track_map(image, track, map & !sector_bit(&geometry, sector))?;
            image.sector_mut(vtoc_ts)?[VTOC_LAST_TRACK] = track;

            let ts = TrackSector::new(track, sector);
            debug!("allocated {}", ts);
            return Ok(ts);
        }
    }

    Err(DosError::DiskFull)
}
