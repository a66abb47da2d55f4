/// Free sector map visualization

use crate::error::Result;
use crate::filesystem::bitmap;
use crate::format::{TrackSector, VTOC_TRACK};
use crate::image::DiskImage;
use std::fmt::Write;

/// ANSI color codes for sector map
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BRIGHT_WHITE: &str = "\x1b[97m";
    pub const DARK_WHITE: &str = "\x1b[37m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
}

const BLOCK_FREE: &str = "\u{2591}"; // ░
const BLOCK_USED: &str = "\u{2593}"; // ▓

/// Render the bitmap as a grid of sectors (rows) by tracks (columns)
///
/// Used sectors on the boot and VTOC tracks are highlighted when `color` is
/// set.
pub fn render_free_map(image: &DiskImage, color: bool) -> Result<String> {
    let geometry = *image.geometry();
    let num_tracks = geometry.tracks as usize;
    let mut out = String::new();

    let _ = writeln!(out, "=== Free Sector Map ===");
    if color {
        let _ = writeln!(
            out,
            "Legend: {}{} Used{} {}{} Free{} {}{} System{}",
            colors::BRIGHT_WHITE, BLOCK_USED, colors::RESET,
            colors::DARK_WHITE, BLOCK_FREE, colors::RESET,
            colors::BRIGHT_YELLOW, BLOCK_USED, colors::RESET
        );
    } else {
        let _ = writeln!(out, "Legend: {} Used {} Free", BLOCK_USED, BLOCK_FREE);
    }
    out.push('\n');

    // Sector 0 at the bottom
    for sector in (0..geometry.sectors_per_track).rev() {
        let _ = write!(out, "{:>2} ", sector);

        for track in 0..geometry.tracks {
            let free = bitmap::is_free(image, TrackSector::new(track, sector))?;
            let block = if free { BLOCK_FREE } else { BLOCK_USED };

            if color {
                let shade = if free {
                    colors::DARK_WHITE
                } else if track == 0 || track == VTOC_TRACK {
                    colors::BRIGHT_YELLOW
                } else {
                    colors::BRIGHT_WHITE
                };
                let _ = write!(out, "{}{}{}", shade, block, colors::RESET);
            } else {
                out.push_str(block);
            }
        }
        out.push('\n');
    }

    // Track number axis
    out.push_str("   ");
    let mut printed_cols = vec![false; num_tracks];
    for track in 0..num_tracks {
        if track % 5 == 0 && !printed_cols[track] {
            for (i, digit) in track.to_string().chars().enumerate() {
                let col = track + i;
                if col < num_tracks {
                    out.push(digit);
                    printed_cols[col] = true;
                }
            }
        } else if !printed_cols[track] {
            out.push(' ');
        }
    }
    out.push('\n');

    Ok(out)
}

/// Print the free sector map to stdout
pub fn draw_free_map(image: &DiskImage) -> Result<()> {
    print!("{}", render_free_map(image, true)?);
    Ok(())
}
