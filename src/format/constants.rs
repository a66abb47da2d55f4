/// DOS 3.3 on-disk layout constants

/// Sector size in bytes
pub const SECTOR_SIZE: usize = 256;

/// Tracks on a standard 5.25" image
pub const STANDARD_TRACKS: u8 = 35;

/// Sectors per track on a DOS 3.3 image
pub const STANDARD_SECTORS: u8 = 16;

/// Size of a standard 35-track image
pub const STANDARD_IMAGE_SIZE: usize = 143_360;

/// Track holding the VTOC and the catalog
pub const VTOC_TRACK: u8 = 17;

/// Sector holding the VTOC
pub const VTOC_SECTOR: u8 = 0;

/// Highest track count the VTOC bitmap can describe
pub const MAX_TRACKS: u8 = 50;

/// Highest sector count a 32-bit bitmap word can describe
pub const MAX_SECTORS_PER_TRACK: u8 = 32;

/// DOS release number written at init
pub const DOS_RELEASE: u8 = 3;

/// Default volume number
pub const DEFAULT_VOLUME: u8 = 254;

// VTOC field offsets

/// Catalog head track
pub const VTOC_CATALOG_TRACK: usize = 0x01;
/// Catalog head sector
pub const VTOC_CATALOG_SECTOR: usize = 0x02;
/// DOS release number
pub const VTOC_RELEASE: usize = 0x03;
/// Volume number
pub const VTOC_VOLUME: usize = 0x06;
/// Maximum track/sector pairs per list sector
pub const VTOC_MAX_PAIRS: usize = 0x27;
/// Last track where sectors were allocated
pub const VTOC_LAST_TRACK: usize = 0x30;
/// Allocation direction (+1 or -1)
pub const VTOC_DIRECTION: usize = 0x31;
/// Tracks per disk
pub const VTOC_TRACKS: usize = 0x34;
/// Sectors per track
pub const VTOC_SECTORS: usize = 0x35;
/// Bytes per sector (little endian)
pub const VTOC_BYTES_PER_SECTOR: usize = 0x36;
/// Start of the free sector bitmap
pub const VTOC_BITMAP: usize = 0x38;
/// Bitmap bytes per track
pub const BITMAP_BYTES_PER_TRACK: usize = 4;

// Catalog sector layout

/// Next catalog sector track
pub const CATALOG_NEXT_TRACK: usize = 0x01;
/// Next catalog sector sector
pub const CATALOG_NEXT_SECTOR: usize = 0x02;
/// First entry in a catalog sector
pub const CATALOG_FIRST_ENTRY: usize = 0x0B;
/// Size of a catalog entry
pub const CATALOG_ENTRY_SIZE: usize = 0x23;
/// Entries per catalog sector
pub const CATALOG_ENTRIES_PER_SECTOR: usize = 7;

// Catalog entry layout

/// Track/sector list track
pub const ENTRY_TS_TRACK: usize = 0x00;
/// Track/sector list sector
pub const ENTRY_TS_SECTOR: usize = 0x01;
/// File type and lock flag
pub const ENTRY_TYPE: usize = 0x02;
/// File name
pub const ENTRY_NAME: usize = 0x03;
/// File name length
pub const FILE_NAME_LEN: usize = 30;
/// Sector count (little endian)
pub const ENTRY_SECTOR_COUNT: usize = 0x21;
/// Track byte marking a deleted entry
pub const DELETED_MARKER: u8 = 0xFF;
/// Padding for file names (high-bit space)
pub const NAME_PAD: u8 = 0xA0;

// Track/sector list layout

/// Next list sector track
pub const TSLIST_NEXT_TRACK: usize = 0x01;
/// Next list sector sector
pub const TSLIST_NEXT_SECTOR: usize = 0x02;
/// Sector offset within the file of the first pair (little endian)
pub const TSLIST_SECTOR_OFFSET: usize = 0x05;
/// First track/sector pair
pub const TSLIST_FIRST_PAIR: usize = 0x0C;

// Binary file header

/// Size of the load address + length header on binary files
pub const BINARY_HEADER_SIZE: usize = 4;

/// Read a little-endian 16-bit value
#[inline]
pub fn read_u16le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Write a little-endian 16-bit value
#[inline]
pub fn write_u16le(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16le() {
        let data = [0x00, 0x34, 0x12, 0xFF];
        assert_eq!(read_u16le(&data, 1), 0x1234);
        assert_eq!(read_u16le(&data, 2), 0xFF12);
    }

    #[test]
    fn test_write_u16le() {
        let mut data = [0u8; 4];
        write_u16le(&mut data, 2, 0x9100);
        assert_eq!(data, [0x00, 0x00, 0x00, 0x91]);
        assert_eq!(read_u16le(&data, 2), 0x9100);
    }

    #[test]
    fn test_catalog_entries_fit_sector() {
        let end = CATALOG_FIRST_ENTRY + CATALOG_ENTRIES_PER_SECTOR * CATALOG_ENTRY_SIZE;
        assert_eq!(end, SECTOR_SIZE);
    }

    #[test]
    fn test_bitmap_fits_vtoc() {
        let end = VTOC_BITMAP + MAX_TRACKS as usize * BITMAP_BYTES_PER_TRACK;
        assert_eq!(end, SECTOR_SIZE);
    }
}
