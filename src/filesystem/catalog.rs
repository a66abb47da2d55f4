/// Catalog (directory) sectors and entries
///
/// Catalog format:
/// - Linked chain of sectors starting at the VTOC's catalog head
/// - Each sector holds 7 entries of 35 bytes from offset 0x0B
/// - An entry is a track/sector list pointer, a type byte, a 30 byte
///   high-bit ASCII name padded with 0xA0 and a 16-bit sector count
/// - A first pointer byte of 0xFF marks a deleted entry; the name is kept

use crate::error::{DosError, Result};
use crate::filesystem::chain::{CatalogLayout, ChainWalker};
use crate::filesystem::FileType;
use crate::format::*;
use crate::image::DiskImage;
use log::debug;

/// Lifecycle state of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Never used
    Unused,
    /// Holds a file
    Active,
    /// Deleted; name retained
    Deleted,
}

/// Position of an entry within the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSlot {
    /// Catalog sector holding the entry
    pub sector: TrackSector,
    /// Entry index within the sector (0-6)
    pub index: usize,
}

impl CatalogSlot {
    /// Byte offset of the entry within its sector
    pub fn offset(&self) -> usize {
        CATALOG_FIRST_ENTRY + self.index * CATALOG_ENTRY_SIZE
    }
}

/// Catalog entry (35 bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// First track/sector list sector
    pub ts_list: TrackSector,
    /// File type and lock flag
    pub file_type: FileType,
    /// Raw file name (high-bit ASCII, space padded)
    pub name: [u8; FILE_NAME_LEN],
    /// Number of sectors used
    pub sector_count: u16,
}

impl CatalogEntry {
    /// Parse an entry from its 35 bytes
    pub fn parse(data: &[u8]) -> Self {
        let mut name = [0u8; FILE_NAME_LEN];
        name.copy_from_slice(&data[ENTRY_NAME..ENTRY_NAME + FILE_NAME_LEN]);

        Self {
            ts_list: TrackSector::read(data, ENTRY_TS_TRACK),
            file_type: FileType(data[ENTRY_TYPE]),
            name,
            sector_count: read_u16le(data, ENTRY_SECTOR_COUNT),
        }
    }

    /// Store the entry into its 35 bytes
    pub fn write(&self, data: &mut [u8]) {
        data[ENTRY_TS_TRACK] = self.ts_list.track;
        data[ENTRY_TS_SECTOR] = self.ts_list.sector;
        data[ENTRY_TYPE] = self.file_type.0;
        data[ENTRY_NAME..ENTRY_NAME + FILE_NAME_LEN].copy_from_slice(&self.name);
        write_u16le(data, ENTRY_SECTOR_COUNT, self.sector_count);
    }

    /// Classify the entry
    pub fn state(&self) -> EntryState {
        if self.ts_list.track == DELETED_MARKER {
            EntryState::Deleted
        } else if self.ts_list.is_zero() && self.file_type.0 == 0 {
            EntryState::Unused
        } else {
            EntryState::Active
        }
    }

    /// Check whether a new file may be stored in this slot
    pub fn is_available(&self) -> bool {
        self.state() != EntryState::Active
    }

    /// File name with the high bit stripped and padding removed
    pub fn name_str(&self) -> String {
        decode_name(&self.name)
    }
}

/// Encode a file name as stored in the catalog
///
/// Names are upper-cased, stored with the high bit set and padded to 30
/// bytes with high-bit spaces.
pub fn encode_name(name: &str) -> Result<[u8; FILE_NAME_LEN]> {
    if name.is_empty() {
        return Err(DosError::InvalidFilename("name is empty".to_string()));
    }
    if name.len() > FILE_NAME_LEN {
        return Err(DosError::InvalidFilename(format!(
            "{} is longer than {} characters",
            name, FILE_NAME_LEN
        )));
    }

    let mut encoded = [NAME_PAD; FILE_NAME_LEN];
    for (slot, ch) in encoded.iter_mut().zip(name.chars()) {
        if !ch.is_ascii() || ch.is_ascii_control() {
            return Err(DosError::InvalidFilename(format!(
                "{} contains an invalid character",
                name
            )));
        }
        *slot = ch.to_ascii_uppercase() as u8 | 0x80;
    }
    Ok(encoded)
}

/// Decode a stored file name for display
pub fn decode_name(name: &[u8]) -> String {
    name.iter()
        .map(|&b| {
            let ch = b & 0x7F;
            if (0x20..0x7F).contains(&ch) {
                ch as char
            } else {
                ' '
            }
        })
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// One sector of the catalog chain
pub struct CatalogSector<'a> {
    /// Location of this sector
    pub location: TrackSector,
    data: &'a [u8],
}

impl<'a> CatalogSector<'a> {
    /// All seven entries of this sector, whatever their state
    pub fn entries(&self) -> impl Iterator<Item = (CatalogSlot, CatalogEntry)> + '_ {
        (0..CATALOG_ENTRIES_PER_SECTOR).map(move |index| {
            let slot = CatalogSlot {
                sector: self.location,
                index,
            };
            let offset = slot.offset();
            (
                slot,
                CatalogEntry::parse(&self.data[offset..offset + CATALOG_ENTRY_SIZE]),
            )
        })
    }
}

/// A file located by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundFile {
    /// Catalog position of the entry
    pub slot: CatalogSlot,
    /// First track/sector list sector
    pub ts_list: TrackSector,
    /// File type and lock flag
    pub file_type: FileType,
    /// Whether the contents are binary (any non-text type)
    pub is_binary: bool,
    /// Sector count from the entry
    pub sector_count: u16,
}

/// Walk the catalog chain lazily from its head
pub fn iterate_catalog(
    image: &DiskImage,
    head: TrackSector,
) -> impl Iterator<Item = Result<CatalogSector<'_>>> {
    ChainWalker::<CatalogLayout>::new(image, head)
        .map(|node| node.map(|(location, data)| CatalogSector { location, data }))
}

/// Every entry that is active or deleted, in catalog order
pub fn catalog_entries(
    image: &DiskImage,
    head: TrackSector,
) -> Result<Vec<(CatalogSlot, CatalogEntry)>> {
    let mut entries = Vec::new();
    for sector in iterate_catalog(image, head) {
        let sector = sector?;
        entries.extend(
            sector
                .entries()
                .filter(|(_, entry)| entry.state() != EntryState::Unused),
        );
    }
    Ok(entries)
}

/// Look up a file by name
///
/// The scan stops at the first entry whose stored name matches, deleted or
/// not. A deleted match therefore hides any later entry with the same name
/// and yields `None`. A name that cannot be stored matches nothing.
pub fn find_file(image: &DiskImage, head: TrackSector, name: &str) -> Result<Option<FoundFile>> {
    let Ok(wanted) = encode_name(name) else {
        return Ok(None);
    };

    for sector in iterate_catalog(image, head) {
        let sector = sector?;
        for (slot, entry) in sector.entries() {
            if entry.state() == EntryState::Unused || entry.name != wanted {
                continue;
            }
            if entry.state() == EntryState::Deleted {
                debug!("{} matches a deleted entry at {:?}", name, slot);
                return Ok(None);
            }
            return Ok(Some(FoundFile {
                slot,
                ts_list: entry.ts_list,
                file_type: entry.file_type,
                is_binary: entry.file_type.is_binary(),
                sector_count: entry.sector_count,
            }));
        }
    }

    Ok(None)
}

/// First slot that is unused or deleted
pub fn find_free_slot(image: &DiskImage, head: TrackSector) -> Result<Option<CatalogSlot>> {
    for sector in iterate_catalog(image, head) {
        let sector = sector?;
        let free = sector.entries().find(|(_, entry)| entry.is_available());
        if let Some((slot, _)) = free {
            return Ok(Some(slot));
        }
    }
    Ok(None)
}

/// Store an entry in the first free slot
///
/// Returns `DiskFull` when every slot of the chain is active.
pub fn add_entry(image: &mut DiskImage, head: TrackSector, entry: &CatalogEntry) -> Result<CatalogSlot> {
    let slot = find_free_slot(image, head)?.ok_or(DosError::DiskFull)?;
    write_entry(image, slot, entry)?;
    debug!("catalog entry {} stored at {:?}", entry.name_str(), slot);
    Ok(slot)
}

/// Read the entry at a slot
pub fn read_entry(image: &DiskImage, slot: CatalogSlot) -> Result<CatalogEntry> {
    let data = image.read_sector(slot.sector)?;
    let offset = slot.offset();
    Ok(CatalogEntry::parse(&data[offset..offset + CATALOG_ENTRY_SIZE]))
}

/// Overwrite the entry at a slot
pub fn write_entry(image: &mut DiskImage, slot: CatalogSlot, entry: &CatalogEntry) -> Result<()> {
    let data = image.sector_mut(slot.sector)?;
    let offset = slot.offset();
    entry.write(&mut data[offset..offset + CATALOG_ENTRY_SIZE]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::vtoc::Vtoc;

    fn formatted() -> (DiskImage, TrackSector) {
        let image = DiskImage::create(Geometry::dos33()).unwrap();
        let head = Vtoc::load(&image).unwrap().catalog;
        (image, head)
    }

    fn entry(name: &str, ts_list: TrackSector, file_type: u8) -> CatalogEntry {
        CatalogEntry {
            ts_list,
            file_type: FileType(file_type),
            name: encode_name(name).unwrap(),
            sector_count: 1,
        }
    }

    #[test]
    fn test_encode_name() {
        let name = encode_name("hello").unwrap();
        assert_eq!(&name[..5], &[0xC8, 0xC5, 0xCC, 0xCC, 0xCF]);
        assert!(name[5..].iter().all(|&b| b == 0xA0));
        assert_eq!(decode_name(&name), "HELLO");
    }

    #[test]
    fn test_encode_invalid_names() {
        assert!(encode_name("").is_err());
        assert!(encode_name(&"X".repeat(31)).is_err());
        assert!(encode_name("CAFÉ").is_err());
        assert!(encode_name(&"X".repeat(30)).is_ok());
    }

    #[test]
    fn test_entry_parse_write() {
        let mut data = [0u8; CATALOG_ENTRY_SIZE];
        let original = entry("PROGRAM", TrackSector::new(18, 15), 0x84);
        original.write(&mut data);

        assert_eq!(data[0], 18);
        assert_eq!(data[1], 15);
        assert_eq!(data[2], 0x84);
        assert_eq!(data[0x21], 1);

        let parsed = CatalogEntry::parse(&data);
        assert_eq!(parsed, original);
        assert_eq!(parsed.state(), EntryState::Active);
        assert!(parsed.file_type.is_locked());
    }

    #[test]
    fn test_entry_states() {
        let unused = CatalogEntry::parse(&[0u8; CATALOG_ENTRY_SIZE]);
        assert_eq!(unused.state(), EntryState::Unused);
        assert!(unused.is_available());

        let mut data = [0u8; CATALOG_ENTRY_SIZE];
        entry("GONE", TrackSector::new(20, 3), 0x04).write(&mut data);
        data[0] = 0xFF;
        let deleted = CatalogEntry::parse(&data);
        assert_eq!(deleted.state(), EntryState::Deleted);
        assert!(deleted.is_available());
        assert_eq!(deleted.name_str(), "GONE");
    }

    #[test]
    fn test_empty_catalog() {
        let (image, head) = formatted();
        assert_eq!(iterate_catalog(&image, head).count(), 15);
        assert!(catalog_entries(&image, head).unwrap().is_empty());
        assert!(find_file(&image, head, "HELLO").unwrap().is_none());
    }

    #[test]
    fn test_find_unstorable_names() {
        let (image, head) = formatted();
        assert!(find_file(&image, head, &"A".repeat(31)).unwrap().is_none());
        assert!(find_file(&image, head, "").unwrap().is_none());
        assert!(find_file(&image, head, "CAFÉ").unwrap().is_none());
    }

    #[test]
    fn test_add_and_find() {
        let (mut image, head) = formatted();
        let slot = add_entry(&mut image, head, &entry("HELLO", TrackSector::new(18, 0), 0x04)).unwrap();
        assert_eq!(slot, CatalogSlot { sector: head, index: 0 });

        let found = find_file(&image, head, "hello").unwrap().unwrap();
        assert_eq!(found.ts_list, TrackSector::new(18, 0));
        assert!(found.is_binary);
        assert_eq!(found.slot, slot);

        let second = add_entry(&mut image, head, &entry("NOTES", TrackSector::new(18, 2), 0x00)).unwrap();
        assert_eq!(second.index, 1);
        let notes = find_file(&image, head, "NOTES").unwrap().unwrap();
        assert!(!notes.is_binary);
    }

    #[test]
    fn test_deleted_slot_reused() {
        let (mut image, head) = formatted();
        let slot = add_entry(&mut image, head, &entry("OLD", TrackSector::new(18, 0), 0x04)).unwrap();
        add_entry(&mut image, head, &entry("KEEP", TrackSector::new(18, 2), 0x04)).unwrap();

        image.sector_mut(slot.sector).unwrap()[slot.offset()] = DELETED_MARKER;
        assert!(find_file(&image, head, "OLD").unwrap().is_none());

        let reused = add_entry(&mut image, head, &entry("NEW", TrackSector::new(19, 0), 0x04)).unwrap();
        assert_eq!(reused, slot);
        assert_eq!(read_entry(&image, slot).unwrap().name_str(), "NEW");
    }

    #[test]
    fn test_deleted_name_shadows_later_entry() {
        let (mut image, head) = formatted();
        let slot = add_entry(&mut image, head, &entry("TWIN", TrackSector::new(18, 0), 0x04)).unwrap();
        image.sector_mut(slot.sector).unwrap()[slot.offset()] = DELETED_MARKER;

        let mut later = entry("TWIN", TrackSector::new(19, 0), 0x04);
        later.sector_count = 2;
        let later_slot = CatalogSlot { sector: head, index: 3 };
        write_entry(&mut image, later_slot, &later).unwrap();

        assert!(find_file(&image, head, "TWIN").unwrap().is_none());
    }

    #[test]
    fn test_catalog_spills_to_next_sector() {
        let (mut image, head) = formatted();
        for i in 0..8 {
            add_entry(&mut image, head, &entry(&format!("F{}", i), TrackSector::new(18, i), 0x04)).unwrap();
        }

        let found = find_file(&image, head, "F7").unwrap().unwrap();
        assert_eq!(found.slot, CatalogSlot { sector: TrackSector::new(17, 14), index: 0 });
        assert_eq!(catalog_entries(&image, head).unwrap().len(), 8);
    }

    #[test]
    fn test_catalog_full() {
        let (mut image, head) = formatted();
        for i in 0..15 * 7 {
            add_entry(&mut image, head, &entry(&format!("F{}", i), TrackSector::new(18, 0), 0x04)).unwrap();
        }

        let result = add_entry(&mut image, head, &entry("ONE MORE", TrackSector::new(18, 0), 0x04));
        assert!(matches!(result, Err(DosError::DiskFull)));
    }
}
