/// DOS 3.3 filesystem session

use crate::error::{DosError, Result};
use crate::filesystem::catalog::{self, CatalogEntry, CatalogSlot, EntryState, FoundFile};
use crate::filesystem::tslist::{self, BinaryFile, TsListSector};
use crate::filesystem::{bitmap, DirEntry, FileSystem, FileSystemInfo, FileType, Vtoc};
use crate::format::*;
use crate::image::DiskImage;
use log::{debug, info, warn};
use std::path::Path;

/// A mounted DOS 3.3 volume
///
/// Borrows the image for the whole session and caches the catalog head read
/// from the VTOC at mount time.
pub struct Dos33FileSystem<'a> {
    image: &'a mut DiskImage,
    catalog_head: TrackSector,
}

impl<'a> Dos33FileSystem<'a> {
    /// Mount the volume held in an image
    pub fn mount(image: &'a mut DiskImage) -> Result<Self> {
        let vtoc = Vtoc::load(image)?;
        if !image.geometry().contains(vtoc.catalog) {
            return Err(DosError::malformed(format!(
                "catalog head {} is outside the disk",
                vtoc.catalog
            )));
        }

        debug!("mounted volume {} with catalog at {}", vtoc.volume, vtoc.catalog);
        Ok(Self {
            image,
            catalog_head: vtoc.catalog,
        })
    }

    /// The underlying image
    pub fn image(&self) -> &DiskImage {
        self.image
    }

    /// First catalog sector
    pub fn catalog_head(&self) -> TrackSector {
        self.catalog_head
    }

    /// Decode the VTOC
    pub fn vtoc(&self) -> Result<Vtoc> {
        Vtoc::load(self.image)
    }

    /// Active and deleted catalog entries in catalog order
    pub fn catalog_entries(&self) -> Result<Vec<(CatalogSlot, CatalogEntry)>> {
        catalog::catalog_entries(self.image, self.catalog_head)
    }

    /// Look up a file, `None` if it is not in the catalog
    pub fn find_file(&self, name: &str) -> Result<Option<FoundFile>> {
        catalog::find_file(self.image, self.catalog_head, name)
    }

    fn lookup(&self, name: &str) -> Result<FoundFile> {
        self.find_file(name)?
            .ok_or_else(|| DosError::FileNotFound(name.to_string()))
    }

    /// Add a binary file loaded at `load_address`
    pub fn add_file(&mut self, name: &str, data: &[u8], load_address: u16) -> Result<CatalogSlot> {
        self.add_typed_file(name, data, FileType(FileType::BINARY), Some(load_address))
    }

    /// Add a text file
    pub fn add_text_file(&mut self, name: &str, text: &str) -> Result<CatalogSlot> {
        let encoded = tslist::encode_text(text)?;
        self.add_typed_file(name, &encoded, FileType(FileType::TEXT), None)
    }

    /// Add a file of any type
    ///
    /// The name, the catalog slot and the free space are all checked before
    /// anything is written, so a failure leaves the image as it was.
    pub fn add_typed_file(
        &mut self,
        name: &str,
        data: &[u8],
        file_type: FileType,
        load_address: Option<u16>,
    ) -> Result<CatalogSlot> {
        let encoded_name = catalog::encode_name(name)?;
        if self.find_file(name)?.is_some() {
            return Err(DosError::FileExists(name.to_string()));
        }
        if catalog::find_free_slot(self.image, self.catalog_head)?.is_none() {
            return Err(DosError::DiskFull);
        }

        let chain = tslist::write_file_chain(self.image, data, load_address)?;
        let entry = CatalogEntry {
            ts_list: chain.first,
            file_type,
            name: encoded_name,
            sector_count: chain.sector_count,
        };
        let slot = catalog::add_entry(self.image, self.catalog_head, &entry)?;

        info!(
            "added {} ({}, {} sectors) with list at {}",
            name, file_type, chain.sector_count, chain.first
        );
        Ok(slot)
    }

    /// Read a binary file
    pub fn read_binary(&self, name: &str) -> Result<BinaryFile> {
        let file = self.lookup(name)?;
        tslist::materialize_binary(self.image, file.ts_list)
    }

    /// Read a text file
    pub fn read_text(&self, name: &str) -> Result<String> {
        let file = self.lookup(name)?;
        tslist::materialize_text(self.image, file.ts_list)
    }

    /// Track/sector list sectors of a file
    pub fn ts_lists(&self, name: &str) -> Result<Vec<TsListSector>> {
        let file = self.lookup(name)?;
        tslist::ts_list_sectors(self.image, file.ts_list)
    }

    /// Write a file's contents to a host path
    ///
    /// Binary files are written verbatim without their header, text files
    /// as rendered text. Returns the number of bytes written.
    pub fn extract_file<P: AsRef<Path>>(&self, name: &str, path: P) -> Result<usize> {
        let data = self.read_file(name)?;
        std::fs::write(path.as_ref(), &data)?;
        info!("extracted {} to {}", name, path.as_ref().display());
        Ok(data.len())
    }

    /// Set or clear the lock flag of a file
    pub fn set_locked(&mut self, name: &str, locked: bool) -> Result<()> {
        let file = self.lookup(name)?;
        let mut entry = catalog::read_entry(self.image, file.slot)?;
        entry.file_type = entry.file_type.with_locked(locked);
        catalog::write_entry(self.image, file.slot, &entry)?;
        debug!("{} {}", name, if locked { "locked" } else { "unlocked" });
        Ok(())
    }

    /// Copy a system loader image over the start of the disk
    ///
    /// The source is laid down sector by sector in track-major order from
    /// (0,0) and every sector it covers is marked used. Returns the number of
    /// sectors written.
    pub fn add_system_loader(&mut self, loader: &[u8]) -> Result<usize> {
        let geometry = *self.image.geometry();
        let sector_size = geometry.sector_size as usize;

        if loader.len() % sector_size != 0 {
            return Err(DosError::UnalignedSource { size: loader.len() });
        }

        let count = loader.len() / sector_size;
        let limit = VTOC_TRACK as usize * geometry.sectors_per_track as usize;
        if count > limit {
            return Err(DosError::invalid_format(format!(
                "loader of {} sectors would overwrite the VTOC track",
                count
            )));
        }

        for (ts, chunk) in geometry.sectors().zip(loader.chunks(sector_size)) {
            if ts.track != 0 && !bitmap::is_free(self.image, ts)? {
                warn!("loader overwrites {} which is already in use", ts);
            }
            self.image.write_sector(ts, chunk)?;
            bitmap::mark_used(self.image, ts)?;
        }

        info!("added system loader of {} sectors", count);
        Ok(count)
    }

    /// Sectors marked free in the bitmap
    pub fn free_sector_count(&self) -> Result<usize> {
        bitmap::free_sector_count(self.image)
    }

    /// Catalog listing including deleted entries
    pub fn read_dir_all(&self) -> Result<Vec<DirEntry>> {
        Ok(self
            .catalog_entries()?
            .into_iter()
            .map(|(_, entry)| DirEntry {
                name: entry.name_str(),
                file_type: entry.file_type,
                sector_count: entry.sector_count,
                ts_list: entry.ts_list,
                deleted: entry.state() == EntryState::Deleted,
            })
            .collect())
    }
}

impl FileSystem for Dos33FileSystem<'_> {
    fn read_dir(&self) -> Result<Vec<DirEntry>> {
        Ok(self
            .read_dir_all()?
            .into_iter()
            .filter(|entry| !entry.deleted)
            .collect())
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let file = self.lookup(name)?;
        if file.is_binary {
            Ok(tslist::materialize_binary(self.image, file.ts_list)?.data)
        } else {
            Ok(tslist::materialize_text(self.image, file.ts_list)?.into_bytes())
        }
    }

    /// Mark the entry deleted. The name is retained and the file's sectors
    /// stay allocated.
    fn delete_file(&mut self, name: &str) -> Result<()> {
        let file = self.lookup(name)?;
        if file.file_type.is_locked() {
            return Err(DosError::FileLocked(name.to_string()));
        }

        let sector = self.image.sector_mut(file.slot.sector)?;
        sector[file.slot.offset() + ENTRY_TS_TRACK] = DELETED_MARKER;
        info!("deleted {}", name);
        Ok(())
    }

    fn info(&self) -> Result<FileSystemInfo> {
        let vtoc = self.vtoc()?;
        let geometry = self.image.geometry();
        let files = self
            .catalog_entries()?
            .iter()
            .filter(|(_, entry)| entry.state() == EntryState::Active)
            .count();

        Ok(FileSystemInfo {
            fs_type: "DOS 3.3".to_string(),
            volume: vtoc.volume,
            total_sectors: geometry.total_sectors(),
            free_sectors: self.free_sector_count()?,
            sector_size: geometry.sector_size as usize,
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatted() -> DiskImage {
        DiskImage::create(Geometry::dos33()).unwrap()
    }

    #[test]
    fn test_mount_empty_volume() {
        let mut image = formatted();
        let fs = Dos33FileSystem::mount(&mut image).unwrap();
        assert_eq!(fs.catalog_head(), TrackSector::new(17, 15));
        assert!(fs.read_dir().unwrap().is_empty());
        assert!(fs.find_file("HELLO").unwrap().is_none());
    }

    #[test]
    fn test_mount_bad_catalog_head() {
        let mut image = formatted();
        image.sector_mut(TrackSector::new(17, 0)).unwrap()[VTOC_CATALOG_TRACK] = 90;
        assert!(matches!(
            Dos33FileSystem::mount(&mut image),
            Err(DosError::MalformedImage(_))
        ));
    }

    #[test]
    fn test_add_and_read_binary() {
        let mut image = formatted();
        let mut fs = Dos33FileSystem::mount(&mut image).unwrap();

        fs.add_file("HELLO", &[0xA9, 0x00, 0x60], 0x0300).unwrap();
        let file = fs.read_binary("HELLO").unwrap();
        assert_eq!(file.load_address, 0x0300);
        assert_eq!(file.data, vec![0xA9, 0x00, 0x60]);

        let entries = fs.read_dir().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "HELLO");
        assert_eq!(entries[0].file_type, FileType(FileType::BINARY));
    }

    #[test]
    fn test_add_duplicate_name() {
        let mut image = formatted();
        let mut fs = Dos33FileSystem::mount(&mut image).unwrap();
        fs.add_file("TWICE", &[1], 0x0800).unwrap();

        let free = fs.free_sector_count().unwrap();
        assert!(matches!(
            fs.add_file("twice", &[2], 0x0800),
            Err(DosError::FileExists(_))
        ));
        assert_eq!(fs.free_sector_count().unwrap(), free);
    }

    #[test]
    fn test_text_file() {
        let mut image = formatted();
        let mut fs = Dos33FileSystem::mount(&mut image).unwrap();
        fs.add_text_file("NOTES", "LINE ONE\nLINE TWO\n").unwrap();

        assert_eq!(fs.read_text("NOTES").unwrap(), "LINE ONE\nLINE TWO\n");
        assert_eq!(fs.read_file("NOTES").unwrap(), b"LINE ONE\nLINE TWO\n".to_vec());
        assert!(fs.find_file("NOTES").unwrap().map(|f| !f.is_binary).unwrap());
    }

    #[test]
    fn test_read_missing_file() {
        let mut image = formatted();
        let fs = Dos33FileSystem::mount(&mut image).unwrap();
        assert!(matches!(fs.read_file("NOPE"), Err(DosError::FileNotFound(_))));
    }

    #[test]
    fn test_delete_keeps_name_and_sectors() {
        let mut image = formatted();
        let mut fs = Dos33FileSystem::mount(&mut image).unwrap();
        fs.add_file("GONE", &[1, 2, 3], 0x0800).unwrap();
        let free = fs.free_sector_count().unwrap();

        fs.delete_file("GONE").unwrap();
        assert!(fs.find_file("GONE").unwrap().is_none());
        assert!(fs.read_dir().unwrap().is_empty());
        assert_eq!(fs.free_sector_count().unwrap(), free);

        let all = fs.read_dir_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "GONE");
        assert!(all[0].deleted);
    }

    #[test]
    fn test_locked_file_cannot_be_deleted() {
        let mut image = formatted();
        let mut fs = Dos33FileSystem::mount(&mut image).unwrap();
        fs.add_file("SAFE", &[0], 0x0800).unwrap();
        fs.set_locked("SAFE", true).unwrap();

        assert!(fs.find_file("SAFE").unwrap().unwrap().file_type.is_locked());
        assert!(matches!(fs.delete_file("SAFE"), Err(DosError::FileLocked(_))));

        fs.set_locked("SAFE", false).unwrap();
        fs.delete_file("SAFE").unwrap();
    }

    #[test]
    fn test_system_loader() {
        let mut image = formatted();
        let mut fs = Dos33FileSystem::mount(&mut image).unwrap();
        let loader = vec![0x4C; 18 * 256];

        assert_eq!(fs.add_system_loader(&loader).unwrap(), 18);
        assert_eq!(fs.image().data()[..loader.len()], loader[..]);
        assert!(!bitmap::is_free(fs.image(), TrackSector::new(1, 1)).unwrap());
        assert!(bitmap::is_free(fs.image(), TrackSector::new(1, 2)).unwrap());
    }

    #[test]
    fn test_system_loader_unaligned() {
        let mut image = formatted();
        let mut fs = Dos33FileSystem::mount(&mut image).unwrap();
        assert!(matches!(
            fs.add_system_loader(&[0; 300]),
            Err(DosError::UnalignedSource { size: 300 })
        ));
    }

    #[test]
    fn test_system_loader_over_vtoc() {
        let mut image = formatted();
        let mut fs = Dos33FileSystem::mount(&mut image).unwrap();
        let loader = vec![0; 18 * 4096];
        assert!(matches!(
            fs.add_system_loader(&loader),
            Err(DosError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_free_track_zero_is_not_used_for_files() {
        let mut image = formatted();
        bitmap::set_track_map(&mut image, 0, bitmap::full_track_mask(16)).unwrap();
        for track in 1..35 {
            bitmap::set_track_map(&mut image, track, 0).unwrap();
        }

        let mut fs = Dos33FileSystem::mount(&mut image).unwrap();
        assert!(matches!(
            fs.add_text_file("NOTES", "HELLO\n"),
            Err(DosError::DiskFull)
        ));
        assert!(fs.read_dir().unwrap().is_empty());
    }

    #[test]
    fn test_two_sector_tracks() {
        let geometry = Geometry::new(35, 2, 256).unwrap();
        let mut image = DiskImage::create(geometry).unwrap();
        let mut fs = Dos33FileSystem::mount(&mut image).unwrap();
        assert_eq!(fs.catalog_head(), TrackSector::new(17, 1));

        fs.add_file("TINY", &[1, 2], 0x0300).unwrap();
        assert_eq!(fs.read_binary("TINY").unwrap().data, vec![1, 2]);
    }

    #[test]
    fn test_info() {
        let mut image = formatted();
        let mut fs = Dos33FileSystem::mount(&mut image).unwrap();
        fs.add_file("A", &[0; 10], 0x0800).unwrap();

        let info = fs.info().unwrap();
        assert_eq!(info.fs_type, "DOS 3.3");
        assert_eq!(info.volume, 254);
        assert_eq!(info.total_sectors, 560);
        assert_eq!(info.free_sectors, 33 * 16 - 2);
        assert_eq!(info.files, 1);
    }

    #[test]
    fn test_extract_binary() {
        let mut image = formatted();
        let mut fs = Dos33FileSystem::mount(&mut image).unwrap();
        fs.add_file("DATA", &[9, 8, 7], 0x4000).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        assert_eq!(fs.extract_file("DATA", &path).unwrap(), 3);
        assert_eq!(std::fs::read(&path).unwrap(), vec![9, 8, 7]);
    }
}
