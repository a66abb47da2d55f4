/// DOS 3.3 filesystem structures
///
/// The low-level modules work directly on a [`DiskImage`] buffer; the
/// [`Dos33FileSystem`] session ties them together.

/// Free sector bitmap
pub mod bitmap;
/// Catalog sectors and entries
pub mod catalog;
/// Linked sector chain walking
pub mod chain;
/// Mounted volume
pub mod dos33;
/// Catalog type byte
pub mod file_type;
/// Track/sector lists and file contents
pub mod tslist;
/// Volume Table of Contents
pub mod vtoc;

pub use catalog::{CatalogEntry, CatalogSlot, EntryState, FoundFile};
pub use dos33::Dos33FileSystem;
pub use file_type::FileType;
pub use tslist::{BinaryFile, FileChain, TsListSector};
pub use vtoc::Vtoc;

use crate::error::Result;
use crate::format::TrackSector;
use std::fmt;

/// Directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File name with padding removed
    pub name: String,
    /// File type and lock flag
    pub file_type: FileType,
    /// Sector count from the catalog
    pub sector_count: u16,
    /// First track/sector list sector
    pub ts_list: TrackSector,
    /// Entry has been deleted
    pub deleted: bool,
}

impl fmt::Display for DirEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let locked = if self.file_type.is_locked() { '*' } else { ' ' };
        let mnemonic = FileType(self.file_type.kind()).to_string();
        write!(
            f,
            "{}{:<4} {:03} {:<30}",
            locked, mnemonic, self.sector_count, self.name
        )?;
        if self.deleted {
            write!(f, " DEL")?;
        }
        Ok(())
    }
}

/// Filesystem information
#[derive(Debug)]
pub struct FileSystemInfo {
    /// Filesystem type name
    pub fs_type: String,
    /// Volume number from the VTOC
    pub volume: u8,
    /// Total sectors on disk
    pub total_sectors: usize,
    /// Sectors marked free in the bitmap
    pub free_sectors: usize,
    /// Sector size in bytes
    pub sector_size: usize,
    /// Active catalog entries
    pub files: usize,
}

/// Filesystem trait for accessing files on disk images
pub trait FileSystem {
    /// List directory entries
    fn read_dir(&self) -> Result<Vec<DirEntry>>;

    /// Read a file's contents
    fn read_file(&self, name: &str) -> Result<Vec<u8>>;

    /// Delete a file
    fn delete_file(&mut self, name: &str) -> Result<()>;

    /// Get filesystem information
    fn info(&self) -> Result<FileSystemInfo>;
}
