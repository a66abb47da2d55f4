/*!
# dos33manager

A Rust library for reading and writing Apple II DOS 3.3 disk images.

## Features

- Raw DOS-ordered 5.25" images (35 or 40 tracks, 16 sectors of 256 bytes)
- VTOC, catalog, free sector bitmap and track/sector list handling
- Binary and text file reading and writing
- System loader (boot tracks) ingestion
- Idiomatic Rust API with comprehensive error handling

## Quick Start

```rust,no_run
use dos33manager::{DiskImage, Dos33FileSystem, FileSystem, Geometry};

// Create a freshly initialized volume
let mut image = DiskImage::create(Geometry::dos33())?;

{
    let mut fs = Dos33FileSystem::mount(&mut image)?;

    // Boot tracks from another image
    let dos = std::fs::read("dos33.img")?;
    fs.add_system_loader(&dos)?;

    // Add a binary file loaded at $9100
    let program = std::fs::read("hello.bin")?;
    fs.add_file("HELLO", &program, 0x9100)?;

    for entry in fs.read_dir()? {
        println!("{}", entry);
    }
}

// Save changes
image.save("hello.dsk")?;
# Ok::<(), dos33manager::DosError>(())
```

## Modules

- `format`: Geometry, track/sector addressing and layout constants
- `image`: The disk image buffer and its builder
- `filesystem`: VTOC, catalog, bitmap, track/sector lists and the mounted volume
- `map`: Free sector map rendering
- `error`: Error types and Result alias
*/

#![warn(missing_docs)]

/// Error types and Result alias
pub mod error;
/// DOS 3.3 filesystem structures
pub mod filesystem;
/// Geometry and on-disk layout constants
pub mod format;
/// Disk image buffer and builder
pub mod image;
/// I/O operations for reading and writing image files
pub mod io;
/// Free sector map visualization
pub mod map;

// Re-export common types
pub use error::{DosError, Result};
pub use filesystem::{
    BinaryFile, CatalogEntry, CatalogSlot, DirEntry, Dos33FileSystem, EntryState, FileChain,
    FileSystem, FileSystemInfo, FileType, FoundFile, TsListSector, Vtoc,
};
pub use format::{Geometry, TrackSector};
pub use image::{DiskImage, DiskImageBuilder};
