/// Track/sector lists and file contents
///
/// Every file owns a chain of track/sector list sectors. Each list sector
/// holds a link to the next list sector, the file-relative index of its first
/// pair and up to 122 (track, sector) pairs naming the data sectors in order.
///
/// Binary files start with a 4-byte header: load address and length, both
/// little-endian. Text files are high-bit ASCII with carriage returns as line
/// ends, terminated by a zero byte.

use crate::error::{DosError, Result};
use crate::filesystem::bitmap;
use crate::filesystem::chain::{ChainLayout, ChainWalker, TsListLayout};
use crate::format::*;
use crate::image::DiskImage;
use log::debug;
use std::fmt;

/// Decoded track/sector list sector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsListSector {
    /// Location of this list sector
    pub location: TrackSector,
    /// Following list sector
    pub next: Option<TrackSector>,
    /// Index within the file of the first data sector listed here
    pub sector_offset: u16,
    /// Data sectors, up to the first (0,0) pair
    pub pairs: Vec<TrackSector>,
}

impl TsListSector {
    /// Decode a list sector
    pub fn parse(location: TrackSector, data: &[u8], max_pairs: usize) -> Self {
        let pairs = (0..max_pairs)
            .map(|i| TrackSector::read(data, TSLIST_FIRST_PAIR + i * 2))
            .take_while(|ts| !ts.is_zero())
            .collect();

        Self {
            location,
            next: TsListLayout::next(data),
            sector_offset: read_u16le(data, TSLIST_SECTOR_OFFSET),
            pairs,
        }
    }
}

impl fmt::Display for TsListSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.next {
            Some(next) => writeln!(f, "T/S list {} -> {}", self.location, next)?,
            None => writeln!(f, "T/S list {} (last)", self.location)?,
        }
        writeln!(f, "Sector offset: {}", self.sector_offset)?;

        for (row, chunk) in self.pairs.chunks(8).enumerate() {
            write!(f, "{:3}:", self.sector_offset as usize + row * 8)?;
            for ts in chunk {
                write!(f, " {:02X}/{:02X}", ts.track, ts.sector)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Contents of a binary file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryFile {
    /// Load address from the header
    pub load_address: u16,
    /// Payload, exactly the header length
    pub data: Vec<u8>,
}

/// Result of writing a file's sector chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileChain {
    /// First track/sector list sector
    pub first: TrackSector,
    /// Sector count for the catalog entry
    pub sector_count: u16,
}

/// Decode every list sector of a file
pub fn ts_list_sectors(image: &DiskImage, first: TrackSector) -> Result<Vec<TsListSector>> {
    let max_pairs = image.geometry().max_pairs_per_list();
    ChainWalker::<TsListLayout>::new(image, first)
        .map(|node| node.map(|(location, data)| TsListSector::parse(location, data, max_pairs)))
        .collect()
}

/// Data sectors of a file in file order
pub fn collect_data_sectors(image: &DiskImage, first: TrackSector) -> Result<Vec<TrackSector>> {
    let geometry = *image.geometry();
    let mut sectors = Vec::new();

    for list in ts_list_sectors(image, first)? {
        for ts in list.pairs {
            if !geometry.contains(ts) {
                return Err(DosError::malformed(format!(
                    "data sector {} in list {} is outside the disk",
                    ts, list.location
                )));
            }
            sectors.push(ts);
        }
    }

    debug!("file at {} has {} data sectors", first, sectors.len());
    Ok(sectors)
}

/// Concatenated data sectors of a file
pub fn read_raw(image: &DiskImage, first: TrackSector) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    for ts in collect_data_sectors(image, first)? {
        data.extend_from_slice(image.read_sector(ts)?);
    }
    Ok(data)
}

/// Read a binary file, honouring its load address and length header
pub fn materialize_binary(image: &DiskImage, first: TrackSector) -> Result<BinaryFile> {
    let raw = read_raw(image, first)?;
    if raw.len() < BINARY_HEADER_SIZE {
        return Err(DosError::malformed(format!(
            "binary file at {} has no header",
            first
        )));
    }

    let load_address = read_u16le(&raw, 0);
    let length = read_u16le(&raw, 2) as usize;
    let end = BINARY_HEADER_SIZE + length;
    if end > raw.len() {
        return Err(DosError::malformed(format!(
            "binary file at {} declares {} bytes but holds {}",
            first,
            length,
            raw.len() - BINARY_HEADER_SIZE
        )));
    }

    Ok(BinaryFile {
        load_address,
        data: raw[BINARY_HEADER_SIZE..end].to_vec(),
    })
}

/// Read a text file
///
/// Each data sector is read up to its first zero byte. Bytes are masked to
/// seven bits, carriage returns become newlines, tabs and printable
/// characters pass through and anything else is shown as `[XX]`.
pub fn materialize_text(image: &DiskImage, first: TrackSector) -> Result<String> {
    let mut text = String::new();

    for ts in collect_data_sectors(image, first)? {
        for &byte in image.read_sector(ts)?.iter().take_while(|&&b| b != 0) {
            match byte & 0x7F {
                0x0D => text.push('\n'),
                ch @ (0x09 | 0x20..=0x7E) => text.push(ch as char),
                _ => text.push_str(&format!("[{:02X}]", byte)),
            }
        }
    }

    Ok(text)
}

/// Encode text for storage as a DOS text file
///
/// Newlines become carriage returns and a carriage return directly before a
/// newline is dropped. Every byte gets its high bit set.
pub fn encode_text(text: &str) -> Result<Vec<u8>> {
    if let Some(ch) = text.chars().find(|ch| !ch.is_ascii()) {
        return Err(DosError::InvalidText(format!(
            "character {:?} is not ASCII",
            ch
        )));
    }

    let bytes = text.as_bytes();
    let mut encoded = Vec::with_capacity(bytes.len());
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => {}
            b'\n' => encoded.push(0x8D),
            0 => {
                return Err(DosError::InvalidText(
                    "text contains a NUL character".to_string(),
                ))
            }
            _ => encoded.push(b | 0x80),
        }
    }
    Ok(encoded)
}

/// Sectors needed to store `len` bytes: (data sectors, list sectors)
pub fn sectors_needed(geometry: &Geometry, len: usize) -> (usize, usize) {
    let sector_size = geometry.sector_size as usize;
    let data = len.div_ceil(sector_size);
    let lists = data.div_ceil(geometry.max_pairs_per_list()).max(1);
    (data, lists)
}

/// Write file contents into freshly allocated sectors
///
/// With a load address the data is stored as a binary file behind its
/// 4-byte header. The list sector is allocated first, then data sectors one
/// at a time, with a further list sector chained in whenever the current one
/// is full. Free space is checked up front so a failing write leaves the
/// image untouched.
pub fn write_file_chain(
    image: &mut DiskImage,
    data: &[u8],
    load_address: Option<u16>,
) -> Result<FileChain> {
    let geometry = *image.geometry();
    let sector_size = geometry.sector_size as usize;
    let max_pairs = geometry.max_pairs_per_list();

    let payload = match load_address {
        Some(address) => {
            let length = u16::try_from(data.len()).map_err(|_| DosError::FileTooLarge(data.len()))?;
            let mut payload = Vec::with_capacity(BINARY_HEADER_SIZE + data.len());
            payload.extend_from_slice(&address.to_le_bytes());
            payload.extend_from_slice(&length.to_le_bytes());
            payload.extend_from_slice(data);
            payload
        }
        None => data.to_vec(),
    };

    let (data_sectors, list_sectors) = sectors_needed(&geometry, payload.len());
    let sector_count = u16::try_from(data_sectors).map_err(|_| DosError::FileTooLarge(payload.len()))?;
    let free = bitmap::allocatable_sector_count(image)?;
    if data_sectors + list_sectors > free {
        debug!(
            "need {} sectors, {} free",
            data_sectors + list_sectors,
            free
        );
        return Err(DosError::DiskFull);
    }

    let first = bitmap::allocate_sector(image)?;
    image.write_sector(first, &[])?;

    let mut list = first;
    let mut slot = 0;
    for (index, chunk) in payload.chunks(sector_size).enumerate() {
        if slot == max_pairs {
            let next = bitmap::allocate_sector(image)?;
            image.write_sector(next, &[])?;
            write_u16le(image.sector_mut(next)?, TSLIST_SECTOR_OFFSET, index as u16);

            let current = image.sector_mut(list)?;
            current[TSLIST_NEXT_TRACK] = next.track;
            current[TSLIST_NEXT_SECTOR] = next.sector;

            list = next;
            slot = 0;
        }

        let ts = bitmap::allocate_sector(image)?;
        image.write_sector(ts, chunk)?;

        let pair = TSLIST_FIRST_PAIR + slot * 2;
        let current = image.sector_mut(list)?;
        current[pair] = ts.track;
        current[pair + 1] = ts.sector;
        slot += 1;
    }

    debug!(
        "wrote {} bytes in {} data sectors from list {}",
        payload.len(),
        data_sectors,
        first
    );
    Ok(FileChain {
        first,
        sector_count,
    })
}
