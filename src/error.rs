use thiserror::Error;

/// Result type alias for DOS 3.3 image operations
pub type Result<T> = std::result::Result<T, DosError>;

/// Errors that can occur when working with DOS 3.3 disk images
#[derive(Debug, Error)]
pub enum DosError {
    /// I/O error occurred while reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid geometry or image size
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Image structures are damaged or inconsistent
    #[error("Malformed image: {0}")]
    MalformedImage(String),

    /// File not found in the catalog
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// File already exists in the catalog
    #[error("File exists: {0}")]
    FileExists(String),

    /// File is locked against deletion
    #[error("File locked: {0}")]
    FileLocked(String),

    /// No free catalog slot or not enough free sectors
    #[error("Disk full: no free space available")]
    DiskFull,

    /// System loader image is not a whole number of sectors
    #[error("Source of {size} bytes is not a multiple of the sector size")]
    UnalignedSource {
        /// Size of the rejected source in bytes
        size: usize,
    },

    /// Invalid filename
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    /// Binary payload too long for the 16-bit length field
    #[error("File too large: {0} bytes")]
    FileTooLarge(usize),

    /// Track/sector outside the image geometry
    #[error("Invalid track {track}, sector {sector}")]
    InvalidTrackSector {
        /// Track number
        track: u8,
        /// Sector number
        sector: u8,
    },

    /// Text that cannot be stored as DOS text
    #[error("Invalid text: {0}")]
    InvalidText(String),
}

impl DosError {
    /// Create a malformed image error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        DosError::MalformedImage(message.into())
    }

    /// Create an invalid format error
    pub fn invalid_format<S: Into<String>>(message: S) -> Self {
        DosError::InvalidFormat(message.into())
    }
}
