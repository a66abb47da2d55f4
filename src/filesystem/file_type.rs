/// Catalog entry type byte
///
/// The high bit is the lock flag; the low seven bits are a one-hot mask of the
/// file type, with zero meaning a text file.

use std::fmt;

/// File type and lock flag as stored in a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileType(pub u8);

impl FileType {
    /// Text file (no type bit set)
    pub const TEXT: u8 = 0x00;

    /// Integer BASIC program - Bit 0
    pub const INTEGER: u8 = 0x01;

    /// Applesoft BASIC program - Bit 1
    pub const APPLESOFT: u8 = 0x02;

    /// Binary file - Bit 2
    pub const BINARY: u8 = 0x04;

    /// SEQ type (sequential/random access) - Bit 3
    pub const S: u8 = 0x08;

    /// REL type (relocatable) - Bit 4
    pub const R: u8 = 0x10;

    /// A type - Bit 5
    pub const A: u8 = 0x20;

    /// B type - Bit 6
    pub const B: u8 = 0x40;

    /// Locked - Bit 7
    pub const LOCKED: u8 = 0x80;

    /// Mask of the type bits
    pub const TYPE_MASK: u8 = 0x7F;

    /// Type bits with the lock flag removed
    #[inline]
    pub fn kind(&self) -> u8 {
        self.0 & Self::TYPE_MASK
    }

    /// Check if the lock flag is set
    #[inline]
    pub fn is_locked(&self) -> bool {
        (self.0 & Self::LOCKED) != 0
    }

    /// Check if this is a text file
    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind() == Self::TEXT
    }

    /// Check if the contents should be read as binary (any non-text type)
    #[inline]
    pub fn is_binary(&self) -> bool {
        !self.is_text()
    }

    /// Copy with the lock flag set or cleared
    pub fn with_locked(self, locked: bool) -> Self {
        if locked {
            FileType(self.0 | Self::LOCKED)
        } else {
            FileType(self.0 & Self::TYPE_MASK)
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = Vec::new();
        if self.is_text() {
            flags.push("TXT");
        } else {
            let kind = self.kind();
            for (bit, name) in [
                (Self::INTEGER, "IBAS"),
                (Self::APPLESOFT, "ABAS"),
                (Self::BINARY, "BIN"),
                (Self::S, "SEQ"),
                (Self::R, "REL"),
                (Self::A, "A"),
                (Self::B, "B"),
            ] {
                if kind & bit != 0 {
                    flags.push(name);
                }
            }
        }
        if self.is_locked() {
            flags.push("LKD");
        }
        write!(f, "{}", flags.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_type() {
        let file_type = FileType(0x00);
        assert!(file_type.is_text());
        assert!(!file_type.is_binary());
        assert!(!file_type.is_locked());
    }

    #[test]
    fn test_locked_binary() {
        let file_type = FileType(FileType::BINARY | FileType::LOCKED);
        assert!(file_type.is_binary());
        assert!(file_type.is_locked());
        assert_eq!(file_type.kind(), FileType::BINARY);
    }

    #[test]
    fn test_locked_text_is_text() {
        assert!(FileType(0x80).is_text());
    }

    #[test]
    fn test_with_locked() {
        let file_type = FileType(FileType::APPLESOFT).with_locked(true);
        assert_eq!(file_type.0, 0x82);
        assert_eq!(file_type.with_locked(false).0, 0x02);
    }

    #[test]
    fn test_display() {
        assert_eq!(FileType(0x00).to_string(), "TXT");
        assert_eq!(FileType(0x04).to_string(), "BIN");
        assert_eq!(FileType(0x82).to_string(), "ABAS LKD");
        assert_eq!(FileType(0x41).to_string(), "IBAS B");
        assert_eq!(FileType(0x08).to_string(), "SEQ");
        assert_eq!(FileType(0x90).to_string(), "REL LKD");
    }
}
