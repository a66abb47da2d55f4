/// I/O operations for reading and writing raw image files

/// Reader implementation for raw images
pub mod reader;
/// Writer implementation for raw images
pub mod writer;

pub use reader::{read_image, read_image_bytes};
pub use writer::write_image;
