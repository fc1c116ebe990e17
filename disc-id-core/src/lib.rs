use std::io::{Read, Seek};

pub mod error;
pub mod region;

pub use error::DiscError;
pub use region::Region;

/// A reader that implements both Read and Seek.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Which on-disc format yielded the identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscType {
    /// Identified via the ISO 9660 reader (CD-ROM image).
    Cd,
    /// Identified via the UDF reader (DVD-ROM image).
    Dvd,
    /// Identified via the binary pattern scanner fallback.
    Binary,
}

impl std::fmt::Display for DiscType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DiscType::Cd => "CD",
            DiscType::Dvd => "DVD",
            DiscType::Binary => "Binary",
        };
        write!(f, "{s}")
    }
}

/// The result of successfully identifying a PlayStation 2 disc image.
#[derive(Debug, Clone)]
pub struct GameIdentification {
    /// Canonical serial number, e.g. `SLUS-12345`.
    pub serial_number: String,
    /// Region the resolved database entry belongs to.
    pub region: Region,
    /// Title as stored in the region database.
    pub title: String,
    /// Which reader produced the serial candidate.
    pub disc_type: DiscType,
}
