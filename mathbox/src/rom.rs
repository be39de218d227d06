//! ROM image loading and validation.
//!
//! The mathbox object data ships as four byte images — a low/high pair
//! per bank — plus the separate program ROM the playfield decoder
//! reads. Images are validated by size and by the simple additive
//! checksum the original tooling used before anything is unpacked
//! into [`Memory`].

use std::path::Path;

use thiserror::Error;

use crate::memory::{Memory, MemoryError};

/// Errors loading or validating a ROM image. These are fatal to the
/// subsystem: without valid images there is no memory and no registry.
#[derive(Debug, Error)]
pub enum RomError {
    #[error("failed to read ROM file \"{filename}\"")]
    Io {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ROM \"{filename}\" has incorrect size (expected {expected} bytes, actual {actual})")]
    WrongSize {
        filename: String,
        expected: usize,
        actual: usize,
    },

    #[error(
        "ROM \"{filename}\" has incorrect checksum (expected {expected:#010X}, actual {actual:#010X})"
    )]
    WrongChecksum {
        filename: String,
        expected: u32,
        actual: u32,
    },

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Identity of a known ROM image: filename, size and (when known) the
/// additive checksum of its bytes.
#[derive(Debug, Clone, Copy)]
pub struct RomSpec {
    pub filename: &'static str,
    pub size: usize,
    pub checksum: Option<u32>,
}

/// Mathbox object ROM bank A, low bytes.
pub const BANK_A_LOW: RomSpec = RomSpec {
    filename: "136029-103.bin",
    size: 0x2000,
    checksum: Some(0x0006_A797),
};
/// Mathbox object ROM bank A, high bytes.
pub const BANK_A_HIGH: RomSpec = RomSpec {
    filename: "136029-104.bin",
    size: 0x2000,
    checksum: Some(0x0004_3382),
};
/// Mathbox object ROM bank B, low bytes.
pub const BANK_B_LOW: RomSpec = RomSpec {
    filename: "136029-101.bin",
    size: 0x4000,
    checksum: Some(0x0015_0247),
};
/// Mathbox object ROM bank B, high bytes.
pub const BANK_B_HIGH: RomSpec = RomSpec {
    filename: "136029-102.bin",
    size: 0x4000,
    checksum: Some(0x000F_557F),
};
/// Program ROM holding the playfield and level tables.
pub const PROGRAM_ROM: RomSpec = RomSpec {
    filename: "136029.206",
    size: 0x4000,
    checksum: None,
};

/// One loaded ROM byte image.
#[derive(Debug)]
pub struct RomImage {
    pub filename: String,
    pub data: Vec<u8>,
    pub checksum: u32,
}

impl RomImage {
    /// Read an image and compute its checksum.
    pub fn load(path: &Path) -> Result<Self, RomError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let data = std::fs::read(path).map_err(|source| RomError::Io {
            filename: filename.clone(),
            source,
        })?;
        let checksum = additive_checksum(&data);
        Ok(Self {
            filename,
            data,
            checksum,
        })
    }

    /// Load an image and validate it against a [`RomSpec`].
    ///
    /// Size is checked before checksum, matching the original loader.
    pub fn load_spec(dir: &Path, spec: &RomSpec) -> Result<Self, RomError> {
        let image = Self::load(&dir.join(spec.filename))?;
        if image.data.len() != spec.size {
            return Err(RomError::WrongSize {
                filename: image.filename,
                expected: spec.size,
                actual: image.data.len(),
            });
        }
        if let Some(expected) = spec.checksum {
            if image.checksum != expected {
                return Err(RomError::WrongChecksum {
                    filename: image.filename,
                    expected,
                    actual: image.checksum,
                });
            }
        }
        Ok(image)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Load and validate the four mathbox object images from `dir` and
/// unpack them into memory.
pub fn load_mathbox_memory(dir: &Path) -> Result<Memory, RomError> {
    let a_low = RomImage::load_spec(dir, &BANK_A_LOW)?;
    let a_high = RomImage::load_spec(dir, &BANK_A_HIGH)?;
    let b_low = RomImage::load_spec(dir, &BANK_B_LOW)?;
    let b_high = RomImage::load_spec(dir, &BANK_B_HIGH)?;
    let memory = Memory::from_rom_images(&a_low.data, &a_high.data, &b_low.data, &b_high.data)?;
    tracing::debug!("mathbox ROMs loaded");
    Ok(memory)
}

fn additive_checksum(data: &[u8]) -> u32 {
    data.iter()
        .fold(0u32, |sum, &byte| sum.wrapping_add(u32::from(byte)))
}
