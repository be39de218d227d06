//! Word-addressable mathbox memory.
//!
//! The mathbox coprocessor sees a flat array of 16-bit words:
//!
//! ```text
//!  address    description
//! 0000-0FFF   RAM shared with the main CPU
//! 1000-1FFF   RAM shared with the video processor
//! 2000-3FFF   object ROM bank A
//! 4000-7FFF   object ROM bank B
//! ```
//!
//! Each ROM bank ships as a pair of byte images (low byte, high byte)
//! that are interleaved into words at construction. The ROM-backed
//! region is read-only; the scratch region below 0x2000 belongs to
//! other subsystems and is irrelevant to mesh decoding.

use std::fmt;

use thiserror::Error;

/// Number of 16-bit words in the mathbox address space.
pub const MEMORY_WORDS: usize = 0x8000;

/// First ROM-backed address; everything below is writable scratch.
pub const ROM_BASE: u16 = 0x2000;

/// Word address where bank A is unpacked.
pub const BANK_A_BASE: u16 = 0x2000;
/// Words in bank A (each source byte image is this many bytes).
pub const BANK_A_WORDS: usize = 0x2000;

/// Word address where bank B is unpacked.
pub const BANK_B_BASE: u16 = 0x4000;
/// Words in bank B.
pub const BANK_B_WORDS: usize = 0x4000;

/// Errors from memory construction and access.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("read outside mathbox address space: {address:#06x}")]
    ReadOutOfRange { address: u16 },

    #[error("write to ROM-backed address {address:#06x}")]
    WriteToRom { address: u16 },

    #[error("bank {bank} {half} byte image has wrong length (expected {expected} bytes, actual {actual})")]
    BadImageLength {
        bank: char,
        half: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("word image at {base:#06x} overruns the address space ({words} words)")]
    ImageOverflow { base: u16, words: usize },
}

/// The mathbox address space: 0x8000 words, ROM-backed from 0x2000 up.
#[derive(Debug)]
pub struct Memory {
    words: Box<[u16; MEMORY_WORDS]>,
}

impl Memory {
    /// Unpack the two ROM bank byte-image pairs into memory.
    ///
    /// Each word is `high * 256 + low`. Bank A lands at 0x2000, bank B
    /// at 0x4000. Image lengths are validated; nothing is defaulted on
    /// mismatch.
    pub fn from_rom_images(
        bank_a_low: &[u8],
        bank_a_high: &[u8],
        bank_b_low: &[u8],
        bank_b_high: &[u8],
    ) -> Result<Self, MemoryError> {
        check_image('A', "low", BANK_A_WORDS, bank_a_low)?;
        check_image('A', "high", BANK_A_WORDS, bank_a_high)?;
        check_image('B', "low", BANK_B_WORDS, bank_b_low)?;
        check_image('B', "high", BANK_B_WORDS, bank_b_high)?;

        let mut words = Box::new([0u16; MEMORY_WORDS]);
        let mut address = BANK_A_BASE as usize;
        for (low, high) in bank_a_low.iter().zip(bank_a_high) {
            words[address] = u16::from(*high) << 8 | u16::from(*low);
            address += 1;
        }
        for (low, high) in bank_b_low.iter().zip(bank_b_high) {
            words[address] = u16::from(*high) << 8 | u16::from(*low);
            address += 1;
        }
        Ok(Self { words })
    }

    /// Seed memory with a raw word image at `base`.
    ///
    /// This bypasses the byte-pair unpacking and is the entry point
    /// for synthetic ROM regions (tests, tooling). The image may cover
    /// any part of the address space but must not overrun it.
    pub fn from_rom_words(base: u16, image: &[u16]) -> Result<Self, MemoryError> {
        let end = base as usize + image.len();
        if end > MEMORY_WORDS {
            return Err(MemoryError::ImageOverflow {
                base,
                words: image.len(),
            });
        }
        let mut words = Box::new([0u16; MEMORY_WORDS]);
        words[base as usize..end].copy_from_slice(image);
        Ok(Self { words })
    }

    /// Read one word.
    pub fn read(&self, address: u16) -> Result<u16, MemoryError> {
        self.words
            .get(address as usize)
            .copied()
            .ok_or(MemoryError::ReadOutOfRange { address })
    }

    /// Write one word to the scratch region below [`ROM_BASE`].
    pub fn write(&mut self, address: u16, value: u16) -> Result<(), MemoryError> {
        if address >= ROM_BASE {
            return Err(MemoryError::WriteToRom { address });
        }
        self.words[address as usize] = value;
        Ok(())
    }
}

fn check_image(
    bank: char,
    half: &'static str,
    expected: usize,
    image: &[u8],
) -> Result<(), MemoryError> {
    if image.len() != expected {
        return Err(MemoryError::BadImageLength {
            bank,
            half,
            expected,
            actual: image.len(),
        });
    }
    Ok(())
}

/// The banked view the 6809 CPU uses for a mathbox word address.
///
/// The CPU sees the mathbox ROMs through a 4KB bank window at 0x2000,
/// one byte-pair per word. Only used for diagnostics (dump output).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuBankAddress {
    pub bank: u8,
    pub address: u16,
}

impl From<u16> for CpuBankAddress {
    fn from(mathbox_address: u16) -> Self {
        Self {
            bank: (mathbox_address / 0x1000) as u8 + 1,
            address: 0x2000 + (mathbox_address.wrapping_mul(2) & 0x1FFF),
        }
    }
}

impl CpuBankAddress {
    /// The mathbox word address this banked address maps back to.
    ///
    /// Constructed values always have `bank >= 1`; hand-built ones
    /// with bank 0 are clamped rather than underflowing.
    pub fn mathbox_address(self) -> u16 {
        0x1000 * u16::from(self.bank.saturating_sub(1)) + (self.address.saturating_sub(0x2000)) / 2
    }
}

impl fmt::Display for CpuBankAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:04X}", self.bank, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_interleaves_high_and_low() {
        let a_low = vec![0x34u8; BANK_A_WORDS];
        let a_high = vec![0x12u8; BANK_A_WORDS];
        let b_low = vec![0x78u8; BANK_B_WORDS];
        let b_high = vec![0x56u8; BANK_B_WORDS];
        let memory = Memory::from_rom_images(&a_low, &a_high, &b_low, &b_high).unwrap();

        assert_eq!(memory.read(0x2000).unwrap(), 0x1234);
        assert_eq!(memory.read(0x3FFF).unwrap(), 0x1234);
        assert_eq!(memory.read(0x4000).unwrap(), 0x5678);
        assert_eq!(memory.read(0x7FFF).unwrap(), 0x5678);
        // scratch region stays zeroed
        assert_eq!(memory.read(0x0000).unwrap(), 0);
    }

    #[test]
    fn test_bad_image_length_is_an_error() {
        let good = vec![0u8; BANK_A_WORDS];
        let short = vec![0u8; BANK_A_WORDS - 1];
        let b = vec![0u8; BANK_B_WORDS];
        let err = Memory::from_rom_images(&good, &short, &b, &b).unwrap_err();
        assert_eq!(
            err,
            MemoryError::BadImageLength {
                bank: 'A',
                half: "high",
                expected: BANK_A_WORDS,
                actual: BANK_A_WORDS - 1,
            }
        );
    }

    #[test]
    fn test_read_out_of_range() {
        let memory = Memory::from_rom_words(0x2000, &[1, 2, 3]).unwrap();
        assert_eq!(
            memory.read(0x8000),
            Err(MemoryError::ReadOutOfRange { address: 0x8000 })
        );
        assert_eq!(
            memory.read(0xFFFF),
            Err(MemoryError::ReadOutOfRange { address: 0xFFFF })
        );
    }

    #[test]
    fn test_rom_region_is_write_protected() {
        let mut memory = Memory::from_rom_words(0x2000, &[0xBEEF]).unwrap();
        assert_eq!(
            memory.write(0x2000, 0),
            Err(MemoryError::WriteToRom { address: 0x2000 })
        );
        assert_eq!(memory.read(0x2000).unwrap(), 0xBEEF);

        memory.write(0x1FFF, 0xCAFE).unwrap();
        assert_eq!(memory.read(0x1FFF).unwrap(), 0xCAFE);
    }

    #[test]
    fn test_word_image_overflow() {
        let err = Memory::from_rom_words(0x7FFF, &[0, 0]).unwrap_err();
        assert_eq!(
            err,
            MemoryError::ImageOverflow {
                base: 0x7FFF,
                words: 2
            }
        );
    }

    #[test]
    fn test_cpu_bank_address_round_trip() {
        for mb in [0x0000u16, 0x0FFF, 0x1000, 0x2ABC, 0x7FFF] {
            let banked = CpuBankAddress::from(mb);
            assert_eq!(banked.mathbox_address(), mb);
        }
        let banked = CpuBankAddress::from(0x2000u16);
        assert_eq!(banked.bank, 3);
        assert_eq!(banked.address, 0x2000);
        assert_eq!(banked.to_string(), "3:2000");
    }

    #[test]
    fn test_cpu_bank_address_clamps_out_of_range_fields() {
        // hand-built values below the constructor's range map to 0
        // instead of underflowing
        let banked = CpuBankAddress {
            bank: 0,
            address: 0x1FFE,
        };
        assert_eq!(banked.mathbox_address(), 0);
    }
}
