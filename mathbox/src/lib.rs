//! Mathbox - I, Robot object ROM decoder
//!
//! This crate decodes the binary 3D object format stored in the game's
//! mathbox ROMs, plus the playfield level data in the program ROM.
//!
//! # Architecture
//!
//! - [`Memory`] - The 16-bit word address space the object ROMs unpack into
//! - [`Mesh`] - One decoded object: surfaces, vertices, shading partition
//! - [`MeshRegistry`] - Every decodable object, found by an eager sweep
//! - [`Palette`] - The 64-color ramp palette surfaces index into
//! - [`playfield`] - Tile-grid and level-table decoding from the program ROM

pub mod decode;
pub mod fixups;
pub mod memory;
pub mod mesh;
pub mod palette;
pub mod playfield;
pub mod registry;
pub mod rom;
pub mod surface;

// Re-export the decode pipeline types
pub use decode::DecodeError;
pub use memory::{CpuBankAddress, Memory, MemoryError};
pub use mesh::Mesh;
pub use registry::MeshRegistry;
pub use surface::{BranchCondition, Surface, SurfaceType};

// Re-export ROM loading
pub use rom::{RomError, RomImage, RomSpec, load_mathbox_memory};

// Re-export palette and playfield types
pub use palette::{Palette, Rgb};
pub use playfield::{Level, LevelRom, Playfield, PlayfieldDecoder, PlayfieldError, Tile, TileKind};
