//! The surface-chain decoder.
//!
//! Object data in the mathbox ROMs is not a flat list: each surface
//! header may carry a branch instruction, making the chain a small
//! bytecode program over a directed graph of surfaces. The decoder is
//! an explicit interpreter loop; unconditional branches jump in-line,
//! visibility-conditioned branches fork the walk and both sides feed
//! the same mesh-in-progress.
//!
//! The ROM format permits crafted cycles, so the walker keeps a
//! visited set of header addresses and bails out of any address it has
//! already interpreted. That set — not the surface list — is the cycle
//! breaker: culled surfaces never reach the surface list but still
//! occupy header addresses.
//!
//! Any malformed data aborts the whole mesh. Partially decoded objects
//! are never published.

use glam::Vec3;
use hashbrown::HashSet;
use thiserror::Error;

use crate::fixups;
use crate::memory::{Memory, MemoryError, ROM_BASE};
use crate::surface::{BranchCondition, Surface, SurfaceType};

/// Sentinel marking "no more surfaces" in a chain; also the low bound
/// of the stop bit in vertex index lists.
pub const END_OF_LIST: u16 = 0x8000;

/// Bit 14 set on the first index-list entry marks it as a vertex
/// reference; clear means it references the surface normal.
const VERTEX_REF_BIT: u16 = 0x4000;

/// Vertex table offsets are 14 bits.
const VERTEX_OFFSET_MASK: u16 = 0x3FFF;

/// Reasons a mesh decode is abandoned.
///
/// All of these are routine during a registry sweep — most of the
/// address space is not object data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{address:#06x} is a known non-mesh address")]
    KnownNonMesh { address: u16 },

    #[error("no mesh header at {address:#06x}: vertex table address {vertex_base:#06x} out of range")]
    InvalidVertexBase { address: u16, vertex_base: u16 },

    #[error("corrupt surface header at {address:#06x}: index list address {index_list:#06x} out of range")]
    CorruptHeader { address: u16, index_list: u16 },

    #[error("surface at {address:#06x} has an empty point list")]
    EmptySurface { address: u16 },

    #[error("no surfaces decoded at {address:#06x}")]
    NoSurfaces { address: u16 },

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Walks a surface chain, accumulating surfaces for one mesh.
pub(crate) struct SurfaceWalker<'a> {
    memory: &'a Memory,
    /// Base address of the mesh being decoded (keys the fixup tables).
    mesh_address: u16,
    /// All vertex and normal references are offsets from here.
    vertex_base: u16,
    /// Header addresses already interpreted; the cycle breaker.
    visited: HashSet<u16>,
    surfaces: Vec<Surface>,
}

impl<'a> SurfaceWalker<'a> {
    pub(crate) fn new(memory: &'a Memory, mesh_address: u16, vertex_base: u16) -> Self {
        Self {
            memory,
            mesh_address,
            vertex_base,
            visited: HashSet::new(),
            surfaces: Vec::new(),
        }
    }

    pub(crate) fn into_surfaces(self) -> Vec<Surface> {
        self.surfaces
    }

    /// Interpret the surface chain starting at `address`.
    ///
    /// Returns normally on the end-of-list sentinel or on reaching an
    /// already-visited header; conditional branches recurse into the
    /// same walker.
    pub(crate) fn walk(&mut self, mut address: u16) -> Result<(), DecodeError> {
        loop {
            if !self.visited.insert(address) {
                // chain rejoins itself; everything from here is known
                return Ok(());
            }

            let header = address;
            let index_list = self.memory.read(address)?;
            address = address.wrapping_add(1);
            if index_list < ROM_BASE || index_list > END_OF_LIST {
                return Err(DecodeError::CorruptHeader {
                    address: header,
                    index_list,
                });
            }
            if index_list == END_OF_LIST {
                return Ok(());
            }

            let control_flags = self.memory.read(address)?;
            address = address.wrapping_add(1);

            let mut surface = Surface {
                address: header,
                index_list_address: index_list,
                control_flags,
                normal: None,
                points: Vec::new(),
            };

            let has_branch = surface.has_branch();
            let branch_condition = surface.branch_condition();

            if surface.is_drawn() {
                self.read_index_list(&mut surface)?;
                self.finish_surface(surface)?;
            }

            if has_branch {
                // the delta is relative to its own word address
                let delta = self.memory.read(address)?;
                let target = address.wrapping_add(delta);
                address = address.wrapping_add(1);

                match branch_condition {
                    BranchCondition::Always => address = target,
                    BranchCondition::IfVisible
                    | BranchCondition::IfHidden
                    | BranchCondition::Never => {
                        // either side may be drawn at runtime; decode
                        // the branch, then fall through sequentially
                        self.walk(target)?;
                    }
                }
            }
        }
    }

    /// Scan a vertex index list into the surface.
    ///
    /// The first entry doubles as an optional normal reference (bit 14
    /// clear) and is never a point itself. The list stops at an entry
    /// with the stop bit (>= 0x8000); that entry still contributes its
    /// masked vertex — the stop bit rides on the final index.
    fn read_index_list(&self, surface: &mut Surface) -> Result<(), DecodeError> {
        let mut cursor = surface.index_list_address;
        let mut offset = self.memory.read(cursor)?;
        cursor = cursor.wrapping_add(1);

        if offset & VERTEX_REF_BIT == 0 {
            surface.normal = Some(self.vertex(offset)?.normalize_or_zero());
        }
        while offset < END_OF_LIST {
            offset = self.memory.read(cursor)?;
            cursor = cursor.wrapping_add(1);
            surface.points.push(self.vertex(offset)?);
        }
        Ok(())
    }

    /// Enforce type/point-count consistency, apply the per-object
    /// patches and append unless structurally duplicate.
    fn finish_surface(&mut self, mut surface: Surface) -> Result<(), DecodeError> {
        match surface.points.len() {
            0 => {
                return Err(DecodeError::EmptySurface {
                    address: surface.address,
                });
            }
            1 => surface.force_type(SurfaceType::Dot),
            2 => {
                if surface.surface_type() == SurfaceType::Polygon {
                    surface.force_type(SurfaceType::Vector);
                }
            }
            _ => {
                if surface.surface_type() == SurfaceType::Vector {
                    // close the line strip
                    let first = surface.points[0];
                    surface.points.push(first);
                }
            }
        }

        fixups::apply_shading_override(self.mesh_address, &mut surface);
        fixups::apply_geometry_fixup(self.mesh_address, &mut surface);

        if !self.surfaces.iter().any(|s| s.same_geometry(&surface)) {
            self.surfaces.push(surface);
        }
        Ok(())
    }

    /// Dereference a vertex table offset into an object-space point.
    fn vertex(&self, offset: u16) -> Result<Vec3, DecodeError> {
        let address = self.vertex_base.wrapping_add(offset & VERTEX_OFFSET_MASK);
        let x = self.memory.read(address)? as i16;
        let y = self.memory.read(address.wrapping_add(1))? as i16;
        let z = self.memory.read(address.wrapping_add(2))? as i16;
        Ok(Vec3::new(f32::from(x), f32::from(y), f32::from(z)))
    }
}
