//! Decoded meshes: one renderable object per valid base address.

use std::io;

use glam::Vec3;

use crate::decode::{DecodeError, SurfaceWalker};
use crate::memory::{CpuBankAddress, Memory, ROM_BASE};
use crate::surface::{Surface, SurfaceType};

/// Addresses that parse as syntactically valid headers but are not
/// object data.
pub const NON_MESH_ADDRESSES: &[u16] = &[0x40DC, 0x4344];

/// An immutable, fully decoded object: a deduplicated surface list
/// pre-partitioned for the renderer.
///
/// A mesh is either decoded completely or not published at all; there
/// is no partially valid state.
#[derive(Debug, PartialEq)]
pub struct Mesh {
    address: u16,
    vertex_base: u16,
    surfaces: Vec<Surface>,
    shaded: Vec<usize>,
    unshaded: Vec<usize>,
}

impl Mesh {
    /// Decode the object whose header sits at `address`.
    ///
    /// The header's first word is the vertex table address; the
    /// surface chain follows it. Any decode failure discards the mesh
    /// entirely.
    pub fn decode(memory: &Memory, address: u16) -> Result<Self, DecodeError> {
        if NON_MESH_ADDRESSES.contains(&address) {
            return Err(DecodeError::KnownNonMesh { address });
        }

        let vertex_base = memory.read(address)?;
        if !(ROM_BASE..0x8000).contains(&vertex_base) {
            return Err(DecodeError::InvalidVertexBase {
                address,
                vertex_base,
            });
        }

        let mut walker = SurfaceWalker::new(memory, address, vertex_base);
        walker.walk(address.wrapping_add(1))?;
        let surfaces = walker.into_surfaces();
        if surfaces.is_empty() {
            return Err(DecodeError::NoSurfaces { address });
        }

        let mut shaded = Vec::new();
        let mut unshaded = Vec::new();
        for (index, surface) in surfaces.iter().enumerate() {
            if surface.is_shaded() && surface.surface_type() == SurfaceType::Polygon {
                shaded.push(index);
            } else {
                unshaded.push(index);
            }
        }

        Ok(Self {
            address,
            vertex_base,
            surfaces,
            shaded,
            unshaded,
        })
    }

    /// Base address of this mesh in ROM (the registry key).
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Base address of this mesh's vertex table.
    pub fn vertex_base(&self) -> u16 {
        self.vertex_base
    }

    /// All surfaces, in decode order.
    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    /// Surfaces rendered with lighting: shaded polygons.
    pub fn shaded_surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.shaded.iter().map(|&i| &self.surfaces[i])
    }

    /// Everything else: dots, vectors and unshaded polygons.
    pub fn unshaded_surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.unshaded.iter().map(|&i| &self.surfaces[i])
    }

    /// Write a human-readable dump of the mesh.
    pub fn dump<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "Object 0x{:04X} ({})",
            self.address,
            CpuBankAddress::from(self.address)
        )?;
        writeln!(
            out,
            "\tVertices 0x{:04X} ({})",
            self.vertex_base,
            CpuBankAddress::from(self.vertex_base)
        )?;
        writeln!(out, "\tSurfaces = {}", self.surfaces.len())?;
        for surface in &self.surfaces {
            write!(
                out,
                "\t\t 0x{:04X} ({})\t{:?}\tcolor={:02X}\tshaded={}",
                surface.address,
                CpuBankAddress::from(surface.address),
                surface.surface_type(),
                surface.color_index(),
                surface.is_shaded()
            )?;
            if let Some(normal) = surface.normal {
                write!(out, "\tnormal={}", vector_string(normal))?;
            }
            write!(out, "\tvertices={{")?;
            for (i, point) in surface.points.iter().enumerate() {
                if i > 0 {
                    write!(out, ",")?;
                }
                write!(out, "{}", vector_string(*point))?;
            }
            writeln!(out, "}}")?;
        }
        writeln!(out)
    }
}

fn vector_string(v: Vec3) -> String {
    format!("{{{},{},{}}}", v.x, v.y, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_with(fragments: &[(u16, &[u16])]) -> Memory {
        let mut image = vec![0u16; 0x6000];
        for (address, words) in fragments {
            let start = *address as usize - 0x2000;
            image[start..start + words.len()].copy_from_slice(words);
        }
        Memory::from_rom_words(0x2000, &image).unwrap()
    }

    /// The worked decode example: one Dot-type surface at base 0x2010.
    #[test]
    fn test_single_dot_mesh() {
        let memory = memory_with(&[
            (0x2010, &[0x2010, 0x2020, 0x0040, 0x8000][..]),
            (0x2020, &[0x4001, 0x8000][..]),
        ]);
        let mesh = Mesh::decode(&memory, 0x2010).unwrap();
        assert_eq!(mesh.address(), 0x2010);
        assert_eq!(mesh.vertex_base(), 0x2010);
        assert_eq!(mesh.surfaces().len(), 1);
        let s = &mesh.surfaces()[0];
        assert_eq!(s.surface_type(), SurfaceType::Dot);
        assert_eq!(s.color_index(), 0x00);
        assert_eq!(s.points.len(), 1);
    }

    #[test]
    fn test_invalid_vertex_base_rejected() {
        let memory = memory_with(&[(0x3000, &[0x1000][..])]);
        let err = Mesh::decode(&memory, 0x3000).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidVertexBase {
                address: 0x3000,
                vertex_base: 0x1000,
            }
        );
    }

    #[test]
    fn test_corrupt_chain_discards_whole_mesh() {
        // first surface is fine, second header is corrupt
        let memory = memory_with(&[
            (0x3000, &[0x2100, 0x3100, 0x0000, 0x1000][..]),
            (0x3100, &[0x4000, 0x4003, 0x4006, 0x8000][..]),
            (0x2100, &[1, 0, 0, 0, 1, 0, 0, 0, 1][..]),
        ]);
        assert!(matches!(
            Mesh::decode(&memory, 0x3000),
            Err(DecodeError::CorruptHeader { .. })
        ));
    }

    #[test]
    fn test_empty_mesh_rejected() {
        // immediate end-of-list: zero surfaces
        let memory = memory_with(&[(0x3000, &[0x2100, 0x8000][..])]);
        let err = Mesh::decode(&memory, 0x3000).unwrap_err();
        assert_eq!(err, DecodeError::NoSurfaces { address: 0x3000 });
    }

    #[test]
    fn test_known_non_mesh_addresses_rejected() {
        let memory = memory_with(&[]);
        for &address in NON_MESH_ADDRESSES {
            assert_eq!(
                Mesh::decode(&memory, address),
                Err(DecodeError::KnownNonMesh { address })
            );
        }
    }

    #[test]
    fn test_partition_is_complete_and_disjoint() {
        // one shaded polygon, one dot with the shade bit (dots never
        // land in the shaded partition), one unshaded polygon
        let memory = memory_with(&[
            (
                0x3000,
                &[0x2100, 0x3100, 0x0040, 0x3200, 0x0241, 0x3100, 0x0002, 0x8000][..],
            ),
            (0x3100, &[0x4000, 0x4003, 0x4006, 0x8009][..]),
            (0x3200, &[0x4000, 0x4006, 0x4003, 0x8009][..]),
            (0x2100, &[1, 0, 0, 0, 1, 0, 0, 0, 1, 1, 1, 1][..]),
        ]);
        let mesh = Mesh::decode(&memory, 0x3000).unwrap();
        assert_eq!(mesh.surfaces().len(), 3);
        assert_eq!(
            mesh.shaded_surfaces().count() + mesh.unshaded_surfaces().count(),
            mesh.surfaces().len()
        );
        for surface in mesh.shaded_surfaces() {
            assert!(surface.is_shaded());
            assert_eq!(surface.surface_type(), SurfaceType::Polygon);
        }
        assert_eq!(mesh.shaded_surfaces().count(), 1);
    }

    #[test]
    fn test_no_duplicate_surface_addresses() {
        let memory = memory_with(&[
            (
                0x3000,
                &[0x2100, 0x3100, 0x0001, 0x3200, 0x0002, 0x8000][..],
            ),
            (0x3100, &[0x4000, 0x4003, 0x8006][..]),
            (0x3200, &[0x4000, 0x4006, 0x8003][..]),
            (0x2100, &[1, 0, 0, 0, 2, 0, 0, 0, 3][..]),
        ]);
        let mesh = Mesh::decode(&memory, 0x3000).unwrap();
        let mut addresses: Vec<u16> = mesh.surfaces().iter().map(|s| s.address).collect();
        addresses.sort_unstable();
        addresses.dedup();
        assert_eq!(addresses.len(), mesh.surfaces().len());
    }

    #[test]
    fn test_shading_override_applies_by_mesh_address() {
        // eyeball object with a color-3 polygon gets force-shaded
        let memory = memory_with(&[
            (0x3892, &[0x2100, 0x3900, 0x0003, 0x8000][..]),
            (0x3900, &[0x4000, 0x4003, 0x4006, 0x8009][..]),
            (0x2100, &[1, 0, 0, 0, 1, 0, 0, 0, 1, 1, 1, 1][..]),
        ]);
        let mesh = Mesh::decode(&memory, 0x3892).unwrap();
        assert_eq!(mesh.surfaces().len(), 1);
        assert!(mesh.surfaces()[0].is_shaded());
        assert_eq!(mesh.shaded_surfaces().count(), 1);
    }

    #[test]
    fn test_dump_is_well_formed() {
        let memory = memory_with(&[
            (0x2010, &[0x2010, 0x2020, 0x0040, 0x8000][..]),
            (0x2020, &[0x4001, 0x8000][..]),
        ]);
        let mesh = Mesh::decode(&memory, 0x2010).unwrap();
        let mut out = Vec::new();
        mesh.dump(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Object 0x2010"));
        assert!(text.contains("Surfaces = 1"));
        assert!(text.contains("Dot"));
    }
}
