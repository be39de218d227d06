//! Surfaces: the drawable primitives that make up a mesh.
//!
//! A surface header in ROM is one or two words (index-list address,
//! then control flags unless the address is the end-of-list sentinel).
//! The control flags pack color, shading, primitive type and an
//! optional branch instruction:
//!
//! ```text
//! bit 15     branch instruction present
//! bits 13-12 branch condition (0=always, 1=if visible, 2=if hidden, 3=never)
//! bits 9-8   primitive type (0=polygon, 1=vector, 2=dot, 3=unknown)
//! bit 6      shaded
//! bits 5-0   color index
//! ```

use glam::Vec3;

/// Color index mask (bits 0-5).
pub const COLOR_MASK: u16 = 0x003F;
/// Shading flag (bit 6).
pub const SHADE_BIT: u16 = 0x0040;
/// Primitive type field (bits 8-9).
pub const TYPE_MASK: u16 = 0x0300;
/// Shift for the primitive type field.
pub const TYPE_SHIFT: u16 = 8;
/// Branch condition field (bits 12-13).
pub const BRANCH_CONDITION_MASK: u16 = 0x3000;
/// Branch instruction flag (bit 15).
pub const BRANCH_BIT: u16 = 0x8000;

/// Primitive type encoded in bits 8-9 of the control flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceType {
    Polygon = 0,
    Vector = 1,
    Dot = 2,
    Unknown = 3,
}

impl SurfaceType {
    pub(crate) fn from_flags(flags: u16) -> Self {
        match (flags & TYPE_MASK) >> TYPE_SHIFT {
            0 => Self::Polygon,
            1 => Self::Vector,
            2 => Self::Dot,
            _ => Self::Unknown,
        }
    }
}

/// Visibility condition of an embedded branch instruction.
///
/// `Always` is taken in-line (an unconditional jump in the surface
/// chain); the visibility-conditioned variants fork the chain and
/// both sides contribute surfaces to the same mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCondition {
    Always = 0,
    IfVisible = 1,
    IfHidden = 2,
    Never = 3,
}

impl BranchCondition {
    pub(crate) fn from_flags(flags: u16) -> Self {
        match (flags & BRANCH_CONDITION_MASK) >> 12 {
            0 => Self::Always,
            1 => Self::IfVisible,
            2 => Self::IfHidden,
            _ => Self::Never,
        }
    }
}

/// One drawable primitive: a dot, a line strip or a filled fan.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    /// Word address of this surface's header (identity within a mesh).
    pub address: u16,
    /// Address of this surface's vertex index list.
    pub index_list_address: u16,
    /// Raw control flags (see module docs for the layout).
    pub control_flags: u16,
    /// Unit normal, present when the first index-list entry is a
    /// normal reference.
    pub normal: Option<Vec3>,
    /// Vertices in object space, dereferenced from the mesh vertex
    /// table.
    pub points: Vec<Vec3>,
}

impl Surface {
    /// Color index (bits 0-5 of the control flags).
    pub fn color_index(&self) -> u8 {
        (self.control_flags & COLOR_MASK) as u8
    }

    /// Shading flag (bit 6).
    pub fn is_shaded(&self) -> bool {
        self.control_flags & SHADE_BIT != 0
    }

    /// Primitive type (bits 8-9).
    pub fn surface_type(&self) -> SurfaceType {
        SurfaceType::from_flags(self.control_flags)
    }

    pub(crate) fn has_branch(&self) -> bool {
        self.control_flags & BRANCH_BIT != 0
    }

    pub(crate) fn branch_condition(&self) -> BranchCondition {
        BranchCondition::from_flags(self.control_flags)
    }

    /// Whether the surface is drawn at all.
    ///
    /// A surface is skipped only when it carries a branch instruction
    /// whose condition is not `Always` — the historical encoding
    /// `(flags & 0xB000) <= 0x8000`.
    pub(crate) fn is_drawn(&self) -> bool {
        (self.control_flags & (BRANCH_BIT | BRANCH_CONDITION_MASK)) <= BRANCH_BIT
    }

    /// Rewrite the primitive type field in place.
    pub(crate) fn force_type(&mut self, surface_type: SurfaceType) {
        self.control_flags &= !TYPE_MASK;
        self.control_flags |= (surface_type as u16) << TYPE_SHIFT;
    }

    pub(crate) fn make_shaded(&mut self) {
        self.control_flags |= SHADE_BIT;
    }

    /// Structural equality for deduplication.
    ///
    /// Compares everything a renderer can observe: point count,
    /// shading, color, type, normal and the point values themselves.
    /// Vertex data is integer-derived so exact float comparison is
    /// sufficient.
    pub(crate) fn same_geometry(&self, other: &Surface) -> bool {
        self.points.len() == other.points.len()
            && self.is_shaded() == other.is_shaded()
            && self.color_index() == other.color_index()
            && self.surface_type() == other.surface_type()
            && self.normal == other.normal
            && self.points == other.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(flags: u16) -> Surface {
        Surface {
            address: 0x3000,
            index_list_address: 0x3100,
            control_flags: flags,
            normal: None,
            points: Vec::new(),
        }
    }

    #[test]
    fn test_flag_accessors() {
        let s = surface(0x0147); // color 7, shaded, vector
        assert_eq!(s.color_index(), 0x07);
        assert!(s.is_shaded());
        assert_eq!(s.surface_type(), SurfaceType::Vector);
        assert!(!s.has_branch());
    }

    #[test]
    fn test_draw_predicate() {
        // no branch instruction: always drawn
        assert!(surface(0x0000).is_drawn());
        assert!(surface(0x3000).is_drawn());
        // branch-always is still drawable
        assert!(surface(0x8000).is_drawn());
        // conditioned branches skip the draw
        assert!(!surface(0x9000).is_drawn());
        assert!(!surface(0xA000).is_drawn());
        assert!(!surface(0xB000).is_drawn());
    }

    #[test]
    fn test_branch_condition_decode() {
        assert_eq!(surface(0x8000).branch_condition(), BranchCondition::Always);
        assert_eq!(
            surface(0x9000).branch_condition(),
            BranchCondition::IfVisible
        );
        assert_eq!(
            surface(0xA000).branch_condition(),
            BranchCondition::IfHidden
        );
        assert_eq!(surface(0xB000).branch_condition(), BranchCondition::Never);
    }

    #[test]
    fn test_force_type_preserves_other_bits() {
        let mut s = surface(0x8347);
        s.force_type(SurfaceType::Dot);
        assert_eq!(s.surface_type(), SurfaceType::Dot);
        assert_eq!(s.color_index(), 0x07);
        assert!(s.is_shaded());
        assert!(s.has_branch());
    }

    #[test]
    fn test_same_geometry_ignores_addresses() {
        let point = Vec3::new(1.0, 2.0, 3.0);
        let mut a = surface(0x0200);
        a.points.push(point);
        let mut b = surface(0x0200);
        b.address = 0x4000;
        b.index_list_address = 0x4100;
        b.points.push(point);
        assert!(a.same_geometry(&b));

        b.points[0].x = 4.0;
        assert!(!a.same_geometry(&b));
    }
}
