//! Per-address empirical corrections for known game objects.
//!
//! A handful of objects in the original ROMs render wrong without
//! hand-tuned patches: some polygons lack the shade bit their object
//! clearly wants, and a few vertices sit slightly off. These are
//! observed per-address corrections with no general rule; they are
//! kept here as plain data so the decode algorithm stays generic and
//! the patch set stays inspectable.

use glam::Vec3;

use crate::surface::{Surface, SurfaceType};

/// Objects whose polygons are force-shaded regardless of color.
pub const SHADED_OBJECTS: &[u16] = &[
    0x5B56, // tanker
    0x5B68, // spike
    0x5B6E, // spike
    0x5B72, // spike
    0x5B8C, // spike
    0x5BB5, // spike
    0x5BE7, // spike
    0x5C22, // spike
    0x5F08, // colored "big ball"
    0x692F, // hand
    0x730A, // cube
    0x7318, // cube
    0x7326, // cube
    0x7334, // cube
    0x7342, // cube
    0x7350, // cube
    0x735E, // cube
    0x77D0, // ring
    0x7DF4, // viewer killer
];

/// Eyeball objects: force-shaded only for color indices 1..=7.
pub const SHADED_EYEBALLS: &[u16] = &[0x3892, 0x38A4, 0x38B6, 0x38C8, 0x38DA];

/// Robot visor objects: surfaces with color 0x38/0x39 shift left.
pub const VISOR_OBJECTS: &[u16] = &[0x2958, 0x29EE, 0x2A84, 0x2B1A, 0x2C00];

/// Bird eye objects: surfaces with color 0x38/0x39 are rescaled and
/// recentered.
pub const BIRD_EYE_OBJECTS: &[u16] = &[0x51E0, 0x5234, 0x5288];

/// Set the shade bit on polygons of the known under-shaded objects.
pub fn apply_shading_override(mesh_address: u16, surface: &mut Surface) {
    if surface.surface_type() != SurfaceType::Polygon {
        return;
    }
    if SHADED_EYEBALLS.contains(&mesh_address) {
        let color = surface.color_index();
        if (1..=7).contains(&color) {
            surface.make_shaded();
        }
    } else if SHADED_OBJECTS.contains(&mesh_address) {
        surface.make_shaded();
    }
}

/// Nudge the known misplaced vertices into position.
pub fn apply_geometry_fixup(mesh_address: u16, surface: &mut Surface) {
    let color = surface.color_index();
    if color != 0x38 && color != 0x39 {
        return;
    }
    if VISOR_OBJECTS.contains(&mesh_address) {
        for point in &mut surface.points {
            point.x -= 0.1;
        }
    } else if BIRD_EYE_OBJECTS.contains(&mesh_address) {
        for point in &mut surface.points {
            *point = Vec3::new(point.x * (15.0 / 18.0), point.y - 6.0, point.z + 3.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(flags: u16, points: Vec<Vec3>) -> Surface {
        Surface {
            address: 0x3000,
            index_list_address: 0x3100,
            control_flags: flags,
            normal: None,
            points,
        }
    }

    #[test]
    fn test_eyeball_shading_only_in_color_range() {
        let mut in_range = surface(0x0003, vec![]);
        apply_shading_override(0x3892, &mut in_range);
        assert!(in_range.is_shaded());

        let mut out_of_range = surface(0x0008, vec![]);
        apply_shading_override(0x3892, &mut out_of_range);
        assert!(!out_of_range.is_shaded());

        let mut color_zero = surface(0x0000, vec![]);
        apply_shading_override(0x3892, &mut color_zero);
        assert!(!color_zero.is_shaded());
    }

    #[test]
    fn test_shading_override_skips_non_polygons() {
        let mut dot = surface(0x0200, vec![]); // type = dot
        apply_shading_override(0x5B56, &mut dot);
        assert!(!dot.is_shaded());

        let mut polygon = surface(0x0000, vec![]);
        apply_shading_override(0x5B56, &mut polygon);
        assert!(polygon.is_shaded());
    }

    #[test]
    fn test_shading_override_ignores_other_addresses() {
        let mut s = surface(0x0003, vec![]);
        apply_shading_override(0x3000, &mut s);
        assert!(!s.is_shaded());
    }

    #[test]
    fn test_visor_fixup_shifts_x() {
        let mut s = surface(0x0038, vec![Vec3::new(1.0, 2.0, 3.0)]);
        apply_geometry_fixup(0x2958, &mut s);
        assert_eq!(s.points[0], Vec3::new(0.9, 2.0, 3.0));
    }

    #[test]
    fn test_bird_eye_fixup_rescales() {
        let mut s = surface(0x0039, vec![Vec3::new(18.0, 6.0, -3.0)]);
        apply_geometry_fixup(0x5234, &mut s);
        assert_eq!(s.points[0], Vec3::new(15.0, 0.0, 0.0));
    }

    #[test]
    fn test_geometry_fixup_requires_marker_color() {
        let mut s = surface(0x0001, vec![Vec3::new(1.0, 1.0, 1.0)]);
        apply_geometry_fixup(0x2958, &mut s);
        assert_eq!(s.points[0], Vec3::new(1.0, 1.0, 1.0));
    }
}
