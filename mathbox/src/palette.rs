//! The 64-entry render palette.
//!
//! Surfaces carry a 6-bit color index: the top three bits pick one of
//! eight base colors, the bottom three an intensity ramp step. The
//! hardware rotates between six permutations of the same eight base
//! colors, so the palette is parameterized by group.

use thiserror::Error;

/// Number of palette entries.
pub const PALETTE_SIZE: usize = 64;
/// Number of base-color permutation groups.
pub const NUM_COLOR_GROUPS: usize = 6;

const RAMP_STEPS: usize = 8;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("color group {group} out of range (0..{NUM_COLOR_GROUPS})")]
pub struct BadColorGroup {
    pub group: usize,
}

/// An 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale towards black by `step / 7`.
    fn ramp(self, step: usize) -> Self {
        let scale = step as f64 / (RAMP_STEPS - 1) as f64;
        let channel = |c: u8| (f64::from(c) * scale).round() as u8;
        Self::new(channel(self.r), channel(self.g), channel(self.b))
    }
}

const WHITE: Rgb = Rgb::new(255, 255, 255);
const RED: Rgb = Rgb::new(255, 0, 0);
const ORANGE: Rgb = Rgb::new(255, 165, 0);
const YELLOW: Rgb = Rgb::new(255, 255, 0);
const GREEN: Rgb = Rgb::new(0, 255, 0);
const CYAN: Rgb = Rgb::new(0, 255, 255);
const BLUE: Rgb = Rgb::new(0, 0, 255);
const PURPLE: Rgb = Rgb::new(128, 0, 128);

/// The six base-color orderings the game cycles through.
const COLOR_GROUPS: [[Rgb; 8]; NUM_COLOR_GROUPS] = [
    [WHITE, RED, ORANGE, YELLOW, GREEN, CYAN, BLUE, PURPLE],
    [PURPLE, YELLOW, BLUE, WHITE, CYAN, RED, GREEN, ORANGE],
    [RED, BLUE, YELLOW, CYAN, PURPLE, ORANGE, WHITE, GREEN],
    [YELLOW, PURPLE, GREEN, WHITE, CYAN, RED, ORANGE, BLUE],
    [RED, YELLOW, WHITE, CYAN, BLUE, GREEN, ORANGE, PURPLE],
    [GREEN, BLUE, PURPLE, ORANGE, RED, YELLOW, CYAN, WHITE],
];

/// A fully expanded 64-color palette.
#[derive(Debug)]
pub struct Palette {
    colors: [Rgb; PALETTE_SIZE],
    group: usize,
}

impl Palette {
    /// The default palette (group 0).
    pub fn new() -> Self {
        Self::with_group(0).unwrap_or_else(|_| unreachable!())
    }

    /// Expand one permutation group into its 64-color ramp.
    pub fn with_group(group: usize) -> Result<Self, BadColorGroup> {
        let base = COLOR_GROUPS
            .get(group)
            .ok_or(BadColorGroup { group })?;
        let mut colors = [Rgb::new(0, 0, 0); PALETTE_SIZE];
        for (n, &color) in base.iter().enumerate() {
            for step in 0..RAMP_STEPS {
                colors[n * RAMP_STEPS + step] = color.ramp(step);
            }
        }
        Ok(Self { colors, group })
    }

    pub fn group(&self) -> usize {
        self.group
    }

    /// Resolve a surface's 6-bit color index.
    pub fn color(&self, index: u8) -> Rgb {
        self.colors[usize::from(index) % PALETTE_SIZE]
    }

    /// Palette slot a surface renders with. Shaded surfaces always use
    /// the brightest ramp step of their base color; the lighting pass
    /// darkens from there.
    pub fn material_index(color_index: u8, shaded: bool) -> u8 {
        let index = color_index % PALETTE_SIZE as u8;
        if shaded { index | 7 } else { index }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_group_layout() {
        let palette = Palette::new();
        assert_eq!(palette.group(), 0);
        // ramp step 0 is black, step 7 is the full base color
        assert_eq!(palette.color(0), Rgb::new(0, 0, 0));
        assert_eq!(palette.color(7), WHITE);
        assert_eq!(palette.color(8), Rgb::new(0, 0, 0));
        assert_eq!(palette.color(15), RED);
        assert_eq!(palette.color(63), PURPLE);
    }

    #[test]
    fn test_ramp_rounds_to_nearest() {
        let palette = Palette::new();
        // red ramp: 255 * n/7
        assert_eq!(palette.color(9), Rgb::new(36, 0, 0));
        assert_eq!(palette.color(12), Rgb::new(146, 0, 0));
        assert_eq!(palette.color(14), Rgb::new(219, 0, 0));
    }

    #[test]
    fn test_groups_are_permutations() {
        for group in 0..NUM_COLOR_GROUPS {
            let palette = Palette::with_group(group).unwrap();
            let mut full: Vec<Rgb> = (0..8).map(|n| palette.color(n * 8 + 7)).collect();
            full.sort_by_key(|c| (c.r, c.g, c.b));
            let mut base = [WHITE, RED, ORANGE, YELLOW, GREEN, CYAN, BLUE, PURPLE];
            base.sort_by_key(|c| (c.r, c.g, c.b));
            assert_eq!(full, base);
        }
    }

    #[test]
    fn test_bad_group_rejected() {
        assert_eq!(
            Palette::with_group(6).unwrap_err(),
            BadColorGroup { group: 6 }
        );
    }

    #[test]
    fn test_material_index() {
        assert_eq!(Palette::material_index(0x23, false), 0x23);
        assert_eq!(Palette::material_index(0x23, true), 0x27);
        assert_eq!(Palette::material_index(0x40, false), 0x00);
    }
}
