// color.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Color maps (palettes)
use crate::error::EncodeError;

/// Number of bytes per color
pub(crate) const CHANNELS: usize = 3;

/// Maximum number of colors in one map
pub const MAX_COLORS: usize = 256;

/// One RGB color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    /// Create a new color
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Color { red, green, blue }
    }
}

/// A color map (global or local).
///
/// The number of colors is always a power of two, between 2 and 256.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorMap {
    colors: Vec<Color>,
    sorted: bool,
}

/// Get the number of bits needed to index a number of colors (minimum 1)
pub fn bit_size(n_colors: usize) -> u8 {
    let mut bits = 1;
    while bits < 8 && (1 << bits) < n_colors {
        bits += 1;
    }
    bits
}

impl ColorMap {
    /// Create a color map, padding with black to a power of two.
    ///
    /// Returns `None` if `colors` is empty or has more than 256 entries.
    pub fn new(colors: &[Color]) -> Option<Self> {
        if colors.is_empty() || colors.len() > MAX_COLORS {
            return None;
        }
        let mut colors = colors.to_vec();
        colors.resize(1 << bit_size(colors.len()), Color::default());
        Some(ColorMap {
            colors,
            sorted: false,
        })
    }

    /// Create a color map from packed RGB triples
    pub fn with_rgb(rgb: &[u8]) -> Option<Self> {
        let colors: Vec<Color> = rgb
            .chunks_exact(CHANNELS)
            .map(|c| Color::new(c[0], c[1], c[2]))
            .collect();
        Self::new(&colors)
    }

    /// Set the sort flag (advisory only)
    pub fn with_sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    /// Check the sort flag
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Get the number of colors
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Color maps are never empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Get the number of bits per pixel index
    pub fn bit_depth(&self) -> u8 {
        bit_size(self.colors.len())
    }

    /// Get the colors
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Get one color
    pub fn color(&self, idx: u8) -> Option<Color> {
        self.colors.get(idx as usize).copied()
    }

    /// Set one color
    pub fn set_color(&mut self, idx: u8, clr: Color) -> bool {
        match self.colors.get_mut(idx as usize) {
            Some(c) => {
                *c = clr;
                true
            }
            None => false,
        }
    }

    /// Resize to hold at least `n_colors`, rounded up to a power of two.
    ///
    /// New entries are black; shrinking drops entries from the end.
    pub fn resize(&mut self, n_colors: usize) {
        let n_colors = n_colors.clamp(2, MAX_COLORS);
        self.colors.resize(1 << bit_size(n_colors), Color::default());
    }

    /// Size of color map in bytes
    pub(crate) fn size_bytes(&self) -> usize {
        self.colors.len() * CHANNELS
    }

    /// Get packed RGB triples
    pub(crate) fn to_rgb(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size_bytes());
        for c in &self.colors {
            buf.extend_from_slice(&[c.red, c.green, c.blue]);
        }
        buf
    }

    /// Merge two color maps.
    ///
    /// The result holds every color of `self` at its original index,
    /// followed by each color of `other` not already present.  If that
    /// would exceed 256 colors, trailing black entries of `self` (padding)
    /// are dropped first, as long as the distinct colors still fit.  The
    /// returned table maps indices of `other` to indices in the result.
    pub fn union(&self, other: &ColorMap) -> Result<(ColorMap, Vec<u8>), EncodeError> {
        let (mut colors, table) = match merge(&self.colors, &other.colors) {
            Some(merged) => merged,
            None => {
                let used = self
                    .colors
                    .iter()
                    .rposition(|c| *c != Color::default())
                    .map_or(0, |i| i + 1);
                debug!("union: reusing {} padding entries", self.len() - used);
                merge(&self.colors[..used], &other.colors)
                    .ok_or(EncodeError::TooManyColors)?
            }
        };
        debug!("union: {} + {} => {}", self.len(), other.len(), colors.len());
        colors.resize(1 << bit_size(colors.len()), Color::default());
        let map = ColorMap {
            colors,
            sorted: false,
        };
        Ok((map, table))
    }
}

/// Append colors not present in `base`, with a translation table.
///
/// Returns `None` if the result would not fit in one color map.
fn merge(base: &[Color], other: &[Color]) -> Option<(Vec<Color>, Vec<u8>)> {
    let mut colors = base.to_vec();
    let mut table = Vec::with_capacity(other.len());
    for clr in other {
        let idx = match colors.iter().position(|c| c == clr) {
            Some(idx) => idx,
            None => {
                colors.push(*clr);
                colors.len() - 1
            }
        };
        if idx >= MAX_COLORS {
            return None;
        }
        table.push(idx as u8);
    }
    Some((colors, table))
}

#[cfg(test)]
mod test {
    use super::*;

    const BLACK: Color = Color::new(0, 0, 0);
    const WHITE: Color = Color::new(255, 255, 255);
    const RED: Color = Color::new(255, 0, 0);
    const BLUE: Color = Color::new(0, 0, 255);

    #[test]
    fn bit_depth() {
        assert_eq!(bit_size(0), 1);
        assert_eq!(bit_size(2), 1);
        assert_eq!(bit_size(3), 2);
        assert_eq!(bit_size(4), 2);
        assert_eq!(bit_size(5), 3);
        assert_eq!(bit_size(16), 4);
        assert_eq!(bit_size(17), 5);
        assert_eq!(bit_size(129), 8);
        assert_eq!(bit_size(256), 8);
    }

    #[test]
    fn padding() {
        let map = ColorMap::new(&[RED, BLUE, WHITE]).unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map.bit_depth(), 2);
        assert_eq!(map.color(3), Some(BLACK));
        assert_eq!(map.color(4), None);
        let map = ColorMap::new(&[RED]).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.bit_depth(), 1);
        assert!(ColorMap::new(&[]).is_none());
        assert!(ColorMap::new(&[RED; 257]).is_none());
    }

    #[test]
    fn resize() {
        let mut map = ColorMap::new(&[RED, BLUE]).unwrap();
        map.resize(9);
        assert_eq!(map.len(), 16);
        assert_eq!(map.bit_depth(), 4);
        map.resize(3);
        assert_eq!(map.len(), 4);
        assert_eq!(map.bit_depth(), 2);
        assert_eq!(map.colors(), &[RED, BLUE, BLACK, BLACK]);
    }

    #[test]
    fn rgb() {
        let map = ColorMap::with_rgb(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(map.colors(), &[Color::new(1, 2, 3), Color::new(4, 5, 6)]);
        assert_eq!(map.to_rgb(), [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn union() {
        let a = ColorMap::new(&[BLACK, WHITE]).unwrap();
        let b = ColorMap::new(&[WHITE, RED, BLUE]).unwrap();
        // b was padded with black at index 3
        let (map, table) = a.union(&b).unwrap();
        assert_eq!(map.colors(), &[BLACK, WHITE, RED, BLUE]);
        assert_eq!(&table[..3], &[1, 2, 3]);
        assert_eq!(table[3], 0);
        assert_eq!(map.bit_depth(), 2);
    }

    #[test]
    fn union_pads_result() {
        let a = ColorMap::new(&[RED, BLUE]).unwrap();
        let b = ColorMap::new(&[WHITE, Color::new(1, 1, 1)]).unwrap();
        let (map, table) = a.union(&b).unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(table, [2, 3]);
        let c = ColorMap::new(&[Color::new(9, 9, 9), RED]).unwrap();
        let (map, table) = map.union(&c).unwrap();
        assert_eq!(map.len(), 8);
        assert_eq!(map.color(4), Some(Color::new(9, 9, 9)));
        assert_eq!(map.color(5), Some(BLACK));
        assert_eq!(table, [4, 0]);
    }

    #[test]
    fn union_overflow() {
        let a: Vec<Color> = (0..200).map(|i| Color::new(i as u8, 0, 0)).collect();
        let b: Vec<Color> = (0..200).map(|i| Color::new(0, i as u8, 1)).collect();
        let a = ColorMap::new(&a).unwrap();
        let b = ColorMap::new(&b).unwrap();
        let (a_before, b_before) = (a.clone(), b.clone());
        assert!(matches!(a.union(&b), Err(EncodeError::TooManyColors)));
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }

    #[test]
    fn union_reuses_padding() {
        let a: Vec<Color> = (0..129).map(|i| Color::new(i as u8, 0, 0)).collect();
        let a = ColorMap::new(&a).unwrap();
        assert_eq!(a.len(), 256);
        let b = ColorMap::new(&[Color::new(0, 9, 9), Color::new(0, 8, 8)]).unwrap();
        let (map, table) = a.union(&b).unwrap();
        assert_eq!(map.len(), 256);
        assert_eq!(table, [129, 130]);
        assert_eq!(&map.colors()[..129], &a.colors()[..129]);
        assert_eq!(map.color(129), Some(Color::new(0, 9, 9)));
        assert_eq!(map.color(130), Some(Color::new(0, 8, 8)));
        assert_eq!(map.color(131), Some(BLACK));
    }

    #[test]
    fn union_full_map() {
        // 256 distinct colors with nothing to spare
        let a: Vec<Color> = (0..256).map(|i| Color::new(i as u8, 1, 0)).collect();
        let a = ColorMap::new(&a).unwrap();
        let same = ColorMap::new(&[Color::new(7, 1, 0)]).unwrap();
        // `same` is padded with black, which is not in `a`
        assert!(matches!(a.union(&same), Err(EncodeError::TooManyColors)));
        let (map, table) = a.union(&a).unwrap();
        assert_eq!(map, a);
        assert_eq!(table.len(), 256);
        assert_eq!(table[255], 255);
    }
}
