//! Texture sampling for column writes.
//!
//! Texture loading lives outside this crate. The frame buffer only needs
//! something it can sample per pixel, which is what [`TextureSampler`] is.

use super::double_buffer::Color;

/// Halves every channel of a packed `0x00RRGGBB` colour after a right shift.
///
/// Used to darken one side of a wall so corners read at a glance.
pub const DARKEN_MASK: Color = 0x007F_7F7F;

/// Something a textured span can pull colours from.
///
/// Implementors must accept any coordinate: out-of-range values wrap or
/// clamp, they never panic. Sampling happens inside the front-buffer lock,
/// so it must not allocate or block.
pub trait TextureSampler {
    /// Height of the texture in texels.
    fn height(&self) -> usize;

    /// Returns the colour at texel `(x, y)`.
    fn sample(&self, x: usize, y: usize) -> Color;
}

/// An in-memory texture with wrapping lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    width: usize,
    height: usize,
    texels: Vec<Color>,
}

impl Texture {
    /// Wraps a row-major texel vector.
    ///
    /// Returns `None` if the dimensions are zero or do not match the
    /// vector length.
    #[must_use]
    pub fn from_texels(width: usize, height: usize, texels: Vec<Color>) -> Option<Self> {
        if width == 0 || height == 0 || texels.len() != width * height {
            return None;
        }
        Some(Self { width, height, texels })
    }

    /// Builds a `size` x `size` checkerboard of two colours, `cell` texels per square.
    #[must_use]
    pub fn checkerboard(size: usize, cell: usize, a: Color, b: Color) -> Self {
        let size = size.max(1);
        let cell = cell.max(1);
        let texels = (0..size * size)
            .map(|i| {
                let (x, y) = (i % size, i / size);
                if (x / cell + y / cell) % 2 == 0 { a } else { b }
            })
            .collect();
        Self { width: size, height: size, texels }
    }

    /// Width of the texture in texels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }
}

impl TextureSampler for Texture {
    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn sample(&self, x: usize, y: usize) -> Color {
        self.texels[(y % self.height) * self.width + (x % self.width)]
    }
}

/// One textured wall column, as produced by a raycaster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TexturedSpan {
    /// Screen column.
    pub x: usize,
    /// First row to write (inclusive).
    pub y_start: usize,
    /// Last row to write (inclusive).
    pub y_end: usize,
    /// Full projected height of the wall slice, may exceed the screen.
    pub line_height: usize,
    /// Texture column to sample.
    pub tex_x: usize,
    /// Whether to darken the column.
    pub darken: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_dimension_mismatch() {
        assert!(Texture::from_texels(2, 2, vec![0; 3]).is_none());
        assert!(Texture::from_texels(0, 2, Vec::new()).is_none());
        assert!(Texture::from_texels(2, 2, vec![0; 4]).is_some());
    }

    #[test]
    fn test_texture_wraps() {
        let tex = Texture::from_texels(2, 2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(tex.sample(0, 0), 1);
        assert_eq!(tex.sample(3, 0), 2);
        assert_eq!(tex.sample(0, 3), 3);
        assert_eq!(tex.sample(5, 5), 4);
    }

    #[test]
    fn test_checkerboard() {
        let tex = Texture::checkerboard(4, 2, 0xA, 0xB);
        assert_eq!(tex.sample(0, 0), 0xA);
        assert_eq!(tex.sample(2, 0), 0xB);
        assert_eq!(tex.sample(2, 2), 0xA);
        assert_eq!(tex.width(), 4);
    }
}
