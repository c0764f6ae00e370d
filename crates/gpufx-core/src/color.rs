//! RGBA color value type.
//!
//! Pixel data throughout gpufx is 8-bit-per-channel RGBA, 4 bytes per pixel,
//! row-major, no padding. [`Rgba`] is the host-side value type for a single
//! color: a plain `Copy` struct with no ownership semantics.

/// An RGBA color with 8-bit channels.
///
/// Alpha defaults to 255 (opaque) via [`Rgba::rgb`].
///
/// # Example
///
/// ```rust
/// use gpufx_core::Rgba;
///
/// let red = Rgba::rgb(255, 0, 0);
/// assert_eq!(red.a, 255);
///
/// let transparent_black = Rgba::new(0, 0, 0, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// Red channel (0-255).
    pub r: u8,
    /// Green channel (0-255).
    pub g: u8,
    /// Blue channel (0-255).
    pub b: u8,
    /// Alpha channel (0-255), 255 = opaque.
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    /// Creates a color from all four channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color (alpha = 255).
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Returns the channels as a `[r, g, b, a]` byte array.
    ///
    /// This is the wire layout used by device buffers.
    #[inline]
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Builds a color from a `[r, g, b, a]` byte array.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

impl From<[u8; 4]> for Rgba {
    fn from(bytes: [u8; 4]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Rgba> for [u8; 4] {
    fn from(color: Rgba) -> Self {
        color.to_bytes()
    }
}
