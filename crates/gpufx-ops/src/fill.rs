//! Solid and gradient fills.

use std::sync::Arc;

use gpufx_compute::GpuImage;
use gpufx_core::{Result, Rgba};
use tracing::debug;

/// Direction of a two-color linear gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum GradientDirection {
    /// Top to bottom.
    #[default]
    Vertical = 0,
    /// Left to right.
    Horizontal = 1,
    /// Top-left to bottom-right.
    Diagonal = 2,
    /// Bottom-left to top-right.
    DiagonalUp = 3,
}

/// Fills the whole logical extent with a solid color.
///
/// # Example
///
/// ```rust
/// # use std::sync::Arc;
/// # use gpufx_compute::{ComputeBackend, CpuBackend, GpuImage};
/// # use gpufx_core::Rgba;
/// # let backend: Arc<dyn ComputeBackend> = Arc::new(CpuBackend::new());
/// let mut img = GpuImage::new(&backend, 8, 8)?;
/// gpufx_ops::fill::fill_color(&mut img, Rgba::WHITE)?;
/// # Ok::<(), gpufx_core::Error>(())
/// ```
pub fn fill_color(image: &mut GpuImage, color: Rgba) -> Result<()> {
    let (width, height) = image.dimensions();
    debug!(width, height, ?color, "fill_color");
    let backend = Arc::clone(image.backend());
    backend.fill_solid(image.buffer_mut()?, width, height, color)
}

/// Fills the whole logical extent with a linear gradient from `color1` to
/// `color2`.
///
/// With `seamless`, the ramp runs to `color2` at the midpoint and back, so
/// opposite edges match when the image is tiled.
pub fn fill_gradient(
    image: &mut GpuImage,
    color1: Rgba,
    color2: Rgba,
    direction: GradientDirection,
    seamless: bool,
) -> Result<()> {
    let (width, height) = image.dimensions();
    debug!(width, height, ?direction, seamless, "fill_gradient");
    let backend = Arc::clone(image.backend());
    backend.fill_gradient(
        image.buffer_mut()?,
        width,
        height,
        color1,
        color2,
        direction as u32,
        seamless,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpufx_compute::{ComputeBackend, CpuBackend};

    fn image(w: u32, h: u32) -> GpuImage {
        let backend: Arc<dyn ComputeBackend> = Arc::new(CpuBackend::new());
        GpuImage::new(&backend, w, h).unwrap()
    }

    #[test]
    fn test_fill_color_covers_logical_extent() {
        let mut img = image(3, 3);
        fill_color(&mut img, Rgba::new(1, 2, 3, 4)).unwrap();
        let px = img.download().unwrap();
        assert!(px.chunks_exact(4).all(|p| p == [1, 2, 3, 4]));
    }

    #[test]
    fn test_horizontal_gradient_endpoints() {
        let mut img = image(4, 1);
        fill_gradient(
            &mut img,
            Rgba::rgb(0, 0, 0),
            Rgba::rgb(255, 255, 255),
            GradientDirection::Horizontal,
            false,
        )
        .unwrap();
        let px = img.download().unwrap();
        assert_eq!(px[0], 0);
        assert_eq!(px[12], 255);
    }

    #[test]
    fn test_seamless_gradient_edges_match() {
        let mut img = image(5, 1);
        fill_gradient(
            &mut img,
            Rgba::rgb(0, 0, 0),
            Rgba::rgb(200, 200, 200),
            GradientDirection::Horizontal,
            true,
        )
        .unwrap();
        let px = img.download().unwrap();
        assert_eq!(px[0], px[16]); // first and last pixel agree
    }

    #[test]
    fn test_fill_respects_shrunk_logical_extent() {
        let mut img = image(4, 4);
        fill_color(&mut img, Rgba::rgb(9, 9, 9)).unwrap();
        img.set_dimensions(2, 2).unwrap();
        fill_color(&mut img, Rgba::rgb(1, 1, 1)).unwrap();
        let px = img.download().unwrap();
        assert_eq!(px.len(), 16);
        assert!(px.chunks_exact(4).all(|p| p == [1, 1, 1, 255]));
    }
}
