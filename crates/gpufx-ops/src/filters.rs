//! In-place and snapshot-consuming effects.
//!
//! The second family (stroke, shadow, gaussian blur) mutates its target
//! while reading the target's original pixels. Each of these takes
//! `cache: Option<&mut GpuImage>` and runs the snapshot protocol:
//!
//! 1. with `Some(cache)`, validate that the cache's logical dimensions
//!    equal the target's ([`Error::DimensionMismatch`] otherwise); with
//!    `None`, allocate a transient snapshot at the target's size;
//! 2. device-copy the target's pixels into the snapshot;
//! 3. dispatch the kernel reading the snapshot and writing the target;
//! 4. drop the snapshot if transient; a borrowed cache is never freed.
//!
//! Step 4 holds on every path, including kernel errors, because the
//! transient snapshot is an owned local.

use std::str::FromStr;
use std::sync::Arc;

use gpufx_compute::{ComputeBackend, DeviceBuffer, GpuImage};
use gpufx_core::{Error, Result, Rgba};
use tracing::{debug, trace};

/// Which side of the alpha edge a stroke or shadow is rendered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum EdgePlacement {
    /// Effect grows outward into transparent pixels.
    #[default]
    Outer = 0,
    /// Effect eats inward into opaque pixels.
    Inner = 1,
}

/// Channel of the key image examined by [`apply_chroma_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ChromaChannel {
    /// Red channel.
    Red = 0,
    /// Green channel.
    Green = 1,
    /// Blue channel.
    Blue = 2,
    /// Alpha channel.
    Alpha = 3,
}

impl FromStr for ChromaChannel {
    type Err = Error;

    /// Accepts single-letter (`r`) or full (`red`) names, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "r" | "red" => Ok(Self::Red),
            "g" | "green" => Ok(Self::Green),
            "b" | "blue" => Ok(Self::Blue),
            "a" | "alpha" => Ok(Self::Alpha),
            _ => Err(Error::invalid_argument(format!(
                "unrecognized chroma channel: {s:?}"
            ))),
        }
    }
}

/// Runs the snapshot protocol around a kernel dispatch.
///
/// `op` receives `(backend, target, snapshot, width, height)` with the
/// snapshot already holding the target's pre-mutation pixels.
fn with_snapshot<F>(image: &mut GpuImage, cache: Option<&mut GpuImage>, op: F) -> Result<()>
where
    F: FnOnce(
        &Arc<dyn ComputeBackend>,
        &mut dyn DeviceBuffer,
        &dyn DeviceBuffer,
        u32,
        u32,
    ) -> Result<()>,
{
    let (width, height) = image.dimensions();
    let backend = Arc::clone(image.backend());
    match cache {
        Some(cache) => {
            if cache.dimensions() != (width, height) {
                return Err(Error::dimension_mismatch(
                    (width, height),
                    cache.dimensions(),
                ));
            }
            trace!(width, height, "snapshot into borrowed cache");
            backend.copy_device_to_device(cache.buffer_mut()?, image.buffer()?, width, height)?;
            op(&backend, image.buffer_mut()?, cache.buffer()?, width, height)
        }
        None => {
            trace!(width, height, "snapshot into transient buffer");
            let mut snapshot = GpuImage::new(&backend, width, height)?;
            backend.copy_device_to_device(
                snapshot.buffer_mut()?,
                image.buffer()?,
                width,
                height,
            )?;
            op(&backend, image.buffer_mut()?, snapshot.buffer()?, width, height)
            // snapshot dropped here, releasing the transient buffer
        }
    }
}

/// Rounds the image corners by clearing alpha outside quarter-circle arcs
/// of the given radius.
pub fn apply_corner_radius(image: &mut GpuImage, radius: u32) -> Result<()> {
    let (width, height) = image.dimensions();
    debug!(width, height, radius, "apply_corner_radius");
    let backend = Arc::clone(image.backend());
    backend.corner_radius(image.buffer_mut()?, width, height, radius)
}

/// Multiplies every pixel's alpha by `opacity`.
///
/// # Errors
///
/// [`Error::InvalidArgument`] unless `opacity` is within `[0.0, 1.0]`.
pub fn apply_opacity(image: &mut GpuImage, opacity: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&opacity) {
        return Err(Error::invalid_argument(format!(
            "opacity must be in [0.0, 1.0], got {opacity}"
        )));
    }
    let (width, height) = image.dimensions();
    debug!(width, height, opacity, "apply_opacity");
    let backend = Arc::clone(image.backend());
    backend.opacity(image.buffer_mut()?, width, height, opacity)
}

/// Mirrors the image along one axis.
///
/// # Errors
///
/// [`Error::InvalidArgument`] when both flags are set; flipping both axes
/// takes two calls. Both flags unset is a no-op.
pub fn apply_flip(image: &mut GpuImage, horizontal: bool, vertical: bool) -> Result<()> {
    if horizontal && vertical {
        return Err(Error::invalid_argument(
            "horizontal and vertical flip are mutually exclusive",
        ));
    }
    let (width, height) = image.dimensions();
    debug!(width, height, horizontal, vertical, "apply_flip");
    let backend = Arc::clone(image.backend());
    backend.flip(image.buffer_mut()?, width, height, horizontal, vertical)
}

/// Converts the image to grayscale, preserving alpha.
pub fn apply_grayscale(image: &mut GpuImage) -> Result<()> {
    let (width, height) = image.dimensions();
    debug!(width, height, "apply_grayscale");
    let backend = Arc::clone(image.backend());
    backend.grayscale(image.buffer_mut()?, width, height)
}

/// Keys out pixels of `image` wherever the corresponding `key` pixel's
/// selected channel is at or above `threshold`.
///
/// The key image may have different dimensions; it is sampled
/// proportionally. `invert` keys the pixels *below* the threshold instead;
/// `zero_all_channels` clears color channels along with alpha.
pub fn apply_chroma_key(
    image: &mut GpuImage,
    key: &GpuImage,
    channel: ChromaChannel,
    threshold: u8,
    invert: bool,
    zero_all_channels: bool,
) -> Result<()> {
    let (width, height) = image.dimensions();
    let (key_w, key_h) = key.dimensions();
    debug!(width, height, key_w, key_h, ?channel, threshold, invert, "apply_chroma_key");
    let backend = Arc::clone(image.backend());
    backend.chroma_key(
        image.buffer_mut()?,
        key.buffer()?,
        width,
        height,
        key_w,
        key_h,
        channel as u32,
        threshold,
        invert,
        zero_all_channels,
    )
}

/// Draws a stroke of `stroke_width` pixels along the image's alpha edge.
///
/// Snapshot-consuming: see the module docs for the `cache` contract.
///
/// # Example
///
/// ```rust
/// # use std::sync::Arc;
/// # use gpufx_compute::{ComputeBackend, CpuBackend, GpuImage};
/// # use gpufx_core::Rgba;
/// # use gpufx_ops::filters::{apply_stroke, EdgePlacement};
/// # let backend: Arc<dyn ComputeBackend> = Arc::new(CpuBackend::new());
/// let mut img = GpuImage::new(&backend, 64, 64)?;
/// let mut cache = GpuImage::new(&backend, 64, 64)?;
///
/// // Transient snapshot:
/// apply_stroke(&mut img, None, 2, Rgba::BLACK, EdgePlacement::Outer)?;
/// // Reused snapshot across repeated calls:
/// apply_stroke(&mut img, Some(&mut cache), 2, Rgba::BLACK, EdgePlacement::Outer)?;
/// # Ok::<(), gpufx_core::Error>(())
/// ```
pub fn apply_stroke(
    image: &mut GpuImage,
    cache: Option<&mut GpuImage>,
    stroke_width: u32,
    color: Rgba,
    placement: EdgePlacement,
) -> Result<()> {
    let (width, height) = image.dimensions();
    debug!(width, height, stroke_width, ?placement, "apply_stroke");
    with_snapshot(image, cache, |backend, target, snapshot, w, h| {
        backend.stroke(target, snapshot, w, h, stroke_width, color, placement as u32)
    })
}

/// Casts a soft shadow of the image's alpha silhouette.
///
/// `radius` is the shadow spread in pixels, `intensity` its strength in
/// `[0.0, 1.0]`. Snapshot-consuming: see the module docs for `cache`.
pub fn apply_shadow(
    image: &mut GpuImage,
    cache: Option<&mut GpuImage>,
    radius: f32,
    intensity: f32,
    color: Rgba,
    placement: EdgePlacement,
) -> Result<()> {
    if !(0.0..=1.0).contains(&intensity) {
        return Err(Error::invalid_argument(format!(
            "shadow intensity must be in [0.0, 1.0], got {intensity}"
        )));
    }
    if radius < 0.0 {
        return Err(Error::invalid_argument("shadow radius cannot be negative"));
    }
    let (width, height) = image.dimensions();
    debug!(width, height, radius, intensity, ?placement, "apply_shadow");
    with_snapshot(image, cache, |backend, target, snapshot, w, h| {
        backend.shadow(target, snapshot, w, h, radius, intensity, color, placement as u32)
    })
}

/// Gaussian-blurs the image with the given radius.
///
/// Snapshot-consuming: see the module docs for `cache`.
pub fn apply_gaussian_blur(
    image: &mut GpuImage,
    cache: Option<&mut GpuImage>,
    radius: f32,
) -> Result<()> {
    if radius < 0.0 {
        return Err(Error::invalid_argument("blur radius cannot be negative"));
    }
    let (width, height) = image.dimensions();
    debug!(width, height, radius, "apply_gaussian_blur");
    with_snapshot(image, cache, |backend, target, snapshot, w, h| {
        backend.gaussian_blur(target, snapshot, w, h, radius)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::fill_color;
    use gpufx_compute::CpuBackend;

    fn setup(w: u32, h: u32) -> (Arc<CpuBackend>, GpuImage) {
        let cpu = Arc::new(CpuBackend::new());
        let backend: Arc<dyn ComputeBackend> = cpu.clone();
        let img = GpuImage::new(&backend, w, h).unwrap();
        (cpu, img)
    }

    #[test]
    fn test_opacity_range_validated() {
        let (_cpu, mut img) = setup(2, 2);
        assert!(apply_opacity(&mut img, 1.5).is_err());
        assert!(apply_opacity(&mut img, -0.1).is_err());
        apply_opacity(&mut img, 0.5).unwrap();
    }

    #[test]
    fn test_opacity_halves_alpha() {
        let (_cpu, mut img) = setup(1, 1);
        fill_color(&mut img, Rgba::new(10, 10, 10, 200)).unwrap();
        apply_opacity(&mut img, 0.5).unwrap();
        assert_eq!(img.download().unwrap()[3], 100);
    }

    #[test]
    fn test_flip_flags_mutually_exclusive() {
        let (_cpu, mut img) = setup(2, 2);
        let err = apply_flip(&mut img, true, true).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        apply_flip(&mut img, true, false).unwrap();
        apply_flip(&mut img, false, false).unwrap(); // no-op
    }

    #[test]
    fn test_chroma_channel_parsing() {
        assert_eq!("g".parse::<ChromaChannel>().unwrap(), ChromaChannel::Green);
        assert_eq!("ALPHA".parse::<ChromaChannel>().unwrap(), ChromaChannel::Alpha);
        assert!("luma".parse::<ChromaChannel>().is_err());
    }

    #[test]
    fn test_transient_snapshot_is_released() {
        let (cpu, mut img) = setup(8, 8);
        fill_color(&mut img, Rgba::rgb(100, 100, 100)).unwrap();
        assert_eq!(cpu.live_allocations(), 1);
        apply_gaussian_blur(&mut img, None, 2.0).unwrap();
        // Only the image's own buffer remains.
        assert_eq!(cpu.live_allocations(), 1);
    }

    #[test]
    fn test_borrowed_cache_dimensions_validated() {
        let (_cpu, mut img) = setup(8, 8);
        let backend = Arc::clone(img.backend());
        let mut cache = GpuImage::new(&backend, 4, 4).unwrap();
        let err = apply_gaussian_blur(&mut img, Some(&mut cache), 2.0).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected_w: 8,
                expected_h: 8,
                got_w: 4,
                got_h: 4,
            }
        ));
    }

    #[test]
    fn test_borrowed_cache_survives_operation() {
        let (cpu, mut img) = setup(8, 8);
        let backend = Arc::clone(img.backend());
        fill_color(&mut img, Rgba::rgb(50, 50, 50)).unwrap();
        let mut cache = GpuImage::new(&backend, 8, 8).unwrap();

        apply_stroke(&mut img, Some(&mut cache), 1, Rgba::BLACK, EdgePlacement::Outer).unwrap();
        assert!(cache.is_allocated());
        // Cache now holds the pre-mutation snapshot.
        assert_eq!(cache.download().unwrap()[0], 50);
        assert_eq!(cpu.live_allocations(), 2);
    }

    #[test]
    fn test_blur_preserves_constant_image() {
        let (_cpu, mut img) = setup(4, 4);
        fill_color(&mut img, Rgba::rgb(80, 80, 80)).unwrap();
        apply_gaussian_blur(&mut img, None, 1.5).unwrap();
        assert!(img.download().unwrap().chunks_exact(4).all(|p| p == [80, 80, 80, 255]));
    }

    #[test]
    fn test_shadow_parameters_validated() {
        let (_cpu, mut img) = setup(2, 2);
        assert!(apply_shadow(&mut img, None, 2.0, 1.5, Rgba::BLACK, EdgePlacement::Outer).is_err());
        assert!(apply_shadow(&mut img, None, -1.0, 0.5, Rgba::BLACK, EdgePlacement::Outer).is_err());
    }
}
