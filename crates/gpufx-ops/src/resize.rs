//! Resampling and margin cropping.
//!
//! Both operations write a differently-sized result and therefore come in
//! two shapes: the plain form allocates and returns a fresh image, the
//! `_into` form writes to a caller-supplied destination whose logical
//! dimensions must already match the result exactly. The destination is
//! only ever written, never freed, so one allocation can serve a whole
//! pipeline of same-sized results.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use gpufx_compute::{ComputeBackend, DeviceBuffer, GpuImage};
use gpufx_core::{Error, Result};
use tracing::debug;

/// Resampling algorithm for [`resize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMethod {
    /// Nearest neighbor. Fastest, blocky.
    Nearest,
    /// Bilinear interpolation.
    Bilinear,
    /// Bicubic (Catmull-Rom) interpolation. Slowest, smoothest.
    #[default]
    Bicubic,
}

impl fmt::Display for ResizeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
            Self::Bicubic => "bicubic",
        };
        f.write_str(name)
    }
}

impl FromStr for ResizeMethod {
    type Err = Error;

    /// Parses a method name, case-insensitively.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedMethod`] for anything other than `nearest`,
    /// `bilinear`, or `bicubic`.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            "bicubic" => Ok(Self::Bicubic),
            _ => Err(Error::UnsupportedMethod(s.to_string())),
        }
    }
}

fn dispatch_resize(
    backend: &Arc<dyn ComputeBackend>,
    dst: &mut dyn DeviceBuffer,
    src: &dyn DeviceBuffer,
    dst_w: u32,
    dst_h: u32,
    src_w: u32,
    src_h: u32,
    method: ResizeMethod,
) -> Result<()> {
    match method {
        ResizeMethod::Nearest => backend.resize_nearest(dst, src, dst_w, dst_h, src_w, src_h),
        ResizeMethod::Bilinear => backend.resize_bilinear(dst, src, dst_w, dst_h, src_w, src_h),
        ResizeMethod::Bicubic => backend.resize_bicubic(dst, src, dst_w, dst_h, src_w, src_h),
    }
}

/// Resamples `image` to `width x height`, returning a new image.
///
/// # Errors
///
/// [`Error::InvalidArgument`] for zero target dimensions.
///
/// # Example
///
/// ```rust
/// # use std::sync::Arc;
/// # use gpufx_compute::{ComputeBackend, CpuBackend, GpuImage};
/// # use gpufx_ops::resize::{resize, ResizeMethod};
/// # let backend: Arc<dyn ComputeBackend> = Arc::new(CpuBackend::new());
/// let img = GpuImage::new(&backend, 64, 64)?;
/// let half = resize(&img, 32, 32, ResizeMethod::Bilinear)?;
/// assert_eq!(half.dimensions(), (32, 32));
/// # Ok::<(), gpufx_core::Error>(())
/// ```
pub fn resize(image: &GpuImage, width: u32, height: u32, method: ResizeMethod) -> Result<GpuImage> {
    let mut result = GpuImage::new(image.backend(), width, height)?;
    resize_into(image, width, height, method, &mut result)?;
    Ok(result)
}

/// Resamples `image` into a caller-supplied destination.
///
/// # Errors
///
/// [`Error::DimensionMismatch`] when the destination's logical dimensions
/// are not exactly `width x height`; the destination is untouched.
pub fn resize_into(
    image: &GpuImage,
    width: u32,
    height: u32,
    method: ResizeMethod,
    dest: &mut GpuImage,
) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::invalid_argument(
            "resize dimensions must be non-zero",
        ));
    }
    if dest.dimensions() != (width, height) {
        return Err(Error::dimension_mismatch(
            (width, height),
            dest.dimensions(),
        ));
    }
    let (src_w, src_h) = image.dimensions();
    debug!(src_w, src_h, width, height, %method, "resize");
    let backend = Arc::clone(image.backend());
    dispatch_resize(
        &backend,
        dest.buffer_mut()?,
        image.buffer()?,
        width,
        height,
        src_w,
        src_h,
        method,
    )
}

/// Validated crop geometry shared by both crop shapes.
fn crop_extent(image: &GpuImage, left: i32, top: i32, right: i32, bottom: i32) -> Result<(u32, u32)> {
    if left < 0 || top < 0 || right < 0 || bottom < 0 {
        return Err(Error::invalid_argument("margins cannot be negative"));
    }
    let (width, height) = image.dimensions();
    if left as i64 + right as i64 >= width as i64 || top as i64 + bottom as i64 >= height as i64 {
        return Err(Error::invalid_argument(
            "total margins exceed image dimensions",
        ));
    }
    Ok((
        width - left as u32 - right as u32,
        height - top as u32 - bottom as u32,
    ))
}

/// Crops the given margins off the edges of `image`, returning a new image.
///
/// # Errors
///
/// [`Error::InvalidArgument`] for negative margins or margins that consume
/// an entire axis.
pub fn crop_margins(
    image: &GpuImage,
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
) -> Result<GpuImage> {
    let (new_w, new_h) = crop_extent(image, left, top, right, bottom)?;
    let mut result = GpuImage::new(image.backend(), new_w, new_h)?;
    crop_margins_into(image, left, top, right, bottom, &mut result)?;
    Ok(result)
}

/// Crops margins into a caller-supplied destination.
///
/// The destination's logical dimensions must equal the crop result
/// (`width - left - right` by `height - top - bottom`).
pub fn crop_margins_into(
    image: &GpuImage,
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
    dest: &mut GpuImage,
) -> Result<()> {
    let (new_w, new_h) = crop_extent(image, left, top, right, bottom)?;
    if dest.dimensions() != (new_w, new_h) {
        return Err(Error::dimension_mismatch((new_w, new_h), dest.dimensions()));
    }
    let (src_w, src_h) = image.dimensions();
    debug!(src_w, src_h, left, top, right, bottom, "crop_margins");
    let backend = Arc::clone(image.backend());
    backend.crop(
        dest.buffer_mut()?,
        image.buffer()?,
        src_w,
        src_h,
        new_w,
        new_h,
        left,
        top,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::fill_color;
    use gpufx_compute::CpuBackend;
    use gpufx_core::Rgba;

    fn image(w: u32, h: u32) -> GpuImage {
        let backend: Arc<dyn ComputeBackend> = Arc::new(CpuBackend::new());
        GpuImage::new(&backend, w, h).unwrap()
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("nearest".parse::<ResizeMethod>().unwrap(), ResizeMethod::Nearest);
        assert_eq!("BiCubic".parse::<ResizeMethod>().unwrap(), ResizeMethod::Bicubic);
        let err = "lanczos".parse::<ResizeMethod>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedMethod(s) if s == "lanczos"));
        assert_eq!(ResizeMethod::default(), ResizeMethod::Bicubic);
    }

    #[test]
    fn test_resize_owned_result() {
        let mut img = image(8, 8);
        fill_color(&mut img, Rgba::rgb(10, 20, 30)).unwrap();
        let out = resize(&img, 4, 2, ResizeMethod::Nearest).unwrap();
        assert_eq!(out.dimensions(), (4, 2));
        assert!(out.download().unwrap().chunks_exact(4).all(|p| p == [10, 20, 30, 255]));
    }

    #[test]
    fn test_resize_into_validates_destination() {
        let img = image(8, 8);
        let mut dest = image(4, 4);
        let err = resize_into(&img, 4, 2, ResizeMethod::Bilinear, &mut dest).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected_w: 4,
                expected_h: 2,
                got_w: 4,
                got_h: 4,
            }
        ));
    }

    #[test]
    fn test_resize_into_reuses_destination() {
        let mut img = image(8, 8);
        fill_color(&mut img, Rgba::rgb(5, 5, 5)).unwrap();
        let mut dest = image(4, 4);
        resize_into(&img, 4, 4, ResizeMethod::Bicubic, &mut dest).unwrap();
        assert!(dest.download().unwrap().chunks_exact(4).all(|p| p == [5, 5, 5, 255]));
    }

    #[test]
    fn test_crop_margin_validation() {
        let img = image(10, 10);
        let err = crop_margins(&img, -1, 0, 0, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        // Margins that consume the full axis are rejected, even exactly.
        let err = crop_margins(&img, 5, 0, 5, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_crop_margins_geometry() {
        let mut img = image(4, 4);
        let bytes: Vec<u8> = (0..64).collect();
        img.upload(&bytes, 4, 4).unwrap();
        let out = crop_margins(&img, 1, 1, 1, 1).unwrap();
        assert_eq!(out.dimensions(), (2, 2));
        // Top-left of the crop is source pixel (1, 1).
        assert_eq!(&out.download().unwrap()[0..4], &bytes[(4 + 1) * 4..(4 + 1) * 4 + 4]);
    }

    #[test]
    fn test_crop_margins_leaving_single_column() {
        let mut img = image(10, 10);
        let mut bytes = Vec::with_capacity(400);
        for _y in 0..10 {
            for x in 0..10u8 {
                bytes.extend_from_slice(&[x, 0, 0, 255]);
            }
        }
        img.upload(&bytes, 10, 10).unwrap();

        // Margins summing to width - 1 are the largest that still succeed.
        let out = crop_margins(&img, 5, 0, 4, 0).unwrap();
        assert_eq!(out.dimensions(), (1, 10));
        // The surviving column is source column 5.
        assert!(out.download().unwrap().chunks_exact(4).all(|p| p[0] == 5));
    }

    #[test]
    fn test_crop_margins_into_validates_destination() {
        let img = image(10, 10);
        let mut dest = image(9, 9);
        let err = crop_margins_into(&img, 1, 1, 1, 1, &mut dest).unwrap_err();
        assert!(err.is_dimension_error());
    }
}
