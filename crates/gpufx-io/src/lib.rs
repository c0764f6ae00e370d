//! # gpufx-io
//!
//! File load/save for [`GpuImage`]s through the `image` codec crate.
//!
//! Decoding and encoding happen entirely on the host; this crate only
//! converts between files and raw RGBA8, then hands the bytes to the
//! device image's transfer methods. Format is inferred from the file
//! extension on save and from content on load.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gpufx_compute::{ComputeBackend, CpuBackend};
//! use gpufx_io::{load_image, save_image};
//!
//! let backend: Arc<dyn ComputeBackend> = Arc::new(CpuBackend::new());
//! let img = load_image("texture.png", &backend, None)?;
//! save_image(&img, "copy.png")?;
//! # Ok::<(), gpufx_io::IoError>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use std::path::Path;
use std::sync::Arc;

use gpufx_compute::{ComputeBackend, GpuImage};
use thiserror::Error;
use tracing::debug;

/// Errors from file load/save.
#[derive(Debug, Error)]
pub enum IoError {
    /// Device-side failure (allocation, transfer, bounds).
    #[error(transparent)]
    Gpu(#[from] gpufx_core::Error),

    /// Codec failure (decode, encode, unsupported format).
    #[error("codec error: {0}")]
    Codec(#[from] image::ImageError),

    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`IoError`].
pub type Result<T> = std::result::Result<T, IoError>;

/// Loads an image file into device memory.
///
/// The file is decoded to RGBA8 and uploaded. With `container: None` a new
/// [`GpuImage`] is allocated at the decoded size. With `Some`, the decoded
/// pixels are uploaded into the supplied image instead: the decoded extent
/// must fit the container's *allocated* extent
/// ([`gpufx_core::Error::OutOfBounds`] otherwise) and becomes the
/// container's logical extent, so one allocation can be reloaded with
/// files of varying sizes.
pub fn load_image(
    path: impl AsRef<Path>,
    backend: &Arc<dyn ComputeBackend>,
    container: Option<GpuImage>,
) -> Result<GpuImage> {
    let path = path.as_ref();
    let decoded = image::open(path)?.into_rgba8();
    let (width, height) = decoded.dimensions();
    debug!(path = %path.display(), width, height, "load_image");

    let mut img = match container {
        Some(container) => container,
        None => GpuImage::new(backend, width, height)?,
    };
    img.upload(decoded.as_raw(), width, height)?;
    Ok(img)
}

/// Saves the logical extent of a device image to a file.
///
/// The format is chosen by the file extension (`.png`, `.jpg`, ...).
pub fn save_image(img: &GpuImage, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let (width, height) = img.dimensions();
    debug!(path = %path.display(), width, height, "save_image");
    let bytes = img.download()?;
    image::save_buffer(
        path,
        &bytes,
        width,
        height,
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(())
}
