//! Positioned alpha blending.

use std::sync::Arc;

use gpufx_compute::GpuImage;
use gpufx_core::Result;
use tracing::trace;

/// Alpha-blends `over` onto `background` with `over`'s top-left corner at
/// `(x, y)` in background coordinates.
///
/// Coordinates may be negative or exceed the background; out-of-range rows
/// and columns are handled by the backend (the CPU backend clips them).
///
/// # Example
///
/// ```rust
/// # use std::sync::Arc;
/// # use gpufx_compute::{ComputeBackend, CpuBackend, GpuImage};
/// # let backend: Arc<dyn ComputeBackend> = Arc::new(CpuBackend::new());
/// let mut bg = GpuImage::new(&backend, 64, 64)?;
/// let icon = GpuImage::new(&backend, 16, 16)?;
/// gpufx_ops::blend(&mut bg, &icon, 24, 24)?;
/// # Ok::<(), gpufx_core::Error>(())
/// ```
pub fn blend(background: &mut GpuImage, over: &GpuImage, x: i32, y: i32) -> Result<()> {
    let (bg_w, bg_h) = background.dimensions();
    let (fg_w, fg_h) = over.dimensions();
    trace!(bg_w, bg_h, fg_w, fg_h, x, y, "blend");
    let backend = Arc::clone(background.backend());
    backend.blend(
        background.buffer_mut()?,
        over.buffer()?,
        bg_w,
        bg_h,
        fg_w,
        fg_h,
        x,
        y,
    )
}
