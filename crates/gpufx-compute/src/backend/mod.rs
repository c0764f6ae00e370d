//! Compute backend contract.
//!
//! The operation layer never touches pixels itself; it validates arguments,
//! manages cache buffers, and dispatches to a [`ComputeBackend`]. Each trait
//! method corresponds to one device kernel entry point. Buffers cross the
//! boundary as [`DeviceBuffer`] trait objects; a backend downcasts them to
//! its own handle type.
//!
//! Dimensions passed to kernels are always the *logical* extent of the
//! images involved: rows are packed at the logical width from the buffer
//! origin, so a kernel sees a dense `width * height * 4`-byte image
//! regardless of the allocation size behind it.

mod cpu;

pub use cpu::{CpuBackend, CpuBuffer};

use gpufx_core::{Result, Rgba};

/// Helper trait for downcasting backend handles.
pub trait AsAny: 'static {
    /// Upcast to `&dyn Any`.
    fn as_any(&self) -> &dyn std::any::Any;
    /// Upcast to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

/// Owning handle to a block of device memory.
///
/// The box returned by [`ComputeBackend::allocate`] is the *only* owner of
/// the underlying allocation: dropping it releases the device memory. There
/// is no separate `release` call and therefore no way to free a live handle
/// twice.
///
/// The byte length is fixed at allocation; a buffer is never resized in
/// place.
pub trait DeviceBuffer: Send + Sync + AsAny + std::fmt::Debug {
    /// Allocated size in bytes (`alloc_width * alloc_height * 4`).
    fn len_bytes(&self) -> usize;
}

/// Device-side operations invoked by the operation layer.
///
/// All dispatches are synchronous: a call returns only after the kernel and
/// any associated transfer completed. Backend-detected failures surface as
/// [`gpufx_core::Error::Backend`]; argument validation is the caller's job
/// and has already happened by the time a method here runs.
#[allow(clippy::too_many_arguments)]
pub trait ComputeBackend: Send + Sync {
    /// Backend name for diagnostics.
    fn name(&self) -> &'static str;

    // === Buffer management ===

    /// Allocates device memory for a `width * height` RGBA image.
    fn allocate(&self, width: u32, height: u32) -> Result<Box<dyn DeviceBuffer>>;

    /// Copies `width * height * 4` bytes between two device buffers.
    fn copy_device_to_device(
        &self,
        dst: &mut dyn DeviceBuffer,
        src: &dyn DeviceBuffer,
        width: u32,
        height: u32,
    ) -> Result<()>;

    // === Host/device transfer ===

    /// Uploads `width * height * 4` host bytes into a device buffer.
    ///
    /// Never partial: `src.len()` not matching the pixel count is a
    /// programming error the backend asserts on.
    fn copy_host_to_device(
        &self,
        dst: &mut dyn DeviceBuffer,
        src: &[u8],
        width: u32,
        height: u32,
    ) -> Result<()>;

    /// Downloads `width * height * 4` bytes from a device buffer into host
    /// memory. Same no-partial-transfer contract as upload.
    fn copy_device_to_host(
        &self,
        dst: &mut [u8],
        src: &dyn DeviceBuffer,
        width: u32,
        height: u32,
    ) -> Result<()>;

    // === Fill ===

    /// Fills the image with a solid color.
    fn fill_solid(&self, buf: &mut dyn DeviceBuffer, width: u32, height: u32, color: Rgba)
    -> Result<()>;

    /// Fills the image with a two-color linear gradient.
    ///
    /// `direction`: 0 = vertical, 1 = horizontal, 2 = diagonal
    /// (top-left to bottom-right), 3 = diagonal (bottom-left to top-right).
    /// `seamless` mirrors the ramp so the two edges match.
    fn fill_gradient(
        &self,
        buf: &mut dyn DeviceBuffer,
        width: u32,
        height: u32,
        color1: Rgba,
        color2: Rgba,
        direction: u32,
        seamless: bool,
    ) -> Result<()>;

    // === Blend ===

    /// Alpha-blends `src` over `dst` with `src`'s top-left corner at
    /// `(x, y)` in `dst` coordinates.
    ///
    /// No clipping contract is guaranteed at this layer; out-of-range
    /// placement behavior is backend-defined.
    fn blend(
        &self,
        dst: &mut dyn DeviceBuffer,
        src: &dyn DeviceBuffer,
        dst_width: u32,
        dst_height: u32,
        src_width: u32,
        src_height: u32,
        x: i32,
        y: i32,
    ) -> Result<()>;

    // === Resize / crop ===

    /// Nearest-neighbor resample from `src` into `dst`.
    fn resize_nearest(
        &self,
        dst: &mut dyn DeviceBuffer,
        src: &dyn DeviceBuffer,
        dst_width: u32,
        dst_height: u32,
        src_width: u32,
        src_height: u32,
    ) -> Result<()>;

    /// Bilinear resample from `src` into `dst`.
    fn resize_bilinear(
        &self,
        dst: &mut dyn DeviceBuffer,
        src: &dyn DeviceBuffer,
        dst_width: u32,
        dst_height: u32,
        src_width: u32,
        src_height: u32,
    ) -> Result<()>;

    /// Bicubic (Catmull-Rom) resample from `src` into `dst`.
    fn resize_bicubic(
        &self,
        dst: &mut dyn DeviceBuffer,
        src: &dyn DeviceBuffer,
        dst_width: u32,
        dst_height: u32,
        src_width: u32,
        src_height: u32,
    ) -> Result<()>;

    /// Copies the `dst_width x dst_height` rectangle of `src` anchored at
    /// `(origin_x, origin_y)` into `dst`.
    fn crop(
        &self,
        dst: &mut dyn DeviceBuffer,
        src: &dyn DeviceBuffer,
        src_width: u32,
        src_height: u32,
        dst_width: u32,
        dst_height: u32,
        origin_x: i32,
        origin_y: i32,
    ) -> Result<()>;

    // === In-place filters (no snapshot required) ===

    /// Rounds the image corners by zeroing alpha outside a `radius`-pixel
    /// corner arc.
    fn corner_radius(
        &self,
        buf: &mut dyn DeviceBuffer,
        width: u32,
        height: u32,
        radius: u32,
    ) -> Result<()>;

    /// Scales every alpha value by `factor` in `[0, 1]`.
    fn opacity(&self, buf: &mut dyn DeviceBuffer, width: u32, height: u32, factor: f32)
    -> Result<()>;

    /// Mirrors the image horizontally and/or vertically.
    ///
    /// The backend supports combined flips; the host contract restricts
    /// callers to one axis per call.
    fn flip(
        &self,
        buf: &mut dyn DeviceBuffer,
        width: u32,
        height: u32,
        horizontal: bool,
        vertical: bool,
    ) -> Result<()>;

    /// Converts the image to grayscale (Rec.709 luma), preserving alpha.
    fn grayscale(&self, buf: &mut dyn DeviceBuffer, width: u32, height: u32) -> Result<()>;

    /// Keys out pixels of `buf` wherever the sampled `key` pixel's selected
    /// channel meets `threshold`.
    ///
    /// `channel` is the ordinal 0-3 for R/G/B/A. `invert` flips the match;
    /// `zero_all_channels` zeroes color channels in addition to alpha.
    fn chroma_key(
        &self,
        buf: &mut dyn DeviceBuffer,
        key: &dyn DeviceBuffer,
        width: u32,
        height: u32,
        key_width: u32,
        key_height: u32,
        channel: u32,
        threshold: u8,
        invert: bool,
        zero_all_channels: bool,
    ) -> Result<()>;

    // === Snapshot-consuming filters ===
    //
    // These read the pre-mutation pixels from `snapshot` and write the
    // transformed result into `target`, which lets in-place mutation be
    // expressed as a pure function at the kernel level. The host has
    // already copied the target's pixels into `snapshot`.

    /// Draws a stroke of `stroke_width` pixels along the alpha edge.
    ///
    /// `mode`: 0 = outer (stroke grows into transparent pixels),
    /// 1 = inner (stroke eats into opaque pixels).
    fn stroke(
        &self,
        target: &mut dyn DeviceBuffer,
        snapshot: &dyn DeviceBuffer,
        width: u32,
        height: u32,
        stroke_width: u32,
        color: Rgba,
        mode: u32,
    ) -> Result<()>;

    /// Casts a soft shadow of the alpha silhouette.
    ///
    /// `mode` as for [`stroke`](ComputeBackend::stroke).
    fn shadow(
        &self,
        target: &mut dyn DeviceBuffer,
        snapshot: &dyn DeviceBuffer,
        width: u32,
        height: u32,
        radius: f32,
        intensity: f32,
        color: Rgba,
        mode: u32,
    ) -> Result<()>;

    /// Gaussian blur with the given radius.
    fn gaussian_blur(
        &self,
        target: &mut dyn DeviceBuffer,
        snapshot: &dyn DeviceBuffer,
        width: u32,
        height: u32,
        radius: f32,
    ) -> Result<()>;
}
