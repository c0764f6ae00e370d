//! Device-resident RGBA image with split allocated/logical extents.

use std::fmt;
use std::sync::Arc;

use gpufx_core::{Error, Result};

use crate::backend::{ComputeBackend, DeviceBuffer};

/// An RGBA image whose pixels live in device memory.
///
/// Two extents govern every image:
///
/// - the **allocated extent**, fixed when the buffer is created, which
///   determines the byte length of the device allocation
///   (`alloc_width * alloc_height * 4`);
/// - the **logical extent**, which is the size the image currently presents
///   to operations and may be lowered (never raised past the allocation)
///   at any time.
///
/// Shrinking the logical extent is free: no device work happens, the extra
/// allocation simply goes unused until the extent is raised again. This is
/// what makes cache buffers reusable across differently-sized operations.
///
/// The image owns its buffer exclusively. [`free`](GpuImage::free) drops it
/// and is idempotent; every subsequent pixel access fails with
/// [`Error::Unallocated`] instead of touching dead memory.
pub struct GpuImage {
    backend: Arc<dyn ComputeBackend>,
    buffer: Option<Box<dyn DeviceBuffer>>,
    alloc_width: u32,
    alloc_height: u32,
    width: u32,
    height: u32,
}

impl GpuImage {
    /// Allocates a new `width x height` image on the given backend.
    ///
    /// The logical extent starts equal to the allocated extent. Pixel
    /// contents are unspecified until written.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for zero dimensions,
    /// [`Error::AllocationFailed`] if the backend cannot allocate.
    pub fn new(backend: &Arc<dyn ComputeBackend>, width: u32, height: u32) -> Result<Self> {
        let mut img = Self::uninitialized(backend, width, height)?;
        img.init()?;
        Ok(img)
    }

    /// Creates an image descriptor without allocating device memory.
    ///
    /// Call [`init`](GpuImage::init) before using the pixels; until then the
    /// image reports [`is_allocated`](GpuImage::is_allocated) `false`.
    pub fn uninitialized(
        backend: &Arc<dyn ComputeBackend>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_argument(format!(
                "image dimensions must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self {
            backend: Arc::clone(backend),
            buffer: None,
            alloc_width: width,
            alloc_height: height,
            width,
            height,
        })
    }

    /// Allocates the device buffer if the image does not have one.
    ///
    /// No-op when already allocated.
    pub fn init(&mut self) -> Result<()> {
        if self.buffer.is_none() {
            self.buffer = Some(self.backend.allocate(self.alloc_width, self.alloc_height)?);
        }
        Ok(())
    }

    /// Releases the device buffer.
    ///
    /// Idempotent: freeing an already-freed image does nothing. Dropping the
    /// image releases the buffer too, so calling this is only needed to
    /// reclaim device memory early.
    pub fn free(&mut self) {
        self.buffer = None;
    }

    /// Whether the image currently holds a device buffer.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.buffer.is_some()
    }

    /// Current logical width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Current logical height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Logical `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Fixed allocated width in pixels.
    #[inline]
    pub fn alloc_width(&self) -> u32 {
        self.alloc_width
    }

    /// Fixed allocated height in pixels.
    #[inline]
    pub fn alloc_height(&self) -> u32 {
        self.alloc_height
    }

    /// Allocated `(width, height)`.
    #[inline]
    pub fn alloc_dimensions(&self) -> (u32, u32) {
        (self.alloc_width, self.alloc_height)
    }

    /// Logical pixel count times four.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Sets the logical width.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] when `width` exceeds the allocated width,
    /// [`Error::InvalidArgument`] when zero. The image is unchanged on error.
    pub fn set_width(&mut self, width: u32) -> Result<()> {
        if width == 0 {
            return Err(Error::invalid_argument("logical width must be non-zero"));
        }
        if width > self.alloc_width {
            return Err(Error::out_of_bounds(width, self.alloc_width, "width"));
        }
        self.width = width;
        Ok(())
    }

    /// Sets the logical height.
    ///
    /// Same contract as [`set_width`](GpuImage::set_width).
    pub fn set_height(&mut self, height: u32) -> Result<()> {
        if height == 0 {
            return Err(Error::invalid_argument("logical height must be non-zero"));
        }
        if height > self.alloc_height {
            return Err(Error::out_of_bounds(height, self.alloc_height, "height"));
        }
        self.height = height;
        Ok(())
    }

    /// Sets both logical dimensions, validating each axis.
    pub fn set_dimensions(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_argument(
                "logical dimensions must be non-zero",
            ));
        }
        if width > self.alloc_width {
            return Err(Error::out_of_bounds(width, self.alloc_width, "width"));
        }
        if height > self.alloc_height {
            return Err(Error::out_of_bounds(height, self.alloc_height, "height"));
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// The backend this image was allocated on.
    #[inline]
    pub fn backend(&self) -> &Arc<dyn ComputeBackend> {
        &self.backend
    }

    /// Borrows the device buffer.
    ///
    /// # Errors
    ///
    /// [`Error::Unallocated`] when the image was freed or never initialized.
    pub fn buffer(&self) -> Result<&dyn DeviceBuffer> {
        self.buffer.as_deref().ok_or(Error::Unallocated)
    }

    /// Mutably borrows the device buffer.
    pub fn buffer_mut(&mut self) -> Result<&mut dyn DeviceBuffer> {
        match self.buffer.as_deref_mut() {
            Some(buf) => Ok(buf),
            None => Err(Error::Unallocated),
        }
    }

    /// Allocates a new image at the logical extent and copies the pixels.
    ///
    /// The clone's allocation is exactly the source's logical size; any
    /// unused slack in the source allocation is not carried over.
    pub fn try_clone(&self) -> Result<Self> {
        let src = self.buffer()?;
        let mut clone = Self::new(&self.backend, self.width, self.height)?;
        self.backend
            .copy_device_to_device(clone.buffer_mut()?, src, self.width, self.height)?;
        Ok(clone)
    }

    /// Uploads a packed `width x height` RGBA byte block and makes that the
    /// logical extent.
    ///
    /// This is how one allocation is reused across differently-sized loads:
    /// any extent that fits the allocation may be uploaded.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] when an axis exceeds the allocated extent,
    /// [`Error::InvalidArgument`] when `bytes.len()` is not
    /// `width * height * 4` or a dimension is zero, [`Error::Unallocated`]
    /// without a buffer. The logical extent is unchanged on error.
    pub fn upload(&mut self, bytes: &[u8], width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_argument(
                "upload dimensions must be non-zero",
            ));
        }
        if width > self.alloc_width {
            return Err(Error::out_of_bounds(width, self.alloc_width, "width"));
        }
        if height > self.alloc_height {
            return Err(Error::out_of_bounds(height, self.alloc_height, "height"));
        }
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(Error::invalid_argument(format!(
                "upload expects {expected} bytes for {width}x{height}, got {}",
                bytes.len()
            )));
        }
        let backend = Arc::clone(&self.backend);
        backend.copy_host_to_device(self.buffer_mut()?, bytes, width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Downloads the logical extent as packed RGBA bytes.
    pub fn download(&self) -> Result<Vec<u8>> {
        let src = self.buffer()?;
        let mut out = vec![0u8; self.byte_len()];
        self.backend
            .copy_device_to_host(&mut out, src, self.width, self.height)?;
        Ok(out)
    }
}

impl fmt::Debug for GpuImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuImage")
            .field("backend", &self.backend.name())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("alloc_width", &self.alloc_width)
            .field("alloc_height", &self.alloc_height)
            .field("allocated", &self.buffer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;

    fn backend() -> Arc<dyn ComputeBackend> {
        Arc::new(CpuBackend::new())
    }

    #[test]
    fn test_new_starts_at_allocated_extent() {
        let img = GpuImage::new(&backend(), 64, 32).unwrap();
        assert_eq!(img.dimensions(), (64, 32));
        assert_eq!(img.alloc_dimensions(), (64, 32));
        assert!(img.is_allocated());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let err = GpuImage::new(&backend(), 0, 10).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_logical_shrink_and_grow_within_allocation() {
        let mut img = GpuImage::new(&backend(), 100, 100).unwrap();
        img.set_width(40).unwrap();
        img.set_height(60).unwrap();
        assert_eq!(img.dimensions(), (40, 60));
        img.set_dimensions(100, 100).unwrap();
        assert_eq!(img.alloc_dimensions(), (100, 100));
    }

    #[test]
    fn test_logical_cannot_exceed_allocation() {
        let mut img = GpuImage::new(&backend(), 100, 100).unwrap();
        let err = img.set_width(101).unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfBounds {
                requested: 101,
                allocated: 100,
                axis: "width"
            }
        ));
        // Failed set leaves the extent unchanged.
        assert_eq!(img.dimensions(), (100, 100));
        assert!(img.set_height(0).is_err());
    }

    #[test]
    fn test_free_is_idempotent() {
        let mut img = GpuImage::new(&backend(), 8, 8).unwrap();
        img.free();
        assert!(!img.is_allocated());
        img.free();
        assert!(matches!(img.buffer().unwrap_err(), Error::Unallocated));
        assert!(matches!(img.download().unwrap_err(), Error::Unallocated));
    }

    #[test]
    fn test_uninitialized_then_init() {
        let mut img = GpuImage::uninitialized(&backend(), 8, 8).unwrap();
        assert!(!img.is_allocated());
        img.init().unwrap();
        assert!(img.is_allocated());
        img.init().unwrap(); // no-op
        assert!(img.is_allocated());
    }

    #[test]
    fn test_upload_download_round_trip() {
        let mut img = GpuImage::new(&backend(), 2, 2).unwrap();
        let bytes: Vec<u8> = (0..16).collect();
        img.upload(&bytes, 2, 2).unwrap();
        assert_eq!(img.download().unwrap(), bytes);
    }

    #[test]
    fn test_upload_smaller_extent_updates_logical_dims() {
        let mut img = GpuImage::new(&backend(), 4, 4).unwrap();
        img.upload(&[5u8; 2 * 3 * 4], 2, 3).unwrap();
        assert_eq!(img.dimensions(), (2, 3));
        assert_eq!(img.alloc_dimensions(), (4, 4));
    }

    #[test]
    fn test_upload_beyond_allocation_rejected() {
        let mut img = GpuImage::new(&backend(), 2, 2).unwrap();
        let err = img.upload(&[0u8; 3 * 2 * 4], 3, 2).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { axis: "width", .. }));
        assert_eq!(img.dimensions(), (2, 2));
    }

    #[test]
    fn test_upload_wrong_length_rejected() {
        let mut img = GpuImage::new(&backend(), 2, 2).unwrap();
        let err = img.upload(&[0u8; 15], 2, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_try_clone_uses_logical_extent() {
        let mut img = GpuImage::new(&backend(), 4, 4).unwrap();
        img.upload(&(0..16).collect::<Vec<u8>>(), 2, 2).unwrap();
        let clone = img.try_clone().unwrap();
        assert_eq!(clone.dimensions(), (2, 2));
        assert_eq!(clone.alloc_dimensions(), (2, 2));
        assert_eq!(clone.download().unwrap(), img.download().unwrap());
    }
}
