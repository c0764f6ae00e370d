//! Error types for gpufx operations.
//!
//! One taxonomy serves the whole surface: image lifecycle, host/device
//! transfer, and the operation layer. Every failure is raised synchronously
//! at the call that detects it, before any device work is dispatched; there
//! is no partial-success state for a single operation and nothing is retried
//! automatically.
//!
//! # Usage
//!
//! ```rust
//! use gpufx_core::{Error, Result};
//!
//! fn check_logical(requested: u32, allocated: u32) -> Result<()> {
//!     if requested > allocated {
//!         return Err(Error::out_of_bounds(requested, allocated, "width"));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during gpufx image processing.
///
/// # Categories
///
/// - **Allocation**: [`AllocationFailed`](Error::AllocationFailed)
/// - **Bounds**: [`OutOfBounds`](Error::OutOfBounds)
/// - **Cache/destination contract**: [`DimensionMismatch`](Error::DimensionMismatch)
/// - **Argument validation**: [`InvalidArgument`](Error::InvalidArgument),
///   [`UnsupportedMethod`](Error::UnsupportedMethod)
/// - **Lifecycle**: [`Unallocated`](Error::Unallocated)
/// - **Backend**: [`Backend`](Error::Backend)
#[derive(Debug, Error)]
pub enum Error {
    /// The backend could not satisfy a device allocation request.
    ///
    /// Fatal to the call; no output buffer was produced.
    #[error("failed to allocate device buffer for {width}x{height} image: {reason}")]
    AllocationFailed {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
        /// Backend-reported reason.
        reason: String,
    },

    /// A requested logical dimension exceeds the allocated dimension.
    ///
    /// Local and recoverable: the image is left unchanged.
    #[error("requested {axis} {requested} exceeds allocated {axis} {allocated}")]
    OutOfBounds {
        /// Requested logical size.
        requested: u32,
        /// Fixed allocated size.
        allocated: u32,
        /// Which axis was violated ("width" or "height").
        axis: &'static str,
    },

    /// A caller-supplied cache/destination/background image does not match
    /// the dimensions the operation requires.
    ///
    /// Raised before any device dispatch; the target's pixels are untouched.
    #[error("dimension mismatch: operation requires {expected_w}x{expected_h}, got {got_w}x{got_h}")]
    DimensionMismatch {
        /// Required width.
        expected_w: u32,
        /// Required height.
        expected_h: u32,
        /// Supplied width.
        got_w: u32,
        /// Supplied height.
        got_h: u32,
    },

    /// An argument failed validation: mutually exclusive flags both set,
    /// negative or excessive crop margins, grid capacity exceeded,
    /// heterogeneous collage dimensions, unrecognized chroma channel.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unrecognized resize method value.
    #[error("unsupported resize method: {0}")]
    UnsupportedMethod(String),

    /// The image has no live device buffer (freed or never initialized).
    #[error("image has no device buffer (freed or not initialized)")]
    Unallocated,

    /// A backend kernel dispatch reported failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl Error {
    /// Creates an [`Error::AllocationFailed`] error.
    #[inline]
    pub fn allocation_failed(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::AllocationFailed {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::OutOfBounds`] error.
    #[inline]
    pub fn out_of_bounds(requested: u32, allocated: u32, axis: &'static str) -> Self {
        Self::OutOfBounds {
            requested,
            allocated,
            axis,
        }
    }

    /// Creates an [`Error::DimensionMismatch`] error.
    ///
    /// `expected` and `got` are `(width, height)` pairs.
    #[inline]
    pub fn dimension_mismatch(expected: (u32, u32), got: (u32, u32)) -> Self {
        Self::DimensionMismatch {
            expected_w: expected.0,
            expected_h: expected.1,
            got_w: got.0,
            got_h: got.1,
        }
    }

    /// Creates an [`Error::InvalidArgument`] error.
    #[inline]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates an [`Error::Backend`] error.
    #[inline]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Returns `true` if this is a bounds or dimension-contract error.
    #[inline]
    pub fn is_dimension_error(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. } | Self::DimensionMismatch { .. }
        )
    }

    /// Returns `true` if this is an allocation error.
    #[inline]
    pub fn is_allocation_error(&self) -> bool {
        matches!(self, Self::AllocationFailed { .. })
    }
}
