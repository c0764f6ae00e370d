//! # gpufx-ops
//!
//! Image operations over [`GpuImage`](gpufx_compute::GpuImage) targets.
//!
//! Every function here follows the same shape: validate arguments against
//! the images' logical extents, manage any cache buffer the operation needs,
//! then dispatch one backend kernel. Nothing in this crate touches pixels
//! directly.
//!
//! # Modules
//!
//! - [`fill`] - Solid and gradient fills
//! - [`blend`] - Positioned alpha blending
//! - [`resize`] - Resampling and margin cropping
//! - [`filters`] - In-place and snapshot-consuming effects
//! - [`composite`] - Aligned/padded blends, cover-fit, grid, collage
//!
//! # Cache buffers
//!
//! Operations that mutate an image in place while reading its original
//! pixels (stroke, shadow, blur) take `cache: Option<&mut GpuImage>`:
//!
//! - `None` — the operation allocates a same-size snapshot, uses it, and
//!   frees it before returning;
//! - `Some(cache)` — the caller lends a pre-allocated image whose logical
//!   dimensions must match the target's; the operation copies the snapshot
//!   in and never frees it.
//!
//! Operations that write a differently-sized result (resize, crop) instead
//! come in an owned shape returning a fresh [`GpuImage`] and an `_into`
//! shape writing to a caller-supplied destination.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use gpufx_compute::{ComputeBackend, CpuBackend, GpuImage};
//! use gpufx_core::Rgba;
//! use gpufx_ops::{fill, filters, resize};
//!
//! let backend: Arc<dyn ComputeBackend> = Arc::new(CpuBackend::new());
//! let mut img = GpuImage::new(&backend, 64, 64)?;
//!
//! fill::fill_color(&mut img, Rgba::rgb(200, 40, 40))?;
//! filters::apply_gaussian_blur(&mut img, None, 2.0)?;
//!
//! let thumb = resize::resize(&img, 16, 16, resize::ResizeMethod::Bilinear)?;
//! assert_eq!(thumb.dimensions(), (16, 16));
//! # Ok::<(), gpufx_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod blend;
pub mod composite;
pub mod fill;
pub mod filters;
pub mod resize;

pub use blend::blend;
pub use composite::Alignment;
pub use fill::GradientDirection;
pub use filters::{ChromaChannel, EdgePlacement};
pub use resize::ResizeMethod;

pub use gpufx_core::{Error, Result, Rgba};
