//! Device-resident image storage and the compute backend contract.
//!
//! # Architecture
//!
//! ```text
//! GpuImage (lifecycle + host/device transfer)
//!     └── Box<dyn DeviceBuffer>   (owning handle to device memory)
//!     └── Arc<dyn ComputeBackend> (kernel dispatch contract)
//!             └── CpuBackend      (rayon reference implementation)
//! ```
//!
//! [`GpuImage`] pairs one exclusively-owned [`DeviceBuffer`] with a fixed
//! *allocated extent* and a mutable *logical extent* bounded by it. The
//! logical extent is the size every operation works at; keeping it below the
//! allocated extent lets one allocation be reused across differently-sized
//! loads without reallocating.
//!
//! [`ComputeBackend`] is the seam for real device backends (CUDA, wgpu):
//! every pixel kernel the operation layer dispatches goes through it.
//! [`CpuBackend`] implements the full contract against host memory and is
//! what the test suites run on.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use gpufx_compute::{ComputeBackend, CpuBackend, GpuImage};
//!
//! let backend: Arc<dyn ComputeBackend> = Arc::new(CpuBackend::new());
//! let mut img = GpuImage::new(&backend, 256, 256)?;
//!
//! // Use only part of the allocation
//! img.set_width(128)?;
//! assert_eq!(img.dimensions(), (128, 256));
//!
//! img.free(); // idempotent
//! img.free();
//! # Ok::<(), gpufx_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backend;
pub mod image;

pub use backend::{AsAny, ComputeBackend, CpuBackend, DeviceBuffer};
pub use image::GpuImage;

pub use gpufx_core::{Error, Result, Rgba};
