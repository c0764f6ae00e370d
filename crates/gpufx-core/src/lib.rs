//! # gpufx-core
//!
//! Core types for GPU-resident image composition.
//!
//! This crate is the leaf of the gpufx workspace: it has no internal
//! dependencies and provides the two types every other crate builds on:
//!
//! - [`Rgba`] - 8-bit-per-channel RGBA color value
//! - [`Error`] / [`Result`] - the shared error taxonomy
//!
//! ## Crate Structure
//!
//! ```text
//! gpufx-core (this crate)
//!    ^
//!    |
//!    +-- gpufx-compute (device buffers, backend contract, GpuImage)
//!    +-- gpufx-ops     (operation layer)
//!    +-- gpufx-io      (file load/save glue)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod color;
pub mod error;

pub use color::Rgba;
pub use error::{Error, Result};
