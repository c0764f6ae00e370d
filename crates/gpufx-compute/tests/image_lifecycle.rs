//! Integration tests for the image lifecycle and buffer ownership model.

use std::sync::Arc;

use gpufx_compute::{ComputeBackend, CpuBackend, Error, GpuImage};

fn cpu() -> (Arc<CpuBackend>, Arc<dyn ComputeBackend>) {
    let cpu = Arc::new(CpuBackend::new());
    let backend: Arc<dyn ComputeBackend> = cpu.clone();
    (cpu, backend)
}

#[test]
fn test_buffer_released_on_drop() {
    let (cpu, backend) = cpu();
    {
        let _img = GpuImage::new(&backend, 32, 32).unwrap();
        assert_eq!(cpu.live_allocations(), 1);
    }
    assert_eq!(cpu.live_allocations(), 0);
}

#[test]
fn test_free_releases_immediately_and_is_idempotent() {
    let (cpu, backend) = cpu();
    let mut img = GpuImage::new(&backend, 32, 32).unwrap();
    assert_eq!(cpu.live_allocations(), 1);
    img.free();
    assert_eq!(cpu.live_allocations(), 0);
    img.free();
    assert_eq!(cpu.live_allocations(), 0);
    assert!(matches!(img.buffer().unwrap_err(), Error::Unallocated));
}

#[test]
fn test_logical_extent_bounded_by_allocation() {
    let (_cpu, backend) = cpu();
    let mut img = GpuImage::new(&backend, 200, 100).unwrap();

    img.set_dimensions(50, 50).unwrap();
    assert_eq!(img.dimensions(), (50, 50));
    assert_eq!(img.alloc_dimensions(), (200, 100));

    // Raising back up to the allocation is allowed, past it is not.
    img.set_dimensions(200, 100).unwrap();
    let err = img.set_height(101).unwrap_err();
    assert!(err.is_dimension_error());
    assert_eq!(img.dimensions(), (200, 100));
}

#[test]
fn test_reload_at_smaller_extent_reuses_allocation() {
    let (cpu, backend) = cpu();
    let mut img = GpuImage::new(&backend, 4, 4).unwrap();
    img.upload(&vec![7u8; 64], 4, 4).unwrap();

    // A smaller load goes into the same allocation and shrinks the view.
    let bytes: Vec<u8> = (100..116).collect();
    img.upload(&bytes, 2, 2).unwrap();
    assert_eq!(img.dimensions(), (2, 2));
    assert_eq!(img.download().unwrap(), bytes);
    assert_eq!(cpu.live_allocations(), 1);
}

#[test]
fn test_clone_is_independent() {
    let (cpu, backend) = cpu();
    let mut img = GpuImage::new(&backend, 2, 2).unwrap();
    img.upload(&[1u8; 16], 2, 2).unwrap();

    let clone = img.try_clone().unwrap();
    assert_eq!(cpu.live_allocations(), 2);

    img.upload(&[9u8; 16], 2, 2).unwrap();
    assert_eq!(clone.download().unwrap(), vec![1u8; 16]);
}
