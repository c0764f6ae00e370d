//! Integration tests for the cache-buffer reuse protocol and the
//! dimension-validation contracts across the operation layer.

use std::sync::Arc;

use gpufx_compute::{ComputeBackend, CpuBackend, GpuImage};
use gpufx_core::{Error, Rgba};
use gpufx_ops::composite::{blend_padding, cover_image_in_container, create_image_grid};
use gpufx_ops::filters::{
    EdgePlacement, apply_gaussian_blur, apply_shadow, apply_stroke,
};
use gpufx_ops::resize::{ResizeMethod, crop_margins, resize, resize_into};
use gpufx_ops::{blend, fill};

fn cpu() -> (Arc<CpuBackend>, Arc<dyn ComputeBackend>) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let cpu = Arc::new(CpuBackend::new());
    let backend: Arc<dyn ComputeBackend> = cpu.clone();
    (cpu, backend)
}

#[test]
fn test_snapshot_ops_reuse_one_cache_across_calls() {
    let (cpu, backend) = cpu();
    let mut img = GpuImage::new(&backend, 32, 32).unwrap();
    fill::fill_color(&mut img, Rgba::rgb(200, 50, 50)).unwrap();

    let mut cache = GpuImage::new(&backend, 32, 32).unwrap();
    let before = cpu.live_allocations();

    apply_stroke(&mut img, Some(&mut cache), 2, Rgba::BLACK, EdgePlacement::Outer).unwrap();
    apply_shadow(&mut img, Some(&mut cache), 3.0, 0.8, Rgba::BLACK, EdgePlacement::Outer).unwrap();
    apply_gaussian_blur(&mut img, Some(&mut cache), 1.5).unwrap();

    // No hidden allocations: the borrowed cache served all three passes.
    assert_eq!(cpu.live_allocations(), before);
    assert!(cache.is_allocated());
}

#[test]
fn test_transient_snapshots_do_not_leak() {
    let (cpu, backend) = cpu();
    let mut img = GpuImage::new(&backend, 16, 16).unwrap();
    fill::fill_color(&mut img, Rgba::rgb(10, 120, 10)).unwrap();

    for _ in 0..5 {
        apply_gaussian_blur(&mut img, None, 2.0).unwrap();
    }
    assert_eq!(cpu.live_allocations(), 1);
}

#[test]
fn test_cache_dimension_mismatch_leaves_target_untouched() {
    let (_cpu, backend) = cpu();
    let mut img = GpuImage::new(&backend, 8, 8).unwrap();
    fill::fill_color(&mut img, Rgba::rgb(77, 77, 77)).unwrap();
    let before = img.download().unwrap();

    let mut wrong = GpuImage::new(&backend, 8, 9).unwrap();
    let err = apply_stroke(&mut img, Some(&mut wrong), 1, Rgba::BLACK, EdgePlacement::Outer)
        .unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
    assert_eq!(img.download().unwrap(), before);
}

#[test]
fn test_resize_destination_contract() {
    let (cpu, backend) = cpu();
    let mut img = GpuImage::new(&backend, 64, 64).unwrap();
    fill::fill_color(&mut img, Rgba::rgb(1, 2, 3)).unwrap();

    // Owned shape allocates; _into reuses and validates.
    let owned = resize(&img, 32, 32, ResizeMethod::Bilinear).unwrap();
    assert_eq!(owned.dimensions(), (32, 32));

    let mut dest = GpuImage::new(&backend, 32, 32).unwrap();
    let live = cpu.live_allocations();
    resize_into(&img, 32, 32, ResizeMethod::Bilinear, &mut dest).unwrap();
    assert_eq!(cpu.live_allocations(), live);

    let err = resize_into(&img, 16, 16, ResizeMethod::Bilinear, &mut dest).unwrap_err();
    assert!(err.is_dimension_error());
}

#[test]
fn test_resize_destination_reuse_via_logical_shrink() {
    // One allocation serves descending result sizes by shrinking the view.
    let (cpu, backend) = cpu();
    let mut img = GpuImage::new(&backend, 64, 64).unwrap();
    fill::fill_color(&mut img, Rgba::rgb(9, 9, 9)).unwrap();

    let mut dest = GpuImage::new(&backend, 64, 64).unwrap();
    let live = cpu.live_allocations();
    for size in [64u32, 48, 32, 16] {
        dest.set_dimensions(size, size).unwrap();
        resize_into(&img, size, size, ResizeMethod::Nearest, &mut dest).unwrap();
        assert_eq!(dest.download().unwrap().len(), (size * size * 4) as usize);
    }
    assert_eq!(cpu.live_allocations(), live);
}

#[test]
fn test_crop_margin_errors() {
    let (_cpu, backend) = cpu();
    let img = GpuImage::new(&backend, 10, 10).unwrap();

    assert!(matches!(
        crop_margins(&img, 0, -3, 0, 0).unwrap_err(),
        Error::InvalidArgument(_)
    ));
    assert!(matches!(
        crop_margins(&img, 0, 5, 0, 5).unwrap_err(),
        Error::InvalidArgument(_)
    ));
}

#[test]
fn test_unsupported_method_name() {
    let err = "area".parse::<ResizeMethod>().unwrap_err();
    assert!(matches!(err, Error::UnsupportedMethod(_)));
}

#[test]
fn test_grid_capacity_error() {
    let (_cpu, backend) = cpu();
    let img = GpuImage::new(&backend, 4, 4).unwrap();
    let err = create_image_grid(&img, 2, 2, 5, 2, Rgba::TRANSPARENT).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_cover_fit_scales_and_centers() {
    // 100x100 source, left half red and right half blue, into a 50x200
    // container: scale = 2, scaled 200x200, placed at x = -75. Container
    // columns therefore show scaled columns 75..125: the red/blue seam
    // lands in the middle of the container.
    let (cpu, backend) = cpu();
    let mut src = GpuImage::new(&backend, 100, 100).unwrap();
    let mut bytes = Vec::with_capacity(100 * 100 * 4);
    for _y in 0..100 {
        for x in 0..100 {
            let px: [u8; 4] = if x < 50 { [255, 0, 0, 255] } else { [0, 0, 255, 255] };
            bytes.extend_from_slice(&px);
        }
    }
    src.upload(&bytes, 100, 100).unwrap();

    let out =
        cover_image_in_container(&src, 50, 200, 0, 0, Rgba::WHITE, None, None).unwrap();
    assert_eq!(out.dimensions(), (50, 200));

    let px = out.download().unwrap();
    let at = |x: usize, y: usize| &px[(y * 50 + x) * 4..(y * 50 + x) * 4 + 3];
    // Away from the interpolated seam at container x = 25.
    assert_eq!(at(5, 100), &[255, 0, 0]);
    assert_eq!(at(44, 100), &[0, 0, 255]);

    // The transient scaled image was released.
    assert_eq!(cpu.live_allocations(), 2); // src + out
}

#[test]
fn test_blend_padding_ownership_round_trip() {
    let (cpu, backend) = cpu();
    let mut img = GpuImage::new(&backend, 4, 4).unwrap();
    fill::fill_color(&mut img, Rgba::rgb(255, 0, 0)).unwrap();

    // Caller-supplied background passes through the call.
    let mut bg = GpuImage::new(&backend, 8, 8).unwrap();
    fill::fill_color(&mut bg, Rgba::WHITE).unwrap();
    let live = cpu.live_allocations();
    let out = blend_padding(&img, 2, Some(bg)).unwrap();
    assert_eq!(cpu.live_allocations(), live);
    assert_eq!(out.dimensions(), (8, 8));

    let px = out.download().unwrap();
    assert_eq!(&px[0..3], &[255, 255, 255]); // padding shows the background
    assert_eq!(&px[(2 * 8 + 2) * 4..(2 * 8 + 2) * 4 + 3], &[255, 0, 0]);
}

#[test]
fn test_freed_image_surfaces_unallocated() {
    let (_cpu, backend) = cpu();
    let mut img = GpuImage::new(&backend, 4, 4).unwrap();
    img.free();
    let err = fill::fill_color(&mut img, Rgba::BLACK).unwrap_err();
    assert!(matches!(err, Error::Unallocated));

    let mut bg = GpuImage::new(&backend, 8, 8).unwrap();
    let err = blend(&mut bg, &img, 0, 0).unwrap_err();
    assert!(matches!(err, Error::Unallocated));
}
