//! CPU reference backend using rayon for parallelization.
//!
//! Simulates device memory with host `Vec<u8>` buffers so the full operation
//! layer can run and be tested without a GPU. Kernels parallelize over rows.
//!
//! The backend counts live allocations, which the test suites use to assert
//! the transient-cache cleanup property of the reuse protocol.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use gpufx_core::{Error, Result, Rgba};

use super::{AsAny, ComputeBackend, DeviceBuffer};

/// CPU buffer handle - "device" memory stored in RAM.
#[derive(Debug)]
pub struct CpuBuffer {
    data: Vec<u8>,
    live: Arc<AtomicUsize>,
}

impl CpuBuffer {
    /// Raw pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw pixel bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for CpuBuffer {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

impl AsAny for CpuBuffer {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl DeviceBuffer for CpuBuffer {
    fn len_bytes(&self) -> usize {
        self.data.len()
    }
}

/// CPU implementation of the [`ComputeBackend`] contract.
pub struct CpuBackend {
    live: Arc<AtomicUsize>,
}

impl CpuBackend {
    /// Creates a new CPU backend.
    pub fn new() -> Self {
        Self {
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of buffers currently alive.
    ///
    /// Transient cache buffers allocated inside an operation must be gone
    /// by the time the operation returns; tests assert on this counter.
    pub fn live_allocations(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Downcasts a handle to the CPU buffer type.
fn cpu_ref(buf: &dyn DeviceBuffer) -> Result<&CpuBuffer> {
    buf.as_any()
        .downcast_ref::<CpuBuffer>()
        .ok_or_else(|| Error::backend("buffer does not belong to the cpu backend"))
}

/// Mutable variant of [`cpu_ref`].
fn cpu_mut(buf: &mut dyn DeviceBuffer) -> Result<&mut CpuBuffer> {
    buf.as_any_mut()
        .downcast_mut::<CpuBuffer>()
        .ok_or_else(|| Error::backend("buffer does not belong to the cpu backend"))
}

/// Byte count of a packed `width * height` RGBA image.
#[inline]
fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

#[inline]
fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8
}

/// Rec.709 luma weights.
const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn allocate(&self, width: u32, height: u32) -> Result<Box<dyn DeviceBuffer>> {
        let bytes = (width as u64)
            .checked_mul(height as u64)
            .and_then(|px| px.checked_mul(4))
            .filter(|&b| usize::try_from(b).is_ok())
            .ok_or_else(|| Error::allocation_failed(width, height, "byte length overflow"))?;

        let mut data = Vec::new();
        data.try_reserve_exact(bytes as usize)
            .map_err(|_| Error::allocation_failed(width, height, "out of host memory"))?;
        data.resize(bytes as usize, 0);

        self.live.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(CpuBuffer {
            data,
            live: self.live.clone(),
        }))
    }

    fn copy_device_to_device(
        &self,
        dst: &mut dyn DeviceBuffer,
        src: &dyn DeviceBuffer,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let n = byte_len(width, height);
        let src = cpu_ref(src)?;
        let dst = cpu_mut(dst)?;
        assert!(src.data.len() >= n && dst.data.len() >= n, "copy exceeds buffer capacity");
        dst.data[..n].copy_from_slice(&src.data[..n]);
        Ok(())
    }

    fn copy_host_to_device(
        &self,
        dst: &mut dyn DeviceBuffer,
        src: &[u8],
        width: u32,
        height: u32,
    ) -> Result<()> {
        let n = byte_len(width, height);
        assert_eq!(src.len(), n, "host byte count must match pixel count");
        let dst = cpu_mut(dst)?;
        assert!(dst.data.len() >= n, "upload exceeds buffer capacity");
        dst.data[..n].copy_from_slice(src);
        Ok(())
    }

    fn copy_device_to_host(
        &self,
        dst: &mut [u8],
        src: &dyn DeviceBuffer,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let n = byte_len(width, height);
        assert_eq!(dst.len(), n, "host byte count must match pixel count");
        let src = cpu_ref(src)?;
        assert!(src.data.len() >= n, "download exceeds buffer capacity");
        dst.copy_from_slice(&src.data[..n]);
        Ok(())
    }

    fn fill_solid(
        &self,
        buf: &mut dyn DeviceBuffer,
        width: u32,
        height: u32,
        color: Rgba,
    ) -> Result<()> {
        let n = byte_len(width, height);
        let px = color.to_bytes();
        let buf = cpu_mut(buf)?;
        buf.data[..n]
            .par_chunks_exact_mut(4)
            .for_each(|out| out.copy_from_slice(&px));
        Ok(())
    }

    fn fill_gradient(
        &self,
        buf: &mut dyn DeviceBuffer,
        width: u32,
        height: u32,
        color1: Rgba,
        color2: Rgba,
        direction: u32,
        seamless: bool,
    ) -> Result<()> {
        let n = byte_len(width, height);
        let w = width as usize;
        let h = height as usize;
        let span_x = (w - 1).max(1) as f32;
        let span_y = (h - 1).max(1) as f32;
        let span_diag = ((w - 1) + (h - 1)).max(1) as f32;
        let buf = cpu_mut(buf)?;

        buf.data[..n]
            .par_chunks_exact_mut(w * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let mut t = match direction {
                        0 => y as f32 / span_y,
                        1 => x as f32 / span_x,
                        2 => (x + y) as f32 / span_diag,
                        _ => (x + (h - 1 - y)) as f32 / span_diag,
                    };
                    if seamless {
                        t = 1.0 - (2.0 * t - 1.0).abs();
                    }
                    px[0] = lerp_u8(color1.r, color2.r, t);
                    px[1] = lerp_u8(color1.g, color2.g, t);
                    px[2] = lerp_u8(color1.b, color2.b, t);
                    px[3] = lerp_u8(color1.a, color2.a, t);
                }
            });
        Ok(())
    }

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
    ) -> Result<()> {
        let dn = byte_len(dst_width, dst_height);
        let sn = byte_len(src_width, src_height);
        let dw = dst_width as usize;
        let sw = src_width as usize;
        let src = cpu_ref(src)?;
        let src_data = &src.data[..sn];
        let dst = cpu_mut(dst)?;

        // This backend clips out-of-range placement.
        dst.data[..dn]
            .par_chunks_exact_mut(dw * 4)
            .enumerate()
            .for_each(|(dy, row)| {
                let sy = dy as i64 - y as i64;
                if sy < 0 || sy >= src_height as i64 {
                    return;
                }
                let src_row = &src_data[sy as usize * sw * 4..(sy as usize + 1) * sw * 4];
                for sx in 0..sw {
                    let dx = x as i64 + sx as i64;
                    if dx < 0 || dx >= dst_width as i64 {
                        continue;
                    }
                    let sp = &src_row[sx * 4..sx * 4 + 4];
                    let dp = &mut row[dx as usize * 4..dx as usize * 4 + 4];
                    let fa = sp[3] as f32 / 255.0;
                    let inv = 1.0 - fa;
                    dp[0] = (sp[0] as f32 * fa + dp[0] as f32 * inv).round() as u8;
                    dp[1] = (sp[1] as f32 * fa + dp[1] as f32 * inv).round() as u8;
                    dp[2] = (sp[2] as f32 * fa + dp[2] as f32 * inv).round() as u8;
                    dp[3] = (sp[3] as f32 + dp[3] as f32 * inv).round().min(255.0) as u8;
                }
            });
        Ok(())
    }

    fn resize_nearest(
        &self,
        dst: &mut dyn DeviceBuffer,
        src: &dyn DeviceBuffer,
        dst_width: u32,
        dst_height: u32,
        src_width: u32,
        src_height: u32,
    ) -> Result<()> {
        let dn = byte_len(dst_width, dst_height);
        let sn = byte_len(src_width, src_height);
        let dw = dst_width as usize;
        let sw = src_width as usize;
        let src = cpu_ref(src)?;
        let src_data = &src.data[..sn];
        let dst = cpu_mut(dst)?;

        dst.data[..dn]
            .par_chunks_exact_mut(dw * 4)
            .enumerate()
            .for_each(|(dy, row)| {
                let sy = ((dy as u64 * src_height as u64) / dst_height as u64)
                    .min(src_height as u64 - 1) as usize;
                let src_row = &src_data[sy * sw * 4..(sy + 1) * sw * 4];
                for dx in 0..dw {
                    let sx = ((dx as u64 * src_width as u64) / dst_width as u64)
                        .min(src_width as u64 - 1) as usize;
                    row[dx * 4..dx * 4 + 4].copy_from_slice(&src_row[sx * 4..sx * 4 + 4]);
                }
            });
        Ok(())
    }

    fn resize_bilinear(
        &self,
        dst: &mut dyn DeviceBuffer,
        src: &dyn DeviceBuffer,
        dst_width: u32,
        dst_height: u32,
        src_width: u32,
        src_height: u32,
    ) -> Result<()> {
        let dn = byte_len(dst_width, dst_height);
        let sn = byte_len(src_width, src_height);
        let dw = dst_width as usize;
        let sw = src_width as usize;
        let sh = src_height as usize;
        let rx = src_width as f32 / dst_width as f32;
        let ry = src_height as f32 / dst_height as f32;
        let src = cpu_ref(src)?;
        let src_data = &src.data[..sn];
        let dst = cpu_mut(dst)?;

        dst.data[..dn]
            .par_chunks_exact_mut(dw * 4)
            .enumerate()
            .for_each(|(dy, row)| {
                let fy = dy as f32 * ry;
                let y0 = (fy as usize).min(sh - 1);
                let y1 = (y0 + 1).min(sh - 1);
                let ty = fy - y0 as f32;
                for dx in 0..dw {
                    let fx = dx as f32 * rx;
                    let x0 = (fx as usize).min(sw - 1);
                    let x1 = (x0 + 1).min(sw - 1);
                    let tx = fx - x0 as f32;
                    for ch in 0..4 {
                        let sample =
                            |x: usize, y: usize| src_data[(y * sw + x) * 4 + ch] as f32;
                        let top = sample(x0, y0) + tx * (sample(x1, y0) - sample(x0, y0));
                        let bot = sample(x0, y1) + tx * (sample(x1, y1) - sample(x0, y1));
                        row[dx * 4 + ch] =
                            (top + ty * (bot - top)).round().clamp(0.0, 255.0) as u8;
                    }
                }
            });
        Ok(())
    }

    fn resize_bicubic(
        &self,
        dst: &mut dyn DeviceBuffer,
        src: &dyn DeviceBuffer,
        dst_width: u32,
        dst_height: u32,
        src_width: u32,
        src_height: u32,
    ) -> Result<()> {
        let dn = byte_len(dst_width, dst_height);
        let sn = byte_len(src_width, src_height);
        let dw = dst_width as usize;
        let sw = src_width as usize;
        let sh = src_height as usize;
        let rx = src_width as f32 / dst_width as f32;
        let ry = src_height as f32 / dst_height as f32;
        let src = cpu_ref(src)?;
        let src_data = &src.data[..sn];
        let dst = cpu_mut(dst)?;

        // Catmull-Rom cubic over a 4x4 neighborhood.
        fn cubic(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
            p1 + 0.5
                * t
                * (p2 - p0
                    + t * (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3
                        + t * (3.0 * (p1 - p2) + p3 - p0)))
        }

        dst.data[..dn]
            .par_chunks_exact_mut(dw * 4)
            .enumerate()
            .for_each(|(dy, row)| {
                let fy = dy as f32 * ry;
                let y1 = (fy as usize).min(sh - 1);
                let ty = fy - y1 as f32;
                let ys = [
                    y1.saturating_sub(1),
                    y1,
                    (y1 + 1).min(sh - 1),
                    (y1 + 2).min(sh - 1),
                ];
                for dx in 0..dw {
                    let fx = dx as f32 * rx;
                    let x1 = (fx as usize).min(sw - 1);
                    let tx = fx - x1 as f32;
                    let xs = [
                        x1.saturating_sub(1),
                        x1,
                        (x1 + 1).min(sw - 1),
                        (x1 + 2).min(sw - 1),
                    ];
                    for ch in 0..4 {
                        let sample =
                            |x: usize, y: usize| src_data[(y * sw + x) * 4 + ch] as f32;
                        let mut cols = [0.0f32; 4];
                        for (i, &sy) in ys.iter().enumerate() {
                            cols[i] = cubic(
                                sample(xs[0], sy),
                                sample(xs[1], sy),
                                sample(xs[2], sy),
                                sample(xs[3], sy),
                                tx,
                            );
                        }
                        let v = cubic(cols[0], cols[1], cols[2], cols[3], ty);
                        row[dx * 4 + ch] = v.round().clamp(0.0, 255.0) as u8;
                    }
                }
            });
        Ok(())
    }

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
    ) -> Result<()> {
        let dn = byte_len(dst_width, dst_height);
        let sn = byte_len(src_width, src_height);
        let dw = dst_width as usize;
        let sw = src_width as usize;
        assert!(
            origin_x >= 0
                && origin_y >= 0
                && origin_x as u32 + dst_width <= src_width
                && origin_y as u32 + dst_height <= src_height,
            "crop rectangle exceeds source bounds"
        );
        let ox = origin_x as usize;
        let oy = origin_y as usize;
        let src = cpu_ref(src)?;
        let src_data = &src.data[..sn];
        let dst = cpu_mut(dst)?;

        dst.data[..dn]
            .par_chunks_exact_mut(dw * 4)
            .enumerate()
            .for_each(|(dy, row)| {
                let start = ((oy + dy) * sw + ox) * 4;
                row.copy_from_slice(&src_data[start..start + dw * 4]);
            });
        Ok(())
    }

    fn corner_radius(
        &self,
        buf: &mut dyn DeviceBuffer,
        width: u32,
        height: u32,
        radius: u32,
    ) -> Result<()> {
        let n = byte_len(width, height);
        let w = width as usize;
        let r = (radius.min(width / 2).min(height / 2)) as f32;
        if r <= 0.0 {
            return Ok(());
        }
        let fw = width as f32;
        let fh = height as f32;
        let buf = cpu_mut(buf)?;

        buf.data[..n]
            .par_chunks_exact_mut(w * 4)
            .enumerate()
            .for_each(|(y, row)| {
                let fy = y as f32 + 0.5;
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let fx = x as f32 + 0.5;
                    // Distance to the nearest corner arc center, if the pixel
                    // lies in one of the four corner squares.
                    let cx = if fx < r {
                        Some(r)
                    } else if fx > fw - r {
                        Some(fw - r)
                    } else {
                        None
                    };
                    let cy = if fy < r {
                        Some(r)
                    } else if fy > fh - r {
                        Some(fh - r)
                    } else {
                        None
                    };
                    if let (Some(cx), Some(cy)) = (cx, cy) {
                        let d = ((fx - cx).powi(2) + (fy - cy).powi(2)).sqrt();
                        if d > r {
                            px[3] = 0;
                        }
                    }
                }
            });
        Ok(())
    }

    fn opacity(
        &self,
        buf: &mut dyn DeviceBuffer,
        width: u32,
        height: u32,
        factor: f32,
    ) -> Result<()> {
        let n = byte_len(width, height);
        let buf = cpu_mut(buf)?;
        buf.data[..n].par_chunks_exact_mut(4).for_each(|px| {
            px[3] = (px[3] as f32 * factor).round().clamp(0.0, 255.0) as u8;
        });
        Ok(())
    }

    fn flip(
        &self,
        buf: &mut dyn DeviceBuffer,
        width: u32,
        height: u32,
        horizontal: bool,
        vertical: bool,
    ) -> Result<()> {
        if !horizontal && !vertical {
            return Ok(());
        }
        let n = byte_len(width, height);
        let w = width as usize;
        let h = height as usize;
        let buf = cpu_mut(buf)?;
        let snapshot = buf.data[..n].to_vec();

        buf.data[..n]
            .par_chunks_exact_mut(w * 4)
            .enumerate()
            .for_each(|(y, row)| {
                let sy = if vertical { h - 1 - y } else { y };
                let src_row = &snapshot[sy * w * 4..(sy + 1) * w * 4];
                if horizontal {
                    for x in 0..w {
                        let sx = w - 1 - x;
                        row[x * 4..x * 4 + 4].copy_from_slice(&src_row[sx * 4..sx * 4 + 4]);
                    }
                } else {
                    row.copy_from_slice(src_row);
                }
            });
        Ok(())
    }

    fn grayscale(&self, buf: &mut dyn DeviceBuffer, width: u32, height: u32) -> Result<()> {
        let n = byte_len(width, height);
        let buf = cpu_mut(buf)?;
        buf.data[..n].par_chunks_exact_mut(4).for_each(|px| {
            let luma = (LUMA_R * px[0] as f32 + LUMA_G * px[1] as f32 + LUMA_B * px[2] as f32)
                .round()
                .clamp(0.0, 255.0) as u8;
            px[0] = luma;
            px[1] = luma;
            px[2] = luma;
        });
        Ok(())
    }

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
    ) -> Result<()> {
        let n = byte_len(width, height);
        let kn = byte_len(key_width, key_height);
        let w = width as usize;
        let kw = key_width as usize;
        let ch = channel as usize;
        let key = cpu_ref(key)?;
        let key_data = &key.data[..kn];
        let buf = cpu_mut(buf)?;

        buf.data[..n]
            .par_chunks_exact_mut(w * 4)
            .enumerate()
            .for_each(|(y, row)| {
                // Key buffer sampled at proportional coordinates so key and
                // target may have different dimensions.
                let ky = ((y as u64 * key_height as u64) / height as u64)
                    .min(key_height as u64 - 1) as usize;
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let kx = ((x as u64 * key_width as u64) / width as u64)
                        .min(key_width as u64 - 1) as usize;
                    let v = key_data[(ky * kw + kx) * 4 + ch];
                    let mut keyed = v >= threshold;
                    if invert {
                        keyed = !keyed;
                    }
                    if keyed {
                        px[3] = 0;
                        if zero_all_channels {
                            px[0] = 0;
                            px[1] = 0;
                            px[2] = 0;
                        }
                    }
                }
            });
        Ok(())
    }

    fn stroke(
        &self,
        target: &mut dyn DeviceBuffer,
        snapshot: &dyn DeviceBuffer,
        width: u32,
        height: u32,
        stroke_width: u32,
        color: Rgba,
        mode: u32,
    ) -> Result<()> {
        let n = byte_len(width, height);
        let w = width as usize;
        let h = height as usize;
        let r = stroke_width as i64;
        let r2 = r * r;
        let snap = cpu_ref(snapshot)?;
        let snap_data = &snap.data[..n];
        let target = cpu_mut(target)?;
        let stroke_px = color.to_bytes();

        let alpha_at = |x: i64, y: i64| -> Option<u8> {
            if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
                None
            } else {
                Some(snap_data[(y as usize * w + x as usize) * 4 + 3])
            }
        };

        target.data[..n]
            .par_chunks_exact_mut(w * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let own_alpha = snap_data[(y * w + x) * 4 + 3];
                    let looking_for_opaque = mode == 0;
                    let candidate = if looking_for_opaque {
                        own_alpha == 0
                    } else {
                        own_alpha > 0
                    };
                    if !candidate {
                        continue;
                    }
                    'search: for dy in -r..=r {
                        for dx in -r..=r {
                            if dx * dx + dy * dy > r2 {
                                continue;
                            }
                            let neighbor = alpha_at(x as i64 + dx, y as i64 + dy);
                            let hit = match neighbor {
                                Some(a) if looking_for_opaque => a > 0,
                                Some(a) => a == 0,
                                // Outside the image counts as transparent.
                                None => !looking_for_opaque,
                            };
                            if hit {
                                px.copy_from_slice(&stroke_px);
                                break 'search;
                            }
                        }
                    }
                }
            });
        Ok(())
    }

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
    ) -> Result<()> {
        if radius <= 0.0 {
            return Ok(());
        }
        let n = byte_len(width, height);
        let w = width as usize;
        let h = height as usize;
        let ri = radius.ceil() as i64;
        let snap = cpu_ref(snapshot)?;
        let snap_data = &snap.data[..n];
        let target = cpu_mut(target)?;

        let alpha_at = |x: i64, y: i64| -> u8 {
            if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
                0
            } else {
                snap_data[(y as usize * w + x as usize) * 4 + 3]
            }
        };

        target.data[..n]
            .par_chunks_exact_mut(w * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let own_alpha = snap_data[(y * w + x) * 4 + 3];
                    let outer = mode == 0;
                    if (outer && own_alpha != 0) || (!outer && own_alpha == 0) {
                        continue;
                    }
                    // Strongest contribution from silhouette pixels within
                    // the blur radius, attenuated linearly by distance.
                    let mut coverage = 0.0f32;
                    for dy in -ri..=ri {
                        for dx in -ri..=ri {
                            let d2 = (dx * dx + dy * dy) as f32;
                            if d2 > radius * radius {
                                continue;
                            }
                            let a = alpha_at(x as i64 + dx, y as i64 + dy);
                            let silhouette = if outer { a as f32 / 255.0 } else {
                                if a == 0 { 1.0 } else { 0.0 }
                            };
                            if silhouette > 0.0 {
                                let falloff = 1.0 - d2.sqrt() / radius;
                                coverage = coverage.max(silhouette * falloff);
                            }
                        }
                    }
                    if coverage <= 0.0 {
                        continue;
                    }
                    let shade = (coverage * intensity).clamp(0.0, 1.0);
                    if outer {
                        px[0] = color.r;
                        px[1] = color.g;
                        px[2] = color.b;
                        px[3] = (shade * color.a as f32).round() as u8;
                    } else {
                        let t = shade * color.a as f32 / 255.0;
                        px[0] = lerp_u8(px[0], color.r, t);
                        px[1] = lerp_u8(px[1], color.g, t);
                        px[2] = lerp_u8(px[2], color.b, t);
                    }
                }
            });
        Ok(())
    }

    fn gaussian_blur(
        &self,
        target: &mut dyn DeviceBuffer,
        snapshot: &dyn DeviceBuffer,
        width: u32,
        height: u32,
        radius: f32,
    ) -> Result<()> {
        let n = byte_len(width, height);
        let snap = cpu_ref(snapshot)?;
        if radius <= 0.0 {
            let snap_data = snap.data[..n].to_vec();
            let target = cpu_mut(target)?;
            target.data[..n].copy_from_slice(&snap_data);
            return Ok(());
        }
        let w = width as usize;
        let h = height as usize;
        let r = radius.ceil() as i64;
        let sigma = (radius / 3.0).max(0.1);

        let kernel_size = (r * 2 + 1) as usize;
        let mut kernel = vec![0.0f32; kernel_size];
        let mut sum = 0.0;
        for (i, k) in kernel.iter_mut().enumerate() {
            let d = (i as i64 - r) as f32;
            *k = (-d * d / (2.0 * sigma * sigma)).exp();
            sum += *k;
        }
        for k in &mut kernel {
            *k /= sum;
        }

        let snap_data = &snap.data[..n];

        // Horizontal pass into an f32 scratch image.
        let mut temp = vec![0.0f32; n];
        temp.par_chunks_exact_mut(w * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..w as i64 {
                    for ch in 0..4 {
                        let mut acc = 0.0;
                        for (ki, &k) in kernel.iter().enumerate() {
                            let sx = (x + ki as i64 - r).clamp(0, w as i64 - 1) as usize;
                            acc += snap_data[(y * w + sx) * 4 + ch] as f32 * k;
                        }
                        row[x as usize * 4 + ch] = acc;
                    }
                }
            });

        // Vertical pass into the target.
        let target = cpu_mut(target)?;
        target.data[..n]
            .par_chunks_exact_mut(w * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..w {
                    for ch in 0..4 {
                        let mut acc = 0.0;
                        for (ki, &k) in kernel.iter().enumerate() {
                            let sy = (y as i64 + ki as i64 - r).clamp(0, h as i64 - 1) as usize;
                            acc += temp[(sy * w + x) * 4 + ch] * k;
                        }
                        row[x * 4 + ch] = acc.round().clamp(0.0, 255.0) as u8;
                    }
                }
            });
        Ok(())
    }
}
