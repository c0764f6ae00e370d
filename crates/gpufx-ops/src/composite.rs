//! Higher-level composition: aligned and padded blends, cover-fit, grid,
//! and collage layouts.
//!
//! All placement arithmetic is done on the images' logical extents with
//! floor division, so a foreground larger than its background produces the
//! expected negative coordinates and lets the backend clip.

use gpufx_compute::GpuImage;
use gpufx_core::{Error, Result, Rgba};
use tracing::debug;

use crate::blend::blend;
use crate::fill::fill_color;
use crate::resize::{ResizeMethod, resize, resize_into};

/// Named placement of a foreground within a background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Both axes centered.
    #[default]
    Center,
    /// Centered horizontally, flush with the top edge.
    Top,
    /// Centered horizontally, flush with the bottom edge.
    Bottom,
    /// Centered vertically, flush with the left edge.
    Left,
    /// Centered vertically, flush with the right edge.
    Right,
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    BottomRight,
}

impl Alignment {
    /// Maps an alignment name to its variant.
    ///
    /// Unrecognized names fall back to [`Alignment::Center`]; this is a
    /// documented default, not an error. `"middle"` is accepted as an alias
    /// for center.
    pub fn from_name(name: &str) -> Self {
        match name {
            "center" | "middle" => Self::Center,
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            "left" => Self::Left,
            "right" => Self::Right,
            "top-left" => Self::TopLeft,
            "top-right" => Self::TopRight,
            "bottom-left" => Self::BottomLeft,
            "bottom-right" => Self::BottomRight,
            _ => Self::Center,
        }
    }

    /// Top-left placement of a `fg_w x fg_h` foreground inside a
    /// `bg_w x bg_h` background.
    fn position(self, bg_w: u32, bg_h: u32, fg_w: u32, fg_h: u32) -> (i64, i64) {
        let center_x = (bg_w as i64 - fg_w as i64).div_euclid(2);
        let center_y = (bg_h as i64 - fg_h as i64).div_euclid(2);
        let right = bg_w as i64 - fg_w as i64;
        let bottom = bg_h as i64 - fg_h as i64;
        match self {
            Self::Center => (center_x, center_y),
            Self::Top => (center_x, 0),
            Self::Bottom => (center_x, bottom),
            Self::Left => (0, center_y),
            Self::Right => (right, center_y),
            Self::TopLeft => (0, 0),
            Self::TopRight => (right, 0),
            Self::BottomLeft => (0, bottom),
            Self::BottomRight => (right, bottom),
        }
    }
}

/// Saturates a placement coordinate into the `i32` range the blend kernel
/// accepts. A foreground this far outside its background is fully clipped,
/// so saturation cannot change what gets drawn.
fn clamp_coord(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Blends `image` onto `background` at a named alignment, with optional
/// pixel offsets applied after alignment.
pub fn blend_aligned(
    background: &mut GpuImage,
    image: &GpuImage,
    alignment: Alignment,
    offset_x: i32,
    offset_y: i32,
) -> Result<()> {
    let (bg_w, bg_h) = background.dimensions();
    let (fg_w, fg_h) = image.dimensions();
    let (x, y) = alignment.position(bg_w, bg_h, fg_w, fg_h);
    debug!(bg_w, bg_h, fg_w, fg_h, ?alignment, x, y, "blend_aligned");
    blend(
        background,
        image,
        clamp_coord(x + i64::from(offset_x)),
        clamp_coord(y + i64::from(offset_y)),
    )
}

/// Dimensions of `image` with `padding` pixels added on every side.
#[inline]
pub fn get_padding_size(image: &GpuImage, padding: u32) -> (u32, u32) {
    (image.width() + padding * 2, image.height() + padding * 2)
}

/// Dimensions of `image` with `padding` pixels removed from every side.
///
/// # Errors
///
/// [`Error::InvalidArgument`] when the padding consumes an entire axis.
pub fn get_no_padding_size(image: &GpuImage, padding: u32) -> Result<(u32, u32)> {
    let (width, height) = image.dimensions();
    if padding * 2 >= width || padding * 2 >= height {
        return Err(Error::invalid_argument(
            "padding exceeds image dimensions",
        ));
    }
    Ok((width - padding * 2, height - padding * 2))
}

/// Blends `image` centered in a background `padding` pixels larger on every
/// side.
///
/// With `background: None` a transparent background is allocated; with
/// `Some`, the supplied image is used (and returned), its logical
/// dimensions validated against the padded size. Ownership of the
/// background passes through the call either way.
pub fn blend_padding(
    image: &GpuImage,
    padding: u32,
    background: Option<GpuImage>,
) -> Result<GpuImage> {
    let (padded_w, padded_h) = get_padding_size(image, padding);
    debug!(padded_w, padded_h, padding, "blend_padding");
    let mut background = match background {
        Some(bg) => {
            if bg.dimensions() != (padded_w, padded_h) {
                return Err(Error::dimension_mismatch((padded_w, padded_h), bg.dimensions()));
            }
            bg
        }
        None => {
            let mut bg = GpuImage::new(image.backend(), padded_w, padded_h)?;
            fill_color(&mut bg, Rgba::TRANSPARENT)?;
            bg
        }
    };
    blend(&mut background, image, padding as i32, padding as i32)?;
    Ok(background)
}

/// Scales `image` uniformly so it fully covers a `container_width x
/// container_height` container, then centers it (plus offsets) over a
/// `background_color` fill.
///
/// The scale factor is `max(cw/w, ch/h)`: one axis fits exactly, the other
/// overflows and is clipped by the blend. A `resize_cache` sized to the
/// scaled dimensions avoids the intermediate allocation; a `container`
/// image (validated against the container size) avoids the result
/// allocation, and is returned either way.
pub fn cover_image_in_container(
    image: &GpuImage,
    container_width: u32,
    container_height: u32,
    offset_x: i32,
    offset_y: i32,
    background_color: Rgba,
    resize_cache: Option<&mut GpuImage>,
    container: Option<GpuImage>,
) -> Result<GpuImage> {
    if container_width == 0 || container_height == 0 {
        return Err(Error::invalid_argument(
            "container dimensions must be non-zero",
        ));
    }
    let (width, height) = image.dimensions();
    let scale = (container_width as f32 / width as f32)
        .max(container_height as f32 / height as f32);
    let scaled_w = (width as f32 * scale).round().max(1.0) as u32;
    let scaled_h = (height as f32 * scale).round().max(1.0) as u32;
    debug!(
        width,
        height,
        container_width,
        container_height,
        scale,
        scaled_w,
        scaled_h,
        "cover_image_in_container"
    );

    let mut container = match container {
        Some(c) => {
            if c.dimensions() != (container_width, container_height) {
                return Err(Error::dimension_mismatch(
                    (container_width, container_height),
                    c.dimensions(),
                ));
            }
            c
        }
        None => GpuImage::new(image.backend(), container_width, container_height)?,
    };
    fill_color(&mut container, background_color)?;

    let x = (container_width as i64 - scaled_w as i64).div_euclid(2) + offset_x as i64;
    let y = (container_height as i64 - scaled_h as i64).div_euclid(2) + offset_y as i64;

    match resize_cache {
        Some(cache) => {
            resize_into(image, scaled_w, scaled_h, ResizeMethod::Bicubic, cache)?;
            blend(&mut container, cache, clamp_coord(x), clamp_coord(y))?;
        }
        None => {
            let scaled = resize(image, scaled_w, scaled_h, ResizeMethod::Bicubic)?;
            blend(&mut container, &scaled, clamp_coord(x), clamp_coord(y))?;
            // scaled dropped here
        }
    }
    Ok(container)
}

/// Shared cell layout for [`create_image_grid`] and
/// [`create_image_collage`]: uniform spacing between cells and around the
/// border.
fn layout_cells(
    images: &[&GpuImage],
    grid_width: u32,
    grid_height: u32,
    spacing: u32,
    background_color: Rgba,
) -> Result<GpuImage> {
    let (cell_w, cell_h) = images[0].dimensions();
    let total_w = u64::from(grid_width) * u64::from(cell_w)
        + u64::from(grid_width + 1) * u64::from(spacing);
    let total_h = u64::from(grid_height) * u64::from(cell_h)
        + u64::from(grid_height + 1) * u64::from(spacing);
    let total_w = u32::try_from(total_w)
        .map_err(|_| Error::invalid_argument("grid dimensions overflow"))?;
    let total_h = u32::try_from(total_h)
        .map_err(|_| Error::invalid_argument("grid dimensions overflow"))?;

    let mut result = GpuImage::new(images[0].backend(), total_w, total_h)?;
    fill_color(&mut result, background_color)?;

    for (i, &image) in images.iter().enumerate() {
        let col = (i as u32) % grid_width;
        let row = (i as u32) / grid_width;
        let x = spacing + col * (cell_w + spacing);
        let y = spacing + row * (cell_h + spacing);
        blend(&mut result, image, x as i32, y as i32)?;
    }
    Ok(result)
}

/// Tiles `num_images` copies of `source` into a `grid_width x grid_height`
/// layout with uniform spacing, over a `background_color` fill.
///
/// # Errors
///
/// [`Error::InvalidArgument`] when `num_images` exceeds the grid capacity
/// or is zero, or a grid dimension is zero.
pub fn create_image_grid(
    source: &GpuImage,
    grid_width: u32,
    grid_height: u32,
    num_images: u32,
    spacing: u32,
    background_color: Rgba,
) -> Result<GpuImage> {
    if grid_width == 0 || grid_height == 0 {
        return Err(Error::invalid_argument("grid dimensions must be non-zero"));
    }
    if num_images == 0 {
        return Err(Error::invalid_argument("num_images must be non-zero"));
    }
    let capacity = u64::from(grid_width) * u64::from(grid_height);
    if u64::from(num_images) > capacity {
        return Err(Error::invalid_argument(format!(
            "num_images {num_images} exceeds grid capacity {capacity}"
        )));
    }
    debug!(grid_width, grid_height, num_images, spacing, "create_image_grid");
    let copies = vec![source; num_images as usize];
    layout_cells(&copies, grid_width, grid_height, spacing, background_color)
}

/// Lays out a list of same-sized images into a `grid_width x grid_height`
/// grid, row-major, with uniform spacing over a `background_color` fill.
///
/// # Errors
///
/// [`Error::InvalidArgument`] when the list is empty, exceeds the grid
/// capacity, or contains images of differing logical dimensions.
pub fn create_image_collage(
    images: &[&GpuImage],
    grid_width: u32,
    grid_height: u32,
    spacing: u32,
    background_color: Rgba,
) -> Result<GpuImage> {
    if grid_width == 0 || grid_height == 0 {
        return Err(Error::invalid_argument("grid dimensions must be non-zero"));
    }
    if images.is_empty() {
        return Err(Error::invalid_argument("collage needs at least one image"));
    }
    let capacity = u64::from(grid_width) * u64::from(grid_height);
    if images.len() as u64 > capacity {
        return Err(Error::invalid_argument(format!(
            "{} images exceed grid capacity {capacity}",
            images.len()
        )));
    }
    let dims = images[0].dimensions();
    if images.iter().any(|img| img.dimensions() != dims) {
        return Err(Error::invalid_argument(
            "collage images must share identical dimensions",
        ));
    }
    debug!(grid_width, grid_height, count = images.len(), spacing, "create_image_collage");
    layout_cells(images, grid_width, grid_height, spacing, background_color)
}
