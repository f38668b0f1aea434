//! PNG encoding for image hints and theme icons.

use std::fs::{self, File};
use std::path::Path;

use cairo::{Context, Format, ImageSurface};
use resvg::usvg;

use super::IconError;
use crate::notification::ImageData;

fn raster_err(err: impl std::fmt::Display) -> IconError {
    IconError::Raster(err.to_string())
}

/// Checks that `image` describes an 8-bit RGB or RGBA buffer large enough for its extents.
pub(crate) fn validate_payload(image: &ImageData) -> Result<(), IconError> {
    if image.width <= 0 || image.height <= 0 {
        return Err(IconError::InvalidImage(format!(
            "empty extents {}x{}",
            image.width, image.height
        )));
    }
    if image.bits_per_sample != 8 {
        return Err(IconError::InvalidImage(format!(
            "{} bits per sample",
            image.bits_per_sample
        )));
    }
    let expected_channels = if image.has_alpha { 4 } else { 3 };
    if image.channels != expected_channels {
        return Err(IconError::InvalidImage(format!(
            "{} channels with has_alpha={}",
            image.channels, image.has_alpha
        )));
    }
    let row_bytes = i64::from(image.width) * i64::from(image.channels);
    if i64::from(image.rowstride) < row_bytes {
        return Err(IconError::InvalidImage(format!(
            "rowstride {} shorter than a row ({} bytes)",
            image.rowstride, row_bytes
        )));
    }
    let needed = i64::from(image.rowstride) * i64::from(image.height - 1) + row_bytes;
    if (image.data.len() as i64) < needed {
        return Err(IconError::InvalidImage(format!(
            "{} bytes of pixel data, need {}",
            image.data.len(),
            needed
        )));
    }
    Ok(())
}

/// Writes a raw pixel payload as PNG.
pub fn encode_pixels(image: &ImageData, dest: &Path) -> Result<(), IconError> {
    validate_payload(image)?;

    let mut surface =
        ImageSurface::create(Format::ARgb32, image.width, image.height).map_err(raster_err)?;
    let stride = usize::try_from(surface.stride()).map_err(raster_err)?;

    {
        let mut data = surface.data().map_err(raster_err)?;
        for y in 0..image.height {
            for x in 0..image.width {
                let Some([r, g, b, a]) = image.pixel(x, y) else {
                    continue;
                };
                // Cairo wants premultiplied native-endian ARGB.
                let premultiply = |c: u8| (u32::from(c) * u32::from(a) / 255);
                let argb = (u32::from(a) << 24)
                    | (premultiply(r) << 16)
                    | (premultiply(g) << 8)
                    | premultiply(b);
                let offset = y as usize * stride + x as usize * 4;
                data[offset..offset + 4].copy_from_slice(&argb.to_ne_bytes());
            }
        }
    }

    let mut file = File::create(dest)?;
    surface.write_to_png(&mut file).map_err(raster_err)?;
    Ok(())
}

/// Rasterizes an SVG or PNG icon into a square PNG of `size` pixels.
pub fn rasterize_file(source: &Path, size: u32, dest: &Path) -> Result<(), IconError> {
    let extension = source
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    if extension.eq_ignore_ascii_case("svg") {
        rasterize_svg(source, size, dest)
    } else if extension.eq_ignore_ascii_case("png") {
        rasterize_png(source, size, dest)
    } else {
        Err(IconError::Unsupported(source.display().to_string()))
    }
}

fn rasterize_svg(source: &Path, size: u32, dest: &Path) -> Result<(), IconError> {
    let svg_data = fs::read(source)?;
    let tree = usvg::Tree::from_data(&svg_data, &usvg::Options::default()).map_err(raster_err)?;

    let natural = tree.size();
    let scale = size as f32 / natural.width().max(natural.height());
    let transform = tiny_skia::Transform::from_scale(scale, scale);

    let mut pixmap = tiny_skia::Pixmap::new(size, size)
        .ok_or_else(|| IconError::Raster(format!("Cannot allocate {size}px pixmap")))?;
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    pixmap.save_png(dest).map_err(raster_err)
}

fn rasterize_png(source: &Path, size: u32, dest: &Path) -> Result<(), IconError> {
    let mut input = File::open(source)?;
    let image = ImageSurface::create_from_png(&mut input).map_err(raster_err)?;
    let longest = image.width().max(image.height());
    if longest <= 0 {
        return Err(IconError::InvalidImage(format!(
            "{} has no pixels",
            source.display()
        )));
    }

    let edge = i32::try_from(size).map_err(raster_err)?;
    let target = ImageSurface::create(Format::ARgb32, edge, edge).map_err(raster_err)?;
    {
        let ctx = Context::new(&target).map_err(raster_err)?;
        let scale = f64::from(edge) / f64::from(longest);
        ctx.scale(scale, scale);
        ctx.set_source_surface(&image, 0.0, 0.0)
            .map_err(raster_err)?;
        ctx.paint().map_err(raster_err)?;
    }

    let mut output = File::create(dest)?;
    target.write_to_png(&mut output).map_err(raster_err)?;
    Ok(())
}
