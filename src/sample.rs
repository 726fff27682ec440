//! Cover-cropped sampling and nearest-neighbor blits.
//!
//! All scaling in the pipeline is nearest-neighbor on purpose; the hard pixel
//! edges are part of the look. The cover sampler crops, never stretches and
//! never letterboxes; the contain blit in [`crate::display`] does the
//! opposite.

use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{GlitchError, GlitchResult};
use crate::source::FrameSource;

/// Fill `dst` from the largest centered source rectangle whose aspect matches
/// `dst`, resampling nearest-neighbor. Every destination pixel is written.
///
/// A source that reports no geometry (or whose data does not match its
/// reported extent) is replaced by an opaque black frame.
pub fn cover_sample(source: &dyn FrameSource, dst: &mut PixelBuffer) -> GlitchResult<()> {
    let dst_extent = dst.extent();
    if dst_extent.is_empty() {
        return Ok(());
    }

    let src_extent = source.extent();
    let data = source.data();
    let usable = !src_extent.is_empty() && data.len() == src_extent.pixel_count() * 4;
    if !usable {
        dst.fill([0, 0, 0, 255]);
        return Ok(());
    }

    let (sw, sh) = (f64::from(src_extent.width), f64::from(src_extent.height));
    let (dw, dh) = (f64::from(dst_extent.width), f64::from(dst_extent.height));

    let src_aspect = sw / sh;
    let dst_aspect = dw / dh;

    // Centered crop rectangle in source space.
    let (sx, sy, crop_w, crop_h) = if src_aspect > dst_aspect {
        let crop_w = sh * dst_aspect;
        ((sw - crop_w) / 2.0, 0.0, crop_w, sh)
    } else {
        let crop_h = sw / dst_aspect;
        (0.0, (sh - crop_h) / 2.0, sw, crop_h)
    };

    let max_x = src_extent.width - 1;
    let max_y = src_extent.height - 1;
    let row_stride = src_extent.width as usize * 4;

    for y in 0..dst_extent.height {
        let fy = sy + (f64::from(y) + 0.5) * crop_h / dh;
        let py = (fy.floor().max(0.0) as u32).min(max_y);
        let src_row = py as usize * row_stride;
        for x in 0..dst_extent.width {
            let fx = sx + (f64::from(x) + 0.5) * crop_w / dw;
            let px = (fx.floor().max(0.0) as u32).min(max_x);
            let si = src_row + px as usize * 4;
            let di = dst.pixel_index(x, y);
            let out = [data[si], data[si + 1], data[si + 2], 255];
            dst.data_mut()[di..di + 4].copy_from_slice(&out);
        }
    }
    Ok(())
}

/// Nearest-neighbor resample of the whole of `src` into the whole of `dst`.
///
/// Aspects are expected to already agree (the geometry resolver derives both
/// extents from one aspect); this function does not stretch-correct.
pub fn resample_nearest(src: &PixelBuffer, dst: &mut PixelBuffer) -> GlitchResult<()> {
    let dst_extent = dst.extent();
    if dst_extent.is_empty() || src.extent().is_empty() {
        return Ok(());
    }
    blit_nearest(src, dst, 0, 0, dst_extent.width, dst_extent.height)
}

/// Nearest-neighbor blit of the whole of `src` into the destination rectangle
/// `(dx, dy, dw, dh)`, which must lie inside `dst`.
pub fn blit_nearest(
    src: &PixelBuffer,
    dst: &mut PixelBuffer,
    dx: u32,
    dy: u32,
    dw: u32,
    dh: u32,
) -> GlitchResult<()> {
    if dw == 0 || dh == 0 {
        return Ok(());
    }
    if src.extent().is_empty() {
        return Err(GlitchError::render("blit_nearest source is empty"));
    }
    let dst_extent = dst.extent();
    if dx.checked_add(dw).is_none_or(|r| r > dst_extent.width)
        || dy.checked_add(dh).is_none_or(|b| b > dst_extent.height)
    {
        return Err(GlitchError::render(
            "blit_nearest destination rectangle out of bounds",
        ));
    }

    let (sw, sh) = (u64::from(src.width()), u64::from(src.height()));
    for y in 0..dh {
        let sy = ((u64::from(y) * sh) / u64::from(dh)) as u32;
        for x in 0..dw {
            let sx = ((u64::from(x) * sw) / u64::from(dw)) as u32;
            let px = src.pixel(sx, sy);
            dst.set_pixel(dx + x, dy + y, px);
        }
    }
    Ok(())
}
