//! Snapshot export: encode the true frame buffer as a still image.
//!
//! Exports always read the frame buffer, never the letterboxed screen
//! buffer, so saved stills carry the real output aspect (1:1, 16:9, ...).

use std::io::Cursor;
use std::path::Path;

use anyhow::Context as _;
use image::ImageEncoder as _;

use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{GlitchError, GlitchResult};

/// Encode the frame as PNG bytes.
pub fn encode_png(frame: &PixelBuffer) -> GlitchResult<Vec<u8>> {
    if frame.extent().is_empty() {
        return Err(GlitchError::validation(
            "cannot encode an empty frame buffer; run at least one tick first",
        ));
    }

    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(Cursor::new(&mut out))
        .write_image(
            frame.data(),
            frame.width(),
            frame.height(),
            image::ExtendedColorType::Rgba8,
        )
        .context("encode frame buffer as PNG")?;
    Ok(out)
}

/// Write the frame as a PNG file, creating parent directories as needed.
pub fn save_png(frame: &PixelBuffer, path: &Path) -> GlitchResult<()> {
    if frame.extent().is_empty() {
        return Err(GlitchError::validation(
            "cannot save an empty frame buffer; run at least one tick first",
        ));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        frame.data(),
        frame.width(),
        frame.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}
