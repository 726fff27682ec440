//! Letterboxed presentation of the frame buffer into the viewport.
//!
//! "Contain" fitting: the frame is scaled to fit entirely inside the screen
//! buffer with uniform margins, never cropped and never stretched. This is
//! purely a presentation step; snapshots export the frame buffer, not the
//! screen buffer.

use crate::foundation::core::{Extent, PixelBuffer};
use crate::foundation::error::GlitchResult;
use crate::sample::blit_nearest;

/// Resolved contain-fit placement of a frame inside a screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContainFit {
    pub scale: f64,
    /// Scaled frame size after rounding.
    pub dest: Extent,
    /// Top-left corner of the destination rectangle (floor of half margins).
    pub offset_x: u32,
    pub offset_y: u32,
}

/// Compute `scale = min(sw/fw, sh/fh)` and the centered destination rect.
pub fn contain_fit(frame: Extent, screen: Extent) -> ContainFit {
    if frame.is_empty() || screen.is_empty() {
        return ContainFit {
            scale: 0.0,
            dest: Extent::ZERO,
            offset_x: 0,
            offset_y: 0,
        };
    }

    let scale = (f64::from(screen.width) / f64::from(frame.width))
        .min(f64::from(screen.height) / f64::from(frame.height));
    let dw = ((f64::from(frame.width) * scale).round() as u32).min(screen.width);
    let dh = ((f64::from(frame.height) * scale).round() as u32).min(screen.height);

    ContainFit {
        scale,
        dest: Extent::new(dw, dh),
        offset_x: (screen.width - dw) / 2,
        offset_y: (screen.height - dh) / 2,
    }
}

/// Blit the frame into the screen buffer, letterboxed over solid black.
pub fn present(frame: &PixelBuffer, screen: &mut PixelBuffer) -> GlitchResult<()> {
    screen.fill([0, 0, 0, 255]);
    let fit = contain_fit(frame.extent(), screen.extent());
    if fit.dest.is_empty() {
        return Ok(());
    }
    blit_nearest(
        frame,
        screen,
        fit.offset_x,
        fit.offset_y,
        fit.dest.width,
        fit.dest.height,
    )
}
