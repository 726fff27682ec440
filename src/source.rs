//! The camera collaborator seam.
//!
//! The pipeline only ever reads frames; device acquisition, permissions and
//! focus live outside the core. A source that has not reported its geometry
//! yet returns an empty extent; geometry decisions then substitute
//! [`NOMINAL_SOURCE`] (see [`effective_extent`]) and the sampler draws an
//! opaque black frame.

use crate::foundation::core::{Extent, PixelBuffer};
use crate::foundation::error::GlitchResult;

/// Fallback source size used while a device has not reported dimensions.
pub const NOMINAL_SOURCE: Extent = Extent {
    width: 1280,
    height: 720,
};

/// A continuously updating frame supplier (live camera, decoder, test rig).
pub trait FrameSource {
    /// Current reported dimensions. An empty extent means "not yet reporting".
    fn extent(&self) -> Extent;

    /// Current frame as straight RGBA8, row-major, `width * height * 4` bytes.
    fn data(&self) -> &[u8];

    /// Advance to the next frame. Called once per scheduler tick before
    /// sampling; pull-based sources may leave this as the default no-op.
    fn advance(&mut self) {}
}

/// The extent used for geometry decisions: the reported one, with
/// [`NOMINAL_SOURCE`] standing in while the source has not reported yet.
///
/// The substitution keeps the resolution signature stable across the moment
/// a nominal-sized camera starts reporting, so no spurious reallocation
/// interrupts the first real frame.
pub fn effective_extent(source: &dyn FrameSource) -> Extent {
    let extent = source.extent();
    if extent.is_empty() { NOMINAL_SOURCE } else { extent }
}

/// Deterministic moving test pattern standing in for a camera.
///
/// A two-axis color gradient with a bright scanline that scrolls one row per
/// [`FrameSource::advance`] call. Identical tick counts produce identical
/// pixels, which is what the snapshot-style tests rely on.
#[derive(Clone, Debug)]
pub struct TestPatternSource {
    buffer: PixelBuffer,
    tick: u64,
}

impl TestPatternSource {
    pub fn new(extent: Extent) -> GlitchResult<Self> {
        let mut source = Self {
            buffer: PixelBuffer::new(extent)?,
            tick: 0,
        };
        source.redraw();
        Ok(source)
    }

    /// A source that reports no geometry, for exercising the fallback path.
    pub fn unreported() -> Self {
        Self {
            buffer: PixelBuffer::empty(),
            tick: 0,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    fn redraw(&mut self) {
        let extent = self.buffer.extent();
        if extent.is_empty() {
            return;
        }
        let (w, h) = (extent.width, extent.height);
        let scanline = (self.tick % u64::from(h)) as u32;
        for y in 0..h {
            for x in 0..w {
                let r = ((u64::from(x) * 255) / u64::from(w.max(1))) as u8;
                let g = ((u64::from(y) * 255) / u64::from(h.max(1))) as u8;
                let b = ((self.tick * 3) % 256) as u8;
                let px = if y == scanline {
                    [255, 255, 255, 255]
                } else {
                    [r, g, b, 255]
                };
                self.buffer.set_pixel(x, y, px);
            }
        }
    }
}

impl FrameSource for TestPatternSource {
    fn extent(&self) -> Extent {
        self.buffer.extent()
    }

    fn data(&self) -> &[u8] {
        self.buffer.data()
    }

    fn advance(&mut self) {
        self.tick += 1;
        self.redraw();
    }
}
