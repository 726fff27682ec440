//! Aspect/resolution negotiation for the processing and frame buffers.
//!
//! Pure functions of (viewport, format, requested resolution). The rest of
//! the pipeline reallocates buffers only when the [`ResolutionSignature`]
//! changes between ticks.

use crate::foundation::core::Extent;
use crate::params::{FormatMode, ResolvedFormat};

/// Minimum sane frame buffer short side; degenerate requests clamp up to this.
pub const MIN_RESOLUTION: u32 = 120;

/// Processing buffer short side as a fraction of the frame short side.
const LOW_RES_FACTOR: f64 = 0.85;

/// Realistic device-portrait aspect range (w/h), kept even when the device is
/// physically landscape.
const PORTRAIT_MIN_ASPECT: f64 = 9.0 / 19.5;
const PORTRAIT_MAX_ASPECT: f64 = 9.0 / 14.0;
const PORTRAIT_FALLBACK_ASPECT: f64 = 9.0 / 16.0;

const LANDSCAPE_ASPECT: f64 = 16.0 / 9.0;

/// Composite key over every input that affects buffer geometry.
///
/// Equality is the whole contract: buffers are resized iff the signature
/// differs from the previous tick's.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResolutionSignature {
    pub format: FormatMode,
    pub resolved: ResolvedFormat,
    pub resolution: u32,
    pub viewport: Extent,
    pub source: Extent,
}

impl ResolutionSignature {
    pub fn capture(
        format: FormatMode,
        resolution: u32,
        viewport: Extent,
        source: Extent,
    ) -> Self {
        Self {
            format,
            resolved: format.resolve(viewport),
            resolution,
            viewport,
            source,
        }
    }
}

/// Output of the geometry resolver: the true frame aspect and the extents of
/// the frame and processing buffers (the feedback buffer always mirrors the
/// frame buffer).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameGeometry {
    /// Width over height of the true frame.
    pub aspect: f64,
    /// Frame buffer extent, short side = requested resolution.
    pub frame: Extent,
    /// Processing buffer extent, short side = `max(120, floor(res * 0.85))`.
    pub low: Extent,
}

/// Target aspect ratio (w/h) for a resolved format.
pub fn target_aspect(resolved: ResolvedFormat, viewport: Extent) -> f64 {
    match resolved {
        ResolvedFormat::Square => 1.0,
        ResolvedFormat::Landscape => LANDSCAPE_ASPECT,
        ResolvedFormat::Portrait => {
            if viewport.is_empty() {
                PORTRAIT_FALLBACK_ASPECT
            } else {
                viewport.aspect().clamp(PORTRAIT_MIN_ASPECT, PORTRAIT_MAX_ASPECT)
            }
        }
    }
}

/// Compute buffer geometry for this viewport/format/resolution combination.
///
/// Degenerate inputs clamp rather than fail: a zero or tiny resolution is
/// raised to [`MIN_RESOLUTION`], an empty viewport falls back to a nominal
/// portrait aspect.
pub fn resolve_geometry(viewport: Extent, format: FormatMode, resolution: u32) -> FrameGeometry {
    let resolved = format.resolve(viewport);
    let aspect = target_aspect(resolved, viewport);

    let res = resolution.max(MIN_RESOLUTION);
    let low_res = MIN_RESOLUTION.max((f64::from(res) * LOW_RES_FACTOR).floor() as u32);

    FrameGeometry {
        aspect,
        frame: extent_for_short_side(aspect, res),
        low: extent_for_short_side(aspect, low_res),
    }
}

/// Extent with the given short side, oriented by the aspect ratio.
fn extent_for_short_side(aspect: f64, short: u32) -> Extent {
    if aspect >= 1.0 {
        Extent::new((f64::from(short) * aspect).round() as u32, short)
    } else {
        Extent::new(short, (f64::from(short) / aspect).round() as u32)
    }
}
