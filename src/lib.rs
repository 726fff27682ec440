//! glitchcam renders a live camera feed through a chain of degrading visual
//! effects and letterboxes the result into an arbitrary viewport, while a
//! pristine true-aspect frame stays exportable as a snapshot.
//!
//! # Pipeline overview
//!
//! Per refresh tick:
//!
//! 1. **Geometry**: a [`ResolutionSignature`] over (format, resolution,
//!    viewport, source size) decides whether buffers must be reallocated.
//! 2. **Sample**: the source frame is cover-cropped (never stretched) into a
//!    low-resolution processing buffer.
//! 3. **Effects**: an ordered in-place chain — block glitch, bit crush,
//!    chromatic split, noise, false color — mutates the processing buffer.
//! 4. **Upscale**: nearest-neighbor resample into the full-resolution frame
//!    buffer (aspects match by construction).
//! 5. **Composite**: temporal feedback echo, then overlays (color bars, date
//!    stamp) on the frame buffer.
//! 6. **Present**: contain-fit letterbox blit into the viewport-sized screen
//!    buffer. Snapshots export the frame buffer, never the screen buffer.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Single-threaded, frame-synchronous**: all stages run sequentially
//!   inside one scheduler iteration; the feedback buffer and the bend burst
//!   are the only cross-tick state, both owned by the [`PipelineSession`].
//! - **Snapshot-per-tick configuration**: a [`TickParams`] value is captured
//!   once per tick and passed by value, so a tick is a pure function of
//!   (previous buffers, source frame, config).
//! - **Best-effort rendering**: degenerate geometry clamps, missing sources
//!   substitute a nominal black frame, and a failed tick is logged and
//!   skipped without stopping the loop.
#![forbid(unsafe_code)]

mod display;
mod effects;
mod foundation;
mod geometry;
mod overlay;
mod params;
mod pipeline;
mod sample;
mod source;

pub mod export;

pub use display::{ContainFit, contain_fit, present};
pub use effects::feedback::FeedbackCompositor;
pub use effects::fx::{
    add_noise, apply_chain, bit_crush, block_glitch, chroma_split, false_color, max_chroma_shift,
};
pub use foundation::core::{Extent, PixelBuffer};
pub use foundation::error::{GlitchError, GlitchResult};
pub use geometry::{
    FrameGeometry, MIN_RESOLUTION, ResolutionSignature, resolve_geometry, target_aspect,
};
pub use overlay::{draw_color_bars, draw_date_stamp};
pub use params::{EffectToggles, FormatMode, Preset, ResolvedFormat, TickParams};
pub use pipeline::{PipelineSession, Scheduler, TickInputs};
pub use sample::{blit_nearest, cover_sample, resample_nearest};
pub use source::{FrameSource, NOMINAL_SOURCE, TestPatternSource, effective_extent};
