//! The per-refresh driver: geometry tracking, stage sequencing, cross-tick
//! state.
//!
//! One [`PipelineSession`] owns every buffer plus the only two pieces of
//! cross-tick state, the feedback echo and the bend burst. Each tick is a
//! pure function of (previous buffers, source frame, parameter snapshot), so
//! multiple sessions can coexist without interference and tests can run the
//! pipeline headless with a seeded RNG.

use std::ops::ControlFlow;

use crate::display;
use crate::effects::feedback::FeedbackCompositor;
use crate::effects::fx;
use crate::foundation::core::{Extent, PixelBuffer};
use crate::foundation::error::GlitchResult;
use crate::geometry::{ResolutionSignature, resolve_geometry};
use crate::overlay;
use crate::params::TickParams;
use crate::sample::{cover_sample, resample_nearest};
use crate::source::{FrameSource, effective_extent};

/// Bend burst lifetime in ticks: 1.0 decays to 0 by a fixed 0.04 per tick.
const BEND_TICKS: u32 = 25;

/// Owns the processing, frame, feedback and screen buffers and sequences the
/// render stages for one tick.
#[derive(Clone, Debug)]
pub struct PipelineSession {
    signature: Option<ResolutionSignature>,
    geometry_generation: u64,
    low: PixelBuffer,
    frame: PixelBuffer,
    feedback: FeedbackCompositor,
    screen: PixelBuffer,
    bend_ticks: u32,
    rng: fastrand::Rng,
}

impl Default for PipelineSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineSession {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    /// Deterministic session for tests and reproducible offline renders.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(fastrand::Rng::with_seed(seed))
    }

    fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            signature: None,
            geometry_generation: 0,
            low: PixelBuffer::empty(),
            frame: PixelBuffer::empty(),
            feedback: FeedbackCompositor::new(),
            screen: PixelBuffer::empty(),
            bend_ticks: 0,
            rng,
        }
    }

    /// The true frame as of the most recently completed tick. This, not the
    /// screen buffer, is the snapshot artifact.
    pub fn frame(&self) -> &PixelBuffer {
        &self.frame
    }

    /// Viewport-sized presentation buffer, letterboxed. Ephemeral.
    pub fn screen(&self) -> &PixelBuffer {
        &self.screen
    }

    /// Counts buffer reallocations; unchanged across ticks with an unchanged
    /// resolution signature.
    pub fn geometry_generation(&self) -> u64 {
        self.geometry_generation
    }

    /// Current transient burst intensity in 0..=1.
    pub fn bend_burst(&self) -> f32 {
        self.bend_ticks as f32 / BEND_TICKS as f32
    }

    /// Momentary "bend" action: snap the burst to full strength.
    pub fn trigger_bend(&mut self) {
        self.bend_ticks = BEND_TICKS;
    }

    /// Flush all buffers and cross-tick state, forcing a full geometry
    /// recompute on the next tick. Called when the pipeline is restarted
    /// (e.g. on a camera source switch).
    pub fn reset(&mut self) {
        self.signature = None;
        self.low = PixelBuffer::empty();
        self.frame = PixelBuffer::empty();
        self.screen = PixelBuffer::empty();
        self.feedback = FeedbackCompositor::new();
        self.bend_ticks = 0;
    }

    /// Run one full tick: signature check, sample, effects, upscale,
    /// feedback, overlays, present, burst decay.
    ///
    /// Stage order is fixed; see the module docs of [`crate::effects::fx`].
    /// A failed tick leaves previously valid buffers in place; callers decide
    /// whether to keep looping (the [`Scheduler`] does).
    #[tracing::instrument(skip(self, source, params))]
    pub fn tick(
        &mut self,
        source: &dyn FrameSource,
        viewport: Extent,
        params: &TickParams,
    ) -> GlitchResult<()> {
        let signature = ResolutionSignature::capture(
            params.format,
            params.resolution,
            viewport,
            effective_extent(source),
        );
        if self.signature != Some(signature) {
            self.reallocate(&signature)?;
            self.signature = Some(signature);
        }

        let bend = self.bend_burst();

        cover_sample(source, &mut self.low)?;
        fx::apply_chain(&mut self.low, params, bend, &mut self.rng);
        resample_nearest(&self.low, &mut self.frame)?;

        if params.toggles.feedback {
            self.feedback
                .pass(&mut self.frame, params.corruption, bend, &mut self.rng)?;
        }
        if params.toggles.bars {
            overlay::draw_color_bars(&mut self.frame, params.corruption + bend * 0.6, &mut self.rng);
        }
        if params.toggles.date {
            let stamp = chrono::Local::now().format("%Y/%m/%d").to_string();
            overlay::draw_date_stamp(&mut self.frame, &stamp);
        }

        display::present(&self.frame, &mut self.screen)?;

        self.bend_ticks = self.bend_ticks.saturating_sub(1);
        Ok(())
    }

    fn reallocate(&mut self, signature: &ResolutionSignature) -> GlitchResult<()> {
        let geometry =
            resolve_geometry(signature.viewport, signature.format, signature.resolution);
        let mut changed = false;
        changed |= self.low.resize(geometry.low)?;
        changed |= self.frame.resize(geometry.frame)?;
        changed |= self.screen.resize(signature.viewport)?;
        if self.feedback.extent() != geometry.frame {
            self.feedback.resize(geometry.frame)?;
            changed = true;
        }
        if changed {
            self.geometry_generation += 1;
            tracing::debug!(
                frame = ?geometry.frame,
                low = ?geometry.low,
                aspect = geometry.aspect,
                "reallocated pipeline buffers"
            );
        }
        Ok(())
    }
}

/// Everything the pipeline re-reads from its collaborators at the start of a
/// tick: the current viewport and the parameter snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickInputs {
    pub viewport: Extent,
    pub params: TickParams,
}

/// Drives [`PipelineSession::tick`] once per display refresh until the
/// presenter asks to stop.
///
/// A failing tick is logged and skipped rather than terminating the loop;
/// the previous frame stays presentable. Re-entering [`Scheduler::run`]
/// after a stop (e.g. a camera source switch) flushes the session so the
/// restarted pipeline recomputes its geometry from scratch.
#[derive(Debug, Default)]
pub struct Scheduler {
    session: PipelineSession,
    ran: bool,
}

impl Scheduler {
    pub fn new(session: PipelineSession) -> Self {
        Self {
            session,
            ran: false,
        }
    }

    pub fn session(&self) -> &PipelineSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PipelineSession {
        &mut self.session
    }

    /// Loop: advance the source, capture inputs, tick, present.
    ///
    /// The presenter callback doubles as the refresh yield point; block in it
    /// to pace the loop. Returns the number of completed (non-failed) ticks.
    pub fn run<S, I, P>(
        &mut self,
        source: &mut S,
        mut inputs: I,
        mut present: P,
    ) -> GlitchResult<u64>
    where
        S: FrameSource,
        I: FnMut() -> TickInputs,
        P: FnMut(&PipelineSession) -> ControlFlow<()>,
    {
        if self.ran {
            self.session.reset();
        }
        self.ran = true;
        let mut completed = 0u64;
        loop {
            source.advance();
            let TickInputs { viewport, params } = inputs();
            match self.session.tick(source, viewport, &params) {
                Ok(()) => completed += 1,
                Err(err) => {
                    tracing::warn!(error = %err, "tick failed; continuing on next refresh");
                }
            }
            // The presenter is the refresh yield and the only stop signal, so
            // it must run even after a failed tick or a persistent error
            // would spin here forever.
            if present(&self.session).is_break() {
                return Ok(completed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{FormatMode, Preset};
    use crate::source::TestPatternSource;

    fn quiet_params() -> TickParams {
        let mut params = Preset::Digi.params();
        params.toggles.noise = false;
        params.toggles.date = false;
        params
    }

    #[test]
    fn bend_burst_decays_to_zero_in_exactly_25_ticks() {
        let mut session = PipelineSession::with_seed(4);
        let mut source = TestPatternSource::new(Extent::new(64, 48)).unwrap();
        let params = quiet_params();
        let viewport = Extent::new(400, 300);

        session.trigger_bend();
        assert_eq!(session.bend_burst(), 1.0);

        let mut previous = session.bend_burst();
        for tick in 1..=25u32 {
            source.advance();
            session.tick(&source, viewport, &params).unwrap();
            let now = session.bend_burst();
            assert!(now >= 0.0, "burst went negative at tick {tick}");
            assert!(now < previous || now == 0.0);
            previous = now;
        }
        assert_eq!(session.bend_burst(), 0.0);

        // One earlier it was still positive.
        let mut session = PipelineSession::with_seed(4);
        session.trigger_bend();
        for _ in 0..24 {
            source.advance();
            session.tick(&source, viewport, &params).unwrap();
        }
        assert!(session.bend_burst() > 0.0);
    }

    #[test]
    fn unchanged_signature_does_not_reallocate() {
        let mut session = PipelineSession::with_seed(9);
        let mut source = TestPatternSource::new(Extent::new(128, 72)).unwrap();
        let params = quiet_params();
        let viewport = Extent::new(800, 600);

        source.advance();
        session.tick(&source, viewport, &params).unwrap();
        let generation = session.geometry_generation();
        assert_eq!(generation, 1);

        for _ in 0..3 {
            source.advance();
            session.tick(&source, viewport, &params).unwrap();
        }
        assert_eq!(session.geometry_generation(), generation);
    }

    #[test]
    fn viewport_rotation_triggers_one_reallocation() {
        let mut session = PipelineSession::with_seed(9);
        let mut source = TestPatternSource::new(Extent::new(128, 72)).unwrap();
        let params = quiet_params();

        source.advance();
        session.tick(&source, Extent::new(800, 600), &params).unwrap();
        let generation = session.geometry_generation();

        source.advance();
        session.tick(&source, Extent::new(600, 800), &params).unwrap();
        assert_eq!(session.geometry_generation(), generation + 1);

        source.advance();
        session.tick(&source, Extent::new(600, 800), &params).unwrap();
        assert_eq!(session.geometry_generation(), generation + 1);
    }

    #[test]
    fn frame_matches_requested_square_resolution() {
        let mut session = PipelineSession::with_seed(2);
        let mut source = TestPatternSource::new(Extent::new(320, 240)).unwrap();
        let mut params = quiet_params();
        params.format = FormatMode::Square;
        params.resolution = 240;

        source.advance();
        session
            .tick(&source, Extent::new(500, 900), &params)
            .unwrap();
        assert_eq!(session.frame().extent(), Extent::new(240, 240));
        assert_eq!(session.screen().extent(), Extent::new(500, 900));
    }

    #[test]
    fn reset_forces_geometry_recompute() {
        let mut session = PipelineSession::with_seed(3);
        let mut source = TestPatternSource::new(Extent::new(64, 64)).unwrap();
        let params = quiet_params();
        let viewport = Extent::new(300, 300);

        source.advance();
        session.tick(&source, viewport, &params).unwrap();
        session.trigger_bend();
        session.reset();

        assert_eq!(session.bend_burst(), 0.0);
        assert!(session.frame().extent().is_empty());

        source.advance();
        session.tick(&source, viewport, &params).unwrap();
        assert!(!session.frame().extent().is_empty());
    }

    #[test]
    fn scheduler_runs_until_presenter_breaks() {
        let mut scheduler = Scheduler::new(PipelineSession::with_seed(5));
        let mut source = TestPatternSource::new(Extent::new(64, 48)).unwrap();
        let params = quiet_params();
        let viewport = Extent::new(200, 200);

        let mut presented = 0u32;
        let ticks = scheduler
            .run(
                &mut source,
                || TickInputs { viewport, params },
                |session| {
                    assert!(!session.screen().extent().is_empty());
                    presented += 1;
                    if presented >= 6 {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                },
            )
            .unwrap();
        assert_eq!(ticks, 6);
        assert_eq!(source.tick(), 6);

        // Restarting flushes the session and recomputes geometry.
        let generation = scheduler.session().geometry_generation();
        let ticks = scheduler
            .run(
                &mut source,
                || TickInputs { viewport, params },
                |_| ControlFlow::Break(()),
            )
            .unwrap();
        assert_eq!(ticks, 1);
        assert_eq!(scheduler.session().geometry_generation(), generation + 1);
    }

    #[test]
    fn presenter_can_stop_a_persistently_failing_loop() {
        // A frame buffer that would overflow the byte-length computation makes
        // every tick fail before the signature is committed. The presenter
        // must still get its yield so the loop remains stoppable.
        let mut scheduler = Scheduler::new(PipelineSession::with_seed(7));
        let mut source = TestPatternSource::new(Extent::new(64, 48)).unwrap();
        let mut params = quiet_params();
        params.format = FormatMode::Square;
        params.resolution = u32::MAX;
        let viewport = Extent::new(200, 200);

        let mut presented = 0u32;
        let ticks = scheduler
            .run(
                &mut source,
                || TickInputs { viewport, params },
                |_| {
                    presented += 1;
                    if presented >= 4 {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                },
            )
            .unwrap();
        assert_eq!(ticks, 0);
        assert_eq!(presented, 4);
        assert_eq!(scheduler.session().geometry_generation(), 0);
    }

    #[test]
    fn unreported_source_still_renders_black_frames() {
        let mut session = PipelineSession::with_seed(8);
        let source = TestPatternSource::unreported();
        let params = quiet_params();

        session
            .tick(&source, Extent::new(400, 400), &params)
            .unwrap();
        let frame = session.frame();
        assert!(!frame.extent().is_empty());
        assert!(frame.data().chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
    }
}
