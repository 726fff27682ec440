//! Temporal feedback: a decaying echo buffer blended back over the frame.

use fastrand::Rng;

use crate::foundation::core::{Extent, PixelBuffer};
use crate::foundation::error::{GlitchError, GlitchResult};
use crate::foundation::math::{lerp_u8, mul_div255_u8, opacity_q8, screen_u8};

/// Owns the cross-tick echo buffer.
///
/// The buffer always matches the frame buffer extent; contents are discarded
/// on resize. Ordering inside [`FeedbackCompositor::pass`] matters: the frame
/// is captured into the echo buffer *before* the echo is composited back,
/// otherwise trails would never decay.
#[derive(Clone, Debug)]
pub struct FeedbackCompositor {
    buffer: PixelBuffer,
}

impl Default for FeedbackCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackCompositor {
    pub fn new() -> Self {
        Self {
            buffer: PixelBuffer::empty(),
        }
    }

    /// Match the frame buffer extent, discarding echo content on change.
    pub fn resize(&mut self, extent: Extent) -> GlitchResult<()> {
        self.buffer.resize(extent)?;
        Ok(())
    }

    /// Drop all echo content without changing geometry.
    pub fn clear(&mut self) {
        self.buffer.fill([0, 0, 0, 0]);
    }

    pub fn extent(&self) -> Extent {
        self.buffer.extent()
    }

    /// One feedback tick over `frame` with intensity `amt` (0..=1).
    ///
    /// (a) Capture: blend the frame into the echo buffer at opacity
    /// `0.92 - amt*0.22`, so older content fades faster as `amt` rises.
    /// (b) Echo: screen-blend the buffer back onto the frame at opacity
    /// `0.18 + amt*0.36`, displaced by a small random jitter scaled by `amt`
    /// and `bend`.
    pub fn pass(
        &mut self,
        frame: &mut PixelBuffer,
        amt: f32,
        bend: f32,
        rng: &mut Rng,
    ) -> GlitchResult<()> {
        if self.buffer.extent() != frame.extent() {
            return Err(GlitchError::render(
                "feedback buffer extent does not match frame buffer",
            ));
        }
        if frame.extent().is_empty() {
            return Ok(());
        }

        let capture_op = opacity_q8(0.92 - amt * 0.22);
        for (d, s) in self
            .buffer
            .data_mut()
            .chunks_exact_mut(4)
            .zip(frame.data().chunks_exact(4))
        {
            for c in 0..3 {
                d[c] = lerp_u8(d[c], s[c], capture_op);
            }
            d[3] = 255;
        }

        let echo_op = opacity_q8(0.18 + amt * 0.36);
        let dx = ((rng.f32() - 0.5) * (amt * 9.0 + bend * 12.0)).round() as i32;
        let dy = ((rng.f32() - 0.5) * (amt * 7.0 + bend * 9.0)).round() as i32;

        let (w, h) = (frame.width() as i32, frame.height() as i32);
        for y in 0..h {
            let sy = y - dy;
            if sy < 0 || sy >= h {
                continue;
            }
            for x in 0..w {
                let sx = x - dx;
                if sx < 0 || sx >= w {
                    continue;
                }
                let echo = self.buffer.pixel(sx as u32, sy as u32);
                let i = frame.pixel_index(x as u32, y as u32);
                let data = frame.data_mut();
                for c in 0..3 {
                    let scaled = mul_div255_u8(u16::from(echo[c]), echo_op);
                    data[i + c] = screen_u8(data[i + c], scaled);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_rejects_mismatched_extents() {
        let mut fb = FeedbackCompositor::new();
        fb.resize(Extent::new(4, 4)).unwrap();
        let mut frame = PixelBuffer::new(Extent::new(5, 4)).unwrap();
        let mut rng = Rng::with_seed(1);
        assert!(fb.pass(&mut frame, 0.5, 0.0, &mut rng).is_err());
    }

    #[test]
    fn static_input_converges_without_saturating() {
        let mut fb = FeedbackCompositor::new();
        fb.resize(Extent::new(8, 8)).unwrap();
        let mut rng = Rng::with_seed(42);

        let mut last = 0u8;
        for _ in 0..50 {
            // A fresh mid-gray frame every tick, like a static camera scene.
            let mut frame = PixelBuffer::new(Extent::new(8, 8)).unwrap();
            frame.fill([128, 128, 128, 255]);
            fb.pass(&mut frame, 0.5, 0.0, &mut rng).unwrap();
            last = frame
                .data()
                .chunks_exact(4)
                .map(|px| px[0])
                .max()
                .unwrap();
            assert!(last < 255, "feedback ran away to saturation");
        }
        // Screen blend of a <=0.36-opacity echo over mid gray stays well
        // below full white.
        assert!(last < 210);
    }

    #[test]
    fn capture_happens_before_composite() {
        // First pass over a black echo buffer must not brighten the frame:
        // the captured copy is the frame itself, and screening a frame with a
        // scaled copy of itself only ever raises values derived from it.
        let mut fb = FeedbackCompositor::new();
        fb.resize(Extent::new(4, 4)).unwrap();
        let mut frame = PixelBuffer::new(Extent::new(4, 4)).unwrap();
        frame.fill([0, 0, 0, 255]);
        let mut rng = Rng::with_seed(2);
        fb.pass(&mut frame, 1.0, 0.0, &mut rng).unwrap();
        assert!(frame.data().chunks_exact(4).all(|px| px[0] == 0));
    }

    #[test]
    fn resize_discards_echo_content() {
        let mut fb = FeedbackCompositor::new();
        fb.resize(Extent::new(4, 4)).unwrap();
        let mut frame = PixelBuffer::new(Extent::new(4, 4)).unwrap();
        frame.fill([200, 200, 200, 255]);
        let mut rng = Rng::with_seed(3);
        fb.pass(&mut frame, 0.2, 0.0, &mut rng).unwrap();

        fb.resize(Extent::new(6, 6)).unwrap();
        assert_eq!(fb.extent(), Extent::new(6, 6));
        fb.resize(Extent::new(4, 4)).unwrap();
        // Contents were zeroed by the round trip.
        let mut frame = PixelBuffer::new(Extent::new(4, 4)).unwrap();
        frame.fill([0, 0, 0, 255]);
        fb.pass(&mut frame, 1.0, 0.0, &mut rng).unwrap();
        assert!(frame.data().chunks_exact(4).all(|px| px[0] == 0));
    }
}
