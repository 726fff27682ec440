//! The ordered in-place effect chain applied to the processing buffer.
//!
//! Stage order is a deliberate design choice and must not change: block
//! displacement runs before the chromatic split so displaced blocks also
//! receive color fringing, and noise lands on top of the crushed palette.
//! Every stage reads and writes the same buffer; each stage's output is the
//! next stage's input.
//!
//! Randomness comes from the injected [`fastrand::Rng`] so tests can seed the
//! pipeline, but the individual stages make no reproducibility promise across
//! runs — fresh draws per block/pixel are part of the aesthetic.

use std::f32::consts::PI;

use fastrand::Rng;

use crate::foundation::core::PixelBuffer;
use crate::foundation::math::clamp_channel;
use crate::params::TickParams;

/// Run the enabled stages in their fixed order.
///
/// `bend` is the transient burst intensity in 0..=1; it widens the block
/// glitch and the chromatic shift while it decays.
pub fn apply_chain(buf: &mut PixelBuffer, params: &TickParams, bend: f32, rng: &mut Rng) {
    if params.toggles.blocks {
        block_glitch(buf, params.corruption, bend, rng);
    }
    if params.toggles.bitcrush {
        bit_crush(buf, params.grit);
    }
    chroma_split(buf, params.chroma, bend, rng);
    if params.toggles.noise {
        add_noise(buf, params.grit, rng);
    }
    if params.toggles.false_color {
        false_color(buf, params.palette);
    }
}

/// Copy randomly displaced rectangles over themselves, destroying spatial
/// structure. Intentionally lossy; blocks may overlap previously moved ones.
pub fn block_glitch(buf: &mut PixelBuffer, amt: f32, bend: f32, rng: &mut Rng) {
    let (w, h) = (buf.width(), buf.height());
    if w < 2 || h < 2 {
        return;
    }

    let blocks = (6.0 + amt * 40.0 + bend * 45.0).floor() as u32;
    for _ in 0..blocks {
        let bw = ((8.0 + rng.f32() * (amt * 54.0 + 18.0)).floor() as u32).min(w);
        let bh = ((4.0 + rng.f32() * (amt * 40.0 + 12.0)).floor() as u32).min(h);
        if bw == 0 || bh == 0 {
            continue;
        }

        let x0 = rng.u32(0..=w - bw);
        let y0 = rng.u32(0..=h - bh);

        let sx = clamp_offset(x0, (rng.f32() - 0.5) * (amt * 70.0 + 20.0), w - bw);
        let sy = clamp_offset(y0, (rng.f32() - 0.5) * (amt * 55.0 + 20.0), h - bh);

        // In-place copy; overlapping source/destination is fine and wanted.
        for y in 0..bh {
            for x in 0..bw {
                let di = buf.pixel_index(x0 + x, y0 + y);
                let si = buf.pixel_index(sx + x, sy + y);
                let data = buf.data_mut();
                data[di] = data[si];
                data[di + 1] = data[si + 1];
                data[di + 2] = data[si + 2];
            }
        }
    }
}

fn clamp_offset(base: u32, delta: f32, max: u32) -> u32 {
    ((f64::from(base) + f64::from(delta)).floor().max(0.0) as u32).min(max)
}

/// Quantize each color channel to `floor(3 + (1 - amt) * 18)` levels by
/// rounding to the nearest multiple of `255 / levels`.
pub fn bit_crush(buf: &mut PixelBuffer, amt: f32) {
    let levels = (3.0 + (1.0 - amt.clamp(0.0, 1.0)) * 18.0).floor();
    let step = 255.0 / levels;
    for px in buf.data_mut().chunks_exact_mut(4) {
        for c in &mut px[..3] {
            *c = clamp_channel((f32::from(*c) / step).round() * step);
        }
    }
}

/// Maximum per-pixel channel displacement for the chromatic split. Grows
/// monotonically with both intensities.
pub fn max_chroma_shift(amt: f32, bend: f32) -> i32 {
    (amt * 6.0 + bend * 4.0).floor() as i32
}

/// Shift the red, green and blue planes independently and blend them back
/// over the original. Offsets are drawn once per invocation per channel;
/// samples past the buffer edge replicate the edge pixel.
pub fn chroma_split(buf: &mut PixelBuffer, amt: f32, bend: f32, rng: &mut Rng) {
    if amt <= 0.001 {
        return;
    }
    let (w, h) = (buf.width() as i32, buf.height() as i32);
    if w == 0 || h == 0 {
        return;
    }

    let max_shift = max_chroma_shift(amt, bend);
    let draw = |rng: &mut Rng| -> i32 {
        let magnitude = rng.i32(0..=max_shift.max(0));
        if rng.bool() { magnitude } else { -magnitude }
    };
    let offsets = [
        (draw(rng), draw(rng)),
        (draw(rng), draw(rng)),
        (draw(rng), draw(rng)),
    ];

    let k = (amt * 0.85).clamp(0.0, 0.85);
    let src = buf.data().to_vec();
    let sample = |x: i32, y: i32, c: usize| -> f32 {
        let x = x.clamp(0, w - 1);
        let y = y.clamp(0, h - 1);
        f32::from(src[((y * w + x) as usize) * 4 + c])
    };

    let data = buf.data_mut();
    for y in 0..h {
        for x in 0..w {
            let i = ((y * w + x) as usize) * 4;
            for (c, &(dx, dy)) in offsets.iter().enumerate() {
                let shifted = sample(x + dx, y + dy, c);
                let original = f32::from(src[i + c]);
                data[i + c] = clamp_channel(original * (1.0 - k) + shifted * k);
            }
            data[i + 3] = 255;
        }
    }
}

/// Add uniform noise in `[-amt*26, amt*26]`, drawn fresh per channel per
/// pixel, clamped to the channel range.
pub fn add_noise(buf: &mut PixelBuffer, amt: f32, rng: &mut Rng) {
    let n = amt * 26.0;
    if n <= 0.0 {
        return;
    }
    for px in buf.data_mut().chunks_exact_mut(4) {
        for c in &mut px[..3] {
            let r = (rng.f32() * 2.0 - 1.0) * n;
            *c = clamp_channel(f32::from(*c) + r);
        }
    }
}

/// Remap toward a synthetic luminance-derived palette: inverted-luminance
/// red, luminance green, sinusoidal blue, blended by `amt`.
pub fn false_color(buf: &mut PixelBuffer, amt: f32) {
    let k = amt.clamp(0.0, 1.0);
    if k <= 0.0 {
        return;
    }
    for px in buf.data_mut().chunks_exact_mut(4) {
        let (r, g, b) = (f32::from(px[0]), f32::from(px[1]), f32::from(px[2]));
        let lum = (0.2126 * r + 0.7152 * g + 0.0722 * b) / 255.0;

        let tr = (255.0 * (1.0 - lum) * (0.6 + 0.4 * k) + 40.0 * k).clamp(0.0, 255.0);
        let tg = (255.0 * lum * (0.8 + 0.2 * k) + 30.0 * k).clamp(0.0, 255.0);
        let tb = (255.0 * (0.35 + 0.65 * (lum * PI).sin()) * (0.7 + 0.3 * k)).clamp(0.0, 255.0);

        px[0] = clamp_channel(r * (1.0 - k) + tr * k);
        px[1] = clamp_channel(g * (1.0 - k) + tg * k);
        px[2] = clamp_channel(b * (1.0 - k) + tb * k);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Extent;

    fn gradient_buffer(w: u32, h: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(Extent::new(w, h)).unwrap();
        for y in 0..h {
            for x in 0..w {
                let v = ((x + y * w) % 256) as u8;
                buf.set_pixel(x, y, [v, v.wrapping_add(85), v.wrapping_add(170), 255]);
            }
        }
        buf
    }

    fn distinct_values(buf: &PixelBuffer, channel: usize) -> usize {
        let mut seen = [false; 256];
        for px in buf.data().chunks_exact(4) {
            seen[px[channel] as usize] = true;
        }
        seen.iter().filter(|&&s| s).count()
    }

    #[test]
    fn bit_crush_quantization_level_counts() {
        // amt = 1 leaves 3 levels (4 reachable multiples of 85 incl. 255),
        // amt = 0 leaves 21 levels (22 reachable multiples).
        let mut hard = gradient_buffer(32, 32);
        bit_crush(&mut hard, 1.0);
        for c in 0..3 {
            assert!(distinct_values(&hard, c) <= 4);
        }

        let mut soft = gradient_buffer(32, 32);
        bit_crush(&mut soft, 0.0);
        for c in 0..3 {
            assert!(distinct_values(&soft, c) <= 22);
        }
    }

    #[test]
    fn bit_crush_snaps_to_step_multiples() {
        let mut buf = gradient_buffer(16, 16);
        bit_crush(&mut buf, 1.0);
        let step = 255.0 / 3.0;
        for px in buf.data().chunks_exact(4) {
            for &c in &px[..3] {
                let nearest = (f32::from(c) / step).round() * step;
                assert!((f32::from(c) - nearest).abs() < 1.0, "channel {c} off-grid");
            }
        }
    }

    #[test]
    fn chroma_split_below_threshold_is_identity() {
        let mut buf = gradient_buffer(12, 9);
        let before = buf.clone();
        let mut rng = Rng::with_seed(7);
        chroma_split(&mut buf, 0.0, 0.0, &mut rng);
        assert_eq!(buf, before);
        chroma_split(&mut buf, 0.001, 1.0, &mut rng);
        assert_eq!(buf, before);
    }

    #[test]
    fn chroma_shift_bound_is_monotone() {
        let mut last = -1;
        for i in 0..=10 {
            let amt = i as f32 / 10.0;
            let bound = max_chroma_shift(amt, 0.0);
            assert!(bound >= last);
            last = bound;
        }
        assert!(max_chroma_shift(1.0, 1.0) > max_chroma_shift(1.0, 0.0));
    }

    #[test]
    fn chroma_split_forces_opaque_alpha() {
        let mut buf = gradient_buffer(8, 8);
        for px in buf.data_mut().chunks_exact_mut(4) {
            px[3] = 17;
        }
        let mut rng = Rng::with_seed(3);
        chroma_split(&mut buf, 0.5, 0.0, &mut rng);
        assert!(buf.data().chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn noise_stays_within_amplitude_bound() {
        let mut buf = PixelBuffer::new(Extent::new(16, 16)).unwrap();
        buf.fill([128, 128, 128, 255]);
        let mut rng = Rng::with_seed(11);
        add_noise(&mut buf, 0.5, &mut rng);
        // amt * 26 = 13, plus rounding slack.
        for px in buf.data().chunks_exact(4) {
            for &c in &px[..3] {
                assert!((f32::from(c) - 128.0).abs() <= 14.0);
            }
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn noise_amt_0_is_identity() {
        let mut buf = gradient_buffer(8, 8);
        let before = buf.clone();
        let mut rng = Rng::with_seed(5);
        add_noise(&mut buf, 0.0, &mut rng);
        assert_eq!(buf, before);
    }

    #[test]
    fn false_color_amt_0_is_identity() {
        let mut buf = gradient_buffer(8, 8);
        let before = buf.clone();
        false_color(&mut buf, 0.0);
        assert_eq!(buf, before);
    }

    #[test]
    fn false_color_darkens_highlights_toward_palette() {
        let mut buf = PixelBuffer::new(Extent::new(2, 2)).unwrap();
        buf.fill([255, 255, 255, 255]);
        false_color(&mut buf, 1.0);
        let px = buf.pixel(0, 0);
        // Full luminance maps to low synthetic red.
        assert!(px[0] < 128);
        assert!(px[1] > 128);
    }

    #[test]
    fn block_glitch_only_permutes_existing_content() {
        let mut buf = PixelBuffer::new(Extent::new(40, 30)).unwrap();
        buf.fill([80, 90, 100, 255]);
        let mut rng = Rng::with_seed(99);
        block_glitch(&mut buf, 1.0, 1.0, &mut rng);
        // A constant image is a fixed point: copies move identical pixels.
        assert!(buf.data().chunks_exact(4).all(|px| px == [80, 90, 100, 255]));
    }

    #[test]
    fn block_glitch_handles_tiny_buffers() {
        let mut buf = PixelBuffer::new(Extent::new(1, 1)).unwrap();
        let mut rng = Rng::with_seed(1);
        block_glitch(&mut buf, 1.0, 1.0, &mut rng);

        let mut buf = PixelBuffer::new(Extent::new(3, 3)).unwrap();
        block_glitch(&mut buf, 1.0, 1.0, &mut rng);
    }
}
