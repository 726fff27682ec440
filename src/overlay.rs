//! Non-photographic overlays drawn onto the frame buffer after the feedback
//! pass: synthetic color bars and the date stamp.
//!
//! Text uses a built-in 5x7 pixel font scaled by whole factors, so glyph
//! edges stay hard at any frame size. No anti-aliasing anywhere, matching
//! the low-fidelity look of the rest of the pipeline.

use fastrand::Rng;

use crate::foundation::core::PixelBuffer;
use crate::foundation::math::{lerp_u8, opacity_q8};

/// Opaque-ish decorative rectangles, like stray data bars on a broken tape.
///
/// `amt` controls count (`2 + floor(amt*6)`) and width (`10 + floor(amt*22)`
/// px); height spans 35–100% of the frame at a random vertical position.
/// Purely decorative and intentionally not reproducible.
pub fn draw_color_bars(frame: &mut PixelBuffer, amt: f32, rng: &mut Rng) {
    let (w, h) = (frame.width(), frame.height());
    if w == 0 || h == 0 {
        return;
    }

    let bars = (2.0 + amt * 6.0).floor() as u32;
    let bar_w = (10.0 + amt * 22.0).floor() as u32;
    let op = opacity_q8(0.55);

    for _ in 0..bars {
        let x = rng.u32(0..w);
        let bar_h = (((h as f32) * (0.35 + rng.f32() * 0.65)).floor() as u32).clamp(1, h);
        let y = rng.u32(0..=h - bar_h);
        let color = [rng.u8(..), rng.u8(..), rng.u8(..)];
        fill_rect_blend(frame, x, y, bar_w, bar_h, color, op);
    }
}

/// Blend a solid rectangle over the frame, clipped to the frame bounds.
fn fill_rect_blend(
    frame: &mut PixelBuffer,
    x0: u32,
    y0: u32,
    rect_w: u32,
    rect_h: u32,
    rgb: [u8; 3],
    op: u16,
) {
    let (w, h) = (frame.width(), frame.height());
    let x1 = (x0 + rect_w).min(w);
    let y1 = (y0 + rect_h).min(h);
    for y in y0..y1 {
        for x in x0..x1 {
            let i = frame.pixel_index(x, y);
            let data = frame.data_mut();
            for c in 0..3 {
                data[i + c] = lerp_u8(data[i + c], rgb[c], op);
            }
            data[i + 3] = 255;
        }
    }
}

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;

/// 5x7 bitmaps for '0'..'9' and '/'; bit 4 is the leftmost column.
fn glyph_rows(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '/' => [0b00001, 0b00010, 0b00010, 0b00100, 0b01000, 0b01000, 0b10000],
        _ => return None,
    };
    Some(rows)
}

const STAMP_COLOR: [u8; 3] = [255, 220, 80];
const SHADOW_COLOR: [u8; 3] = [0, 0, 0];

/// Draw `text` (digits and '/' only, anything else is skipped) at the fixed
/// bottom-left stamp position: 3% padding, glyph height 5% of frame width,
/// amber over a hard offset shadow.
pub fn draw_date_stamp(frame: &mut PixelBuffer, text: &str) {
    let (w, h) = (frame.width(), frame.height());
    if w == 0 || h == 0 {
        return;
    }

    let pad = (f64::from(w) * 0.03).floor() as u32;
    let target_px = (f64::from(w) * 0.05).floor() as u32;
    let scale = (target_px / GLYPH_H).max(1);

    let glyph_h = GLYPH_H * scale;
    let y0 = (h - pad.min(h)).saturating_sub(glyph_h);
    let mut x = pad;

    let shadow_op = opacity_q8(0.65);
    let text_op = opacity_q8(0.95);

    for ch in text.chars() {
        let Some(rows) = glyph_rows(ch) else {
            x += (GLYPH_W + 1) * scale;
            continue;
        };
        draw_glyph(frame, &rows, x + scale, y0 + scale, scale, SHADOW_COLOR, shadow_op);
        draw_glyph(frame, &rows, x, y0, scale, STAMP_COLOR, text_op);
        x += (GLYPH_W + 1) * scale;
    }
}

fn draw_glyph(
    frame: &mut PixelBuffer,
    rows: &[u8; 7],
    x0: u32,
    y0: u32,
    scale: u32,
    rgb: [u8; 3],
    op: u16,
) {
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_W {
            if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                continue;
            }
            fill_rect_blend(
                frame,
                x0 + col * scale,
                y0 + row as u32 * scale,
                scale,
                scale,
                rgb,
                op,
            );
        }
    }
}
