pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Round and clamp a float channel value into u8 range.
pub(crate) fn clamp_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Separable "screen" blend of one channel: `255 - (255-d)(255-s)/255`.
pub(crate) fn screen_u8(d: u8, s: u8) -> u8 {
    255 - mul_div255_u8(255 - u16::from(d), 255 - u16::from(s))
}

/// Linear interpolation of one channel toward `s` by opacity `op` (0..=255).
pub(crate) fn lerp_u8(d: u8, s: u8, op: u16) -> u8 {
    let inv = 255 - op;
    mul_div255_u8(u16::from(d), inv).saturating_add(mul_div255_u8(u16::from(s), op))
}

/// Quantize a 0..1 opacity into the 0..=255 fixed-point domain.
pub(crate) fn opacity_q8(op: f32) -> u16 {
    ((op.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16
}
