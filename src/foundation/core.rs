use crate::foundation::error::{GlitchError, GlitchResult};

/// Pixel dimensions of a buffer, viewport or source frame.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const ZERO: Extent = Extent {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The smaller of width/height, the normalized resolution control.
    pub fn short_side(self) -> u32 {
        self.width.min(self.height)
    }

    /// Width over height. Callers must guard against empty extents.
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    fn byte_len(self) -> GlitchResult<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| GlitchError::geometry("pixel buffer size overflow"))
    }
}

/// Straight-alpha RGBA8 pixel grid, row-major.
///
/// Resizes are lossy: whenever the extent changes, contents are discarded and
/// the buffer is zero-filled. Resizing to the current extent is a no-op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    extent: Extent,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(extent: Extent) -> GlitchResult<Self> {
        let len = extent.byte_len()?;
        Ok(Self {
            extent,
            data: vec![0; len],
        })
    }

    pub fn empty() -> Self {
        Self {
            extent: Extent::ZERO,
            data: Vec::new(),
        }
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn width(&self) -> u32 {
        self.extent.width
    }

    pub fn height(&self) -> u32 {
        self.extent.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Resize to `extent`, discarding contents if the extent differs.
    ///
    /// Returns `true` when a reallocation happened, `false` for the
    /// idempotent unchanged case.
    pub fn resize(&mut self, extent: Extent) -> GlitchResult<bool> {
        if extent == self.extent {
            return Ok(false);
        }
        let len = extent.byte_len()?;
        self.data.clear();
        self.data.resize(len, 0);
        self.extent = extent;
        Ok(true)
    }

    pub fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Byte index of pixel (x, y). Callers must stay in bounds.
    pub fn pixel_index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.extent.width as usize) + (x as usize)) * 4
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.pixel_index(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.pixel_index(x, y);
        self.data[i..i + 4].copy_from_slice(&rgba);
    }
}
