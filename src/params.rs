//! Per-tick parameter snapshot supplied by the surrounding UI.
//!
//! The pipeline never reads controls directly. The caller captures a
//! [`TickParams`] value once per tick and passes it by value; every stage of
//! that tick sees the same snapshot, so no torn reads are possible.

use crate::foundation::core::Extent;
use crate::foundation::error::{GlitchError, GlitchResult};

/// Requested output format for the true frame.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FormatMode {
    /// Follow the current viewport orientation.
    #[default]
    Auto,
    Portrait,
    Landscape,
    Square,
}

/// A [`FormatMode`] with `Auto` resolved against a concrete viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedFormat {
    Portrait,
    Landscape,
    Square,
}

impl FormatMode {
    /// Resolve `Auto` from viewport orientation (`width > height` is landscape).
    pub fn resolve(self, viewport: Extent) -> ResolvedFormat {
        match self {
            FormatMode::Auto => {
                if viewport.width > viewport.height {
                    ResolvedFormat::Landscape
                } else {
                    ResolvedFormat::Portrait
                }
            }
            FormatMode::Portrait => ResolvedFormat::Portrait,
            FormatMode::Landscape => ResolvedFormat::Landscape,
            FormatMode::Square => ResolvedFormat::Square,
        }
    }
}

/// Independent on/off switches for the seven optional render features.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EffectToggles {
    pub blocks: bool,
    pub bitcrush: bool,
    pub feedback: bool,
    pub noise: bool,
    pub false_color: bool,
    pub bars: bool,
    pub date: bool,
}

impl Default for EffectToggles {
    fn default() -> Self {
        Preset::Mall.params().toggles
    }
}

/// Immutable per-tick configuration snapshot.
///
/// Intensities are normalized to `0..=1` (the UI's 0–100 sliders divided by
/// 100). `resolution` is the requested short side of the frame buffer in
/// pixels; degenerate values are clamped by the geometry resolver rather than
/// rejected at tick time.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TickParams {
    pub format: FormatMode,
    /// Requested frame buffer short side, practical range 120..=1000.
    pub resolution: u32,
    pub grit: f32,
    pub corruption: f32,
    pub chroma: f32,
    pub palette: f32,
    #[serde(default)]
    pub toggles: EffectToggles,
}

impl Default for TickParams {
    fn default() -> Self {
        Preset::Mall.params()
    }
}

impl TickParams {
    /// Validate a snapshot coming from an untrusted source (CLI/JSON).
    ///
    /// The pipeline itself clamps rather than fails; this is the up-front
    /// check for configuration files, mirroring slider semantics.
    pub fn validate(&self) -> GlitchResult<()> {
        for (name, v) in [
            ("grit", self.grit),
            ("corruption", self.corruption),
            ("chroma", self.chroma),
            ("palette", self.palette),
        ] {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(GlitchError::validation(format!(
                    "intensity '{name}' must be within 0..=1, got {v}"
                )));
            }
        }
        if self.resolution == 0 {
            return Err(GlitchError::validation("resolution must be > 0"));
        }
        Ok(())
    }
}

/// Named parameter bundles matching the product's stock looks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Mall,
    Buffer,
    Neon,
    Digi,
}

impl Preset {
    pub fn all() -> [Preset; 4] {
        [Preset::Mall, Preset::Buffer, Preset::Neon, Preset::Digi]
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Mall => "mall",
            Preset::Buffer => "buffer",
            Preset::Neon => "neon",
            Preset::Digi => "digi",
        }
    }

    pub fn params(self) -> TickParams {
        match self {
            Preset::Mall => TickParams {
                format: FormatMode::Auto,
                resolution: 380,
                grit: 0.70,
                corruption: 0.48,
                chroma: 0.22,
                palette: 0.18,
                toggles: EffectToggles {
                    blocks: true,
                    bitcrush: true,
                    feedback: true,
                    noise: true,
                    false_color: false,
                    bars: false,
                    date: true,
                },
            },
            Preset::Buffer => TickParams {
                format: FormatMode::Auto,
                resolution: 320,
                grit: 0.82,
                corruption: 0.70,
                chroma: 0.35,
                palette: 0.62,
                toggles: EffectToggles {
                    blocks: true,
                    bitcrush: true,
                    feedback: true,
                    noise: true,
                    false_color: true,
                    bars: true,
                    date: true,
                },
            },
            Preset::Neon => TickParams {
                format: FormatMode::Auto,
                resolution: 300,
                grit: 0.86,
                corruption: 0.62,
                chroma: 0.40,
                palette: 0.85,
                toggles: EffectToggles {
                    blocks: true,
                    bitcrush: true,
                    feedback: true,
                    noise: true,
                    false_color: true,
                    bars: false,
                    date: true,
                },
            },
            Preset::Digi => TickParams {
                format: FormatMode::Auto,
                resolution: 560,
                grit: 0.26,
                corruption: 0.14,
                chroma: 0.12,
                palette: 0.18,
                toggles: EffectToggles {
                    blocks: false,
                    bitcrush: false,
                    feedback: false,
                    noise: true,
                    false_color: false,
                    bars: false,
                    date: true,
                },
            },
        }
    }
}
