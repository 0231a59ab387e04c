use confab_core::SpeedPreset;

/// Character count above which content is treated as large and its preset
/// is promoted so long responses never crawl.
pub const LARGE_CONTENT_THRESHOLD: usize = 500;

/// Effective pacing for one reveal job after preset, promotion, and
/// multiplier are applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealTuning {
    pub chars_per_chunk: u32,
    pub delay_ms: u64,
}

impl RevealTuning {
    /// Word tokens appended per tick in plain-text mode.
    pub fn words_per_chunk(&self) -> usize {
        ((self.chars_per_chunk as f64 / 5.0).round() as usize).max(1)
    }

    /// Reveal units made visible per tick in rich-text mode.
    pub fn rich_units_per_tick(&self) -> usize {
        (self.chars_per_chunk as usize) * 3
    }
}

fn base(preset: SpeedPreset) -> RevealTuning {
    let (chars_per_chunk, delay_ms) = match preset {
        SpeedPreset::VerySlow => (1, 200),
        SpeedPreset::Slow => (1, 100),
        SpeedPreset::Normal => (1, 30),
        SpeedPreset::Fast => (3, 30),
        SpeedPreset::VeryFast => (5, 20),
        SpeedPreset::UltraFast => (10, 10),
    };
    RevealTuning {
        chars_per_chunk,
        delay_ms,
    }
}

/// Whether content length crosses the large-content threshold.
pub fn is_large(text: &str) -> bool {
    text.chars().count() > LARGE_CONTENT_THRESHOLD
}

/// Promote a preset for large content.
///
/// Slower-than-normal presets move to normal, normal moves to fast, and
/// anything already fast or faster is left alone. Promotion never slows a
/// caller down.
pub fn promote_for_large(preset: SpeedPreset) -> SpeedPreset {
    match preset {
        SpeedPreset::VerySlow | SpeedPreset::Slow => SpeedPreset::Normal,
        SpeedPreset::Normal => SpeedPreset::Fast,
        faster => faster,
    }
}

/// Resolve the effective tuning for a job.
///
/// The multiplier scales characters per chunk up and delay down
/// proportionally, each clamped to a minimum of 1. Non-positive or
/// non-finite multipliers fall back to 1.0.
pub fn tuning(preset: SpeedPreset, multiplier: f64, large: bool) -> RevealTuning {
    let effective = if large {
        promote_for_large(preset)
    } else {
        preset
    };
    let base = base(effective);
    let multiplier = if multiplier.is_finite() && multiplier > 0.0 {
        multiplier
    } else {
        1.0
    };
    RevealTuning {
        chars_per_chunk: ((base.chars_per_chunk as f64 * multiplier).round() as u32).max(1),
        delay_ms: ((base.delay_ms as f64 / multiplier).round() as u64).max(1),
    }
}
