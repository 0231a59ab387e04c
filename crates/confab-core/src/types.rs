use serde::{Deserialize, Serialize};

/// Author of a rendered chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Typed by the embedding host's user.
    User,
    /// Produced by the remote conversational backend (or a local simulation).
    Assistant,
    /// Engine-generated notice (connectivity, local failures).
    System,
}

/// Named reveal-speed preset.
///
/// Presets are ordered slowest to fastest so that large-content promotion can
/// compare tiers. Each maps to a `{chars_per_chunk, delay_ms}` pair spanning
/// roughly 5 to 1000 effective characters per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpeedPreset {
    VerySlow,
    Slow,
    #[default]
    Normal,
    Fast,
    VeryFast,
    UltraFast,
}

impl SpeedPreset {
    /// The wire/config name of the preset.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedPreset::VerySlow => "verySlow",
            SpeedPreset::Slow => "slow",
            SpeedPreset::Normal => "normal",
            SpeedPreset::Fast => "fast",
            SpeedPreset::VeryFast => "veryFast",
            SpeedPreset::UltraFast => "ultraFast",
        }
    }
}
