//! Player settings and run difficulty
//!
//! Persisted separately from progress in LocalStorage. A running simulation
//! only ever reads these.

use serde::{Deserialize, Serialize};

/// Graphics quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    Low,
    Medium,
    #[default]
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "low",
            QualityPreset::Medium => "medium",
            QualityPreset::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Scales the particle count of every burst
    pub fn burst_multiplier(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.55,
            QualityPreset::Medium => 1.0,
            QualityPreset::High => 1.5,
        }
    }

    /// Maximum live particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 160,
            QualityPreset::Medium => 400,
            QualityPreset::High => 900,
        }
    }
}

/// Run difficulty. Only ever used as a lookup key into per-game tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Parse, falling back to the first difficulty on unknown input
    pub fn parse_or_default(s: &str) -> Self {
        Self::from_str(s).unwrap_or_else(|| {
            log::warn!("Unknown difficulty {:?}, using {}", s, Difficulty::default().as_str());
            Difficulty::default()
        })
    }
}

/// Player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Sound effects on
    pub sound: bool,
    /// Procedural background music on
    pub music: bool,
    /// Reduced motion (no screen shake)
    pub reduced_motion: bool,
    /// Graphics quality preset
    #[serde(rename = "graphicsQuality")]
    pub quality: QualityPreset,
    /// Show FPS counter
    pub show_fps: bool,
    /// CRT scanline overlay
    pub scanlines: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound: true,
            music: true,
            reduced_motion: false,
            quality: QualityPreset::High,
            show_fps: false,
            scanlines: true,
        }
    }
}

impl Settings {
    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "arcade_hub_settings";

    /// Screen shake is suppressed under reduced motion
    pub fn screen_shake(&self) -> bool {
        !self.reduced_motion
    }

    /// Parse a stored record, merging whatever is present over defaults
    pub fn from_json(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|e| {
            log::warn!("Discarding unreadable settings: {}", e);
            Self::default()
        })
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                log::info!("Loaded settings from LocalStorage");
                return Self::from_json(&json);
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> crate::Result<()> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| crate::ArcadeError::Storage("localStorage unavailable".into()))?;

        let json = serde_json::to_string(self)?;
        storage
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|_| crate::ArcadeError::Storage("settings write refused".into()))?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) -> crate::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(s.sound && s.music && s.scanlines);
        assert!(!s.reduced_motion && !s.show_fps);
        assert_eq!(s.quality, QualityPreset::High);
    }

    #[test]
    fn test_partial_record_merges_over_defaults() {
        let s = Settings::from_json(r#"{"music":false,"graphicsQuality":"low"}"#);
        assert!(!s.music);
        assert!(s.sound);
        assert_eq!(s.quality, QualityPreset::Low);
    }

    #[test]
    fn test_corrupt_record_falls_back() {
        assert_eq!(Settings::from_json("{not json"), Settings::default());
    }

    #[test]
    fn test_difficulty_fallback() {
        assert_eq!(Difficulty::parse_or_default("HARD"), Difficulty::Hard);
        assert_eq!(Difficulty::parse_or_default("nightmare"), Difficulty::Easy);
    }

    #[test]
    fn test_quality_multipliers() {
        assert_eq!(QualityPreset::Low.burst_multiplier(), 0.55);
        assert_eq!(QualityPreset::Medium.burst_multiplier(), 1.0);
        assert_eq!(QualityPreset::High.burst_multiplier(), 1.5);
        assert_eq!(QualityPreset::from_str("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
    }
}
