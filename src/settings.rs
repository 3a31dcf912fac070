//! Game settings and preferences
//!
//! Persisted separately from game saves under their own storage key.

use serde::{Deserialize, Serialize};

use crate::input::KeyBindings;
use crate::persistence::{Storage, StorageError, keys, read_json, write_json};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    /// Maximum particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 128,
            QualityPreset::Medium => 512,
            QualityPreset::High => 1024,
        }
    }
}

/// How host frames map to simulation steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimestepMode {
    /// Fixed 60 Hz steps from an accumulator, capped per frame
    #[default]
    Fixed,
    /// Exactly one step per host frame (speed follows refresh rate)
    PerFrame,
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Particle effects (explosions, debris)
    pub particles: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Controls ===
    pub key_bindings: KeyBindings,

    // === Simulation ===
    pub timestep: TimestepMode,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            key_bindings: KeyBindings::default(),

            timestep: TimestepMode::Fixed,

            show_fps: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Load settings; missing, malformed or unreadable data gives defaults
    pub fn load(storage: &dyn Storage) -> Self {
        match read_json(storage, keys::SETTINGS) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(err) => {
                log::warn!("Failed to read settings: {}", err);
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        write_json(storage, keys::SETTINGS, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}
