//! Driver configuration.
//!
//! Everything has a default, so an empty file (or no file at all) gives the
//! stock driver: 4ms ticks, 10 pixel squares, no catch-up cap.
//!
//! ```toml
//! # chip8-driver.toml
//! period_ms = 4.0
//! scale = 10
//! max_ticks_per_frame = 250
//! keymap = "conventional"
//! hud_change_detection = true
//! ```

use crate::error::DriverError;
use crate::input::Keymap;
use crate::memory::VIDEO_WIDTH;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// logical tick duration
    pub period_ms: f64,

    /// side of the square painted per lit pixel
    pub scale: u16,

    /// cap on ticks issued in one frame; unbounded if unset
    pub max_ticks_per_frame: Option<u64>,

    pub keymap: Keymap,

    /// only rewrite the HUD when the PC or a register changed
    pub hud_change_detection: bool,

    /// how often the terminal host presents a frame
    pub frame_rate: f64,

    /// how long a terminal key press counts as held
    pub key_hold_ms: u64,

    /// stop after this many frames
    pub frame_limit: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            period_ms: 4.0,
            scale: 10,
            max_ticks_per_frame: None,
            keymap: Keymap::Passthrough,
            hud_change_detection: false,
            frame_rate: 60.0,
            key_hold_ms: 100,
            frame_limit: None,
        }
    }
}

impl DriverConfig {
    pub fn from_toml(text: &str) -> Result<Self, DriverError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, DriverError> {
        let text = fs::read_to_string(path)?;
        DriverConfig::from_toml(&text)
    }

    /// reject values the driver can't run with
    pub fn validate(&self) -> Result<(), DriverError> {
        if !(self.period_ms > 0.0) {
            return Err(DriverError::InvalidConfig(format!(
                "period_ms must be positive, got {}",
                self.period_ms
            )));
        }
        if self.scale == 0 {
            return Err(DriverError::InvalidConfig("scale must be at least 1".to_string()));
        }
        if self.scale as usize * VIDEO_WIDTH > u16::MAX as usize {
            return Err(DriverError::InvalidConfig(format!("scale {} is too big", self.scale)));
        }
        if !(self.frame_rate > 0.0) {
            return Err(DriverError::InvalidConfig(format!(
                "frame_rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if self.max_ticks_per_frame == Some(0) {
            return Err(DriverError::InvalidConfig(
                "max_ticks_per_frame of 0 would never tick".to_string(),
            ));
        }
        if self.frame_limit == Some(0) {
            return Err(DriverError::InvalidConfig(
                "frame_limit of 0 would still present a frame".to_string(),
            ));
        }
        Ok(())
    }
}
