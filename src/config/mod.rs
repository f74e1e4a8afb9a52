//! Page configuration.
//!
//! Every field has a default matching the production page, so a config file
//! only needs to name what it overrides:
//!
//! ```json
//! { "typewriter": { "phrases": ["FAST", "FRIENDLY"] }, "loader": { "media_timeout_ms": 3000 } }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("typewriter phrase list is empty")]
    EmptyPhrases,
    #[error("typewriter phrase {0} is empty")]
    EmptyPhrase(usize),
    #[error("{name} must be a non-empty range, got [{min}, {max})")]
    InvalidRange { name: &'static str, min: f64, max: f64 },
    #[error("progress ceiling must lie in (0, 100), got {0}")]
    InvalidCeiling(f64),
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

/// Half-open `[min, max)` range of per-tick progress increments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRange {
    pub min: f64,
    pub max: f64,
}

impl StepRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn validate(&self, name: &'static str) -> ConfigResult<()> {
        if !(self.min >= 0.0 && self.max > self.min && self.max.is_finite()) {
            return Err(ConfigError::InvalidRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderTimings {
    pub tick_interval_ms: u64,
    pub media_timeout_ms: u64,
    pub settle_delay_ms: u64,
    pub reveal_scroll_delay_ms: u64,
    pub skip_scroll_delay_ms: u64,
}

impl Default for LoaderTimings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            media_timeout_ms: 5000,
            settle_delay_ms: 500,
            reveal_scroll_delay_ms: 500,
            skip_scroll_delay_ms: 100,
        }
    }
}

impl LoaderTimings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn media_timeout(&self) -> Duration {
        Duration::from_millis(self.media_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn reveal_scroll_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_scroll_delay_ms)
    }

    pub fn skip_scroll_delay(&self) -> Duration {
        Duration::from_millis(self.skip_scroll_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressPolicy {
    /// Increment range while media is still loading.
    pub slow_step: StepRange,
    /// Increment range once media is ready.
    pub fast_step: StepRange,
    /// Progress stalls here until media is ready.
    pub stall_ceiling: f64,
}

impl Default for ProgressPolicy {
    fn default() -> Self {
        Self {
            slow_step: StepRange::new(0.0, 2.0),
            fast_step: StepRange::new(5.0, 15.0),
            stall_ceiling: 85.0,
        }
    }
}

impl ProgressPolicy {
    pub fn validate(&self) -> ConfigResult<()> {
        self.slow_step.validate("progress.slow_step")?;
        self.fast_step.validate("progress.fast_step")?;
        if !(self.stall_ceiling > 0.0 && self.stall_ceiling < 100.0) {
            return Err(ConfigError::InvalidCeiling(self.stall_ceiling));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypewriterConfig {
    pub phrases: Vec<String>,
    pub type_delay_ms: u64,
    pub delete_delay_ms: u64,
    pub hold_delay_ms: u64,
    pub next_phrase_delay_ms: u64,
    pub cursor_blink_ms: u64,
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            phrases: vec![
                "PREMIUM OIL CHANGE SERVICE".to_string(),
                "EXPERT CAR DETAILING".to_string(),
                "RELIABLE BATTERY SERVICE".to_string(),
                "GENUINE AUTO ACCESSORIES".to_string(),
            ],
            type_delay_ms: 100,
            delete_delay_ms: 50,
            hold_delay_ms: 2000,
            next_phrase_delay_ms: 500,
            cursor_blink_ms: 700,
        }
    }
}

impl TypewriterConfig {
    pub fn with_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phrases: phrases.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.phrases.is_empty() {
            return Err(ConfigError::EmptyPhrases);
        }
        if let Some(index) = self.phrases.iter().position(|p| p.is_empty()) {
            return Err(ConfigError::EmptyPhrase(index));
        }
        if self.cursor_blink_ms == 0 {
            return Err(ConfigError::ZeroInterval("typewriter.cursor_blink_ms"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavbarConfig {
    pub scroll_threshold: f64,
}

impl Default for NavbarConfig {
    fn default() -> Self {
        Self {
            scroll_threshold: 50.0,
        }
    }
}

/// Viewport geometry for scroll-triggered reveals and the services parallax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub viewport_height: f64,
    /// Fraction of the viewport an element's top must cross to reveal upward.
    pub up_start: f64,
    /// Same threshold for elements sliding in from the side.
    pub side_start: f64,
    /// Background offset, in percent, at the end of the parallax range.
    pub parallax_shift: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            viewport_height: 800.0,
            up_start: 0.85,
            side_start: 0.80,
            parallax_shift: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub whatsapp_number: String,
    pub sent_delay_ms: u64,
    pub restore_delay_ms: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            whatsapp_number: "+971526791455".to_string(),
            sent_delay_ms: 1000,
            restore_delay_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub loader: LoaderTimings,
    pub progress: ProgressPolicy,
    pub typewriter: TypewriterConfig,
    pub navbar: NavbarConfig,
    pub scroll: ScrollConfig,
    pub booking: BookingConfig,
}

impl PageConfig {
    pub fn from_json(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.loader.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("loader.tick_interval_ms"));
        }
        if !(self.scroll.viewport_height > 0.0) {
            return Err(ConfigError::ZeroInterval("scroll.viewport_height"));
        }
        self.progress.validate()?;
        self.typewriter.validate()
    }
}
