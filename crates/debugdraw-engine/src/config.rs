//! Engine configuration loaded from JSON.
//!
//! Every section has a `Default`, and missing fields fall back to it, so a
//! config file only needs the values it changes:
//!
//! ```
//! use debugdraw_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "view": { "flip_y": true } }"#).unwrap();
//! assert!(config.view.flip_y);
//! assert_eq!(config.drag.pick_radius, 5.0);
//! ```

use std::path::Path;

use debugdraw_geom::draw::DrawStyle;
use debugdraw_geom::view::View;
use kurbo::{Affine, Vec2};
use serde::{Deserialize, Serialize};

use crate::drag::DragConfig;
use crate::frame::FrameConfig;
use crate::physics::PhysicsConfig;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid JSON for [`EngineConfig`].
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value parsed but is out of range.
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// ViewConfig
// ---------------------------------------------------------------------------

/// Camera settings used to build a [`View`] each frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// World point shown at the screen center.
    pub camera_offset: Vec2,
    /// World Y up, screen Y down.
    pub flip_y: bool,
    /// Screen pixels per world unit.
    pub zoom: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            camera_offset: Vec2::ZERO,
            flip_y: true,
            zoom: 1.0,
        }
    }
}

impl ViewConfig {
    /// Build the view for a screen of the given size.
    pub fn view(&self, screen_width: f64, screen_height: f64) -> View {
        View::new(screen_width, screen_height)
            .with_matrix(Affine::scale(self.zoom))
            .with_camera_offset(self.camera_offset)
            .with_flip_y(self.flip_y)
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub physics: PhysicsConfig,
    pub drag: DragConfig,
    pub draw: DrawStyle,
    pub view: ViewConfig,
    pub frame: FrameConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed JSON, [`ConfigError::Invalid`]
    /// for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check ranges serde cannot express.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.frame.fixed_dt.is_finite() && self.frame.fixed_dt > 0.0) {
            return Err(ConfigError::Invalid {
                field: "frame.fixed_dt",
                reason: format!("must be positive and finite, got {}", self.frame.fixed_dt),
            });
        }
        if !(self.view.zoom.is_finite() && self.view.zoom != 0.0) {
            return Err(ConfigError::Invalid {
                field: "view.zoom",
                reason: format!("must be finite and non-zero, got {}", self.view.zoom),
            });
        }
        if !(self.drag.update_rate_hz.is_finite() && self.drag.update_rate_hz > 0.0) {
            return Err(ConfigError::Invalid {
                field: "drag.update_rate_hz",
                reason: format!("must be positive, got {}", self.drag.update_rate_hz),
            });
        }
        if !(0.0..=1.0).contains(&self.drag.smoothing) {
            return Err(ConfigError::Invalid {
                field: "drag.smoothing",
                reason: format!("must be in [0, 1], got {}", self.drag.smoothing),
            });
        }
        if !(self.drag.max_force.is_finite() && self.drag.max_force > 0.0) {
            return Err(ConfigError::Invalid {
                field: "drag.max_force",
                reason: format!("must be positive and finite, got {}", self.drag.max_force),
            });
        }
        if !(self.drag.error_bias > 0.0 && self.drag.error_bias <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "drag.error_bias",
                reason: format!("must be in (0, 1], got {}", self.drag.error_bias),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
