//! Effect settings: defaults, JSON settings files and validation.

use crate::color::Rgb;
use crate::driver::{Content, DEFAULT_WORDS};
use crate::error::ConfigError;
use crate::particle::DrawMode;
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectConfig {
    /// Fixed text; takes precedence over `words`.
    pub text: Option<String>,
    pub words: Option<Vec<String>>,
    pub color: String,
    #[serde(alias = "backgroundColor")]
    pub background: String,
    /// Field size in pixels; `None` fills the host surface.
    #[serde(alias = "canvasWidth")]
    pub width: Option<u32>,
    #[serde(alias = "canvasHeight")]
    pub height: Option<u32>,
    /// Sampling stride over the rasterized text.
    pub density: usize,
    /// Base particle radius.
    pub size: f32,
    pub fps: u32,
    pub seed: Option<u64>,
    pub draw_mode: DrawMode,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            text: None,
            words: None,
            color: "#ffffff".to_string(),
            background: "#000000".to_string(),
            width: None,
            height: None,
            density: 5,
            size: 2.0,
            fps: 60,
            seed: None,
            draw_mode: DrawMode::Points,
        }
    }
}

impl EffectConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.color_rgb()?;
        self.background_rgb()?;
        if self.density < 1 {
            return Err(ConfigError::InvalidDensity(self.density));
        }
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(ConfigError::InvalidSize(self.size));
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err(ConfigError::InvalidDimensions {
                width: self.width.unwrap_or_default(),
                height: self.height.unwrap_or_default(),
            });
        }
        if !(10..=240).contains(&self.fps) {
            return Err(ConfigError::InvalidFps(self.fps));
        }
        self.content().map(|_| ())
    }

    pub fn color_rgb(&self) -> Result<Rgb, ConfigError> {
        Rgb::from_hex(&self.color)
    }

    pub fn background_rgb(&self) -> Result<Rgb, ConfigError> {
        Rgb::from_hex(&self.background)
    }

    pub fn content(&self) -> Result<Content, ConfigError> {
        match (&self.text, &self.words) {
            (Some(text), _) if text.trim().is_empty() => Err(ConfigError::EmptyContent("text is blank")),
            (Some(text), _) => Ok(Content::Static(text.clone())),
            (None, Some(words)) => {
                let words: Vec<String> = words
                    .iter()
                    .map(|w| w.trim())
                    .filter(|w| !w.is_empty())
                    .map(str::to_string)
                    .collect();
                if words.is_empty() {
                    Err(ConfigError::EmptyContent("word list is empty"))
                } else {
                    Ok(Content::Rotating(words))
                }
            }
            (None, None) => Ok(Content::Rotating(
                DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
            )),
        }
    }
}
