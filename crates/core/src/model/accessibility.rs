use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AccessibilityError {
    #[error("font size must be between {min} and {max} px, got {provided}")]
    InvalidFontSize { provided: u8, min: u8, max: u8 },

    #[error("unknown content mode: {0}")]
    UnknownMode(String),
}

/// How lesson content is preferably presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    #[default]
    Text,
    Audio,
    Simplified,
}

impl ContentMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Audio => "audio",
            Self::Simplified => "simplified",
        }
    }
}

impl fmt::Display for ContentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentMode {
    type Err = AccessibilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "audio" => Ok(Self::Audio),
            "simplified" => Ok(Self::Simplified),
            _ => Err(AccessibilityError::UnknownMode(s.to_owned())),
        }
    }
}

/// Per-student accessibility preferences.
///
/// These only influence presentation; they never affect difficulty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct AccessibilityPreferences {
    preferred_mode: ContentMode,
    audio_enabled: bool,
    sign_language_enabled: bool,
    emotion_detection_enabled: bool,
    font_size: u8,
    high_contrast: bool,
    reduce_motion: bool,
}

impl Default for AccessibilityPreferences {
    fn default() -> Self {
        Self {
            preferred_mode: ContentMode::Text,
            audio_enabled: false,
            sign_language_enabled: false,
            emotion_detection_enabled: false,
            font_size: Self::DEFAULT_FONT_SIZE,
            high_contrast: false,
            reduce_motion: false,
        }
    }
}

impl AccessibilityPreferences {
    pub const MIN_FONT_SIZE: u8 = 12;
    pub const MAX_FONT_SIZE: u8 = 32;
    pub const DEFAULT_FONT_SIZE: u8 = 18;

    /// Builds a validated preference set.
    ///
    /// # Errors
    ///
    /// Returns `AccessibilityError::InvalidFontSize` when the font size is out of range.
    #[allow(clippy::fn_params_excessive_bools)]
    pub fn new(
        preferred_mode: ContentMode,
        audio_enabled: bool,
        sign_language_enabled: bool,
        emotion_detection_enabled: bool,
        font_size: u8,
        high_contrast: bool,
        reduce_motion: bool,
    ) -> Result<Self, AccessibilityError> {
        validate_font_size(font_size)?;
        Ok(Self {
            preferred_mode,
            audio_enabled,
            sign_language_enabled,
            emotion_detection_enabled,
            font_size,
            high_contrast,
            reduce_motion,
        })
    }

    #[must_use]
    pub fn preferred_mode(&self) -> ContentMode {
        self.preferred_mode
    }

    #[must_use]
    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    #[must_use]
    pub fn sign_language_enabled(&self) -> bool {
        self.sign_language_enabled
    }

    #[must_use]
    pub fn emotion_detection_enabled(&self) -> bool {
        self.emotion_detection_enabled
    }

    #[must_use]
    pub fn font_size(&self) -> u8 {
        self.font_size
    }

    #[must_use]
    pub fn high_contrast(&self) -> bool {
        self.high_contrast
    }

    #[must_use]
    pub fn reduce_motion(&self) -> bool {
        self.reduce_motion
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ContentMode) -> Self {
        self.preferred_mode = mode;
        self
    }

    #[must_use]
    pub fn with_audio(mut self, enabled: bool) -> Self {
        self.audio_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_high_contrast(mut self, enabled: bool) -> Self {
        self.high_contrast = enabled;
        self
    }

    /// # Errors
    ///
    /// Returns `AccessibilityError::InvalidFontSize` when the font size is out of range.
    pub fn with_font_size(mut self, font_size: u8) -> Result<Self, AccessibilityError> {
        validate_font_size(font_size)?;
        self.font_size = font_size;
        Ok(self)
    }
}

fn validate_font_size(font_size: u8) -> Result<(), AccessibilityError> {
    let range = AccessibilityPreferences::MIN_FONT_SIZE..=AccessibilityPreferences::MAX_FONT_SIZE;
    if range.contains(&font_size) {
        Ok(())
    } else {
        Err(AccessibilityError::InvalidFontSize {
            provided: font_size,
            min: AccessibilityPreferences::MIN_FONT_SIZE,
            max: AccessibilityPreferences::MAX_FONT_SIZE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_registration_profile() {
        let prefs = AccessibilityPreferences::default();
        assert_eq!(prefs.preferred_mode(), ContentMode::Text);
        assert_eq!(prefs.font_size(), 18);
        assert!(!prefs.audio_enabled());
    }

    #[test]
    fn rejects_font_size_out_of_range() {
        let err = AccessibilityPreferences::default()
            .with_font_size(64)
            .unwrap_err();
        assert!(matches!(
            err,
            AccessibilityError::InvalidFontSize { provided: 64, .. }
        ));
    }

    #[test]
    fn content_mode_parses() {
        assert_eq!("Audio".parse::<ContentMode>().unwrap(), ContentMode::Audio);
        assert!("braille".parse::<ContentMode>().is_err());
    }
}
