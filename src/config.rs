//! Detection thresholds for the note-detection model.
//!
//! Every key is required: there are no defaults, so a file missing one of
//! them fails the run before any model is invoked.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::error::{Result, TranscribeError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Lower values split sustained sounds into more notes.
    pub onset_threshold: f32,
    /// Lower values emit more notes overall.
    pub frame_threshold: f32,
    /// Notes shorter than this (milliseconds) are discarded.
    pub minimum_note_length: u32,
    /// Hz
    pub minimum_frequency: f32,
    /// Hz
    pub maximum_frequency: f32,
    /// Bias detection toward a single monophonic line.
    pub melodia_trick: bool,
}

impl DetectionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: DetectionConfig = serde_json::from_str(json).map_err(|e| {
            if e.is_data() {
                TranscribeError::Config(e.to_string())
            } else {
                TranscribeError::ConfigParse(e)
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("onset_threshold", self.onset_threshold),
            ("frame_threshold", self.frame_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TranscribeError::Config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if self.minimum_frequency.is_nan() || self.minimum_frequency <= 0.0 {
            return Err(TranscribeError::Config(format!(
                "minimum_frequency must be positive, got {}",
                self.minimum_frequency
            )));
        }

        if self.minimum_frequency >= self.maximum_frequency {
            return Err(TranscribeError::Config(format!(
                "minimum_frequency ({}) must be below maximum_frequency ({})",
                self.minimum_frequency, self.maximum_frequency
            )));
        }

        Ok(())
    }
}

/// Load and validate a configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DetectionConfig> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|e| {
        TranscribeError::Config(format!("Cannot read {}: {e}", path.display()))
    })?;
    DetectionConfig::from_json(&json)
}
