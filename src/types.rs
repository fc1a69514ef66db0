use std::path::PathBuf;

use serde::Serialize;

use crate::midi::key::{Key, KeyProfile};

#[derive(Clone, Debug)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioData {
    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }
}

/// Options for the MIDI post-processing stage.
#[derive(Clone, Debug)]
pub struct PostProcessOptions {
    /// Snap note durations to the sixteenth-note grid. Off by default.
    pub quantize: bool,
    /// General-MIDI program forced onto every part.
    pub program: u8,
    pub key_profile: KeyProfile,
}

impl Default for PostProcessOptions {
    fn default() -> Self {
        Self {
            quantize: false,
            program: crate::CHOIR_AAHS,
            key_profile: KeyProfile::default(),
        }
    }
}

/// Everything a successful run leaves behind.
#[derive(Clone, Debug, Serialize)]
pub struct RunArtifacts {
    pub vocals_path: PathBuf,
    pub mono_path: PathBuf,
    pub raw_midi_path: PathBuf,
    pub midi_path: PathBuf,
    pub key: Key,
}
