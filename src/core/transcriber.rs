use std::{
    env, fs,
    path::{Path, PathBuf},
    process::Command,
};

use tracing::{debug, info};

use crate::{
    config::DetectionConfig,
    error::{Result, TranscribeError},
    io::process::run_captured,
    paths::raw_midi_path_for,
};

/// Turns a mono vocal recording into a raw MIDI transcription.
pub trait PitchTranscriber {
    /// Transcribe `audio` into `output_dir` and return the MIDI file's path.
    ///
    /// The file is named `<audio-stem>_basic_pitch.mid`.
    fn transcribe(
        &self,
        audio: &Path,
        output_dir: &Path,
        config: &DetectionConfig,
    ) -> Result<PathBuf>;
}

/// Runs the Basic Pitch command-line predictor once per file.
pub struct BasicPitchTranscriber {
    program: String,
}

impl BasicPitchTranscriber {
    pub fn new() -> Self {
        let program =
            env::var("VOCAL_MIDI_BASIC_PITCH").unwrap_or_else(|_| "basic-pitch".to_string());
        Self::with_program(program)
    }

    pub fn with_program<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, audio: &Path, output_dir: &Path, config: &DetectionConfig) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(output_dir)
            .arg(audio)
            .arg("--save-midi")
            .args(threshold_args(config));
        cmd
    }
}

impl Default for BasicPitchTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

/// Command-line flags carrying the detection thresholds.
pub fn threshold_args(config: &DetectionConfig) -> Vec<String> {
    let mut args = vec![
        "--onset-threshold".to_string(),
        config.onset_threshold.to_string(),
        "--frame-threshold".to_string(),
        config.frame_threshold.to_string(),
        "--minimum-note-length".to_string(),
        config.minimum_note_length.to_string(),
        "--minimum-frequency".to_string(),
        config.minimum_frequency.to_string(),
        "--maximum-frequency".to_string(),
        config.maximum_frequency.to_string(),
    ];
    if !config.melodia_trick {
        args.push("--no-melodia".to_string());
    }
    args
}

impl PitchTranscriber for BasicPitchTranscriber {
    fn transcribe(
        &self,
        audio: &Path,
        output_dir: &Path,
        config: &DetectionConfig,
    ) -> Result<PathBuf> {
        fs::create_dir_all(output_dir)?;

        // The predictor refuses to overwrite an existing output.
        let midi = raw_midi_path_for(output_dir, audio)?;
        if midi.exists() {
            debug!(path = %midi.display(), "removing stale transcription");
            fs::remove_file(&midi)?;
        }

        info!(
            audio = %audio.display(),
            onset = config.onset_threshold,
            frame = config.frame_threshold,
            min_note_ms = config.minimum_note_length,
            melodia = config.melodia_trick,
            "running note detection"
        );
        run_captured("basic-pitch", &mut self.command(audio, output_dir, config))?;

        if !midi.exists() {
            return Err(TranscribeError::MissingArtifact {
                stage: "note detection",
                path: midi,
            });
        }

        Ok(midi)
    }
}
