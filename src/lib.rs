//! # vocal-midi
//!
//! Turns a song into a MIDI melody: isolate the vocal stem, fold it to mono,
//! run note detection, then tidy the resulting MIDI (key signature and a
//! choir instrument on every part).

pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod midi;
pub mod paths;
pub mod pipeline;
pub mod types;

/// General-MIDI program 52, "Choir Aahs".
pub const CHOIR_AAHS: u8 = 52;

pub use crate::{
    config::{load_config, DetectionConfig},
    core::{
        audio::{downmix_file, downmix_to_mono, read_audio, write_audio},
        separator::{DemucsSeparator, VocalSeparator},
        transcriber::{BasicPitchTranscriber, PitchTranscriber},
    },
    error::{Result, TranscribeError},
    io::progress::{set_stage_progress_callback, set_tool_output_callback, Stage},
    midi::{
        key::{detect_key, Key, KeyProfile, Mode},
        postprocess::post_process,
        score::Score,
    },
    paths::SongLayout,
    pipeline::{transcribe_file, Pipeline},
    types::{AudioData, PostProcessOptions, RunArtifacts},
};
