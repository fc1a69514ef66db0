use crate::error::{Result, TranscribeError};
use std::path::{Path, PathBuf};

pub const DEFAULT_ROOT: &str = "/app";
pub const SEPARATOR_MODEL: &str = "htdemucs";
pub const MONO_FILE: &str = "vocals_mono.wav";
pub const RAW_MIDI_SUFFIX: &str = "_basic_pitch.mid";

/// Every path a run touches, derived from the working root and the input file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongLayout {
    pub root: PathBuf,
    pub input: PathBuf,
    pub song_name: String,
}

impl SongLayout {
    pub fn new<R: AsRef<Path>, I: AsRef<Path>>(root: R, input: I) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let input = root.join(input.as_ref());

        let song_name = input
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                TranscribeError::Input(format!("Cannot derive a song name from {:?}", input))
            })?
            .to_string();

        Ok(Self {
            root,
            input,
            song_name,
        })
    }

    /// Directory the separator writes into (`<root>/separated`).
    pub fn separated_root(&self) -> PathBuf {
        self.root.join("separated")
    }

    /// `<root>/separated/htdemucs/<song>/vocals.wav`
    pub fn vocals_path(&self) -> PathBuf {
        self.separated_root()
            .join(SEPARATOR_MODEL)
            .join(&self.song_name)
            .join("vocals.wav")
    }

    /// `<root>/output/<song>/`
    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output").join(&self.song_name)
    }

    pub fn mono_path(&self) -> PathBuf {
        self.output_dir().join(MONO_FILE)
    }

    pub fn raw_midi_path(&self) -> Result<PathBuf> {
        raw_midi_path_for(&self.output_dir(), &self.mono_path())
    }

    /// `<root>/output/<song>/<song>.mid`
    pub fn midi_path(&self) -> PathBuf {
        self.output_dir().join(format!("{}.mid", self.song_name))
    }
}

/// Where the note-detection model puts its MIDI for `audio`.
pub fn raw_midi_path_for(output_dir: &Path, audio: &Path) -> Result<PathBuf> {
    let stem = audio
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            TranscribeError::Input(format!("Cannot derive a MIDI name from {:?}", audio))
        })?;
    Ok(output_dir.join(format!("{stem}{RAW_MIDI_SUFFIX}")))
}
