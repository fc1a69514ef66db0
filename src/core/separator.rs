use std::{
    env, fs,
    path::{Path, PathBuf},
    process::Command,
};

use tracing::info;

use crate::{
    error::{Result, TranscribeError},
    io::process::run_captured,
    paths::{SongLayout, SEPARATOR_MODEL},
};

/// Produces a vocals-only stem for a song.
pub trait VocalSeparator {
    /// Separate `layout.input` and return the path of the vocals stem.
    ///
    /// Implementations must leave the stem at `layout.vocals_path()`.
    fn separate(&self, layout: &SongLayout) -> Result<PathBuf>;
}

/// Shells out to Demucs in two-stem (vocals / no_vocals) mode.
pub struct DemucsSeparator {
    python: String,
    model: String,
}

impl DemucsSeparator {
    pub fn new() -> Self {
        let python = env::var("VOCAL_MIDI_PYTHON").unwrap_or_else(|_| "python3".to_string());
        Self::with_python(python)
    }

    pub fn with_python<S: Into<String>>(python: S) -> Self {
        Self {
            python: python.into(),
            model: SEPARATOR_MODEL.to_string(),
        }
    }

    fn command(&self, input: &Path, out_root: &Path) -> Command {
        let mut cmd = Command::new(&self.python);
        cmd.arg("-m")
            .arg("demucs.separate")
            .arg("-n")
            .arg(&self.model)
            .arg("--two-stems=vocals")
            .arg("-o")
            .arg(out_root)
            .arg(input);
        cmd
    }
}

impl Default for DemucsSeparator {
    fn default() -> Self {
        Self::new()
    }
}

impl VocalSeparator for DemucsSeparator {
    fn separate(&self, layout: &SongLayout) -> Result<PathBuf> {
        let out_root = layout.separated_root();
        fs::create_dir_all(&out_root)?;

        info!(input = %layout.input.display(), model = %self.model, "running vocal separation");
        run_captured("demucs", &mut self.command(&layout.input, &out_root))?;

        let vocals = layout.vocals_path();
        if !vocals.exists() {
            return Err(TranscribeError::MissingArtifact {
                stage: "vocal separation",
                path: vocals,
            });
        }

        info!(path = %vocals.display(), "vocals file located");
        Ok(vocals)
    }
}
