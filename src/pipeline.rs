use std::{fs, path::Path};

use tracing::info;

use crate::{
    config::{load_config, DetectionConfig},
    core::{
        audio::downmix_file,
        separator::{DemucsSeparator, VocalSeparator},
        transcriber::{BasicPitchTranscriber, PitchTranscriber},
    },
    error::{Result, TranscribeError},
    io::progress::{emit_stage, Stage},
    midi::postprocess::post_process,
    paths::SongLayout,
    types::{PostProcessOptions, RunArtifacts},
};

/// Separate → Downmix → Transcribe → PostProcess, aborting on the first failure.
pub struct Pipeline<S, T> {
    separator: S,
    transcriber: T,
    post: PostProcessOptions,
}

impl Pipeline<DemucsSeparator, BasicPitchTranscriber> {
    /// Demucs and Basic Pitch, located through the environment.
    pub fn external() -> Self {
        Self::new(DemucsSeparator::new(), BasicPitchTranscriber::new())
    }
}

impl<S: VocalSeparator, T: PitchTranscriber> Pipeline<S, T> {
    pub fn new(separator: S, transcriber: T) -> Self {
        Self {
            separator,
            transcriber,
            post: PostProcessOptions::default(),
        }
    }

    pub fn with_post_process(mut self, options: PostProcessOptions) -> Self {
        self.post = options;
        self
    }

    pub fn run(&self, layout: &SongLayout, config: &DetectionConfig) -> Result<RunArtifacts> {
        if !layout.input.is_file() {
            return Err(TranscribeError::Input(format!(
                "Input audio not found: {}",
                layout.input.display()
            )));
        }

        info!(song = %layout.song_name, root = %layout.root.display(), "starting transcription");

        emit_stage(Stage::Separate);
        let vocals_path = self.separator.separate(layout)?;
        require(&vocals_path, "vocal separation")?;

        emit_stage(Stage::Downmix);
        let output_dir = layout.output_dir();
        fs::create_dir_all(&output_dir)?;
        let mono_path = layout.mono_path();
        downmix_file(&vocals_path, &mono_path)?;
        require(&mono_path, "mono downmix")?;

        emit_stage(Stage::Transcribe);
        let raw_midi_path = self
            .transcriber
            .transcribe(&mono_path, &output_dir, config)?;
        require(&raw_midi_path, "note detection")?;

        emit_stage(Stage::PostProcess);
        let midi_path = layout.midi_path();
        let key = post_process(&raw_midi_path, &midi_path, &self.post)?;

        emit_stage(Stage::Finished);
        Ok(RunArtifacts {
            vocals_path,
            mono_path,
            raw_midi_path,
            midi_path,
            key,
        })
    }
}

fn require(path: &Path, stage: &'static str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(TranscribeError::MissingArtifact {
            stage,
            path: path.to_path_buf(),
        })
    }
}

/// Load the configuration, then run the external-tool pipeline on `input`.
///
/// The configuration is read first so a bad file fails before any model runs.
pub fn transcribe_file<I, C, R>(input: I, config_path: C, root: R) -> Result<RunArtifacts>
where
    I: AsRef<Path>,
    C: AsRef<Path>,
    R: AsRef<Path>,
{
    let config = load_config(config_path)?;
    let layout = SongLayout::new(root, input)?;
    Pipeline::external().run(&layout, &config)
}
