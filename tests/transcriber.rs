#![cfg(unix)]

mod common;

use std::fs;

use tempfile::tempdir;
use vocal_midi::{BasicPitchTranscriber, DetectionConfig, PitchTranscriber, TranscribeError};

fn config(melodia_trick: bool) -> DetectionConfig {
    DetectionConfig {
        onset_threshold: 0.6,
        frame_threshold: 0.5,
        minimum_note_length: 80,
        minimum_frequency: 100.0,
        maximum_frequency: 1500.0,
        melodia_trick,
    }
}

fn fake_basic_pitch(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let args_file = dir.join("args.txt");
    let tool = dir.join("fake-basic-pitch");
    common::write_script(
        &tool,
        &format!(
            r#"echo "$@" > "{args}"
stem=$(basename "$2"); stem="${{stem%.*}}"
echo "Predicting MIDI for $2..."
echo "fake midi" > "$1/${{stem}}_basic_pitch.mid"
"#,
            args = args_file.display()
        ),
    );
    (tool, args_file)
}

#[test]
fn passes_thresholds_and_names_output_after_input() {
    let _guard = common::tool_lock();
    let tmp = tempdir().unwrap();
    let out = tmp.path().join("output").join("song");
    let audio = tmp.path().join("vocals_mono.wav");
    fs::write(&audio, b"audio").unwrap();

    let (tool, args_file) = fake_basic_pitch(tmp.path());
    let midi = BasicPitchTranscriber::with_program(tool.to_string_lossy())
        .transcribe(&audio, &out, &config(true))
        .expect("transcription failed");

    assert_eq!(midi, out.join("vocals_mono_basic_pitch.mid"));
    assert!(midi.exists());

    let args = fs::read_to_string(&args_file).unwrap();
    assert_eq!(
        args.trim(),
        format!(
            "{} {} --save-midi --onset-threshold 0.6 --frame-threshold 0.5 \
             --minimum-note-length 80 --minimum-frequency 100 --maximum-frequency 1500",
            out.display(),
            audio.display()
        )
    );
}

#[test]
fn disabled_melodia_adds_flag_and_stale_output_is_replaced() {
    let _guard = common::tool_lock();
    let tmp = tempdir().unwrap();
    let out = tmp.path().join("out");
    fs::create_dir_all(&out).unwrap();
    let audio = tmp.path().join("vocals_mono.wav");
    fs::write(&audio, b"audio").unwrap();
    fs::write(out.join("vocals_mono_basic_pitch.mid"), b"stale").unwrap();

    let (tool, args_file) = fake_basic_pitch(tmp.path());
    let midi = BasicPitchTranscriber::with_program(tool.to_string_lossy())
        .transcribe(&audio, &out, &config(false))
        .unwrap();

    assert!(fs::read_to_string(&args_file).unwrap().trim().ends_with("--no-melodia"));
    assert_eq!(fs::read_to_string(midi).unwrap().trim(), "fake midi");
}

#[test]
fn failed_inference_is_fatal() {
    let _guard = common::tool_lock();
    let tmp = tempdir().unwrap();
    let audio = tmp.path().join("vocals_mono.wav");
    fs::write(&audio, b"audio").unwrap();

    let tool = tmp.path().join("fake-basic-pitch");
    common::write_script(&tool, "echo 'tensorflow exploded' >&2\nexit 1\n");

    let err = BasicPitchTranscriber::with_program(tool.to_string_lossy())
        .transcribe(&audio, tmp.path(), &config(true))
        .unwrap_err();
    match err {
        TranscribeError::ToolFailed { tool, stderr, .. } => {
            assert_eq!(tool, "basic-pitch");
            assert_eq!(stderr, "tensorflow exploded");
        }
        other => panic!("expected ToolFailed, got {other:?}"),
    }
}

#[test]
fn silent_success_is_a_missing_artifact() {
    let _guard = common::tool_lock();
    let tmp = tempdir().unwrap();
    let audio = tmp.path().join("vocals_mono.wav");
    fs::write(&audio, b"audio").unwrap();

    let tool = tmp.path().join("fake-basic-pitch");
    common::write_script(&tool, "exit 0\n");

    let err = BasicPitchTranscriber::with_program(tool.to_string_lossy())
        .transcribe(&audio, tmp.path(), &config(true))
        .unwrap_err();
    assert!(matches!(err, TranscribeError::MissingArtifact { .. }), "got {err:?}");
}
