use std::{fs, path::Path};

use midly::{
    num::{u4, u7},
    MetaMessage, MidiMessage, TrackEventKind,
};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{
    error::{Result, TranscribeError},
    midi::{
        key::{detect_key, Key},
        score::Score,
    },
    types::PostProcessOptions,
};

/// Parse `raw`, tidy it and write the result to `out`.
///
/// Returns the detected key.
pub fn post_process<P: AsRef<Path>, Q: AsRef<Path>>(
    raw: P,
    out: Q,
    options: &PostProcessOptions,
) -> Result<Key> {
    let raw = raw.as_ref();
    let out = out.as_ref();

    let bytes = fs::read(raw)?;
    let mut score = Score::parse(&bytes)?;

    let key = process_score(&mut score, options)?;
    info!(key = %key, correlation = key.correlation, "detected key");

    write_score(&score, out)?;
    info!(path = %out.display(), "cleaned MIDI written");

    Ok(key)
}

/// Apply key detection, optional quantization and the instrument override in place.
pub fn process_score(score: &mut Score<'_>, options: &PostProcessOptions) -> Result<Key> {
    let key = detect_key(score.notes(), options.key_profile);
    apply_key_signature(score, &key);

    if options.quantize {
        quantize_durations(score)?;
    }

    force_program(score, options.program);
    Ok(key)
}

/// Put the key signature at the start of every part, replacing any it already had.
pub fn apply_key_signature(score: &mut Score<'_>, key: &Key) {
    let signature = TrackEventKind::Meta(MetaMessage::KeySignature(key.sharps(), key.is_minor()));
    for part in score.parts_mut() {
        part.remove_events(|kind| matches!(kind, TrackEventKind::Meta(MetaMessage::KeySignature(..))));
        part.prelude.push(signature);
    }
}

/// Replace every part's program changes with a single one per channel at tick 0.
pub fn force_program(score: &mut Score<'_>, program: u8) {
    for part in score.parts_mut() {
        part.remove_events(|kind| {
            matches!(
                kind,
                TrackEventKind::Midi {
                    message: MidiMessage::ProgramChange { .. },
                    ..
                }
            )
        });

        for channel in part.note_channels() {
            part.prelude.push(TrackEventKind::Midi {
                channel: u4::from(channel),
                message: MidiMessage::ProgramChange {
                    program: u7::from(program),
                },
            });
        }
    }
}

/// Snap every note's duration to the nearest sixteenth note.
///
/// Onsets stay put; only note-offs move. Half-way durations round to the even
/// multiple of a sixteenth. A resolution that is not a multiple of four is
/// first rescaled so a sixteenth is a whole number of ticks.
pub fn quantize_durations(score: &mut Score<'_>) -> Result<()> {
    let ppq = score.ppq().ok_or_else(|| {
        TranscribeError::Unsupported("quantizing a timecode-timed MIDI file".to_string())
    })?;

    let factor = sixteenth_factor(ppq);
    if factor > 1 {
        score.rescale(factor)?;
        debug!(from = ppq, to = ppq * factor, "rescaled resolution for quantization");
    }
    let ppq = ppq * factor;

    for track in score.tracks.iter_mut() {
        for note in track.notes.iter_mut() {
            note.offset = note.onset + quantize_ticks(note.duration(), ppq);
        }
    }

    Ok(())
}

/// Smallest multiplier that makes `ppq` divisible by four.
fn sixteenth_factor(ppq: u16) -> u16 {
    match ppq % 4 {
        0 => 1,
        2 => 2,
        _ => 4,
    }
}

/// Round a duration in ticks to the nearest quarter of a quarter note.
///
/// Exact only when `ppq` is a multiple of four.
pub fn quantize_ticks(duration: u64, ppq: u16) -> u64 {
    let ppq = f64::from(ppq);
    let sixteenths = (duration as f64 / ppq * 4.0).round_ties_even();
    (sixteenths * ppq / 4.0).round() as u64
}

/// Serialize `score` to `path`, replacing it atomically.
pub fn write_score(score: &Score<'_>, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    score.to_smf().write_std(tmp.as_file_mut())?;
    tmp.persist(path)?;
    Ok(())
}
