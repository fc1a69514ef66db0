#![allow(dead_code)]

use std::{f32::consts::PI, fs, fs::File, path::Path};

use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
};
use vocal_midi::{write_audio, AudioData};

pub const PPQ: u16 = 220;

/// Interleaved stereo sine pair, 0.2 amplitude.
pub fn stereo_tone(path: &Path, frames: usize, sample_rate: u32) -> AudioData {
    let mut samples = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        samples.push((2.0 * PI * 440.0 * t).sin() * 0.2);
        samples.push((2.0 * PI * 660.0 * t).sin() * 0.2);
    }
    let audio = AudioData {
        samples,
        sample_rate,
        channels: 2,
    };
    write_audio(path, &audio).unwrap();
    audio
}

fn ev(delta: u32, kind: TrackEventKind<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::from(delta),
        kind,
    }
}

fn midi(channel: u8, message: MidiMessage) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel: u4::from(channel),
        message,
    }
}

fn note_on(channel: u8, key: u8, vel: u8) -> TrackEventKind<'static> {
    midi(
        channel,
        MidiMessage::NoteOn {
            key: u7::from(key),
            vel: u7::from(vel),
        },
    )
}

fn note_off(channel: u8, key: u8) -> TrackEventKind<'static> {
    midi(
        channel,
        MidiMessage::NoteOff {
            key: u7::from(key),
            vel: u7::from(0u8),
        },
    )
}

/// Monophonic track from (key, gap_before, length) triples.
fn melody_track(
    channel: u8,
    program: u8,
    notes: &[(u8, u32, u32)],
) -> Vec<TrackEvent<'static>> {
    let mut track = vec![
        ev(0, TrackEventKind::Meta(MetaMessage::TrackName(b"Voice"))),
        ev(
            0,
            midi(
                channel,
                MidiMessage::ProgramChange {
                    program: u7::from(program),
                },
            ),
        ),
    ];
    for &(key, gap, len) in notes {
        track.push(ev(gap, note_on(channel, key, 90)));
        track.push(ev(len, note_off(channel, key)));
    }
    track.push(ev(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)));
    track
}

/// A format-1 transcription the way the note detector emits one: a
/// conductor track followed by a piano part with off-grid durations.
pub fn raw_transcription() -> Smf<'static> {
    let conductor = vec![
        ev(0, TrackEventKind::Meta(MetaMessage::Tempo(u24::from(500_000u32)))),
        ev(0, TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8))),
        ev(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
    ];

    let part = melody_track(
        0,
        0,
        &[
            (60, 0, 430),
            (62, 17, 101),
            (64, 9, 467),
            (65, 30, 52),
            (67, 3, 440),
            (69, 60, 212),
            (71, 11, 96),
            (72, 5, 463),
            (67, 20, 20),
        ],
    );

    Smf {
        header: Header::new(Format::Parallel, Timing::Metrical(u15::from(PPQ))),
        tracks: vec![conductor, part],
    }
}

/// Two parts on different channels with different instruments.
pub fn two_part_transcription() -> Smf<'static> {
    let lead = melody_track(0, 0, &[(64, 0, 220), (67, 0, 220), (72, 0, 440)]);
    let harmony = melody_track(3, 40, &[(55, 0, 440), (60, 0, 440)]);
    Smf {
        header: Header::new(Format::Parallel, Timing::Metrical(u15::from(PPQ))),
        tracks: vec![lead, harmony],
    }
}

pub fn save_midi(smf: &Smf<'_>, path: &Path) {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).unwrap();
    }
    smf.write_std(File::create(path).unwrap()).unwrap();
}

/// (onset, offset, key, velocity, channel) for every note, track by track.
pub fn note_spans(bytes: &[u8]) -> Vec<(u64, u64, u8, u8, u8)> {
    let score = vocal_midi::Score::parse(bytes).unwrap();
    score
        .notes()
        .map(|n| (n.onset, n.offset, n.key, n.velocity, n.channel))
        .collect()
}

#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, format!("#!/bin/sh\n{body}")).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

/// Serializes tests that write and then execute stand-in tools, so no
/// concurrently spawned child holds a script open for writing.
pub static TOOL_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

pub fn tool_lock() -> std::sync::MutexGuard<'static, ()> {
    TOOL_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}
