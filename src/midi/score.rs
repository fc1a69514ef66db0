//! Structured view of a Standard MIDI File.
//!
//! Notes are paired into absolute-tick spans; every other event is kept with
//! its absolute tick and original position so the file can be rebuilt with
//! its event order intact.

use std::collections::{HashMap, VecDeque};

use midly::{
    num::{u15, u28, u4, u7},
    Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
};

use crate::error::{Result, TranscribeError};

/// Largest metrical resolution a header can carry.
const MAX_PPQ: u16 = 0x7FFF;

/// A sounding note with absolute tick timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub onset: u64,
    pub offset: u64,
    pub key: u8,
    pub velocity: u8,
    pub channel: u8,
    off_velocity: u8,
    on_seq: usize,
    off_seq: usize,
}

impl Note {
    pub fn new(onset: u64, offset: u64, key: u8, velocity: u8, channel: u8) -> Self {
        Self {
            onset,
            offset,
            key,
            velocity,
            channel,
            off_velocity: 0,
            on_seq: usize::MAX - 1,
            off_seq: usize::MAX,
        }
    }

    pub fn duration(&self) -> u64 {
        self.offset.saturating_sub(self.onset)
    }
}

/// A non-note event at an absolute tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent<'a> {
    pub tick: u64,
    pub kind: TrackEventKind<'a>,
    seq: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTrack<'a> {
    /// Events emitted at tick 0 ahead of everything else.
    pub prelude: Vec<TrackEventKind<'a>>,
    pub notes: Vec<Note>,
    pub events: Vec<TimedEvent<'a>>,
    /// Tick of the track's end-of-track marker.
    pub end_tick: u64,
}

impl<'a> ScoreTrack<'a> {
    /// A part is a track that carries notes.
    pub fn is_part(&self) -> bool {
        !self.notes.is_empty()
    }

    /// Distinct channels used by this track's notes, ascending.
    pub fn note_channels(&self) -> Vec<u8> {
        let mut channels: Vec<u8> = self.notes.iter().map(|n| n.channel).collect();
        channels.sort_unstable();
        channels.dedup();
        channels
    }

    /// Drop every non-note event matching `pred`.
    pub fn remove_events<F>(&mut self, mut pred: F)
    where
        F: FnMut(&TrackEventKind<'a>) -> bool,
    {
        self.events.retain(|e| !pred(&e.kind));
    }

    fn parse(track: &[TrackEvent<'a>]) -> Self {
        let mut out = ScoreTrack::default();
        let mut tick: u64 = 0;
        let mut pending: HashMap<(u8, u8), VecDeque<(u64, u8, usize)>> = HashMap::new();

        for (seq, event) in track.iter().enumerate() {
            tick += event.delta.as_int() as u64;

            match event.kind {
                TrackEventKind::Meta(MetaMessage::EndOfTrack) => {}
                TrackEventKind::Midi { channel, message } => {
                    let ch = channel.as_int();
                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            pending
                                .entry((ch, key.as_int()))
                                .or_default()
                                .push_back((tick, vel.as_int(), seq));
                        }
                        MidiMessage::NoteOff { key, vel } | MidiMessage::NoteOn { key, vel } => {
                            let opened = pending
                                .get_mut(&(ch, key.as_int()))
                                .and_then(|queue| queue.pop_front());
                            match opened {
                                Some((onset, velocity, on_seq)) => out.notes.push(Note {
                                    onset,
                                    offset: tick,
                                    key: key.as_int(),
                                    velocity,
                                    channel: ch,
                                    off_velocity: vel.as_int(),
                                    on_seq,
                                    off_seq: seq,
                                }),
                                // Unmatched note-off: keep it as-is.
                                None => out.events.push(TimedEvent {
                                    tick,
                                    kind: event.kind,
                                    seq,
                                }),
                            }
                        }
                        _ => out.events.push(TimedEvent {
                            tick,
                            kind: event.kind,
                            seq,
                        }),
                    }
                }
                kind => out.events.push(TimedEvent { tick, kind, seq }),
            }
        }

        // Close anything still sounding at the end of the track.
        let mut unclosed: Vec<((u8, u8), (u64, u8, usize))> = pending
            .into_iter()
            .flat_map(|(k, queue)| queue.into_iter().map(move |open| (k, open)))
            .collect();
        unclosed.sort_by_key(|(_, (_, _, on_seq))| *on_seq);
        for ((ch, key), (onset, velocity, on_seq)) in unclosed {
            out.notes.push(Note {
                onset,
                offset: tick,
                key,
                velocity,
                channel: ch,
                off_velocity: 0,
                on_seq,
                off_seq: usize::MAX,
            });
        }

        out.notes.sort_by_key(|n| (n.onset, n.on_seq));
        out.end_tick = tick;
        out
    }

    fn to_events(&self) -> Vec<TrackEvent<'a>> {
        // (tick, class, seq): prelude first, then original order.
        let mut timed: Vec<(u64, u8, usize, TrackEventKind<'a>)> = Vec::with_capacity(
            self.prelude.len() + self.events.len() + self.notes.len() * 2,
        );

        for (i, kind) in self.prelude.iter().enumerate() {
            timed.push((0, 0, i, *kind));
        }
        for e in &self.events {
            timed.push((e.tick, 1, e.seq, e.kind));
        }
        for n in &self.notes {
            let channel = u4::from(n.channel);
            timed.push((
                n.onset,
                1,
                n.on_seq,
                TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOn {
                        key: u7::from(n.key),
                        vel: u7::from(n.velocity),
                    },
                },
            ));
            timed.push((
                n.offset,
                1,
                n.off_seq,
                TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOff {
                        key: u7::from(n.key),
                        vel: u7::from(n.off_velocity),
                    },
                },
            ));
        }

        timed.sort_by_key(|(tick, class, seq, _)| (*tick, *class, *seq));

        let mut events = Vec::with_capacity(timed.len() + 1);
        let mut last: u64 = 0;
        for (tick, _, _, kind) in timed {
            events.push(TrackEvent {
                delta: u28::from((tick - last) as u32),
                kind,
            });
            last = tick;
        }

        let end = self.end_tick.max(last);
        events.push(TrackEvent {
            delta: u28::from((end - last) as u32),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });

        events
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score<'a> {
    pub header: Header,
    pub tracks: Vec<ScoreTrack<'a>>,
}

impl<'a> Score<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let smf = Smf::parse(bytes)?;
        Ok(Self::from_smf(&smf))
    }

    pub fn from_smf(smf: &Smf<'a>) -> Self {
        Self {
            header: smf.header,
            tracks: smf.tracks.iter().map(|t| ScoreTrack::parse(t)).collect(),
        }
    }

    pub fn to_smf(&self) -> Smf<'a> {
        Smf {
            header: self.header,
            tracks: self.tracks.iter().map(ScoreTrack::to_events).collect(),
        }
    }

    /// Ticks per quarter note, or `None` for SMPTE-timed files.
    pub fn ppq(&self) -> Option<u16> {
        match self.header.timing {
            Timing::Metrical(ticks) => Some(ticks.as_int()),
            Timing::Timecode(_, _) => None,
        }
    }

    /// Multiply the resolution and every tick by `factor`, keeping timing intact.
    ///
    /// Fails for timecode files and when the new resolution overflows 15 bits.
    pub fn rescale(&mut self, factor: u16) -> Result<()> {
        let ppq = self.ppq().ok_or_else(|| {
            TranscribeError::Unsupported("rescaling a timecode-timed MIDI file".to_string())
        })?;
        let scaled = ppq
            .checked_mul(factor)
            .filter(|&t| t <= MAX_PPQ)
            .ok_or_else(|| {
                TranscribeError::Unsupported(format!(
                    "{ppq} ticks per quarter cannot be scaled by {factor}"
                ))
            })?;

        let factor = u64::from(factor);
        for track in self.tracks.iter_mut() {
            for note in track.notes.iter_mut() {
                note.onset *= factor;
                note.offset *= factor;
            }
            for event in track.events.iter_mut() {
                event.tick *= factor;
            }
            track.end_tick *= factor;
        }
        self.header.timing = Timing::Metrical(u15::from(scaled));
        Ok(())
    }

    pub fn parts(&self) -> impl Iterator<Item = &ScoreTrack<'a>> {
        self.tracks.iter().filter(|t| t.is_part())
    }

    pub fn parts_mut(&mut self) -> impl Iterator<Item = &mut ScoreTrack<'a>> {
        self.tracks.iter_mut().filter(|t| t.is_part())
    }

    /// Every note across all tracks.
    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.tracks.iter().flat_map(|t| t.notes.iter())
    }
}
