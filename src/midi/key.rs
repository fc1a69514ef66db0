use serde::{Deserialize, Serialize};

use super::score::Note;

/// Aarden-Essen major key profile (folk-song corpus statistics).
const AARDEN_MAJOR: [f64; 12] = [
    17.7661, 0.145624, 14.9265, 0.160186, 19.8049, 11.3587, 0.291248, 22.062, 0.145624, 8.15494,
    0.232998, 4.95122,
];

/// Aarden-Essen minor key profile.
const AARDEN_MINOR: [f64; 12] = [
    18.2648, 0.737619, 14.0499, 16.8599, 0.702494, 14.4362, 0.702494, 18.6161, 4.56621, 1.93186,
    7.37619, 1.75623,
];

/// Krumhansl-Kessler major key profile (probe-tone ratings).
const KRUMHANSL_MAJOR: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor key profile.
const KRUMHANSL_MINOR: [f64; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

const MAJOR_SHARP_NAMES: [&str; 8] = ["C", "G", "D", "A", "E", "B", "F#", "C#"];
const MAJOR_FLAT_NAMES: [&str; 8] = ["C", "F", "Bb", "Eb", "Ab", "Db", "Gb", "Cb"];
const MINOR_SHARP_NAMES: [&str; 8] = ["A", "E", "B", "F#", "C#", "G#", "D#", "A#"];
const MINOR_FLAT_NAMES: [&str; 8] = ["A", "D", "G", "C", "F", "Bb", "Eb", "Ab"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Major,
    Minor,
}

/// Weight profile used to correlate against the pitch-class distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyProfile {
    #[default]
    AardenEssen,
    KrumhanslKessler,
}

impl KeyProfile {
    fn weights(self, mode: Mode) -> &'static [f64; 12] {
        match (self, mode) {
            (KeyProfile::AardenEssen, Mode::Major) => &AARDEN_MAJOR,
            (KeyProfile::AardenEssen, Mode::Minor) => &AARDEN_MINOR,
            (KeyProfile::KrumhanslKessler, Mode::Major) => &KRUMHANSL_MAJOR,
            (KeyProfile::KrumhanslKessler, Mode::Minor) => &KRUMHANSL_MINOR,
        }
    }
}

/// A detected global key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Key {
    /// Pitch class of the tonic, 0 = C.
    pub tonic: u8,
    pub mode: Mode,
    /// Pearson correlation of the winning profile.
    pub correlation: f64,
}

impl Key {
    /// Accidentals of the key signature: positive for sharps, negative for flats.
    pub fn sharps(&self) -> i8 {
        let major_tonic = match self.mode {
            Mode::Major => self.tonic % 12,
            Mode::Minor => (self.tonic + 3) % 12,
        };
        let fifths = (major_tonic as i8 * 7) % 12;
        if fifths > 6 {
            fifths - 12
        } else {
            fifths
        }
    }

    pub fn is_minor(&self) -> bool {
        self.mode == Mode::Minor
    }

    /// Human-readable name, e.g. `"Eb major"` or `"F# minor"`.
    pub fn name(&self) -> String {
        let sharps = self.sharps();
        let idx = sharps.unsigned_abs() as usize;
        let tonic = match (self.mode, sharps >= 0) {
            (Mode::Major, true) => MAJOR_SHARP_NAMES[idx],
            (Mode::Major, false) => MAJOR_FLAT_NAMES[idx],
            (Mode::Minor, true) => MINOR_SHARP_NAMES[idx],
            (Mode::Minor, false) => MINOR_FLAT_NAMES[idx],
        };
        let mode = match self.mode {
            Mode::Major => "major",
            Mode::Minor => "minor",
        };
        format!("{tonic} {mode}")
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// Estimate the key of a set of notes.
///
/// Builds a duration-weighted pitch-class histogram and correlates it against
/// the profile rotated to each of the 24 major/minor keys. The best Pearson
/// correlation wins; ties keep the earlier candidate (C..B, major first).
pub fn detect_key<'n, I>(notes: I, profile: KeyProfile) -> Key
where
    I: IntoIterator<Item = &'n Note>,
{
    let mut histogram = [0.0_f64; 12];
    for note in notes {
        histogram[(note.key % 12) as usize] += note.duration().max(1) as f64;
    }

    if histogram.iter().all(|&h| h == 0.0) {
        return Key {
            tonic: 0,
            mode: Mode::Major,
            correlation: 0.0,
        };
    }

    let mut best = Key {
        tonic: 0,
        mode: Mode::Major,
        correlation: f64::NEG_INFINITY,
    };

    for tonic in 0..12u8 {
        let mut rotated = [0.0; 12];
        for (i, slot) in rotated.iter_mut().enumerate() {
            *slot = histogram[(i + tonic as usize) % 12];
        }

        for mode in [Mode::Major, Mode::Minor] {
            let corr = pearson(&rotated, profile.weights(mode));
            if corr > best.correlation {
                best = Key {
                    tonic,
                    mode,
                    correlation: corr,
                };
            }
        }
    }

    best
}

/// Pearson correlation coefficient between two 12-element arrays.
fn pearson(x: &[f64; 12], y: &[f64; 12]) -> f64 {
    let x_mean: f64 = x.iter().sum::<f64>() / 12.0;
    let y_mean: f64 = y.iter().sum::<f64>() / 12.0;

    let mut num = 0.0;
    let mut x_sq = 0.0;
    let mut y_sq = 0.0;

    for i in 0..12 {
        let xd = x[i] - x_mean;
        let yd = y[i] - y_mean;
        num += xd * yd;
        x_sq += xd * xd;
        y_sq += yd * yd;
    }

    let denom = (x_sq * y_sq).sqrt();
    if denom < 1e-10 {
        return 0.0;
    }
    num / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn melody(pitches_and_beats: &[(u8, u64)]) -> Vec<Note> {
        let mut tick = 0;
        pitches_and_beats
            .iter()
            .map(|&(pitch, beats)| {
                let note = Note::new(tick, tick + beats * 480, pitch, 80, 0);
                tick += beats * 480;
                note
            })
            .collect()
    }

    #[test]
    fn empty_notes_return_c_major() {
        let notes: Vec<Note> = Vec::new();
        let key = detect_key(&notes, KeyProfile::default());
        assert_eq!(key.tonic, 0);
        assert_eq!(key.mode, Mode::Major);
        assert_eq!(key.correlation, 0.0);
    }

    #[test]
    fn tonic_weighted_c_major_melody() {
        let notes = melody(&[
            (60, 2),
            (62, 1),
            (64, 2),
            (65, 1),
            (67, 2),
            (69, 1),
            (71, 1),
            (72, 2),
        ]);
        let key = detect_key(&notes, KeyProfile::AardenEssen);
        assert_eq!((key.tonic, key.mode), (0, Mode::Major));
        assert_eq!(key.name(), "C major");
    }

    #[test]
    fn krumhansl_finds_c_major_scale() {
        let notes = melody(&[
            (60, 1),
            (62, 1),
            (64, 1),
            (65, 1),
            (67, 1),
            (69, 1),
            (71, 1),
        ]);
        let key = detect_key(&notes, KeyProfile::KrumhanslKessler);
        assert_eq!((key.tonic, key.mode), (0, Mode::Major));
        assert!(key.correlation > 0.7, "correlation {}", key.correlation);
    }

    #[test]
    fn key_signature_accidentals() {
        let key = |tonic, mode| Key {
            tonic,
            mode,
            correlation: 1.0,
        };
        assert_eq!(key(7, Mode::Major).sharps(), 1); // G
        assert_eq!(key(5, Mode::Major).sharps(), -1); // F
        assert_eq!(key(1, Mode::Major).sharps(), -5); // Db
        assert_eq!(key(6, Mode::Major).sharps(), 6); // F#
        assert_eq!(key(9, Mode::Minor).sharps(), 0); // A minor
        assert_eq!(key(4, Mode::Minor).sharps(), 1); // E minor
        assert_eq!(key(2, Mode::Minor).sharps(), -1); // D minor
        assert_eq!(key(3, Mode::Major).name(), "Eb major");
        assert_eq!(key(6, Mode::Minor).name(), "F# minor");
    }

    #[test]
    fn pearson_identical_arrays() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let r = pearson(&a, &a);
        assert!((r - 1.0).abs() < 1e-10, "self-correlation should be 1.0, got {}", r);
    }
}
