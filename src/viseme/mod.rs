//! Viseme mapping for lip-sync animation.
//!
//! A viseme is a visual mouth shape that corresponds to one or more
//! phonemes. Speech synthesizers emit integer viseme codes; this module maps
//! those codes onto the 15-shape Oculus set and from there onto a morph
//! target name, a base intensity, and a coarse [`MouthShape`] for 2D warps.

pub mod timeline;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use timeline::{TimeUnit, VisemeEvent, VisemePayload, VisemeTimeline};

/// Oculus viseme IDs (standard for lip-sync)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Viseme {
    /// Silence (default mouth closed)
    Sil = 0,
    /// /p/, /b/, /m/ (lips pressed together)
    PP = 1,
    /// /f/, /v/ (teeth on lip)
    FF = 2,
    /// /θ/, /ð/ (tongue between teeth)
    TH = 3,
    /// /t/, /d/, /n/, /l/ (tongue at roof)
    DD = 4,
    /// /k/, /g/, /ŋ/ (back of tongue up)
    KK = 5,
    /// /tʃ/, /dʒ/, /ʃ/, /ʒ/ (tongue curved)
    CH = 6,
    /// /s/, /z/ (teeth together, tongue forward)
    SS = 7,
    /// /n/, /nj/ (tongue at roof)
    NN = 8,
    /// /r/ (tongue curled)
    RR = 9,
    /// /a/ (mouth open wide)
    AA = 10,
    /// /e/ (mouth medium)
    E = 11,
    /// /i/ (mouth wide, teeth apart)
    I = 12,
    /// /o/ (rounded, medium)
    O = 13,
    /// /u/ (rounded, small)
    U = 14,
}

const ALL_VISEMES: [Viseme; 15] = [
    Viseme::Sil,
    Viseme::PP,
    Viseme::FF,
    Viseme::TH,
    Viseme::DD,
    Viseme::KK,
    Viseme::CH,
    Viseme::SS,
    Viseme::NN,
    Viseme::RR,
    Viseme::AA,
    Viseme::E,
    Viseme::I,
    Viseme::O,
    Viseme::U,
];

impl Viseme {
    /// The Oculus viseme for a raw Oculus code.
    pub fn from_oculus_id(id: u32) -> Option<Self> {
        usize::try_from(id)
            .ok()
            .and_then(|i| ALL_VISEMES.get(i))
            .copied()
    }

    /// Blend-shape name used by Oculus/ReadyPlayerMe style rigs.
    pub fn morph_target(&self) -> &'static str {
        match self {
            Viseme::Sil => "viseme_sil",
            Viseme::PP => "viseme_PP",
            Viseme::FF => "viseme_FF",
            Viseme::TH => "viseme_TH",
            Viseme::DD => "viseme_DD",
            Viseme::KK => "viseme_kk",
            Viseme::CH => "viseme_CH",
            Viseme::SS => "viseme_SS",
            Viseme::NN => "viseme_nn",
            Viseme::RR => "viseme_RR",
            Viseme::AA => "viseme_aa",
            Viseme::E => "viseme_E",
            Viseme::I => "viseme_I",
            Viseme::O => "viseme_O",
            Viseme::U => "viseme_U",
        }
    }

    /// How far the mouth deforms for this viseme, in `[0, 1]`.
    pub fn base_intensity(&self) -> f32 {
        match self {
            Viseme::Sil => 0.0,
            Viseme::PP => 0.05, // Lips closed, slight press
            Viseme::FF => 0.25,
            Viseme::TH => 0.3,
            Viseme::DD => 0.35,
            Viseme::KK => 0.4,
            Viseme::CH => 0.45,
            Viseme::SS => 0.3,
            Viseme::NN => 0.3,
            Viseme::RR => 0.4,
            Viseme::AA => 1.0, // Wide open
            Viseme::E => 0.7,
            Viseme::I => 0.6,
            Viseme::O => 0.8,
            Viseme::U => 0.6,
        }
    }

    /// Geometric class for the 2D region warp.
    pub fn mouth_shape(&self) -> MouthShape {
        match self {
            Viseme::Sil => MouthShape::Neutral,
            Viseme::PP | Viseme::FF => MouthShape::Closed,
            Viseme::TH | Viseme::DD | Viseme::KK | Viseme::NN => MouthShape::Open,
            Viseme::AA => MouthShape::Wide,
            Viseme::SS | Viseme::E | Viseme::I => MouthShape::Smile,
            Viseme::CH | Viseme::RR | Viseme::O | Viseme::U => MouthShape::Round,
        }
    }
}

impl fmt::Display for Viseme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.morph_target().trim_start_matches("viseme_"))
    }
}

/// Coarse mouth geometry used by renderers without blend shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouthShape {
    /// At rest.
    #[default]
    Neutral,
    /// Lips together or teeth on lip.
    Closed,
    /// Jaw dropped a little.
    Open,
    /// Jaw dropped fully.
    Wide,
    /// Lips spread horizontally.
    Smile,
    /// Lips pushed forward and rounded.
    Round,
}

/// Where a resolved viseme lands on the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouthTarget {
    /// The resolved viseme, `None` for the neutral fallback.
    pub viseme: Option<Viseme>,
    /// Blend-shape name for 3D rigs.
    pub morph_target: &'static str,
    /// Shape class for 2D warps.
    pub shape: MouthShape,
}

impl MouthTarget {
    /// The at-rest target.
    pub const NEUTRAL: Self = Self {
        viseme: None,
        morph_target: "viseme_sil",
        shape: MouthShape::Neutral,
    };

    fn for_viseme(viseme: Viseme) -> Self {
        Self {
            viseme: Some(viseme),
            morph_target: viseme.morph_target(),
            shape: viseme.mouth_shape(),
        }
    }

    /// Stable numeric id for the renderer (`Oculus code`, `0` when neutral).
    pub fn shape_id(&self) -> u8 {
        self.viseme.map_or(0, |v| v as u8)
    }
}

/// Which integer code space the TTS collaborator speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisemeScheme {
    /// 15 Oculus codes, 0–14.
    #[default]
    Oculus,
    /// 22 Azure Speech codes, 0–21.
    Azure,
}

/// Static lookup from viseme code to mouth target and intensity.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisemeMapping {
    scheme: VisemeScheme,
}

impl VisemeMapping {
    pub fn new(scheme: VisemeScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> VisemeScheme {
        self.scheme
    }

    /// The Oculus viseme for a raw code, or `None` for a mapping gap.
    pub fn viseme_for(&self, id: i64) -> Option<Viseme> {
        match self.scheme {
            VisemeScheme::Oculus => u32::try_from(id).ok().and_then(Viseme::from_oculus_id),
            VisemeScheme::Azure => azure_to_viseme(id),
        }
    }

    /// Resolve a raw code to a target and intensity.
    ///
    /// Unknown codes resolve to the neutral target at intensity 0; the
    /// returned flag is `false` so the caller can report the gap.
    pub fn resolve(&self, id: i64) -> (MouthTarget, f32, bool) {
        match self.viseme_for(id) {
            Some(v) => (MouthTarget::for_viseme(v), v.base_intensity(), true),
            None => (MouthTarget::NEUTRAL, 0.0, false),
        }
    }
}

/// Azure Speech viseme IDs onto the Oculus set.
fn azure_to_viseme(id: i64) -> Option<Viseme> {
    let v = match id {
        0 => Viseme::Sil,
        1 | 2 | 9 | 11 => Viseme::AA, // æ ə ʌ, ɑ, aʊ, aɪ
        3 | 8 | 10 => Viseme::O,      // ɔ, o, ɔɪ
        4 => Viseme::E,               // ɛ ʊ
        5 | 13 => Viseme::RR,         // ɝ, ɹ
        6 => Viseme::I,               // j i ɪ
        7 => Viseme::U,               // w u
        12 | 20 => Viseme::KK,        // h, k g ŋ
        14 | 19 => Viseme::DD,        // l, d t n θ
        15 => Viseme::SS,
        16 => Viseme::CH,
        17 => Viseme::TH,
        18 => Viseme::FF,
        21 => Viseme::PP,
        _ => return None,
    };
    Some(v)
}

/// ARPABET phoneme to viseme mapping.
/// Based on Carnegie Mellon University Pronouncing Dictionary.
fn phoneme_to_viseme(phoneme: &str) -> Viseme {
    // Remove stress markers (0, 1, 2)
    let p = phoneme.trim_end_matches(['0', '1', '2']);

    match p {
        "" | "sil" | "sp" => Viseme::Sil,
        "B" | "P" | "M" | "EM" | "MX" => Viseme::PP,
        "F" | "V" => Viseme::FF,
        "TH" | "DH" => Viseme::TH,
        "T" | "D" | "L" | "DX" | "EL" => Viseme::DD,
        "N" | "NX" | "EN" => Viseme::NN,
        "K" | "G" | "NG" => Viseme::KK,
        "CH" | "JH" | "SH" | "ZH" => Viseme::CH,
        "S" | "Z" => Viseme::SS,
        "R" | "ER" => Viseme::RR,
        "AA" | "AO" | "AW" => Viseme::AA,
        "AE" | "AH" | "EH" => Viseme::E,
        "AY" | "EY" | "IH" | "IY" | "Y" => Viseme::I,
        "OW" | "OY" | "UH" => Viseme::O,
        "UW" | "W" => Viseme::U,

        // Default to slight open for unknown
        _ => Viseme::DD,
    }
}

/// Estimate a viseme timeline from space-separated ARPABET phonemes.
///
/// For synthesizers that return audio without viseme marks. Vowels are held
/// longer than stops, adjacent duplicates are merged, and a closing `Sil`
/// event is appended so the mouth comes to rest at the end.
pub fn phonemes_to_timeline(phonemes: &str, speech_rate: f32) -> VisemeTimeline {
    let base_duration = 80.0;
    let duration = base_duration / f64::from(speech_rate.max(0.5));

    let mut events: Vec<(f64, i64)> = Vec::new();
    let mut last: Option<Viseme> = None;
    let mut cursor = 0.0;

    for phone in phonemes.split_whitespace() {
        let bare = phone.trim_end_matches(['0', '1', '2']);
        if bare == "sil" || bare == "sp" {
            // Pauses still take time; close the mouth for them.
            if last != Some(Viseme::Sil) && !events.is_empty() {
                events.push((cursor, Viseme::Sil as i64));
                last = Some(Viseme::Sil);
            }
            cursor += duration;
            continue;
        }

        let viseme = phoneme_to_viseme(phone);
        let phone_duration = match bare {
            "AA" | "AE" | "AH" | "AO" | "AW" | "AY" | "EH" | "EY" | "IH" | "IY" | "OW" | "OY"
            | "UH" | "UW" | "ER" => duration * 1.5,
            "P" | "B" | "T" | "D" | "K" | "G" | "M" | "N" | "F" | "V" | "S" | "Z" => duration * 0.8,
            _ => duration,
        };

        if last != Some(viseme) {
            events.push((cursor, viseme as i64));
            last = Some(viseme);
        }
        cursor += phone_duration;
    }

    if !events.is_empty() && last != Some(Viseme::Sil) {
        events.push((cursor, Viseme::Sil as i64));
    }

    VisemeTimeline::from_raw(events, TimeUnit::Milliseconds, duration)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn oculus_ids_round_trip() {
        for (i, v) in ALL_VISEMES.iter().enumerate() {
            assert_eq!(Viseme::from_oculus_id(i as u32), Some(*v));
            assert_eq!(*v as usize, i);
        }
        assert_eq!(Viseme::from_oculus_id(15), None);
        assert_eq!(Viseme::from_oculus_id(u32::MAX), None);
    }

    #[test]
    fn intensities_are_in_unit_range() {
        for v in ALL_VISEMES {
            let i = v.base_intensity();
            assert!((0.0..=1.0).contains(&i), "{v} has {i}");
        }
        assert_eq!(Viseme::Sil.base_intensity(), 0.0);
        assert_eq!(Viseme::AA.base_intensity(), 1.0);
    }

    #[test]
    fn morph_targets_are_unique() {
        let mut names: Vec<_> = ALL_VISEMES.iter().map(Viseme::morph_target).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL_VISEMES.len());
    }

    #[test]
    fn unknown_id_resolves_to_neutral() {
        let mapping = VisemeMapping::default();
        assert!(!mapping.resolve(-3).2);
        assert!(!mapping.resolve(i64::from(u32::MAX) + 1).2);
        let (target, intensity, known) = mapping.resolve(99);
        assert_eq!(target, MouthTarget::NEUTRAL);
        assert_eq!(intensity, 0.0);
        assert!(!known);
        assert_eq!(target.shape_id(), 0);
    }

    #[test]
    fn known_id_resolves_to_target() {
        let mapping = VisemeMapping::default();
        let (target, intensity, known) = mapping.resolve(10);
        assert!(known);
        assert_eq!(target.viseme, Some(Viseme::AA));
        assert_eq!(target.morph_target, "viseme_aa");
        assert_eq!(target.shape, MouthShape::Wide);
        assert_eq!(target.shape_id(), 10);
        assert_eq!(intensity, 1.0);
    }

    #[test]
    fn azure_scheme_covers_all_codes() {
        let mapping = VisemeMapping::new(VisemeScheme::Azure);
        for id in 0..=21 {
            assert!(mapping.viseme_for(id).is_some(), "azure id {id}");
        }
        assert_eq!(mapping.viseme_for(21), Some(Viseme::PP));
        assert_eq!(mapping.viseme_for(0), Some(Viseme::Sil));
        assert_eq!(mapping.viseme_for(22), None);
        assert_eq!(mapping.viseme_for(-1), None);
    }

    #[test]
    fn consonants_to_visemes() {
        for p in ["B", "P", "M"] {
            assert_eq!(phoneme_to_viseme(p), Viseme::PP);
        }
        assert_eq!(phoneme_to_viseme("AA1"), Viseme::AA);
        assert_eq!(phoneme_to_viseme("UW0"), Viseme::U);
        assert_eq!(phoneme_to_viseme("??"), Viseme::DD);
    }

    #[test]
    fn bilabial_run_merges_into_one_event() {
        let timeline = phonemes_to_timeline("B P M", 1.0);
        // One PP event plus the closing silence.
        assert_eq!(timeline.len(), 2);
        let first = &timeline.events()[0];
        assert_eq!(first.viseme_id, Viseme::PP as i64);
        assert_eq!(first.time_ms, 0.0);
        assert!((first.duration_ms - 3.0 * 64.0).abs() < 1e-9);
    }

    #[test]
    fn phoneme_timeline_is_cumulative() {
        let timeline = phonemes_to_timeline("HH AH0 L OW1", 1.0);
        let times: Vec<f64> = timeline.events().iter().map(|e| e.time_ms).collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(
            timeline.events().last().map(|e| e.viseme_id),
            Some(Viseme::Sil as i64)
        );
    }

    #[test]
    fn empty_phonemes_give_empty_timeline() {
        assert!(phonemes_to_timeline("", 1.0).is_empty());
        assert!(phonemes_to_timeline("sil sp", 1.0).is_empty());
    }
}
