//! Viseme timelines: ingestion, normalization and active-event lookup.
//!
//! A timeline is built once per utterance from the synthesizer's
//! `{ time, viseme_id }` pairs. Times are normalized to milliseconds at
//! ingestion, the sequence is sorted, and each event's duration is derived
//! from its successor. Lookups never fail: before the first event nothing is
//! active, and past the last event the last one holds.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AnimationError, Result};

/// Duration given to the final event when the caller does not pick one.
pub const DEFAULT_FALLBACK_DURATION_MS: f64 = 150.0;

/// Unit of the raw `time` values in a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    #[default]
    Milliseconds,
}

impl TimeUnit {
    fn to_ms(self, value: f64) -> f64 {
        match self {
            Self::Seconds => value * 1000.0,
            Self::Milliseconds => value,
        }
    }
}

/// One raw viseme mark as delivered by the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawViseme {
    /// Offset from audio start, in the payload's [`TimeUnit`].
    #[serde(alias = "offset", alias = "audio_offset")]
    pub time: f64,
    /// Integer viseme code. Signed so that out-of-range codes reach the
    /// mapping (and resolve to neutral) instead of failing the whole payload.
    #[serde(alias = "visemeId", alias = "id")]
    pub viseme_id: i64,
}

/// Wire shape of the synthesizer's viseme side channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisemePayload {
    #[serde(default)]
    pub unit: TimeUnit,
    #[serde(default)]
    pub events: Vec<RawViseme>,
}

impl VisemePayload {
    /// Parse a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`AnimationError::Payload`] when the JSON does not match the
    /// expected shape. Semantically odd content (unsorted, NaN times) is
    /// repaired later by [`VisemeTimeline::from_payload`], not rejected here.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AnimationError::Payload(e.to_string()))
    }

    /// Normalize into a timeline.
    pub fn into_timeline(self, fallback_duration_ms: f64) -> VisemeTimeline {
        VisemeTimeline::from_payload(&self, fallback_duration_ms)
    }
}

/// A normalized viseme event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisemeEvent {
    /// Offset from audio start in milliseconds.
    pub time_ms: f64,
    /// Integer viseme code, as delivered.
    pub viseme_id: i64,
    /// Time until the next event, or the fallback for the last one.
    pub duration_ms: f64,
}

impl VisemeEvent {
    pub fn end_ms(&self) -> f64 {
        self.time_ms + self.duration_ms
    }
}

/// The ordered, immutable viseme sequence for one utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisemeTimeline {
    events: Vec<VisemeEvent>,
}

impl VisemeTimeline {
    /// Build from `(time, viseme_id)` pairs in `unit`.
    ///
    /// Non-finite and negative times are dropped with a warning; the rest
    /// are stably sorted by time.
    pub fn from_raw<I>(raw: I, unit: TimeUnit, fallback_duration_ms: f64) -> Self
    where
        I: IntoIterator<Item = (f64, i64)>,
    {
        let mut dropped = 0usize;
        let mut points: Vec<(f64, i64)> = raw
            .into_iter()
            .filter_map(|(time, id)| {
                let ms = unit.to_ms(time);
                if ms.is_finite() && ms >= 0.0 {
                    Some((ms, id))
                } else {
                    dropped += 1;
                    None
                }
            })
            .collect();
        if dropped > 0 {
            warn!(dropped, "discarded viseme events with invalid timestamps");
        }

        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let fallback = if fallback_duration_ms.is_finite() && fallback_duration_ms >= 0.0 {
            fallback_duration_ms
        } else {
            DEFAULT_FALLBACK_DURATION_MS
        };

        let events = points
            .iter()
            .enumerate()
            .map(|(i, &(time_ms, viseme_id))| {
                let duration_ms = points
                    .get(i + 1)
                    .map_or(fallback, |&(next, _)| next - time_ms);
                VisemeEvent {
                    time_ms,
                    viseme_id,
                    duration_ms,
                }
            })
            .collect();

        Self { events }
    }

    /// Build from a parsed payload.
    pub fn from_payload(payload: &VisemePayload, fallback_duration_ms: f64) -> Self {
        Self::from_raw(
            payload.events.iter().map(|e| (e.time, e.viseme_id)),
            payload.unit,
            fallback_duration_ms,
        )
    }

    pub fn events(&self) -> &[VisemeEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// End of the last event in milliseconds, `0.0` when empty.
    pub fn total_duration_ms(&self) -> f64 {
        self.events.last().map_or(0.0, VisemeEvent::end_ms)
    }

    /// Index of the event active at `current_ms`: the last one whose start
    /// is `<= current_ms`.
    pub fn active_index(&self, current_ms: f64) -> Option<usize> {
        if current_ms.is_nan() {
            return None;
        }
        self.events
            .partition_point(|e| e.time_ms <= current_ms)
            .checked_sub(1)
    }

    /// The event active at `current_ms`.
    pub fn active_event(&self, current_ms: f64) -> Option<&VisemeEvent> {
        self.active_index(current_ms).map(|i| &self.events[i])
    }

    /// The event after `index`, if any.
    pub fn next_after(&self, index: usize) -> Option<&VisemeEvent> {
        self.events.get(index + 1)
    }
}
