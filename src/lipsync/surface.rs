//! Mouth surface trait shared by blend-shape rigs and 2D region warps.
//!
//! [`MouthSurface`] is the one narrow interface the lip-sync engine writes
//! to, so the timing logic never knows which renderer it is feeding.

use std::collections::BTreeMap;

use crate::viseme::{MouthTarget, Viseme};

/// Anything that can display a mouth shape.
pub trait MouthSurface {
    /// Deform the mouth toward `target` at `intensity ∈ [0, 1]`.
    fn apply_mouth_shape(&mut self, target: &MouthTarget, intensity: f32);

    /// Return the mouth to rest.
    fn reset_mouth(&mut self) {
        self.apply_mouth_shape(&MouthTarget::NEUTRAL, 0.0);
    }
}

impl<S: MouthSurface + ?Sized> MouthSurface for Box<S> {
    fn apply_mouth_shape(&mut self, target: &MouthTarget, intensity: f32) {
        (**self).apply_mouth_shape(target, intensity);
    }

    fn reset_mouth(&mut self) {
        (**self).reset_mouth();
    }
}

/// Morph-target weights for a 3D rig.
///
/// Exactly one viseme target carries weight at a time; applying a new shape
/// zeroes the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendShapeRig {
    weights: BTreeMap<&'static str, f32>,
}

impl Default for BlendShapeRig {
    fn default() -> Self {
        let weights = (0..15)
            .filter_map(Viseme::from_oculus_id)
            .map(|v| (v.morph_target(), 0.0))
            .collect();
        Self { weights }
    }
}

impl BlendShapeRig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current influence of `morph_target`, `0.0` if the rig has none.
    pub fn weight(&self, morph_target: &str) -> f32 {
        self.weights.get(morph_target).copied().unwrap_or(0.0)
    }

    /// The strongest target and its weight, if any is non-zero.
    pub fn dominant(&self) -> Option<(&'static str, f32)> {
        self.weights
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, w)| (*k, *w))
    }

    /// All weights, ordered by target name.
    pub fn weights(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        self.weights.iter().map(|(k, w)| (*k, *w))
    }
}

impl MouthSurface for BlendShapeRig {
    fn apply_mouth_shape(&mut self, target: &MouthTarget, intensity: f32) {
        for w in self.weights.values_mut() {
            *w = 0.0;
        }
        let intensity = if intensity.is_finite() {
            intensity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.weights.insert(target.morph_target, intensity);
    }
}
