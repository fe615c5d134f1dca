//! Animation clips and the named mixer registry.
//!
//! The viewer keeps mixers in a registry keyed by caller-chosen names.
//! Looking up a missing name is an explicit error; everything else in the
//! viewer's error model is propagate-or-ignore, this is the one hard failure.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Result, anyhow};

#[derive(Clone, Debug)]
pub enum Keyframes {
    Translation(Vec<cgmath::Vector3<f32>>),
    Rotation(Vec<cgmath::Quaternion<f32>>),
    Scale(Vec<cgmath::Vector3<f32>>),
    Other,
}

/// One channel of a named animation: keyframes plus timing, targeting a
/// scene node by name.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub target: String,
    pub keyframes: Keyframes,
    pub timestamps: Vec<f32>,
}

/// Drives a set of clips against the frame clock.
#[derive(Debug, Default)]
pub struct AnimationMixer {
    clips: Vec<AnimationClip>,
    elapsed: Duration,
}

impl AnimationMixer {
    pub fn new(clips: Vec<AnimationClip>) -> Self {
        Self {
            clips,
            elapsed: Duration::ZERO,
        }
    }

    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn update(&mut self, dt: Duration) {
        self.elapsed += dt;
    }
}

/// Named mixers owned by the render driver.
#[derive(Debug, Default)]
pub struct MixerRegistry {
    mixers: HashMap<String, AnimationMixer>,
}

impl MixerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mixer under `name`, replacing any previous one.
    pub fn create(&mut self, name: &str, clips: Vec<AnimationClip>) {
        self.mixers.insert(name.to_string(), AnimationMixer::new(clips));
    }

    pub fn remove(&mut self, name: &str) -> Option<AnimationMixer> {
        self.mixers.remove(name)
    }

    /// Look up a mixer by name. A missing name is an error carrying the name.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut AnimationMixer> {
        self.mixers
            .get_mut(name)
            .ok_or_else(|| anyhow!("animation mixer `{name}` does not exist"))
    }

    pub fn update_all(&mut self, dt: Duration) {
        for mixer in self.mixers.values_mut() {
            mixer.update(dt);
        }
    }

    pub fn len(&self) -> usize {
        self.mixers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mixers.is_empty()
    }
}
