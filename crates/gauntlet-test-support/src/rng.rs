//! Test RNG — scripted dice for `DeterministicRng` consumers.

use gauntlet_core::rng::DeterministicRng;

/// Rolls the lowest face every time. Every pool it rolls is all botches,
/// which makes it the quickest way to force a fumble.
#[derive(Debug, Default)]
pub struct MockRng;

impl DeterministicRng for MockRng {
    fn next_u32_range(&mut self, min: u32, _max: u32) -> u32 {
        min
    }

    fn next_f64(&mut self) -> f64 {
        0.0
    }
}

/// Hands out scripted faces in order.
///
/// Panics when a face falls outside the requested range or the script runs
/// out, so a test that mis-counts its rolls fails loudly. Complication
/// rolls draw from the same script as pool dice.
#[derive(Debug)]
pub struct SequenceRng {
    faces: Vec<u32>,
    next: usize,
}

impl SequenceRng {
    /// Script the faces to hand out.
    #[must_use]
    pub fn new(faces: Vec<u32>) -> Self {
        Self { faces, next: 0 }
    }

    /// Faces handed out so far.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.next
    }

    /// True once every scripted face has been handed out.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.next >= self.faces.len()
    }
}

impl DeterministicRng for SequenceRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        let Some(&face) = self.faces.get(self.next) else {
            panic!("script exhausted after {} faces", self.faces.len());
        };
        self.next += 1;
        assert!(
            (min..=max).contains(&face),
            "scripted face {face} is outside {min}..={max}"
        );
        face
    }

    fn next_f64(&mut self) -> f64 {
        0.0
    }
}
