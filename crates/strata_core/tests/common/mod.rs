//! Shared fixtures for the entity store tests.

#![allow(dead_code)]

use std::collections::HashMap;

use strata_core::{VisualBackend, VisualHandle};
use strata_shared::Vec3;

/// Visual backend that records every call.
#[derive(Debug, Default)]
pub struct RecordingVisuals {
    pub positions: HashMap<VisualHandle, Vec3>,
    pub disposed: Vec<VisualHandle>,
}

impl VisualBackend for RecordingVisuals {
    fn set_visual_position(&mut self, visual: VisualHandle, position: Vec3) {
        self.positions.insert(visual, position);
    }

    fn dispose_visual(&mut self, visual: VisualHandle) {
        self.disposed.push(visual);
    }
}

/// Approximate vector equality.
pub fn assert_close(actual: Vec3, expected: Vec3) {
    assert!(
        actual.distance(expected) < 1e-5,
        "expected {expected:?}, got {actual:?}"
    );
}
