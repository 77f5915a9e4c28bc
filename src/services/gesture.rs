use serde::{Deserialize, Serialize};

use crate::models::Direction;

pub const DEFAULT_SWIPE_THRESHOLD: f64 = 150.0;

/// Drag state at the moment the card is released
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DragRelease {
    /// Horizontal displacement from rest; positive is rightwards
    pub dx: f64,
    /// Horizontal velocity, when the input device reports one.
    /// Accepted from the client; not used to resolve the gesture.
    #[serde(default)]
    pub velocity: Option<f64>,
}

impl DragRelease {
    pub fn new(dx: f64) -> Self {
        Self { dx, velocity: None }
    }
}

/// What a release resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureOutcome {
    Decided(Direction),
    /// Below threshold: the card returns to rest and stays on top
    SnapBack,
}

/// Resolves a release against a displacement threshold.
///
/// Strictly beyond `+threshold` keeps, strictly beyond `-threshold`
/// discards. Anything else, including non-finite input, snaps back.
pub fn resolve_gesture(release: DragRelease, threshold: f64) -> GestureOutcome {
    let dx = release.dx;
    if !dx.is_finite() {
        return GestureOutcome::SnapBack;
    }

    if dx > threshold {
        GestureOutcome::Decided(Direction::Keep)
    } else if dx < -threshold {
        GestureOutcome::Decided(Direction::Discard)
    } else {
        GestureOutcome::SnapBack
    }
}
