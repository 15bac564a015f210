// orbitscan-core/src/outcome.rs

use crate::{Complex, ResumeBlob};
use serde::{Deserialize, Serialize};

/// Result of iterating one pixel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelOutcome {
    /// Palette index written to the canvas.
    pub color: u32,
    /// Iterations actually performed (before any coloring adjustment).
    pub iterations: u64,
    /// The orbit left the bailout radius or was caught by a finite attractor.
    pub escaped: bool,
    #[serde(default)]
    pub attracted: bool,
    /// Cycle length when periodicity checking caught the orbit.
    #[serde(default)]
    pub period: Option<u64>,
    /// Last orbit value. Non-finite components are stored as 0.
    pub final_z: Complex,
}

impl PixelOutcome {
    /// Create a new PixelOutcome, sanitizing any NaN/Infinity in the final orbit value.
    /// serde_json writes non-finite floats as null, which would not deserialize.
    pub fn new(
        color: u32,
        iterations: u64,
        escaped: bool,
        attracted: bool,
        period: Option<u64>,
        final_z: Complex,
    ) -> Self {
        Self {
            color,
            iterations,
            escaped,
            attracted,
            period,
            final_z: Complex::new(
                Self::sanitize_f64(final_z.re, 0.0),
                Self::sanitize_f64(final_z.im, 0.0),
            ),
        }
    }

    #[inline]
    fn sanitize_f64(value: f64, default: f64) -> f64 {
        if value.is_finite() {
            value
        } else {
            default
        }
    }
}

/// Counters accumulated over a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Pixels handed to the iterator.
    pub pixels_computed: u64,
    /// Pixels taken from a progress record instead of being iterated again.
    pub pixels_replayed: u64,
    /// Orbit steps across all pixels.
    pub iterations: u64,
    /// Work items popped from the list.
    pub items_processed: u64,
    /// Abort polls issued.
    pub polls: u64,
}

/// How a run ended.
#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    Completed,
    /// Abort was requested. The blob resumes the run where it stopped.
    Interrupted(ResumeBlob),
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }

    pub fn resume_blob(&self) -> Option<&ResumeBlob> {
        match self {
            RunOutcome::Completed => None,
            RunOutcome::Interrupted(blob) => Some(blob),
        }
    }
}
