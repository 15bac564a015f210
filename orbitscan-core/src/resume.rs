//! Resume blob for interrupted runs.
//!
//! The blob records the run phase and the pending work list, with a
//! progress record for each item that was stopped part way. Everything else
//! (symmetry, block sizes, box stacks, counters) is rebuilt from the work
//! items when the run continues.

use crate::{EngineError, ItemProgress, WorkItem};
use serde::{Deserialize, Serialize};

/// Current blob format version.
pub const RESUME_VERSION: u32 = 3;

/// Upper bound on pending work items in a blob.
pub const MAX_WORK_ITEMS: usize = 12;

/// Which part of a run was active when it stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Single,
    /// First pass of a three-pass render (solid-guess preview).
    ThreePassGuess,
    /// Full render following the three-pass preview.
    ThreePassFinish,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeBlob {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    pub phase: RunPhase,
    pub items: Vec<WorkItem>,
    /// One record per suspended item in `items`.
    #[serde(default)]
    pub progress: Vec<ItemProgress>,
}

impl ResumeBlob {
    pub fn new(width: u32, height: u32, phase: RunPhase, items: Vec<WorkItem>) -> Self {
        Self {
            version: RESUME_VERSION,
            width,
            height,
            phase,
            items,
            progress: Vec::new(),
        }
    }

    pub fn with_progress(mut self, progress: Vec<ItemProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EngineError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse and check a blob. Version and structural problems are errors.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        let blob: ResumeBlob = serde_json::from_slice(bytes)?;
        blob.check()?;
        Ok(blob)
    }

    /// Structural checks that do not depend on the canvas being resumed into.
    pub fn check(&self) -> Result<(), EngineError> {
        if self.version != RESUME_VERSION {
            return Err(EngineError::ResumeVersion {
                found: self.version,
                expected: RESUME_VERSION,
            });
        }
        if self.items.is_empty() {
            return Err(EngineError::ResumeCorrupt(
                "no pending work items".to_string(),
            ));
        }
        if self.items.len() > MAX_WORK_ITEMS {
            return Err(EngineError::ResumeCorrupt(format!(
                "{} work items exceeds the limit of {}",
                self.items.len(),
                MAX_WORK_ITEMS
            )));
        }
        let (width, height) = (self.width as i32, self.height as i32);
        if let Some(item) = self.items.iter().find(|item| !item.fits(width, height)) {
            return Err(EngineError::ResumeCorrupt(format!(
                "work item {:?} lies outside the {}x{} canvas",
                item, self.width, self.height
            )));
        }
        for record in &self.progress {
            let owners = self.items.iter().filter(|item| **item == record.item).count();
            if owners != 1 {
                return Err(EngineError::ResumeCorrupt(format!(
                    "progress record for {:?} matches {} pending items",
                    record.item, owners
                )));
            }
            if !record.fits(width, height) {
                return Err(EngineError::ResumeCorrupt(format!(
                    "progress record for {:?} has pixels off the canvas",
                    record.item
                )));
            }
        }
        Ok(())
    }

    /// Check that the blob was produced for a canvas of this size.
    pub fn check_canvas(&self, width: u32, height: u32) -> Result<(), EngineError> {
        if self.width != width || self.height != height {
            return Err(EngineError::ResumeCorrupt(format!(
                "blob is for a {}x{} canvas, not {}x{}",
                self.width, self.height, width, height
            )));
        }
        Ok(())
    }
}
