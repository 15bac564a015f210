//! Partial progress of a suspended work item.
//!
//! Algorithms mark restart points while they work. When a run stops, the
//! item goes back on the list restartable from its last mark, and the
//! record below carries what the restart cannot rebuild on its own: the
//! iterator's cross-pixel periodicity state at the mark, the pixels computed
//! since the mark, and a little algorithm state.

use crate::WorkItem;
use serde::{Deserialize, Serialize};

/// Periodicity state carried from one orbit to the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbitCarry {
    /// The next orbit starts with the row-start delay.
    pub reset_periodicity: bool,
    /// Iteration after which the next orbit checks for cycles.
    pub old_color_iter: u64,
}

impl Default for OrbitCarry {
    fn default() -> Self {
        Self {
            reset_periodicity: true,
            old_color_iter: 0,
        }
    }
}

/// A pixel computed after the item's last restart point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedPixel {
    pub x: i32,
    pub y: i32,
    pub color: u32,
    /// Store value the pixel overwrote.
    pub previous: u32,
    /// `old_color_iter` after the orbit.
    pub old_color_iter: u64,
}

/// State an algorithm cannot recover from the item's cursor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmState {
    #[default]
    None,
    /// Solid guessing: non-zero words of the first-pass skip plane, as
    /// `(index, word)`.
    SkipFlags(Vec<(u32, u16)>),
    /// Boundary tracing: color of the scan pixel left of the cursor.
    Trail(u32),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemProgress {
    /// The pending item this record belongs to.
    pub item: WorkItem,
    pub carry: OrbitCarry,
    /// In computation order.
    pub pixels: Vec<ComputedPixel>,
    #[serde(default)]
    pub state: AlgorithmState,
}

impl ItemProgress {
    pub fn new(item: WorkItem, carry: OrbitCarry) -> Self {
        Self {
            item,
            carry,
            pixels: Vec::new(),
            state: AlgorithmState::None,
        }
    }

    /// True when every recorded pixel lies on a `width` x `height` canvas.
    /// Solid guessing computes a few pixels outside its item, so the item
    /// itself is no bound.
    pub fn fits(&self, width: i32, height: i32) -> bool {
        self.pixels
            .iter()
            .all(|p| p.x >= 0 && p.y >= 0 && p.x < width && p.y < height)
    }
}
