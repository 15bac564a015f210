// orbitscan-core/src/work_item.rs

use serde::{Deserialize, Serialize};

/// Which symmetry decisions have already been made for a region.
///
/// Bit `0x10`/`0x20` records that the horizontal/vertical axis split was
/// evaluated; bit `0x01`/`0x02` records that it succeeded and the region
/// is mirrored about that axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymmetryState(u8);

impl SymmetryState {
    pub const FRESH: SymmetryState = SymmetryState(0);
    /// Both axes evaluated, neither mirrored.
    pub const NO_MIRROR: SymmetryState = SymmetryState(0x30);

    const X_MIRRORED: u8 = 0x01;
    const Y_MIRRORED: u8 = 0x02;
    const X_DECIDED: u8 = 0x10;
    const Y_DECIDED: u8 = 0x20;

    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn x_decided(self) -> bool {
        self.0 & Self::X_DECIDED != 0
    }

    pub fn x_mirrored(self) -> bool {
        self.0 & Self::X_MIRRORED != 0
    }

    pub fn y_decided(self) -> bool {
        self.0 & Self::Y_DECIDED != 0
    }

    pub fn y_mirrored(self) -> bool {
        self.0 & Self::Y_MIRRORED != 0
    }

    pub fn mark_x_decided(&mut self) {
        self.0 |= Self::X_DECIDED;
    }

    pub fn mark_x_mirrored(&mut self) {
        self.0 |= Self::X_MIRRORED;
    }

    pub fn mark_y_decided(&mut self) {
        self.0 |= Self::Y_DECIDED;
    }

    pub fn mark_y_mirrored(&mut self) {
        self.0 |= Self::Y_MIRRORED;
    }
}

/// Rectangular region awaiting (or resuming) computation.
///
/// Bounds are inclusive pixel coordinates. `x_begin`/`y_begin` form the
/// resume cursor; `pass` is algorithm specific (two-pass pass number,
/// solid-guess pass, packed tesseral or diffusion cursor).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub x_start: i32,
    pub x_stop: i32,
    pub y_start: i32,
    pub y_stop: i32,
    pub x_begin: i32,
    pub y_begin: i32,
    pub pass: i32,
    pub sym: SymmetryState,
}

impl WorkItem {
    /// Fresh region with the cursor at its top-left corner.
    pub fn new(x_start: i32, x_stop: i32, y_start: i32, y_stop: i32) -> Self {
        Self {
            x_start,
            x_stop,
            y_start,
            y_stop,
            x_begin: x_start,
            y_begin: y_start,
            pass: 0,
            sym: SymmetryState::FRESH,
        }
    }

    /// Whole-canvas region.
    pub fn canvas(width: i32, height: i32) -> Self {
        Self::new(0, width - 1, 0, height - 1)
    }

    pub fn cursor(mut self, x_begin: i32, y_begin: i32) -> Self {
        self.x_begin = x_begin;
        self.y_begin = y_begin;
        self
    }

    pub fn with_pass(mut self, pass: i32) -> Self {
        self.pass = pass;
        self
    }

    pub fn with_sym(mut self, sym: SymmetryState) -> Self {
        self.sym = sym;
        self
    }

    /// True when no work has been done on this region yet.
    pub fn is_fresh(&self) -> bool {
        self.x_begin == self.x_start && self.y_begin == self.y_start
    }

    pub fn width(&self) -> i32 {
        self.x_stop - self.x_start + 1
    }

    pub fn height(&self) -> i32 {
        self.y_stop - self.y_start + 1
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x_start && x <= self.x_stop && y >= self.y_start && y <= self.y_stop
    }

    /// True when the region lies inside a `width` x `height` canvas.
    pub fn fits(&self, width: i32, height: i32) -> bool {
        self.x_start >= 0
            && self.y_start >= 0
            && self.x_start <= self.x_stop
            && self.y_start <= self.y_stop
            && self.x_stop < width
            && self.y_stop < height
    }
}
