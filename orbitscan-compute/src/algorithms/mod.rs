//! Spatial-coherence algorithms.
//!
//! Each algorithm works on the current item of an [`EngineContext`] and
//! either finishes it or queues a resumable remainder and suspends.

use crate::engine::EngineContext;

pub(crate) mod boundary_trace;
pub(crate) mod diffusion;
pub(crate) mod one_two_pass;
pub(crate) mod solid_guess;
pub(crate) mod tesseral;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Finished,
    /// Abort was requested; the remainder of the item is back on the list.
    Suspended,
}

/// Rows a symmetric item still owes after `done` rows were computed from
/// the top. The mirrored rows at the bottom are already painted.
pub(crate) fn remaining_y_stop(ctx: &EngineContext<'_>, row: i32) -> i32 {
    let mut y_stop = ctx.item.y_stop;
    if ctx.y_stop != ctx.item.y_stop {
        y_stop -= row - ctx.iy_start;
    }
    y_stop
}
