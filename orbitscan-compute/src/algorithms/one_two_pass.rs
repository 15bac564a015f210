//! Plain scan, optionally preceded by a quarter-density preview pass.

use super::{remaining_y_stop, Flow};
use crate::cancellation::Interrupted;
use crate::engine::EngineContext;
use orbitscan_core::{AlgorithmState, CalcMode, EngineError, WorkItem};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pass {
    /// Even rows and columns, each copied into its 2x2 block.
    Preview,
    Full,
}

struct Stopped {
    col: i32,
    row: i32,
}

pub(crate) fn run(ctx: &mut EngineContext<'_>) -> Result<Flow, EngineError> {
    if ctx.mode == CalcMode::TwoPass && ctx.item.pass == 0 {
        if let Err(at) = scan(ctx, Pass::Preview) {
            let item = ctx.resume_item(at.col, at.row, 0);
            ctx.suspend(item, AlgorithmState::None)?;
            return Ok(Flow::Suspended);
        }
        if !ctx.work_list.is_empty() {
            // Defer the second pass until every preview is on screen.
            let item = ctx.resume_item(ctx.item.x_start, ctx.item.y_start, 1);
            ctx.push_item(item)?;
            return Ok(Flow::Finished);
        }
        ctx.item.pass = 1;
        ctx.item.x_begin = ctx.item.x_start;
        ctx.item.y_begin = ctx.item.y_start;
    }

    if let Err(at) = scan(ctx, Pass::Full) {
        let y_stop = remaining_y_stop(ctx, at.row);
        let item = WorkItem::new(ctx.item.x_start, ctx.item.x_stop, at.row, y_stop)
            .cursor(at.col, at.row)
            .with_pass(ctx.item.pass)
            .with_sym(ctx.item.sym);
        ctx.suspend(item, AlgorithmState::None)?;
        return Ok(Flow::Suspended);
    }
    Ok(Flow::Finished)
}

/// Every pixel is a restart point, so a stop loses at most the orbit in
/// flight.
fn scan(ctx: &mut EngineContext<'_>, pass: Pass) -> Result<(), Stopped> {
    let every_pixel = pass == Pass::Preview || ctx.mode != CalcMode::TwoPass;
    let mut row = ctx.item.y_begin;
    let mut col = ctx.item.x_begin;
    // A restarted row continues the periodicity chain it was stopped in.
    let mut restored = ctx.restoring().is_some();

    while row <= ctx.y_stop {
        if !std::mem::take(&mut restored) {
            ctx.iterator.set_reset_periodicity(true);
        }
        while col <= ctx.x_stop {
            if every_pixel || row & 1 != 0 || col & 1 != 0 {
                ctx.checkpoint();
                let color = ctx
                    .calc_pixel(col, row)
                    .map_err(|Interrupted| Stopped { col, row })?;
                ctx.iterator.set_reset_periodicity(false);
                if pass == Pass::Preview {
                    if row & 1 == 0 && row < ctx.y_stop {
                        ctx.plot(col, row + 1, color);
                        if col & 1 == 0 && col < ctx.x_stop {
                            ctx.plot(col + 1, row + 1, color);
                        }
                    }
                    if col & 1 == 0 && col < ctx.x_stop {
                        col += 1;
                        ctx.plot(col, row, color);
                    }
                }
            }
            col += 1;
        }
        col = ctx.ix_start;
        if pass == Pass::Preview && row & 1 == 0 {
            row += 1;
        }
        row += 1;
    }
    Ok(())
}
