//! Solid guessing.
//!
//! The first pass computes one pixel per block on a coarse grid and paints
//! whole blocks with it. Each following pass halves the block size and
//! guesses the three new corners of every block from their neighbours,
//! computing a corner only when its neighbours disagree. A computed corner
//! can expose a wrong guess from the row above, which is then recomputed.
//!
//! Blocks whose 3x3 neighbourhood needed no computation in the first pass
//! are skipped entirely in the later passes.
//!
//! Every block row is a restart point. A suspended item keeps the skip
//! flags gathered so far in its progress record.

use super::Flow;
use crate::cancellation::Interrupted;
use crate::engine::EngineContext;
use crate::symmetry::PlotMode;
use orbitscan_core::{AlgorithmState, EngineError};

/// Skip-flag words per grid row (block columns plus a border on each side).
const FLAG_COLS: usize = 202;
/// Grid rows of 16-bit words (16 block rows each, plus borders).
const FLAG_ROWS: usize = 7;
/// Largest block size tried before giving up on covering the canvas.
const MAX_GUESS_BLOCK: i32 = 1 << 14;

/// A pixel color, or `None` past the right or bottom edge.
type Sample = Option<u32>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Corner {
    Guessed,
    Computed,
    /// Past the region edge; never computed or shown.
    OffEdge,
}

/// Initial block size: 4 below 300 rows, doubling with every doubling of
/// the height, and large enough for the skip grid to cover the canvas.
fn initial_block_size(width: i32, height: i32) -> Result<i32, EngineError> {
    let mut block = 4;
    let mut rows = 300;
    while rows <= height {
        block += block;
        rows += rows;
    }
    let grid_cols = (FLAG_COLS - 2) as i32;
    let grid_rows = (FLAG_ROWS - 2) as i32 * 16;
    while block * grid_cols < width || block * grid_rows < height {
        block += block;
        if block > MAX_GUESS_BLOCK {
            return Err(EngineError::Resource(format!(
                "skip grid cannot cover a {width}x{height} canvas"
            )));
        }
    }
    Ok(block)
}

/// Two planes of per-block bits. Plane 1 collects "something was computed"
/// during the first pass; plane 0 holds the neighbourhood OR read by the
/// later passes. A clear bit in plane 0 means the block can be skipped.
struct SkipFlags {
    words: Vec<u16>,
}

impl SkipFlags {
    fn new() -> Result<Self, EngineError> {
        let len = 2 * FLAG_ROWS * FLAG_COLS;
        let mut words = Vec::new();
        words
            .try_reserve_exact(len)
            .map_err(|e| EngineError::Resource(format!("skip grid: {e}")))?;
        words.resize(len, 0);
        Ok(Self { words })
    }

    #[inline]
    fn index(plane: usize, row: usize, col: usize) -> usize {
        (plane * FLAG_ROWS + row) * FLAG_COLS + col
    }

    fn get(&self, plane: usize, row: usize, col: usize) -> u16 {
        self.words[Self::index(plane, row, col)]
    }

    fn set(&mut self, plane: usize, row: usize, col: usize, word: u16) {
        self.words[Self::index(plane, row, col)] = word;
    }

    fn plane(&mut self, plane: usize) -> &mut [u16] {
        let start = Self::index(plane, 0, 0);
        &mut self.words[start..start + FLAG_ROWS * FLAG_COLS]
    }

    fn fill(&mut self, plane: usize, word: u16) {
        self.plane(plane).fill(word);
    }

    /// Plane 1 for a progress record.
    fn saved(&mut self) -> AlgorithmState {
        let words = self
            .plane(1)
            .iter()
            .enumerate()
            .filter(|(_, word)| **word != 0)
            .map(|(index, &word)| (index as u32, word))
            .collect();
        AlgorithmState::SkipFlags(words)
    }

    fn restore(&mut self, saved: &[(u32, u16)]) -> Result<(), EngineError> {
        let plane = self.plane(1);
        plane.fill(0);
        for &(index, word) in saved {
            let slot = plane.get_mut(index as usize).ok_or_else(|| {
                EngineError::ResumeCorrupt(format!("skip flag index {index} out of range"))
            })?;
            *slot = word;
        }
        Ok(())
    }

    /// Plane 1 bits of a column and its left and right neighbours.
    fn triple(&self, row: usize, col: usize) -> u16 {
        self.get(1, row, col - 1) | self.get(1, row, col) | self.get(1, row, col + 1)
    }

    /// Build plane 0 from plane 1 after the first pass. `x_lim` and `y_lim`
    /// are the border column and word row.
    fn spread(&mut self, x_lim: usize, y_lim: usize, bottom_row: i32) {
        // Guessing is never trusted at the right and bottom edges.
        for y in 0..=y_lim {
            self.set(1, y, x_lim, 0xffff);
        }
        let edge_row = (bottom_row / 16 + 1) as usize;
        let edge_bit = 1u16 << (bottom_row & 15);
        for x in 0..=x_lim {
            let word = self.get(1, edge_row, x) | edge_bit;
            self.set(1, edge_row, x, word);
        }

        for y in 1..y_lim {
            for x in 1..x_lim {
                let u = self.triple(y, x);
                let word = u
                    | (u >> 1)
                    | (u << 1)
                    | (self.triple(y - 1, x) >> 15)
                    | (self.triple(y + 1, x) << 15);
                self.set(0, y, x, word);
            }
        }
    }
}

fn sample(ctx: &EngineContext<'_>, x: i32, y: i32) -> Sample {
    Some(ctx.store.get_pixel(x, y))
}

struct SolidGuess {
    max_block: i32,
    half_block: i32,
    /// Region start rounded down to the block grid.
    ix_start: i32,
    /// Paint pixel by pixel instead of collecting whole rows.
    guess_plot: bool,
    flags: SkipFlags,
    /// First-pass rows for the top and bottom halves of a block row.
    rows: [Vec<u32>; 2],
}

impl SolidGuess {
    fn new(ctx: &EngineContext<'_>, max_block: i32) -> Result<Self, EngineError> {
        let align = !(max_block - 1);
        let width = ctx.width as usize;
        Ok(Self {
            max_block,
            half_block: max_block >> 1,
            ix_start: ctx.ix_start & align,
            guess_plot: ctx.plots_scattered(),
            flags: SkipFlags::new()?,
            rows: [vec![0; width], vec![0; width]],
        })
    }

    fn align(&self, v: i32) -> i32 {
        v & !(self.max_block - 1)
    }

    /// Turn the first-pass flags into the skip plane of the later passes.
    fn spread_flags(&mut self, ctx: &EngineContext<'_>) {
        let max_block = self.max_block;
        let x_lim = ((ctx.x_stop + max_block) / max_block + 1) as usize;
        let y_lim = (((ctx.y_stop + max_block) / max_block + 15) / 16 + 1) as usize;
        let bottom_row = (ctx.y_stop + max_block) / max_block + 1;
        self.flags.spread(x_lim, y_lim, bottom_row);
    }

    /// Compute one pixel per block along `row`.
    fn calc_grid_row(&self, ctx: &mut EngineContext<'_>, row: i32) -> Result<(), Interrupted> {
        ctx.iterator.set_reset_periodicity(true);
        for col in (self.ix_start..=ctx.x_stop).step_by(self.max_block as usize) {
            ctx.calc_pixel(col, row)?;
            ctx.iterator.set_reset_periodicity(false);
        }
        Ok(())
    }

    /// Resolve one row of blocks of size `block` whose top-left corners lie
    /// on row `y`.
    fn guess_row(
        &mut self,
        ctx: &mut EngineContext<'_>,
        first_pass: bool,
        y: i32,
        block: i32,
    ) -> Result<(), Interrupted> {
        let half = block >> 1;
        self.half_block = half;
        let block_row = y / self.max_block;
        let word_row = (block_row >> 4) as usize + 1;
        let mask = 1u16 << (block_row & 15);
        let mut flag_col = (self.ix_start / self.max_block) as usize;

        let y_less_half = y - half;
        let y_less_block = y - block;
        let y_plus_half = y + half;
        let y_plus_block = y + block;
        let above = if y > 0 { y_less_half } else { 0 };

        let mut prev11: Sample = None;
        let mut c22 = sample(ctx, self.ix_start, y);
        let (mut c12, mut c13) = (c22, c22);
        let mut c21 = sample(ctx, self.ix_start, above);
        let mut c31 = c21;
        let mut c24 = if y_plus_block <= ctx.y_stop {
            sample(ctx, self.ix_start, y_plus_block)
        } else {
            None
        };
        let mut guessed12 = Corner::Computed;
        let mut guessed13 = Corner::Computed;

        let mut x = self.ix_start;
        while x <= ctx.x_stop {
            if x & (self.max_block - 1) == 0 {
                flag_col += 1;
                if !first_pass && self.flags.get(0, word_row, flag_col) & mask == 0 {
                    x += self.max_block;
                    prev11 = c22;
                    c31 = c22;
                    c21 = c22;
                    c24 = c22;
                    c12 = c22;
                    c13 = c22;
                    guessed12 = Corner::Computed;
                    guessed13 = Corner::Computed;
                    continue;
                }
            }

            if first_pass {
                self.plot_block(ctx, Some(0), x, y, c22);
            }

            let x_plus_half = x + half;
            let x_plus_block = x_plus_half + half;
            if x_plus_half > ctx.x_stop {
                c31 = None;
            } else if y > 0 {
                c31 = sample(ctx, x_plus_half, y_less_half);
            }
            let (c41, c42, c44) = if x_plus_block <= ctx.x_stop {
                let c44 = if y_plus_block <= ctx.y_stop {
                    sample(ctx, x_plus_block, y_plus_block)
                } else {
                    None
                };
                (
                    sample(ctx, x_plus_block, above),
                    sample(ctx, x_plus_block, y),
                    c44,
                )
            } else {
                (None, None, None)
            };

            let mut guessed23 = Corner::Guessed;
            let mut guessed32 = Corner::Guessed;
            let mut guessed33 = Corner::Guessed;
            let mut c23 = c22;
            let mut c32 = c22;
            let mut c33 = c22;
            if y_plus_half > ctx.y_stop {
                c23 = None;
                c33 = None;
                guessed23 = Corner::OffEdge;
                guessed33 = Corner::OffEdge;
                guessed13 = Corner::Computed;
            }
            if x_plus_half > ctx.x_stop {
                c32 = None;
                c33 = None;
                guessed32 = Corner::OffEdge;
                guessed33 = Corner::OffEdge;
            }

            loop {
                if guessed33 == Corner::Guessed
                    && (c33 != c44 || c33 != c42 || c33 != c24 || c33 != c32 || c33 != c23)
                {
                    c33 = Some(ctx.calc_pixel(x_plus_half, y_plus_half)?);
                    guessed33 = Corner::Computed;
                }
                if guessed32 == Corner::Guessed
                    && (c32 != c33
                        || c32 != c42
                        || c32 != c31
                        || c32 != c21
                        || c32 != c41
                        || c32 != c23)
                {
                    c32 = Some(ctx.calc_pixel(x_plus_half, y)?);
                    guessed32 = Corner::Computed;
                    continue;
                }
                if guessed23 == Corner::Guessed
                    && (c23 != c33 || c23 != c24 || c23 != c13 || c23 != c12 || c23 != c32)
                {
                    c23 = Some(ctx.calc_pixel(x, y_plus_half)?);
                    guessed23 = Corner::Computed;
                    continue;
                }
                break;
            }

            if first_pass
                && (guessed23 == Corner::Computed
                    || guessed32 == Corner::Computed
                    || guessed33 == Corner::Computed)
            {
                let word = self.flags.get(1, word_row, flag_col) | mask;
                self.flags.set(1, word_row, flag_col, word);
            }

            if half > 1 {
                if first_pass {
                    if self.guess_plot {
                        if let (Corner::Guessed, Some(c)) = (guessed23, c23) {
                            ctx.plot(x, y_plus_half, c);
                        }
                        if let (Corner::Guessed, Some(c)) = (guessed32, c32) {
                            ctx.plot(x_plus_half, y, c);
                        }
                        if let (Corner::Guessed, Some(c)) = (guessed33, c33) {
                            ctx.plot(x_plus_half, y_plus_half, c);
                        }
                    }
                    self.plot_block(ctx, Some(1), x, y_plus_half, c23);
                    self.plot_block(ctx, Some(0), x_plus_half, y, c32);
                    self.plot_block(ctx, Some(1), x_plus_half, y_plus_half, c33);
                } else {
                    if c23 != c22 {
                        self.plot_block(ctx, None, x, y_plus_half, c23);
                    }
                    if c32 != c22 {
                        self.plot_block(ctx, None, x_plus_half, y, c32);
                    }
                    if c33 != c22 {
                        self.plot_block(ctx, None, x_plus_half, y_plus_half, c33);
                    }
                }
            }

            // Fix guesses from the previous row that this block contradicts.
            let fix21 = (c22 != c12 || c22 != c32)
                && c21 == c22
                && c21 == c31
                && c21 == prev11
                && y > 0
                && (x == self.ix_start || c21 == sample(ctx, x - half, y_less_block))
                && (x_plus_half > ctx.x_stop || c21 == sample(ctx, x_plus_half, y_less_block))
                && c21 == sample(ctx, x, y_less_block);
            let fix31 = c22 != c32
                && c31 == c22
                && c31 == c42
                && c31 == c21
                && c31 == c41
                && y > 0
                && x_plus_half <= ctx.x_stop
                && c31 == sample(ctx, x_plus_half, y_less_block)
                && (x_plus_block > ctx.x_stop || c31 == sample(ctx, x_plus_block, y_less_block))
                && c31 == sample(ctx, x, y_less_block);
            prev11 = c31;
            if fix21 {
                c21 = Some(ctx.calc_pixel(x, y_less_half)?);
                if half > 1 && c21 != c22 {
                    self.plot_block(ctx, None, x, y_less_half, c21);
                }
            }
            if fix31 {
                c31 = Some(ctx.calc_pixel(x_plus_half, y_less_half)?);
                if half > 1 && c31 != c22 {
                    self.plot_block(ctx, None, x_plus_half, y_less_half, c31);
                }
            }
            if c23 != c22 {
                if guessed12 == Corner::Guessed {
                    c12 = Some(ctx.calc_pixel(x - half, y)?);
                    if half > 1 && c12 != c22 {
                        self.plot_block(ctx, None, x - half, y, c12);
                    }
                }
                if guessed13 == Corner::Guessed {
                    c13 = Some(ctx.calc_pixel(x - half, y_plus_half)?);
                    if half > 1 && c13 != c22 {
                        self.plot_block(ctx, None, x - half, y_plus_half, c13);
                    }
                }
            }

            c22 = c42;
            c24 = c44;
            c13 = c33;
            c21 = c41;
            c31 = c41;
            c12 = c32;
            guessed12 = guessed32;
            guessed13 = guessed33;
            x += block;
        }

        if first_pass && !self.guess_plot {
            self.put_rows(ctx, y);
        }
        Ok(())
    }

    /// Write the collected first-pass rows, and their mirrors when the
    /// region is mirrored across the horizontal axis.
    fn put_rows(&mut self, ctx: &mut EngineContext<'_>, y: i32) {
        let half = self.half_block;
        let (left, right) = (ctx.item.x_start, ctx.x_stop);
        let span = left as usize..=right as usize;

        for i in 0..half {
            for (buffer, row) in [(0, y + i), (1, y + i + half)] {
                if row <= ctx.y_stop {
                    ctx.store.put_row(row, left, &self.rows[buffer][span.clone()]);
                }
            }
        }

        if ctx.plot_mode == PlotMode::Plain {
            return;
        }
        if ctx.plot_mode == PlotMode::Origin {
            for buffer in &mut self.rows {
                buffer[span.clone()].reverse();
            }
        }
        for i in 0..half {
            for (buffer, row) in [(0, y + i), (1, y + i + half)] {
                if let Some(mirror) = ctx.mirror_row(row) {
                    ctx.store.put_row(mirror, left, &self.rows[buffer][span.clone()]);
                }
            }
        }
    }

    /// Paint the `half_block` square at `(x, y)` except its top-left pixel.
    /// First-pass blocks go to the row buffers instead, unless they lie left
    /// of the region (grid alignment) or rows are painted pixel by pixel.
    fn plot_block(
        &mut self,
        ctx: &mut EngineContext<'_>,
        buffer: Option<usize>,
        x: i32,
        y: i32,
        color: Sample,
    ) {
        let Some(color) = color else {
            return;
        };
        let x_lim = (x + self.half_block).min(ctx.x_stop + 1);
        if let Some(buffer) = buffer {
            if !self.guess_plot {
                if x < x_lim {
                    self.rows[buffer][x as usize..x_lim as usize].fill(color);
                }
                if x >= ctx.item.x_start {
                    return;
                }
            }
        }

        let mut y_lim = y + self.half_block;
        if y_lim > ctx.y_stop {
            if y > ctx.y_stop {
                return;
            }
            y_lim = ctx.y_stop + 1;
        }
        for i in x + 1..x_lim {
            ctx.plot(i, y, color);
        }
        for row in y + 1..y_lim {
            for i in x..x_lim {
                ctx.plot(i, row, color);
            }
        }
    }
}

pub(crate) fn run(ctx: &mut EngineContext<'_>) -> Result<Flow, EngineError> {
    let max_block = initial_block_size(ctx.width, ctx.height)?;
    let mut guess = SolidGuess::new(ctx, max_block)?;
    let yy_start = ctx.item.y_start;
    let first_row = guess.align(yy_start);
    let saved_flags = match ctx.restoring() {
        Some(AlgorithmState::SkipFlags(words)) => Some(words),
        _ => None,
    };
    // The cursor row of a restarted later pass is exact; a first-pass cursor
    // and a fresh item are rounded to the block grid.
    let mut start_row = match saved_flags {
        Some(_) if ctx.item.pass > 0 => ctx.item.y_begin,
        _ => guess.align(ctx.item.y_begin),
    };
    let mut block = max_block;
    log::debug!(
        "solid guess from block size {} (pass {}, row {})",
        max_block,
        ctx.item.pass,
        start_row
    );

    if ctx.item.pass == 0 {
        match &saved_flags {
            Some(words) => guess.flags.restore(words)?,
            None if start_row == first_row => guess.flags.fill(1, 0),
            None => guess.flags.fill(1, 0xffff),
        }

        let mut y = start_row;
        while y <= ctx.y_stop {
            ctx.checkpoint();
            let mut step = Ok(());
            if y == first_row {
                step = guess.calc_grid_row(ctx, y);
            }
            if y + block <= ctx.y_stop {
                step = step.and_then(|()| guess.calc_grid_row(ctx, y + block));
            }
            ctx.iterator.set_reset_periodicity(false);
            let step = step.and_then(|()| guess.guess_row(ctx, true, y, block));
            if step.is_err() {
                let item = ctx.resume_item(ctx.item.x_start, y, 0);
                ctx.suspend(item, guess.flags.saved())?;
                return Ok(Flow::Suspended);
            }
            y += block;
        }

        if ctx.three_pass {
            return Ok(Flow::Finished);
        }
        if !ctx.work_list.is_empty() {
            // Refine after every other item has shown its first pass.
            ctx.checkpoint();
            let item = ctx.resume_item(ctx.item.x_start, first_row, 1);
            ctx.suspend(item, guess.flags.saved())?;
            return Ok(Flow::Finished);
        }
        ctx.item.pass = 1;
        start_row = first_row;
        guess.spread_flags(ctx);
    } else if let Some(words) = &saved_flags {
        guess.flags.restore(words)?;
        guess.spread_flags(ctx);
    } else {
        guess.flags.fill(0, 0xffff);
    }

    if ctx.three_pass {
        return Ok(Flow::Finished);
    }

    for _ in 1..ctx.item.pass {
        block >>= 1;
    }
    if saved_flags.is_none() {
        ctx.iterator.set_reset_periodicity(false);
    }
    loop {
        block >>= 1;
        if block < 2 {
            break;
        }
        let stop_pass = i64::from(ctx.config.stop_pass);
        if stop_pass > 0 && i64::from(ctx.item.pass) >= stop_pass {
            return Ok(Flow::Finished);
        }

        let mut y = start_row;
        while y <= ctx.y_stop {
            ctx.checkpoint();
            if guess.guess_row(ctx, false, y, block).is_err() {
                let item = ctx.resume_item(ctx.item.x_start, y, ctx.item.pass);
                ctx.suspend(item, guess.flags.saved())?;
                return Ok(Flow::Suspended);
            }
            y += block;
        }
        ctx.item.pass += 1;

        if !ctx.work_list.is_empty() && block > 2 {
            ctx.checkpoint();
            let item = ctx.resume_item(ctx.item.x_start, first_row, ctx.item.pass);
            ctx.suspend(item, guess.flags.saved())?;
            return Ok(Flow::Finished);
        }
        start_row = first_row;
    }
    Ok(Flow::Finished)
}
