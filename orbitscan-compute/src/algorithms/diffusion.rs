//! Diffusion scan.
//!
//! The region is cut into square tiles of side `2^k`. A counter walks an
//! ordering of the positions inside one tile that spreads successive
//! positions far apart; each position is computed in every tile at once.
//! During the first half of the ordering each computed pixel also paints a
//! block around it, so the whole image is visible early and sharpens as
//! the scan proceeds.
//!
//! Each counter step is a restart point; the pixels of a step that was cut
//! short travel in the item's progress record.

use super::Flow;
use crate::cancellation::Interrupted;
use crate::engine::EngineContext;
use orbitscan_core::{AlgorithmState, EngineError};

/// Largest counter width, three table lookups of four bits per axis.
const MAX_BITS: u32 = 24;

/// Column nibble for each counter byte.
#[rustfmt::skip]
const DIFFUSION_LA: [u8; 256] = [
    0, 8, 0, 8, 4, 12, 4, 12, 0, 8, 0, 8, 4, 12, 4, 12,
    2, 10, 2, 10, 6, 14, 6, 14, 2, 10, 2, 10, 6, 14, 6, 14,
    0, 8, 0, 8, 4, 12, 4, 12, 0, 8, 0, 8, 4, 12, 4, 12,
    2, 10, 2, 10, 6, 14, 6, 14, 2, 10, 2, 10, 6, 14, 6, 14,
    1, 9, 1, 9, 5, 13, 5, 13, 1, 9, 1, 9, 5, 13, 5, 13,
    3, 11, 3, 11, 7, 15, 7, 15, 3, 11, 3, 11, 7, 15, 7, 15,
    1, 9, 1, 9, 5, 13, 5, 13, 1, 9, 1, 9, 5, 13, 5, 13,
    3, 11, 3, 11, 7, 15, 7, 15, 3, 11, 3, 11, 7, 15, 7, 15,
    0, 8, 0, 8, 4, 12, 4, 12, 0, 8, 0, 8, 4, 12, 4, 12,
    2, 10, 2, 10, 6, 14, 6, 14, 2, 10, 2, 10, 6, 14, 6, 14,
    0, 8, 0, 8, 4, 12, 4, 12, 0, 8, 0, 8, 4, 12, 4, 12,
    2, 10, 2, 10, 6, 14, 6, 14, 2, 10, 2, 10, 6, 14, 6, 14,
    1, 9, 1, 9, 5, 13, 5, 13, 1, 9, 1, 9, 5, 13, 5, 13,
    3, 11, 3, 11, 7, 15, 7, 15, 3, 11, 3, 11, 7, 15, 7, 15,
    1, 9, 1, 9, 5, 13, 5, 13, 1, 9, 1, 9, 5, 13, 5, 13,
    3, 11, 3, 11, 7, 15, 7, 15, 3, 11, 3, 11, 7, 15, 7, 15,
];

/// Row nibble for each counter byte.
#[rustfmt::skip]
const DIFFUSION_LB: [u8; 256] = [
    0, 8, 8, 0, 4, 12, 12, 4, 4, 12, 12, 4, 8, 0, 0, 8,
    2, 10, 10, 2, 6, 14, 14, 6, 6, 14, 14, 6, 10, 2, 2, 10,
    2, 10, 10, 2, 6, 14, 14, 6, 6, 14, 14, 6, 10, 2, 2, 10,
    4, 12, 12, 4, 8, 0, 0, 8, 8, 0, 0, 8, 12, 4, 4, 12,
    1, 9, 9, 1, 5, 13, 13, 5, 5, 13, 13, 5, 9, 1, 1, 9,
    3, 11, 11, 3, 7, 15, 15, 7, 7, 15, 15, 7, 11, 3, 3, 11,
    3, 11, 11, 3, 7, 15, 15, 7, 7, 15, 15, 7, 11, 3, 3, 11,
    5, 13, 13, 5, 9, 1, 1, 9, 9, 1, 1, 9, 13, 5, 5, 13,
    1, 9, 9, 1, 5, 13, 13, 5, 5, 13, 13, 5, 9, 1, 1, 9,
    3, 11, 11, 3, 7, 15, 15, 7, 7, 15, 15, 7, 11, 3, 3, 11,
    3, 11, 11, 3, 7, 15, 15, 7, 7, 15, 15, 7, 11, 3, 3, 11,
    5, 13, 13, 5, 9, 1, 1, 9, 9, 1, 1, 9, 13, 5, 5, 13,
    2, 10, 10, 2, 6, 14, 14, 6, 6, 14, 14, 6, 10, 2, 2, 10,
    4, 12, 12, 4, 8, 0, 0, 8, 8, 0, 0, 8, 12, 4, 4, 12,
    4, 12, 12, 4, 8, 0, 0, 8, 8, 0, 0, 8, 12, 4, 4, 12,
    6, 14, 14, 6, 10, 2, 2, 10, 10, 2, 2, 10, 14, 6, 6, 14,
];

/// Position inside a tile for `counter`. The first counter byte selects the
/// most significant nibble.
fn tile_position(counter: u32, offset: u32) -> (i32, i32) {
    let mut x = 0i32;
    let mut y = 0i32;
    for byte in counter.to_le_bytes().into_iter().take(3) {
        x = (x << 4) + i32::from(DIFFUSION_LA[usize::from(byte)]);
        y = (y << 4) + i32::from(DIFFUSION_LB[usize::from(byte)]);
    }
    (x >> offset, y >> offset)
}

/// Side of the preview block painted for `counter`: the whole tile at
/// first, halving each time the counter doubles.
fn block_size(bits: u32, counter: u32) -> i32 {
    let lg = counter.checked_ilog2().map_or(-1, |l| l as i32);
    1 << ((bits as i32 - lg - 1) / 2)
}

struct Diffusion {
    /// Counter width; twice the tile's log2 side.
    bits: u32,
    tile: i32,
    offset: u32,
    /// Whole tiles across and down.
    nx: i32,
    ny: i32,
    /// Width and height of the partial tiles at the right and bottom.
    rem_x: i32,
    rem_y: i32,
    counter: u32,
}

impl Diffusion {
    fn new(ctx: &EngineContext<'_>) -> Result<Self, EngineError> {
        let width = ctx.x_stop - ctx.ix_start + 1;
        let height = ctx.y_stop - ctx.iy_start + 1;
        let side = width.min(height).max(1) as u32;
        let bits = side.ilog2() * 2;
        if bits > MAX_BITS {
            return Err(EngineError::Resource(format!(
                "diffusion counter needs {bits} bits for a {width}x{height} region, limit is {MAX_BITS}"
            )));
        }
        let tile = 1i32 << (bits / 2);
        let nx = width / tile;
        let ny = height / tile;

        let counter = Self::decode_counter(ctx, bits)?;
        Ok(Self {
            bits,
            tile,
            offset: 12 - bits / 2,
            nx,
            ny,
            rem_x: width - nx * tile,
            rem_y: height - ny * tile,
            counter,
        })
    }

    /// The counter is stored as rows past the item's top (high word) and
    /// the pass number (low word).
    fn decode_counter(ctx: &EngineContext<'_>, bits: u32) -> Result<u32, EngineError> {
        let high = ctx.item.y_begin - ctx.iy_start;
        let low = ctx.item.pass;
        let counter = u32::try_from(high)
            .ok()
            .filter(|h| *h <= 0xffff)
            .zip(u32::try_from(low).ok().filter(|l| *l <= 0xffff))
            .map(|(h, l)| (h << 16) | l)
            .filter(|c| *c < 1 << bits);
        counter.ok_or_else(|| {
            EngineError::ResumeCorrupt(format!(
                "diffusion cursor ({high}, {low}) out of range for {bits} bits"
            ))
        })
    }

    fn limit(&self) -> u32 {
        1 << self.bits
    }

    /// Compute the pixel at `(col_off, row_off)` in every tile, painting a
    /// `block`-sized square from each when given.
    fn visit(
        &self,
        ctx: &mut EngineContext<'_>,
        col_off: i32,
        row_off: i32,
        block: Option<i32>,
    ) -> Result<(), Interrupted> {
        for i in 0..=self.nx {
            if i == self.nx && col_off >= self.rem_x {
                break;
            }
            let col = ctx.ix_start + col_off + i * self.tile;
            for j in 0..=self.ny {
                if j == self.ny && row_off >= self.rem_y {
                    break;
                }
                let row = ctx.iy_start + row_off + j * self.tile;
                ctx.iterator.set_reset_periodicity(true);
                let color = ctx.calc_pixel(col, row)?;
                ctx.iterator.set_reset_periodicity(false);
                if let Some(size) = block.filter(|s| *s > 1) {
                    let right = (col + size - 1).min(ctx.x_stop);
                    let bottom = (row + size - 1).min(ctx.y_stop);
                    for y in row..=bottom {
                        ctx.fill_line(y, col, right, color);
                    }
                }
            }
        }
        Ok(())
    }

    fn scan(&mut self, ctx: &mut EngineContext<'_>) -> Result<(), Interrupted> {
        let preview = ctx.config.fill_color != Some(0);
        let half = self.limit() >> 1;
        while self.counter < half {
            ctx.checkpoint();
            let (col, row) = tile_position(self.counter, self.offset);
            let block = preview.then(|| block_size(self.bits, self.counter));
            self.visit(ctx, col, row, block)?;
            self.counter += 1;
        }
        while self.counter < self.limit() {
            ctx.checkpoint();
            let (col, row) = tile_position(self.counter, self.offset);
            self.visit(ctx, col, row, None)?;
            self.counter += 1;
        }
        Ok(())
    }
}

pub(crate) fn run(ctx: &mut EngineContext<'_>) -> Result<Flow, EngineError> {
    let mut diffusion = Diffusion::new(ctx)?;
    log::debug!(
        "diffusion over {}x{} tiles of {} from counter {}",
        diffusion.nx,
        diffusion.ny,
        diffusion.tile,
        diffusion.counter
    );
    if diffusion.scan(ctx).is_ok() {
        return Ok(Flow::Finished);
    }
    let counter = diffusion.counter;
    let y_begin = ctx.iy_start + (counter >> 16) as i32;
    let pass = (counter & 0xffff) as i32;
    let item = ctx.resume_item(ctx.item.x_start, y_begin, pass);
    ctx.suspend(item, AlgorithmState::None)?;
    Ok(Flow::Suspended)
}
