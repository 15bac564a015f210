//! Tesseral subdivision.
//!
//! Boxes live on an explicit stack. A box whose four edges and middle line
//! share one color is filled without computing its interior; any other box
//! is split across its longer side and the new shared edge computed.
//!
//! An interrupted run records the top box's corner and a size code for each
//! axis. Resuming replays the splits from the whole region down to that box,
//! reading the edges of every box back from the store. A box edge is its
//! full top and bottom rows and the inner part of its left and right
//! columns, whether it was computed or read back.

use super::Flow;
use crate::cancellation::Interrupted;
use crate::engine::EngineContext;
use crate::symmetry::PlotMode;
use orbitscan_core::{AlgorithmState, EngineError};

/// Bits holding a coordinate in the packed resume cursor.
const CURSOR_SHIFT: i32 = 16;
const CURSOR_MASK: i32 = (1 << CURSOR_SHIFT) - 1;
const INITIAL_STACK: usize = 64;

/// What is known about one edge of a box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    Color(u32),
    /// Pixels along the edge differ.
    Mixed,
    /// Computed but not yet examined.
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TessBox {
    x1: i32,
    x2: i32,
    y1: i32,
    y2: i32,
    top: Edge,
    bottom: Edge,
    left: Edge,
    right: Edge,
}

impl TessBox {
    fn new(x1: i32, x2: i32, y1: i32, y2: i32) -> Self {
        Self {
            x1,
            x2,
            y1,
            y2,
            top: Edge::Unknown,
            bottom: Edge::Unknown,
            left: Edge::Unknown,
            right: Edge::Unknown,
        }
    }

    /// Splits run down the middle (a new column) when true.
    fn is_wide(&self) -> bool {
        self.x2 - self.x1 > self.y2 - self.y1
    }

    fn has_interior(&self) -> bool {
        self.x2 - self.x1 >= 2 && self.y2 - self.y1 >= 2
    }

    fn edges(&self) -> [Edge; 4] {
        [self.top, self.bottom, self.left, self.right]
    }
}

/// Smallest code with `span - 2 < 2^code`.
fn size_code(span: i32) -> i32 {
    let mut code = 1;
    let mut size = 2;
    while span - 2 >= size {
        size <<= 1;
        code += 1;
    }
    code
}

fn pack(code: i32, coord: i32) -> i32 {
    (code << CURSOR_SHIFT) + coord
}

fn unpack(packed: i32) -> (i32, i32) {
    let size = 1i32 << ((packed >> CURSOR_SHIFT) & 0x1f);
    (packed & CURSOR_MASK, size)
}

/// Compute a row of pixels. All differ-or-agree information is kept, so
/// every pixel is computed even once the row is known to be mixed.
fn compute_row(ctx: &mut EngineContext<'_>, x1: i32, x2: i32, y: i32) -> Result<Edge, Interrupted> {
    compute_line(ctx, (x1..=x2).map(|x| (x, y)))
}

fn compute_column(
    ctx: &mut EngineContext<'_>,
    x: i32,
    y1: i32,
    y2: i32,
) -> Result<Edge, Interrupted> {
    compute_line(ctx, (y1..=y2).map(|y| (x, y)))
}

/// Compute the inner part of row `y` of a box. The two end pixels belong to
/// the box's columns and are read back, so the edge covers the full row.
fn compute_mid_row(
    ctx: &mut EngineContext<'_>,
    x1: i32,
    x2: i32,
    y: i32,
) -> Result<Edge, Interrupted> {
    let inner = compute_row(ctx, x1 + 1, x2 - 1, y)?;
    let ends = [ctx.store.get_pixel(x1, y), ctx.store.get_pixel(x2, y)];
    Ok(match inner {
        Edge::Color(c) if ends.iter().all(|&end| end == c) => Edge::Color(c),
        Edge::Color(_) => Edge::Mixed,
        edge => edge,
    })
}

fn compute_line(
    ctx: &mut EngineContext<'_>,
    mut pixels: impl Iterator<Item = (i32, i32)>,
) -> Result<Edge, Interrupted> {
    let Some((x, y)) = pixels.next() else {
        return Ok(Edge::Unknown);
    };
    ctx.iterator.set_reset_periodicity(true);
    let first = ctx.calc_pixel(x, y)?;
    ctx.iterator.set_reset_periodicity(false);
    let mut edge = Edge::Color(first);
    for (x, y) in pixels {
        if ctx.calc_pixel(x, y)? != first {
            edge = Edge::Mixed;
        }
    }
    Ok(edge)
}

/// Read back an already computed row, stopping at the first difference.
fn check_row(ctx: &EngineContext<'_>, x1: i32, x2: i32, y: i32) -> Edge {
    check_line(ctx, (x1..=x2).map(|x| (x, y)))
}

/// Read back the interior of an already computed column.
fn check_column(ctx: &EngineContext<'_>, x: i32, y1: i32, y2: i32) -> Edge {
    check_line(ctx, (y1 + 1..y2).map(|y| (x, y)))
}

fn check_line(ctx: &EngineContext<'_>, mut pixels: impl Iterator<Item = (i32, i32)>) -> Edge {
    let Some((x, y)) = pixels.next() else {
        return Edge::Unknown;
    };
    let first = ctx.store.get_pixel(x, y);
    if pixels.all(|(x, y)| ctx.store.get_pixel(x, y) == first) {
        Edge::Color(first)
    } else {
        Edge::Mixed
    }
}

enum Verdict {
    /// Edges and middle line agree on this color.
    Uniform(u32),
    /// Split, reusing the middle line if it was already computed.
    Split(Option<Edge>),
}

struct Tesseral {
    stack: Vec<TessBox>,
    /// Fill dot by dot through the plot wrapper.
    guess_plot: bool,
}

impl Tesseral {
    /// Stack for a fresh region: compute the four outer edges.
    fn fresh(ctx: &mut EngineContext<'_>) -> Result<Self, Interrupted> {
        let (x1, x2, y1, y2) = (ctx.ix_start, ctx.x_stop, ctx.iy_start, ctx.y_stop);
        let mut root = TessBox::new(x1, x2, y1, y2);
        root.top = compute_row(ctx, x1, x2, y1)?;
        root.bottom = compute_row(ctx, x1, x2, y2)?;
        root.left = compute_column(ctx, x1, y1 + 1, y2 - 1)?;
        root.right = compute_column(ctx, x2, y1 + 1, y2 - 1)?;
        Ok(Self::with_root(ctx, root))
    }

    fn with_root(ctx: &EngineContext<'_>, root: TessBox) -> Self {
        let mut stack = Vec::with_capacity(INITIAL_STACK);
        stack.push(root);
        Self {
            stack,
            guess_plot: !matches!(ctx.plot_mode, PlotMode::Plain | PlotMode::XAxis),
        }
    }

    /// Replay the splits that lead from the whole region to the box whose
    /// corner and size codes were saved in the cursor.
    fn resumed(ctx: &EngineContext<'_>) -> Result<Self, EngineError> {
        let (cur_y, y_size) = unpack(ctx.item.y_begin);
        let (cur_x, x_size) = unpack(ctx.item.pass);
        let root = TessBox::new(ctx.ix_start, ctx.x_stop, ctx.iy_start, ctx.y_stop);
        let mut this = Self::with_root(ctx, root);
        let corrupt = || {
            EngineError::ResumeCorrupt(format!(
                "tesseral cursor ({cur_x}, {cur_y}) does not lead to a box"
            ))
        };

        loop {
            let Some(top) = this.stack.last_mut() else {
                return Err(corrupt());
            };
            if top.is_wide() {
                if top.x1 == cur_x && top.x2 - top.x1 - 2 < x_size {
                    break;
                }
                if top.x2 - top.x1 < 2 {
                    return Err(corrupt());
                }
                let mid = (top.x1 + top.x2) >> 1;
                let mut left = *top;
                top.x1 = mid;
                if mid > cur_x {
                    left.x2 = mid;
                    this.stack.push(left);
                }
            } else {
                if top.y1 == cur_y && top.y2 - top.y1 - 2 < y_size {
                    break;
                }
                if top.y2 - top.y1 < 2 {
                    return Err(corrupt());
                }
                let mid = (top.y1 + top.y2) >> 1;
                let mut upper = *top;
                top.y1 = mid;
                if mid > cur_y {
                    upper.y2 = mid;
                    this.stack.push(upper);
                }
            }
        }
        Ok(this)
    }

    fn classify(&mut self, ctx: &mut EngineContext<'_>) -> Result<Verdict, Interrupted> {
        let Some(b) = self.stack.last_mut() else {
            return Ok(Verdict::Split(None));
        };
        if b.edges().contains(&Edge::Mixed) {
            return Ok(Verdict::Split(None));
        }
        if b.top == Edge::Unknown {
            b.top = check_row(ctx, b.x1, b.x2, b.y1);
        }
        if b.top == Edge::Mixed {
            return Ok(Verdict::Split(None));
        }
        if b.bottom == Edge::Unknown {
            b.bottom = check_row(ctx, b.x1, b.x2, b.y2);
        }
        if b.bottom != b.top {
            return Ok(Verdict::Split(None));
        }
        if b.left == Edge::Unknown {
            b.left = check_column(ctx, b.x1, b.y1, b.y2);
        }
        if b.left != b.top {
            return Ok(Verdict::Split(None));
        }
        if b.right == Edge::Unknown {
            b.right = check_column(ctx, b.x2, b.y1, b.y2);
        }
        if b.right != b.top {
            return Ok(Verdict::Split(None));
        }

        let b = *b;
        let middle = if b.is_wide() {
            compute_column(ctx, (b.x1 + b.x2) >> 1, b.y1 + 1, b.y2 - 1)?
        } else {
            compute_mid_row(ctx, b.x1, b.x2, (b.y1 + b.y2) >> 1)?
        };
        match (middle, b.top) {
            (Edge::Color(m), Edge::Color(top)) if m == top => Ok(Verdict::Uniform(top)),
            _ => Ok(Verdict::Split(Some(middle))),
        }
    }

    /// Fill the top box's interior and pop it, charging the poll budget for
    /// the painted area.
    fn fill(&mut self, ctx: &mut EngineContext<'_>, color: u32) {
        let Some(b) = self.stack.pop() else {
            return;
        };
        let color = match ctx.config.fill_color {
            Some(0) => return,
            Some(fill) => fill % ctx.config.colors,
            None => color,
        };

        let (left, right) = (b.x1 + 1, b.x2 - 1);
        if self.guess_plot || right - left + 1 < 2 {
            for col in left..=right {
                for row in b.y1 + 1..b.y2 {
                    ctx.plot(col, row, color);
                }
            }
        } else {
            for row in b.y1 + 1..b.y2 {
                ctx.store.fill_row(row, left, right, color);
                if let Some(mirror) = ctx.mirror_row(row) {
                    ctx.store.fill_row(mirror, left, right, color);
                }
            }
        }
        let area = i64::from(right - left + 1) * i64::from(b.y2 - b.y1 - 1);
        ctx.charge(area >> 4);
    }

    /// Split the top box across its longer side.
    fn split(&mut self, ctx: &mut EngineContext<'_>, middle: Option<Edge>) -> Result<(), Interrupted> {
        let Some(&b) = self.stack.last() else {
            return Ok(());
        };
        if b.is_wide() {
            let mid = (b.x1 + b.x2) >> 1;
            let mid_edge = match middle {
                Some(edge) => edge,
                None => compute_column(ctx, mid, b.y1 + 1, b.y2 - 1)?,
            };
            self.stack.pop();
            if b.x2 - mid > 1 {
                let mut rest = b;
                if rest.top == Edge::Mixed {
                    rest.top = Edge::Unknown;
                }
                if rest.bottom == Edge::Mixed {
                    rest.bottom = Edge::Unknown;
                }
                let first = TessBox {
                    x2: mid,
                    right: mid_edge,
                    ..rest
                };
                self.stack.push(TessBox {
                    x1: mid,
                    left: mid_edge,
                    ..rest
                });
                if mid - b.x1 > 1 {
                    self.stack.push(first);
                }
            }
        } else {
            let mid = (b.y1 + b.y2) >> 1;
            let mid_edge = match middle {
                Some(edge) => edge,
                None => compute_mid_row(ctx, b.x1, b.x2, mid)?,
            };
            self.stack.pop();
            if b.y2 - mid > 1 {
                let mut rest = b;
                if rest.left == Edge::Mixed {
                    rest.left = Edge::Unknown;
                }
                if rest.right == Edge::Mixed {
                    rest.right = Edge::Unknown;
                }
                let first = TessBox {
                    y2: mid,
                    bottom: mid_edge,
                    ..rest
                };
                self.stack.push(TessBox {
                    y1: mid,
                    top: mid_edge,
                    ..rest
                });
                if mid - b.y1 > 1 {
                    self.stack.push(first);
                }
            }
        }
        Ok(())
    }

    /// Process boxes until the stack is empty. Each box is a restart
    /// point: an interruption leaves it on top of the stack.
    fn work(&mut self, ctx: &mut EngineContext<'_>) -> Result<(), Interrupted> {
        while let Some(top) = self.stack.last() {
            if !top.has_interior() {
                self.stack.pop();
                continue;
            }
            ctx.checkpoint();
            match self.classify(ctx)? {
                Verdict::Uniform(color) => self.fill(ctx, color),
                Verdict::Split(middle) => self.split(ctx, middle)?,
            }
        }
        Ok(())
    }
}

pub(crate) fn run(ctx: &mut EngineContext<'_>) -> Result<Flow, EngineError> {
    let mut tess = if ctx.item.pass == 0 {
        ctx.checkpoint();
        match Tesseral::fresh(ctx) {
            Ok(tess) => tess,
            Err(Interrupted) => {
                let item = ctx.item.cursor(ctx.item.x_start, ctx.item.y_start).with_pass(0);
                ctx.suspend(item, AlgorithmState::None)?;
                return Ok(Flow::Suspended);
            }
        }
    } else {
        Tesseral::resumed(ctx)?
    };
    tess.stack
        .try_reserve(INITIAL_STACK)
        .map_err(|e| EngineError::Resource(format!("tesseral box stack: {e}")))?;

    if tess.work(ctx).is_ok() {
        return Ok(Flow::Finished);
    }
    let Some(top) = tess.stack.last() else {
        return Ok(Flow::Finished);
    };
    let y_begin = pack(size_code(top.y2 - top.y1), top.y1);
    let pass = pack(size_code(top.x2 - top.x1), top.x1);
    log::debug!(
        "tesseral suspended at box x {}..={} y {}..={}",
        top.x1,
        top.x2,
        top.y1,
        top.y2
    );
    let item = ctx.item.cursor(ctx.item.x_start, y_begin).with_pass(pass);
    ctx.suspend(item, AlgorithmState::None)?;
    Ok(Flow::Suspended)
}
