//! Boundary tracing.
//!
//! Scans for an unpainted pixel. When its color matches the previously
//! computed pixel in the row, the outline of that same-colored region is
//! walked clockwise, computing only outline pixels. A closed outline is then
//! walked again, filling scanlines leftwards from every south or west step.
//!
//! Each scan pixel is a restart point; the trace and fill it starts belong
//! to it.

use super::{remaining_y_stop, Flow};
use crate::cancellation::Interrupted;
use crate::engine::EngineContext;
use orbitscan_core::{AlgorithmState, EngineError, WorkItem};

/// Color of a pixel nothing has been written to yet.
const UNPAINTED: u32 = 0;

/// Matches needed before an outline counts as enclosing something.
const MIN_OUTLINE_MATCHES: u8 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    fn turn_left(self) -> Self {
        match self {
            Direction::North => Direction::West,
            Direction::East => Direction::North,
            Direction::South => Direction::East,
            Direction::West => Direction::South,
        }
    }

    fn turn_right(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }
}

/// Position on the outline and heading.
#[derive(Clone, Copy, Debug)]
struct Turtle {
    col: i32,
    row: i32,
    going_to: Direction,
    coming_from: Direction,
}

impl Turtle {
    fn start(col: i32, row: i32) -> Self {
        Self {
            col,
            row,
            going_to: Direction::East,
            coming_from: Direction::West,
        }
    }

    fn ahead(&self) -> (i32, i32) {
        match self.going_to {
            Direction::North => (self.col, self.row - 1),
            Direction::East => (self.col + 1, self.row),
            Direction::South => (self.col, self.row + 1),
            Direction::West => (self.col - 1, self.row),
        }
    }

    /// Step onto a matching pixel and turn towards the region's outside.
    fn advance_match(&mut self, col: i32, row: i32) {
        self.col = col;
        self.row = row;
        self.going_to = self.going_to.turn_left();
        self.coming_from = self.going_to.turn_left();
    }

    fn advance_no_match(&mut self) {
        self.going_to = self.going_to.turn_right();
    }

    fn is_at(&self, col: i32, row: i32) -> bool {
        self.col == col && self.row == row
    }
}

/// A same-colored region found by the scan.
#[derive(Clone, Copy, Debug)]
struct Outline {
    col: i32,
    row: i32,
    color: u32,
}

enum State {
    Scanning,
    Tracing(Outline),
    Filling(Outline),
    Done,
}

/// Scan position and trail color at the last restart point.
#[derive(Clone, Copy, Debug)]
struct Mark {
    col: i32,
    row: i32,
    trail: u32,
}

struct Tracer {
    row: i32,
    col: i32,
    /// Color of the last pixel computed by the scan in this row.
    last_color: u32,
    mark: Mark,
}

impl Tracer {
    fn next_row(&mut self, ctx: &mut EngineContext<'_>) {
        self.row += 1;
        self.col = ctx.ix_start;
        self.last_color = UNPAINTED;
        ctx.iterator.set_reset_periodicity(true);
    }

    /// Move past the pixel that started a trace.
    fn resume_scan(&mut self, ctx: &mut EngineContext<'_>) -> State {
        self.last_color = UNPAINTED;
        self.col += 1;
        ctx.iterator.set_reset_periodicity(true);
        State::Scanning
    }

    fn scan(&mut self, ctx: &mut EngineContext<'_>) -> Result<State, Interrupted> {
        while self.row <= ctx.y_stop {
            while self.col <= ctx.x_stop {
                let (col, row) = (self.col, self.row);
                if ctx.store.get_pixel(col, row) != UNPAINTED {
                    self.col += 1;
                    continue;
                }
                let trail = self.last_color;
                self.mark = Mark { col, row, trail };
                ctx.checkpoint();
                self.last_color = ctx.calc_pixel(col, row)?;
                ctx.iterator.set_reset_periodicity(false);
                if self.last_color != trail {
                    self.col += 1;
                    continue;
                }
                return Ok(State::Tracing(Outline {
                    col,
                    row,
                    color: self.last_color,
                }));
            }
            self.next_row(ctx);
        }
        Ok(State::Done)
    }

    fn in_bounds(&self, ctx: &EngineContext<'_>, outline: &Outline, col: i32, row: i32) -> bool {
        row >= outline.row && col >= ctx.ix_start && col <= ctx.x_stop && row <= ctx.y_stop
    }

    /// Walk the outline clockwise, computing unpainted outline pixels.
    fn trace(&mut self, ctx: &mut EngineContext<'_>, outline: Outline) -> Result<State, Interrupted> {
        let mut turtle = Turtle::start(outline.col, outline.row);
        let mut matches = 0u8;
        loop {
            let (col, row) = turtle.ahead();
            let keep_going = if self.in_bounds(ctx, &outline, col, row) {
                let mut color = ctx.store.get_pixel(col, row);
                if color == UNPAINTED {
                    color = ctx.calc_pixel(col, row)?;
                }
                if color == outline.color {
                    matches = (matches + 1).min(MIN_OUTLINE_MATCHES);
                    turtle.advance_match(col, row);
                    true
                } else {
                    turtle.advance_no_match();
                    turtle.going_to != turtle.coming_from || matches > 0
                }
            } else {
                turtle.advance_no_match();
                turtle.going_to != turtle.coming_from || matches > 0
            };
            if !keep_going || (col == outline.col && row == outline.row) {
                break;
            }
        }

        if matches < MIN_OUTLINE_MATCHES {
            return Ok(self.resume_scan(ctx));
        }
        Ok(State::Filling(outline))
    }

    /// Walk the outline again, filling rows to the left on south and west
    /// steps.
    fn fill(&mut self, ctx: &mut EngineContext<'_>, outline: Outline) -> State {
        let fill = match ctx.config.fill_color {
            Some(color) if color > 0 => color,
            _ => outline.color,
        };
        let mut turtle = Turtle::start(outline.col, outline.row);
        loop {
            let mut found = false;
            loop {
                let (col, row) = turtle.ahead();
                if self.in_bounds(ctx, &outline, col, row)
                    && ctx.store.get_pixel(col, row) == outline.color
                {
                    if turtle.going_to == Direction::South
                        || (turtle.going_to == Direction::West
                            && turtle.coming_from != Direction::East)
                    {
                        fill_left(ctx, col, row, outline.color, fill);
                    }
                    turtle.advance_match(col, row);
                    found = true;
                } else {
                    turtle.advance_no_match();
                }
                if found || turtle.going_to == turtle.coming_from {
                    break;
                }
            }
            if !found {
                let (col, row) = turtle.ahead();
                turtle.advance_match(col, row);
            }
            if turtle.is_at(outline.col, outline.row) {
                break;
            }
        }
        self.resume_scan(ctx)
    }
}

/// Fill the unpainted run ending just left of `(col, row)`, if the pixels
/// between it and `col` all carry the trail color.
fn fill_left(ctx: &mut EngineContext<'_>, col: i32, row: i32, trail: u32, fill: u32) {
    let mut right = col;
    let mut color = trail;
    loop {
        right -= 1;
        if right < ctx.ix_start {
            break;
        }
        color = ctx.store.get_pixel(right, row);
        if color != trail {
            break;
        }
    }
    if color != UNPAINTED {
        return;
    }

    let mut left = right;
    while left > ctx.ix_start && ctx.store.get_pixel(left - 1, row) == UNPAINTED {
        left -= 1;
    }
    if left == right {
        ctx.plot(left, row, fill);
    } else {
        ctx.fill_line(row, left, right, fill);
    }
}

pub(crate) fn run(ctx: &mut EngineContext<'_>) -> Result<Flow, EngineError> {
    debug_assert!(ctx.config.colors >= 16);
    let (col, row) = (ctx.item.x_begin.max(ctx.ix_start), ctx.iy_start);
    let trail = match ctx.restoring() {
        Some(AlgorithmState::Trail(trail)) => trail,
        Some(_) => UNPAINTED,
        None => {
            ctx.iterator.set_reset_periodicity(true);
            UNPAINTED
        }
    };
    let mark = Mark { col, row, trail };
    let mut tracer = Tracer {
        row,
        col,
        last_color: trail,
        mark,
    };

    let mut state = State::Scanning;
    loop {
        let next = match state {
            State::Scanning => tracer.scan(ctx),
            State::Tracing(outline) => tracer.trace(ctx, outline),
            State::Filling(outline) => Ok(tracer.fill(ctx, outline)),
            State::Done => return Ok(Flow::Finished),
        };
        state = match next {
            Ok(state) => state,
            Err(Interrupted) => {
                // Restart at the scan pixel that began the interrupted unit.
                let Mark { col, row, trail } = tracer.mark;
                let y_stop = remaining_y_stop(ctx, row);
                let item = WorkItem::new(ctx.item.x_start, ctx.item.x_stop, row, y_stop)
                    .cursor(col, row)
                    .with_sym(ctx.item.sym);
                ctx.suspend(item, AlgorithmState::Trail(trail))?;
                return Ok(Flow::Suspended);
            }
        };
    }
}
