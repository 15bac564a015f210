//! Work-list scheduler and the public engine entry points.

use crate::algorithms::{self, Flow};
use crate::cancellation::{AbortSignal, CancellationChecker, Interrupted, NeverCancel};
use crate::iterate::PixelIterator;
use crate::plugin::{ImageSetup, OrbitPlugin};
use crate::store::PixelStore;
use crate::symmetry::PlotMode;
use crate::worklist::WorkList;
use orbitscan_core::{
    AlgorithmState, CalcMode, ComputedPixel, CoordinateMap, EngineConfig, EngineError,
    FiniteAttractor, InsideColoring, ItemProgress, OrbitCarry, OutsideColoring, RenderStats,
    ResumeBlob, RunOutcome, RunPhase, WorkItem,
};
use std::collections::VecDeque;

/// Canvas width from which the second three-pass phase uses two passes.
const THREE_PASS_TWO_PASS_WIDTH: i32 = 640;

/// Mutable state of one run, shared by the scheduler, the symmetry
/// reducer and the coherence algorithms.
pub(crate) struct EngineContext<'a> {
    pub(crate) config: &'a EngineConfig,
    pub(crate) store: &'a mut dyn PixelStore,
    pub(crate) plugin: &'a mut dyn OrbitPlugin,
    pub(crate) abort: AbortSignal<'a>,
    pub(crate) map: CoordinateMap,
    pub(crate) iterator: PixelIterator,
    pub(crate) work_list: WorkList,
    pub(crate) stats: RenderStats,
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) mode: CalcMode,
    /// Solid guessing stops after its first pass.
    pub(crate) three_pass: bool,
    /// Item being worked on. Its bounds shrink when symmetry splits off a
    /// remainder; `pass` and `sym` track progress.
    pub(crate) item: WorkItem,
    /// Bounds actually computed; smaller than `item` under symmetry.
    pub(crate) ix_start: i32,
    pub(crate) iy_start: i32,
    pub(crate) x_stop: i32,
    pub(crate) y_stop: i32,
    pub(crate) plot_mode: PlotMode,
    pub(crate) pixel_pi: i32,
    input_counter: i64,
    /// Iterator state at the current item's last checkpoint.
    mark_carry: OrbitCarry,
    /// Pixels computed since that checkpoint.
    computed: Vec<ComputedPixel>,
    /// Recorded pixels a restarted item has not asked for yet.
    replay: VecDeque<ComputedPixel>,
    restored: Option<AlgorithmState>,
}

impl<'a> EngineContext<'a> {
    fn new(
        config: &'a EngineConfig,
        store: &'a mut dyn PixelStore,
        plugin: &'a mut dyn OrbitPlugin,
        abort: AbortSignal<'a>,
    ) -> Self {
        let width = store.width();
        let height = store.height();
        let map = CoordinateMap::new(&config.rect, width, height);
        let iterator = PixelIterator::new(config, map.min_pixel_delta());
        Self {
            config,
            store,
            plugin,
            abort,
            map,
            iterator,
            work_list: WorkList::new(),
            stats: RenderStats::default(),
            width,
            height,
            mode: config.calc_mode,
            three_pass: false,
            item: WorkItem::canvas(width, height),
            ix_start: 0,
            iy_start: 0,
            x_stop: width - 1,
            y_stop: height - 1,
            plot_mode: PlotMode::Plain,
            pixel_pi: 0,
            input_counter: i64::from(config.poll_interval),
            mark_carry: OrbitCarry::default(),
            computed: Vec::new(),
            replay: VecDeque::new(),
            restored: None,
        }
    }

    /// Compute pixel `(col, row)` and plot it through the symmetry wrapper.
    ///
    /// An interruption inside the orbit leaves the pixel unpainted. An
    /// interruption from the per-pixel budget poll happens after plotting,
    /// and the pixel is kept for the restart.
    pub(crate) fn calc_pixel(&mut self, col: i32, row: i32) -> Result<u32, Interrupted> {
        if let Some(color) = self.replay_pixel(col, row) {
            return Ok(color);
        }

        let mut point = self.map.pixel_to_complex(col, row);
        if let Some(inversion) = &self.config.inversion {
            point = inversion.apply(point);
        }

        let outcome = {
            let Self {
                iterator,
                plugin,
                abort,
                ..
            } = self;
            iterator.evaluate(&mut **plugin, col, row, point, &mut || abort.poll())?
        };

        self.stats.pixels_computed += 1;
        self.stats.iterations += outcome.iterations;
        self.computed.push(ComputedPixel {
            x: col,
            y: row,
            color: outcome.color,
            previous: self.store.get_pixel(col, row),
            old_color_iter: self.iterator.carry().old_color_iter,
        });
        self.plot(col, row, outcome.color);

        self.charge(i64::try_from(outcome.iterations).unwrap_or(i64::MAX));
        if self.input_counter <= 0 {
            if self.abort.poll() {
                return Err(Interrupted);
            }
            self.input_counter = i64::from(self.config.poll_interval);
        }
        Ok(outcome.color)
    }

    /// Serve `(col, row)` from the restarted item's record. Recorded pixels
    /// are asked for in the order they were computed; anything else drops
    /// the rest of the record.
    fn replay_pixel(&mut self, col: i32, row: i32) -> Option<u32> {
        let next = *self.replay.front()?;
        if (next.x, next.y) != (col, row) {
            log::warn!(
                "restart asked for ({}, {}) instead of recorded ({}, {}), recomputing",
                col,
                row,
                next.x,
                next.y
            );
            self.replay.clear();
            return None;
        }
        self.replay.pop_front();
        self.iterator.set_old_color_iter(next.old_color_iter);
        self.plot(col, row, next.color);
        self.computed.push(next);
        self.stats.pixels_replayed += 1;
        Some(next.color)
    }

    /// Mark a point the current item can restart from.
    pub(crate) fn checkpoint(&mut self) {
        self.computed.clear();
        self.mark_carry = self.iterator.carry();
    }

    /// Algorithm state saved with the current item, once. `Some` means the
    /// item restarts from its last checkpoint with the iterator state of
    /// that moment already in place.
    pub(crate) fn restoring(&mut self) -> Option<AlgorithmState> {
        self.restored.take()
    }

    /// Consume part of the poll budget without polling.
    pub(crate) fn charge(&mut self, amount: i64) {
        self.input_counter = self.input_counter.saturating_sub(amount);
    }

    pub(crate) fn poll(&mut self) -> bool {
        self.abort.poll()
    }

    /// Queue a work item. The list always has room for the item being
    /// suspended, since that item was popped from it.
    pub(crate) fn push_item(&mut self, item: WorkItem) -> Result<(), EngineError> {
        self.work_list.add(item).map_err(|_| {
            EngineError::Resource(format!(
                "work list full while queueing x {}..={} y {}..={}",
                item.x_start, item.x_stop, item.y_start, item.y_stop
            ))
        })
    }

    /// Queue `item`, which restarts the current item from its last
    /// checkpoint, with everything computed since.
    pub(crate) fn suspend(
        &mut self,
        item: WorkItem,
        state: AlgorithmState,
    ) -> Result<(), EngineError> {
        let mut progress = ItemProgress::new(item, self.mark_carry);
        progress.pixels = std::mem::take(&mut self.computed);
        progress.pixels.extend(self.replay.drain(..));
        progress.state = state;
        log::debug!(
            "suspending x {}..={} y {}..={} with {} pixel(s) past the checkpoint",
            item.x_start,
            item.x_stop,
            item.y_start,
            item.y_stop,
            progress.pixels.len()
        );
        self.work_list.add_suspended(progress).map_err(|_| {
            EngineError::Resource(format!(
                "work list full while suspending x {}..={} y {}..={}",
                item.x_start, item.x_stop, item.y_start, item.y_stop
            ))
        })
    }

    /// The current item with its cursor and pass replaced, for suspension.
    pub(crate) fn resume_item(&self, x_begin: i32, y_begin: i32, pass: i32) -> WorkItem {
        self.item.cursor(x_begin, y_begin).with_pass(pass)
    }

    fn begin_item(
        &mut self,
        item: WorkItem,
        progress: Option<ItemProgress>,
    ) -> Result<(), EngineError> {
        self.computed.clear();
        self.replay.clear();
        self.restored = None;
        if let Some(progress) = progress {
            // Put back what the checkpoint saw, then hand the pixels out
            // again as the algorithm asks for them.
            for pixel in progress.pixels.iter().rev() {
                self.store.put_pixel(pixel.x, pixel.y, pixel.previous);
            }
            self.iterator.restore(progress.carry);
            self.replay.extend(progress.pixels);
            self.restored = Some(progress.state);
        }
        self.mark_carry = self.iterator.carry();

        self.item = item;
        self.ix_start = item.x_start;
        self.iy_start = item.y_start;
        self.x_stop = item.x_stop;
        self.y_stop = item.y_stop;
        self.plot_mode = PlotMode::Plain;
        self.pixel_pi = 0;

        let setup = ImageSetup {
            map: &self.map,
            max_iterations: self.config.max_iterations,
            find_attractors: self.config.finite_attractor != FiniteAttractor::Off,
        };
        self.plugin.per_image(&setup)?;
        self.iterator.set_attractors(self.plugin.attractors());
        self.input_counter = i64::from(self.config.poll_interval);

        self.set_symmetry(self.plugin.symmetry());

        log::debug!(
            "work item x {}..={} y {}..={} from ({}, {}) pass {} sym {:#04x} via {:?}, {} recorded pixel(s)",
            self.item.x_start,
            self.item.x_stop,
            self.item.y_start,
            self.item.y_stop,
            self.item.x_begin,
            self.item.y_begin,
            self.item.pass,
            self.item.sym.bits(),
            self.mode,
            self.replay.len()
        );
        Ok(())
    }

    /// Algorithm for a phase, after plugin restrictions.
    fn phase_mode(&self, phase: RunPhase) -> CalcMode {
        let requested = match phase {
            RunPhase::ThreePassGuess => CalcMode::SolidGuess,
            RunPhase::ThreePassFinish => {
                if self.width >= THREE_PASS_TWO_PASS_WIDTH {
                    CalcMode::TwoPass
                } else {
                    CalcMode::OnePass
                }
            }
            RunPhase::Single => match self.config.calc_mode {
                CalcMode::ThreePass => CalcMode::SolidGuess,
                mode => mode,
            },
        };
        match requested {
            CalcMode::BoundaryTrace if self.plugin.no_trace() => {
                log::warn!(
                    "{} does not support boundary tracing, using one pass",
                    self.plugin.id()
                );
                CalcMode::OnePass
            }
            CalcMode::SolidGuess if self.plugin.no_guess() => {
                log::warn!(
                    "{} does not support solid guessing, using one pass",
                    self.plugin.id()
                );
                CalcMode::OnePass
            }
            mode => mode,
        }
    }

    /// Work through `items` with one algorithm. Returns whatever is left
    /// when the run was interrupted, or nothing.
    fn run_phase(
        &mut self,
        mode: CalcMode,
        three_pass: bool,
        items: Vec<WorkItem>,
        progress: Vec<ItemProgress>,
    ) -> Result<(Vec<WorkItem>, Vec<ItemProgress>), EngineError> {
        self.mode = mode;
        self.three_pass = three_pass;
        self.iterator
            .set_boundary_trace(mode == CalcMode::BoundaryTrace);
        self.work_list = WorkList::from_items(items).with_progress(progress);

        while let Some(item) = self.work_list.pop() {
            let progress = self.work_list.take_progress(&item);
            self.begin_item(item, progress)?;
            self.stats.items_processed += 1;
            let flow = match mode {
                CalcMode::OnePass | CalcMode::TwoPass => algorithms::one_two_pass::run(self)?,
                CalcMode::SolidGuess | CalcMode::ThreePass => {
                    algorithms::solid_guess::run(self)?
                }
                CalcMode::BoundaryTrace => algorithms::boundary_trace::run(self)?,
                CalcMode::Tesseral => algorithms::tesseral::run(self)?,
                CalcMode::Diffusion => algorithms::diffusion::run(self)?,
            };
            if flow == Flow::Suspended || self.poll() {
                break;
            }
        }
        Ok(std::mem::take(&mut self.work_list).into_parts())
    }

    fn drive(&mut self, resume: Option<&ResumeBlob>) -> Result<RunOutcome, EngineError> {
        let canvas = WorkItem::canvas(self.width, self.height);
        let (mut phase, mut items, mut progress) = match resume {
            Some(blob) => (blob.phase, blob.items.clone(), blob.progress.clone()),
            None if self.config.calc_mode == CalcMode::ThreePass => {
                (RunPhase::ThreePassGuess, vec![canvas], Vec::new())
            }
            None => (RunPhase::Single, vec![canvas], Vec::new()),
        };

        loop {
            let mode = self.phase_mode(phase);
            if mode == CalcMode::BoundaryTrace {
                check_boundary_trace(self.config)?;
            }

            let (remaining, records) =
                self.run_phase(mode, phase == RunPhase::ThreePassGuess, items, progress)?;
            if !remaining.is_empty() {
                log::info!(
                    "render interrupted with {} work item(s) left in {:?}, {} part way",
                    remaining.len(),
                    phase,
                    records.len()
                );
                let blob = self.blob(phase, remaining).with_progress(records);
                return Ok(RunOutcome::Interrupted(blob));
            }
            if phase != RunPhase::ThreePassGuess {
                log::info!(
                    "render completed: {} pixels computed",
                    self.stats.pixels_computed
                );
                return Ok(RunOutcome::Completed);
            }

            phase = RunPhase::ThreePassFinish;
            items = vec![canvas];
            progress = Vec::new();
            if self.abort.is_latched() {
                log::info!("render interrupted between three-pass phases");
                return Ok(RunOutcome::Interrupted(self.blob(phase, items)));
            }
        }
    }

    fn blob(&self, phase: RunPhase, items: Vec<WorkItem>) -> ResumeBlob {
        ResumeBlob::new(self.width as u32, self.height as u32, phase, items)
    }
}

/// Boundary tracing reads color 0 as "unpainted", so it cannot run with
/// a palette or coloring that legitimately produces 0.
fn check_boundary_trace(config: &EngineConfig) -> Result<(), EngineError> {
    if config.colors < 16 {
        return Err(EngineError::BoundaryTracePrecondition(format!(
            "needs at least 16 colors, palette has {}",
            config.colors
        )));
    }
    if config.inside == InsideColoring::Color(0) {
        return Err(EngineError::BoundaryTracePrecondition(
            "inside color 0 is indistinguishable from unpainted".to_string(),
        ));
    }
    if config.outside == OutsideColoring::Color(0) {
        return Err(EngineError::BoundaryTracePrecondition(
            "outside color 0 is indistinguishable from unpainted".to_string(),
        ));
    }
    Ok(())
}

/// Fractal renderer: drives the configured coherence algorithm over a
/// pixel store, and suspends and resumes on request.
pub struct Engine<C: CancellationChecker = NeverCancel> {
    config: EngineConfig,
    plugin: Box<dyn OrbitPlugin>,
    checker: C,
    stats: RenderStats,
}

impl Engine<NeverCancel> {
    pub fn new(config: EngineConfig, plugin: Box<dyn OrbitPlugin>) -> Result<Self, EngineError> {
        Self::with_checker(config, plugin, NeverCancel)
    }
}

impl<C: CancellationChecker> Engine<C> {
    pub fn with_checker(
        config: EngineConfig,
        plugin: Box<dyn OrbitPlugin>,
        checker: C,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            plugin,
            checker,
            stats: RenderStats::default(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Counters for the most recent `run` or `resume` call.
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Render the whole canvas from scratch.
    pub fn run(&mut self, store: &mut dyn PixelStore) -> Result<RunOutcome, EngineError> {
        self.execute(store, None)
    }

    /// Continue an interrupted render. `store` must still hold the pixels
    /// painted before the interruption.
    pub fn resume(
        &mut self,
        store: &mut dyn PixelStore,
        blob: &ResumeBlob,
    ) -> Result<RunOutcome, EngineError> {
        blob.check()?;
        blob.check_canvas(self.config.width, self.config.height)?;
        self.execute(store, Some(blob))
    }

    /// [`Self::resume`] from a serialized blob.
    pub fn resume_bytes(
        &mut self,
        store: &mut dyn PixelStore,
        bytes: &[u8],
    ) -> Result<RunOutcome, EngineError> {
        let blob = ResumeBlob::from_bytes(bytes)?;
        self.resume(store, &blob)
    }

    fn execute(
        &mut self,
        store: &mut dyn PixelStore,
        resume: Option<&ResumeBlob>,
    ) -> Result<RunOutcome, EngineError> {
        let width = i64::from(self.config.width);
        let height = i64::from(self.config.height);
        if i64::from(store.width()) != width || i64::from(store.height()) != height {
            return Err(EngineError::InvalidCanvas {
                width: store.width().max(0) as u32,
                height: store.height().max(0) as u32,
            });
        }

        let checker = &self.checker;
        let check = || checker.is_cancelled();
        let abort = AbortSignal::new(&check);
        let mut ctx = EngineContext::new(&self.config, store, self.plugin.as_mut(), abort);

        let outcome = ctx.drive(resume);
        let mut stats = ctx.stats;
        stats.polls = ctx.abort.polls();
        self.stats = stats;
        outcome
    }
}
