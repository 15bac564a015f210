use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Answers the engine's abort polls.
pub trait CancellationChecker: Clone {
    /// Called between work items and whenever the poll interval runs out.
    fn is_cancelled(&self) -> bool;
}

/// Runs every item to completion.
#[derive(Clone, Copy, Default)]
pub struct NeverCancel;

impl CancellationChecker for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Cancels while a shared flag is set, e.g. from another thread.
#[derive(Clone)]
pub struct AtomicBoolChecker {
    flag: Arc<AtomicBool>,
}

impl AtomicBoolChecker {
    pub fn new(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }
}

impl CancellationChecker for AtomicBoolChecker {
    fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Cancels on every poll after the first `limit` polls.
///
/// Clones share the poll counter, so the number of polls a run issued can
/// be read back after the run.
#[derive(Clone)]
pub struct CancelAfterPolls {
    limit: u64,
    polls: Rc<Cell<u64>>,
}

impl CancelAfterPolls {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            polls: Rc::new(Cell::new(0)),
        }
    }

    pub fn polls(&self) -> u64 {
        self.polls.get()
    }
}

impl CancellationChecker for CancelAfterPolls {
    fn is_cancelled(&self) -> bool {
        let polls = self.polls.get() + 1;
        self.polls.set(polls);
        polls > self.limit
    }
}

/// Marker returned when an abort poll came back positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interrupted;

/// Latching abort signal owned by a run.
///
/// Once a poll reports cancellation every later poll does too, without
/// consulting the checker again.
pub(crate) struct AbortSignal<'a> {
    check: &'a dyn Fn() -> bool,
    latched: bool,
    polls: u64,
}

impl<'a> AbortSignal<'a> {
    pub(crate) fn new(check: &'a dyn Fn() -> bool) -> Self {
        Self {
            check,
            latched: false,
            polls: 0,
        }
    }

    pub(crate) fn poll(&mut self) -> bool {
        if !self.latched {
            self.polls += 1;
            self.latched = (self.check)();
        }
        self.latched
    }

    pub(crate) fn is_latched(&self) -> bool {
        self.latched
    }

    pub(crate) fn polls(&self) -> u64 {
        self.polls
    }
}
