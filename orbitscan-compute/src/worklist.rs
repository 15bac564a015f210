//! Bounded list of pending regions.

use orbitscan_core::{ItemProgress, WorkItem, MAX_WORK_ITEMS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkListFull;

/// Pending regions, kept merged and sorted by `(pass, y_start, x_start)`.
///
/// Items that were stopped part way carry a progress record and are never
/// merged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkList {
    items: Vec<WorkItem>,
    progress: Vec<ItemProgress>,
}

impl WorkList {
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(MAX_WORK_ITEMS),
            progress: Vec::new(),
        }
    }

    /// Restore a list exactly as it was saved.
    pub fn from_items(items: Vec<WorkItem>) -> Self {
        Self {
            items,
            progress: Vec::new(),
        }
    }

    pub fn with_progress(mut self, progress: Vec<ItemProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<WorkItem> {
        self.items
    }

    /// Items and their progress records.
    pub fn into_parts(self) -> (Vec<WorkItem>, Vec<ItemProgress>) {
        (self.items, self.progress)
    }

    fn has_progress(&self, item: &WorkItem) -> bool {
        self.progress.iter().any(|p| p.item == *item)
    }

    /// Append `item`, then merge and re-sort the list.
    pub fn add(&mut self, item: WorkItem) -> Result<(), WorkListFull> {
        if self.items.len() >= MAX_WORK_ITEMS {
            return Err(WorkListFull);
        }
        self.items.push(item);
        self.tidy();
        Ok(())
    }

    /// Queue a stopped item together with what it needs to restart.
    pub fn add_suspended(&mut self, progress: ItemProgress) -> Result<(), WorkListFull> {
        if self.items.len() >= MAX_WORK_ITEMS || self.has_progress(&progress.item) {
            return Err(WorkListFull);
        }
        self.items.push(progress.item);
        self.progress.push(progress);
        self.tidy();
        Ok(())
    }

    /// Take the first item in `(pass, y_start, x_start)` order.
    pub fn pop(&mut self) -> Option<WorkItem> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(0))
        }
    }

    /// Remove and return the progress record of a popped item.
    pub fn take_progress(&mut self, item: &WorkItem) -> Option<ItemProgress> {
        let index = self.progress.iter().position(|p| p.item == *item)?;
        Some(self.progress.swap_remove(index))
    }

    fn tidy(&mut self) {
        while let Some(gone) = self.combine_one() {
            self.items.remove(gone);
        }
        self.items.sort_by_key(|w| (w.pass, w.y_start, w.x_start));
    }

    /// Merge one pair of untouched, edge-adjacent items with matching pass
    /// and symmetry state. Returns the index of the absorbed item.
    fn combine_one(&mut self) -> Option<usize> {
        for i in 0..self.items.len() {
            if self.items[i].y_start != self.items[i].y_begin {
                continue;
            }
            for j in i + 1..self.items.len() {
                let a = self.items[i];
                let b = self.items[j];
                if self.has_progress(&a) || self.has_progress(&b) {
                    continue;
                }
                if b.sym != a.sym
                    || b.y_start != b.y_begin
                    || b.x_start != b.x_begin
                    || b.pass != a.pass
                {
                    continue;
                }
                if a.x_start == b.x_start && a.x_begin == b.x_begin && a.x_stop == b.x_stop {
                    if a.y_stop + 1 == b.y_start {
                        self.items[i].y_stop = b.y_stop;
                        return Some(j);
                    }
                    if b.y_stop + 1 == a.y_start {
                        self.items[i].y_start = b.y_start;
                        self.items[i].y_begin = b.y_start;
                        return Some(j);
                    }
                }
                if a.y_start == b.y_start && a.y_begin == b.y_begin && a.y_stop == b.y_stop {
                    if a.x_stop + 1 == b.x_start {
                        self.items[i].x_stop = b.x_stop;
                        return Some(j);
                    }
                    if b.x_stop + 1 == a.x_start {
                        self.items[i].x_start = b.x_start;
                        self.items[i].x_begin = b.x_start;
                        return Some(j);
                    }
                }
            }
        }
        None
    }
}
