use serde::Serialize;
use std::fmt;
use std::rc::Rc;

use crate::produce::Snapshot;

/// Everything the engine knows about one container: the committed history,
/// the cursor into it, and the checkpoint bookkeeping.
///
/// Cloning is cheap. The history is a shared immutable slice, so a clone
/// shares it and `history_rc` identity only changes on recorded writes.
#[derive(Debug, Clone)]
pub struct HistoryState<S> {
    pub(crate) history: Rc<[S]>,
    pub(crate) current_item: S,
    pub(crate) step_num: usize,
    pub(crate) is_part_of_history: bool,
    pub(crate) checkpoint: usize,
    pub(crate) is_checkpoint_valid: bool,
}

impl<S: Snapshot> HistoryState<S> {
    /// Fresh state holding `initial` as the only history entry.
    pub fn new(initial: S) -> Self {
        Self {
            history: Rc::from(vec![initial.clone()]),
            current_item: initial,
            step_num: 0,
            is_part_of_history: true,
            checkpoint: 0,
            is_checkpoint_valid: true,
        }
    }

    /// The value currently presented to callers.
    pub fn current_item(&self) -> &S {
        &self.current_item
    }

    /// All committed snapshots, oldest first.
    pub fn history(&self) -> &[S] {
        &self.history
    }

    /// The shared history slice itself, for identity checks.
    pub fn history_rc(&self) -> &Rc<[S]> {
        &self.history
    }

    /// Index of the history entry the cursor points at.
    pub fn step_num(&self) -> usize {
        self.step_num
    }

    /// Whether `current_item` is the history entry at `step_num`. False right
    /// after a write that was excluded from history.
    pub fn is_part_of_history(&self) -> bool {
        self.is_part_of_history
    }

    /// Saved step index, restorable while still valid.
    pub fn checkpoint(&self) -> usize {
        self.checkpoint
    }

    /// False once a truncating write dropped the checkpoint's entry.
    pub fn is_checkpoint_valid(&self) -> bool {
        self.is_checkpoint_valid
    }

    /// Whether the cursor is at the oldest entry.
    pub fn is_first_step(&self) -> bool {
        self.step_num == 0
    }

    /// Whether the cursor is at the newest entry.
    pub fn is_last_step(&self) -> bool {
        self.step_num == self.history.len() - 1
    }

    /// True when both states hold the same history slice, cursor, checkpoint
    /// and current item.
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.history, &other.history)
            && self.current_item.same_ref(&other.current_item)
            && self.step_num == other.step_num
            && self.is_part_of_history == other.is_part_of_history
            && self.checkpoint == other.checkpoint
            && self.is_checkpoint_valid == other.is_checkpoint_valid
    }

    /// Produce a summary of the bookkeeping for logs and tooling.
    pub fn summary(&self) -> HistorySummary {
        HistorySummary {
            history_len: self.history.len(),
            step_num: self.step_num,
            is_part_of_history: self.is_part_of_history,
            checkpoint: self.checkpoint,
            is_checkpoint_valid: self.is_checkpoint_valid,
        }
    }
}

/// Cursor and checkpoint bookkeeping without the snapshots themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub history_len: usize,
    pub step_num: usize,
    pub is_part_of_history: bool,
    pub checkpoint: usize,
    pub is_checkpoint_valid: bool,
}

impl fmt::Display for HistorySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "History: step={}/{} in_history={} checkpoint={}{}",
            self.step_num,
            self.history_len - 1,
            self.is_part_of_history,
            self.checkpoint,
            if self.is_checkpoint_valid { "" } else { " (stale)" }
        )
    }
}
