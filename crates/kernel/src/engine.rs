use std::rc::Rc;

use crate::command::{Command, Update};
use crate::produce::{Producer, Snapshot};
use crate::state::HistoryState;
use crate::step::{StepInput, checked_step};

/// The history state machine.
///
/// Holds the initial state (for `Reset`) and the producer used by recipe
/// writes. `reduce` never mutates anything: it maps an old state and one
/// command to the next state, or to `None` when the command changes nothing.
pub struct HistoryEngine<S, P> {
    initial: HistoryState<S>,
    producer: P,
}

impl<S, P> HistoryEngine<S, P>
where
    S: Snapshot,
    P: Producer<S>,
{
    pub fn new(initial: S, producer: P) -> Self {
        Self {
            initial: HistoryState::new(initial),
            producer,
        }
    }

    /// The state captured at construction, which `Reset` returns to.
    pub fn initial_state(&self) -> &HistoryState<S> {
        &self.initial
    }

    pub fn producer(&self) -> &P {
        &self.producer
    }

    /// Apply one command. Returns `None` when the command is a no-op,
    /// including rejected navigation and stale checkpoint restores.
    pub fn reduce(
        &self,
        state: &HistoryState<S>,
        command: Command<S, P::Draft>,
    ) -> Option<HistoryState<S>> {
        match command {
            Command::SetState {
                update,
                include_in_history,
            } => self.set_state(state, update, include_in_history),
            Command::GoTo(step) => go_to(state, &step),
            Command::GoBack => go_to(state, &offset(state.step_num, -1)),
            Command::GoForward => go_to(state, &offset(state.step_num, 1)),
            Command::SaveCheckpoint => Some(HistoryState {
                checkpoint: state.step_num,
                is_checkpoint_valid: true,
                ..state.clone()
            }),
            Command::RestoreCheckpoint => {
                if !state.is_checkpoint_valid {
                    tracing::error!(
                        checkpoint = state.checkpoint,
                        "unable to restore checkpoint: saved checkpoint at index {} no longer exists",
                        state.checkpoint
                    );
                    return None;
                }
                go_to(state, &StepInput::from(state.checkpoint))
            }
            Command::Reset => Some(self.initial.clone()),
        }
    }

    fn set_state(
        &self,
        state: &HistoryState<S>,
        update: Update<S, P::Draft>,
        include_in_history: bool,
    ) -> Option<HistoryState<S>> {
        let next = match update {
            Update::Replace(value) => value,
            Update::Recipe(recipe) => self.producer.produce(&state.current_item, recipe),
        };
        if next.same_ref(&state.current_item) {
            tracing::trace!("write produced the current item, skipping");
            return None;
        }

        if !include_in_history {
            return Some(HistoryState {
                current_item: next,
                is_part_of_history: false,
                ..state.clone()
            });
        }

        // Keep [0..=step_num], drop any future entries, then append.
        let kept = state.step_num + 1;
        let mut history = Vec::with_capacity(kept + 1);
        history.extend_from_slice(&state.history[..kept]);
        history.push(next.clone());

        // The checkpoint survives only if its slot was not truncated away.
        let is_checkpoint_valid = state.is_checkpoint_valid && state.checkpoint < kept;
        if state.is_checkpoint_valid && !is_checkpoint_valid {
            tracing::debug!(
                checkpoint = state.checkpoint,
                "checkpoint invalidated by truncating write"
            );
        }

        Some(HistoryState {
            history: Rc::from(history),
            current_item: next,
            step_num: kept,
            is_part_of_history: true,
            checkpoint: state.checkpoint,
            is_checkpoint_valid,
        })
    }
}

fn offset(step_num: usize, delta: i64) -> StepInput {
    match i64::try_from(step_num) {
        Ok(step) => StepInput::Int(step.saturating_add(delta)),
        Err(_) => StepInput::from(step_num),
    }
}

fn go_to<S: Snapshot>(state: &HistoryState<S>, step: &StepInput) -> Option<HistoryState<S>> {
    let index = checked_step(step, state.history.len())?;
    Some(HistoryState {
        current_item: state.history[index].clone(),
        step_num: index,
        is_part_of_history: true,
        ..state.clone()
    })
}
