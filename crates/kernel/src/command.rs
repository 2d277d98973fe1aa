use std::fmt;

use crate::produce::Recipe;
use crate::step::StepInput;

/// How a write computes the next value.
pub enum Update<S, D> {
    /// Use this value as-is.
    Replace(S),
    /// Run an edit against a draft of the current item.
    Recipe(Recipe<D>),
}

impl<S, D> Update<S, D> {
    pub fn recipe(edit: impl FnOnce(&mut D) + 'static) -> Self {
        Self::Recipe(Box::new(edit))
    }
}

impl<S: fmt::Debug, D> fmt::Debug for Update<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
            Self::Recipe(_) => f.write_str("Recipe(..)"),
        }
    }
}

/// Every operation the history engine understands.
///
/// Each command carries everything needed to compute the next state.
#[derive(Debug)]
pub enum Command<S, D> {
    /// Write a new value, recorded in history unless `include_in_history` is false.
    SetState {
        update: Update<S, D>,
        include_in_history: bool,
    },
    /// Move the cursor to a specific step.
    GoTo(StepInput),
    /// Move the cursor one step back.
    GoBack,
    /// Move the cursor one step forward.
    GoForward,
    /// Pin the current step as the checkpoint.
    SaveCheckpoint,
    /// Move the cursor back to the checkpoint, if it is still valid.
    RestoreCheckpoint,
    /// Discard all progress and return to the initial state.
    Reset,
}

impl<S, D> Command<S, D> {
    /// Recorded write of a literal value.
    pub fn replace(value: S) -> Self {
        Self::SetState {
            update: Update::Replace(value),
            include_in_history: true,
        }
    }

    /// Recorded write through a recipe.
    pub fn update(edit: impl FnOnce(&mut D) + 'static) -> Self {
        Self::SetState {
            update: Update::recipe(edit),
            include_in_history: true,
        }
    }

    pub fn go_to(step: impl Into<StepInput>) -> Self {
        Self::GoTo(step.into())
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetState { .. } => "set_state",
            Self::GoTo(_) => "go_to",
            Self::GoBack => "go_back",
            Self::GoForward => "go_forward",
            Self::SaveCheckpoint => "save_checkpoint",
            Self::RestoreCheckpoint => "restore_checkpoint",
            Self::Reset => "reset",
        }
    }
}
