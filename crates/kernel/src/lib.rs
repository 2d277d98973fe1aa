//! History Kernel: the state machine behind a time-travelling state container.
//!
//! # Invariants
//! - History is never empty and the cursor always points inside it.
//! - Every transition is a pure function of the old state and one command.
//! - A recorded write truncates any "future" entries before appending.
//! - Checkpoint validity, once lost, only comes back through `SaveCheckpoint`.

pub mod command;
pub mod engine;
pub mod produce;
pub mod state;
pub mod step;

pub use command::{Command, Update};
pub use engine::HistoryEngine;
pub use produce::{Producer, RcProducer, Recipe, Snapshot};
pub use state::{HistoryState, HistorySummary};
pub use step::{StepError, StepInput, checked_step, is_step_valid, validate_step};
