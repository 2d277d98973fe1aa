use std::fmt;
use std::rc::Rc;

use rewind_audit::{MutationError, MutationTracker, Reflect, Tracked};
use rewind_common::ContainerId;
use rewind_kernel::{Command, HistoryEngine, HistoryState, Producer, Snapshot, StepInput, Update};

use crate::config::ContainerConfig;

/// A versioned state container with undo/redo and checkpoints.
///
/// Wraps a [`HistoryEngine`] the way a host wraps a reducer: every operation
/// becomes one [`Command`], the resulting state is committed, and the
/// committed history is audited for in-place edits before control returns.
///
/// Operations that change nothing (no-op writes, rejected navigation, stale
/// checkpoint restores) do not commit and do not audit.
pub struct TimeTravel<S, P: Producer<S>> {
    id: ContainerId,
    config: ContainerConfig,
    engine: HistoryEngine<S, P>,
    state: HistoryState<S>,
    tracker: Option<MutationTracker<Tracked<S>>>,
    commits: usize,
}

impl<S, P> TimeTravel<S, P>
where
    S: Reflect,
    P: Producer<S>,
{
    /// Create a container holding `initial` as its only history entry.
    pub fn new(initial: S, producer: P, config: ContainerConfig) -> Self {
        let id = ContainerId::new();
        let engine = HistoryEngine::new(initial, producer);
        let state = engine.initial_state().clone();
        let tracker = config
            .enable_mutation_detection
            .then(|| MutationTracker::track(timeline(&state)));
        tracing::debug!(
            container = %id,
            audit = config.enable_mutation_detection,
            "time travel container created"
        );
        Self {
            id,
            config,
            engine,
            state,
            tracker,
            commits: 0,
        }
    }

    /// Build the initial value on demand. `init` runs exactly once.
    pub fn new_lazy(init: impl FnOnce() -> S, producer: P, config: ContainerConfig) -> Self {
        Self::new(init(), producer, config)
    }

    /// Apply one command, commit the result, then audit.
    pub fn dispatch(&mut self, command: Command<S, P::Draft>) -> Result<(), MutationError> {
        let _span = tracing::debug_span!("dispatch", container = %self.id).entered();
        let name = command.name();
        let Some(next) = self.engine.reduce(&self.state, command) else {
            tracing::trace!(command = name, "no change");
            return Ok(());
        };
        self.state = next;
        self.commits += 1;
        tracing::debug!(
            command = name,
            step = self.state.step_num(),
            history_len = self.state.history().len(),
            checkpoint = self.state.checkpoint(),
            "committed"
        );
        self.audit()
    }

    /// Re-run the audit without a command, as a host re-render would.
    pub fn render(&mut self) -> Result<(), MutationError> {
        let _span = tracing::debug_span!("render", container = %self.id).entered();
        self.audit()
    }

    fn audit(&mut self) -> Result<(), MutationError> {
        let Some(tracker) = self.tracker.as_mut() else {
            return Ok(());
        };
        tracker.check(timeline(&self.state), &self.config.object_name)
    }

    /// Write a new value. Excluded writes change only the current item.
    pub fn set_state(
        &mut self,
        update: Update<S, P::Draft>,
        include_in_history: bool,
    ) -> Result<(), MutationError> {
        self.dispatch(Command::SetState {
            update,
            include_in_history,
        })
    }

    /// Recorded write of a literal value.
    pub fn replace(&mut self, value: S) -> Result<(), MutationError> {
        self.dispatch(Command::replace(value))
    }

    /// Recorded write through a draft of the current item.
    pub fn update(
        &mut self,
        edit: impl FnOnce(&mut P::Draft) + 'static,
    ) -> Result<(), MutationError> {
        self.dispatch(Command::update(edit))
    }

    /// Move the cursor to `step`. Invalid steps are logged and ignored.
    pub fn go_to(&mut self, step: impl Into<StepInput>) -> Result<(), MutationError> {
        self.dispatch(Command::go_to(step))
    }

    /// Move the cursor one step back.
    pub fn go_back(&mut self) -> Result<(), MutationError> {
        self.dispatch(Command::GoBack)
    }

    /// Move the cursor one step forward.
    pub fn go_forward(&mut self) -> Result<(), MutationError> {
        self.dispatch(Command::GoForward)
    }

    /// Pin the current step as the checkpoint.
    pub fn save_checkpoint(&mut self) -> Result<(), MutationError> {
        self.dispatch(Command::SaveCheckpoint)
    }

    /// Return to the checkpoint if it is still valid.
    pub fn restore_checkpoint(&mut self) -> Result<(), MutationError> {
        self.dispatch(Command::RestoreCheckpoint)
    }

    /// Discard all progress and return to the initial value.
    pub fn reset(&mut self) -> Result<(), MutationError> {
        self.dispatch(Command::Reset)
    }

    /// The value currently presented.
    pub fn current_item(&self) -> &S {
        self.state.current_item()
    }

    /// All committed snapshots, oldest first.
    pub fn history(&self) -> &[S] {
        self.state.history()
    }

    /// Index of the current history entry.
    pub fn step_num(&self) -> usize {
        self.state.step_num()
    }

    /// Saved checkpoint index.
    pub fn checkpoint(&self) -> usize {
        self.state.checkpoint()
    }

    /// Whether the checkpoint can still be restored.
    pub fn is_checkpoint_valid(&self) -> bool {
        self.state.is_checkpoint_valid()
    }

    /// Whether the cursor is at the oldest entry.
    pub fn is_first_step(&self) -> bool {
        self.state.is_first_step()
    }

    /// Whether the cursor is at the newest entry.
    pub fn is_last_step(&self) -> bool {
        self.state.is_last_step()
    }

    /// False right after a write excluded from history.
    pub fn is_part_of_history(&self) -> bool {
        self.state.is_part_of_history()
    }

    /// The full bookkeeping state.
    pub fn state(&self) -> &HistoryState<S> {
        &self.state
    }

    /// Settings the container was built with.
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Identifier recorded on this container's log spans.
    pub fn id(&self) -> ContainerId {
        self.id
    }

    /// Number of commands that changed the state.
    pub fn commits(&self) -> usize {
        self.commits
    }
}

fn timeline<S: Snapshot>(state: &HistoryState<S>) -> Tracked<S> {
    Tracked::Timeline(Rc::clone(state.history_rc()))
}

impl<S, P> fmt::Debug for TimeTravel<S, P>
where
    S: Reflect,
    P: Producer<S>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeTravel")
            .field("id", &self.id)
            .field("summary", &self.state.summary())
            .field("commits", &self.commits)
            .field("audit", &self.tracker.is_some())
            .finish()
    }
}
