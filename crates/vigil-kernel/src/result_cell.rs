//! [`ResultCell`] – the shared last-value-wins measurement slot.
//!
//! Producers overwrite the stored [`ThreadResult`] with
//! [`ResultCell::publish`]; each consumer takes it with
//! [`ResultCell::consume_for`].  Every consumer owns a private delivery flag:
//!
//! * `publish` sets **both** flags after writing the value.
//! * `consume_for(role)` waits for `role`'s flag, copies the value out and
//!   clears only that flag.
//!
//! A consumer therefore sees every update exactly once, independently of the
//! other consumer's pace.  If several publishes land before a consumer
//! wakes, it observes only the latest value.  There is no queue.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tracing::trace;
use vigil_types::{ConsumerRole, ThreadResult};

#[derive(Debug, Default)]
struct CellState {
    result: ThreadResult,
    unseen_by_supervisor: bool,
    unseen_by_publisher: bool,
}

impl CellState {
    fn flag_mut(&mut self, role: ConsumerRole) -> &mut bool {
        match role {
            ConsumerRole::Supervisor => &mut self.unseen_by_supervisor,
            ConsumerRole::Publisher => &mut self.unseen_by_publisher,
        }
    }

    fn flag(&self, role: ConsumerRole) -> bool {
        match role {
            ConsumerRole::Supervisor => self.unseen_by_supervisor,
            ConsumerRole::Publisher => self.unseen_by_publisher,
        }
    }
}

/// Single shared slot holding the most recent [`ThreadResult`].
///
/// # Example
///
/// ```
/// use vigil_kernel::ResultCell;
/// use vigil_types::{ConsumerRole, ThreadResult};
///
/// let cell = ResultCell::new();
/// cell.publish(ThreadResult::new(10.0, 20.0));
/// cell.publish(ThreadResult::new(15.0, 22.0));
///
/// // Last value wins; the intermediate value is never delivered.
/// assert_eq!(cell.consume_for(ConsumerRole::Supervisor), ThreadResult::new(15.0, 22.0));
/// assert!(!cell.has_unseen(ConsumerRole::Supervisor));
/// // The publisher's flag is untouched by the supervisor.
/// assert!(cell.has_unseen(ConsumerRole::Publisher));
/// ```
#[derive(Debug, Default)]
pub struct ResultCell {
    state: Mutex<CellState>,
    updated: Condvar,
}

impl ResultCell {
    /// Create an empty cell with both delivery flags cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored value, mark it unseen for both consumers and
    /// wake every waiter.
    pub fn publish(&self, value: ThreadResult) {
        let mut state = self.lock();
        state.result = value;
        state.unseen_by_supervisor = true;
        state.unseen_by_publisher = true;
        // Broadcast: both consumers may be parked on the same condvar.
        self.updated.notify_all();
        trace!(?value, "result published");
    }

    /// Block until `role` has an unseen value, then copy it out and clear
    /// `role`'s flag.
    ///
    /// Blocks indefinitely when nothing is ever published.
    pub fn consume_for(&self, role: ConsumerRole) -> ThreadResult {
        let mut state = self.lock();
        while !state.flag(role) {
            state = self
                .updated
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        let value = state.result;
        *state.flag_mut(role) = false;
        value
    }

    /// Non-blocking probe: `true` when `role` has not yet consumed the
    /// latest published value.
    pub fn has_unseen(&self, role: ConsumerRole) -> bool {
        self.lock().flag(role)
    }

    /// Copy of the stored value.  Leaves both delivery flags untouched.
    pub fn latest(&self) -> ThreadResult {
        self.lock().result
    }

    fn lock(&self) -> MutexGuard<'_, CellState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
