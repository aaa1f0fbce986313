//! Shared handle over the session state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::models::{Chat, Message};

use super::action::{apply, Action};
use super::app_state::AppState;

/// Called after each applied action with the resulting state.
///
/// Observers run on the dispatching task and must not dispatch themselves.
pub type Observer = Arc<dyn Fn(&Action, &AppState) + Send + Sync>;

/// Single writer of [`AppState`].
///
/// Cloning yields another handle to the same state. Dispatches are
/// serialized: each action is applied and its observers notified before the
/// next action from any handle is applied.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: Mutex<AppState>,
    observers: Mutex<Vec<Observer>>,
    /// Held across apply and notify so observers see actions in order
    writer: Mutex<()>,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(state),
                observers: Mutex::new(Vec::new()),
                writer: Mutex::new(()),
            }),
        }
    }

    pub fn observe<F>(&self, observer: F)
    where
        F: Fn(&Action, &AppState) + Send + Sync + 'static,
    {
        relock(&self.inner.observers).push(Arc::new(observer));
    }

    pub fn dispatch(&self, action: Action) {
        let _writer = relock(&self.inner.writer);
        self.apply_and_notify(&action);
    }

    /// Apply several actions with no other dispatch in between.
    pub fn dispatch_batch(&self, actions: Vec<Action>) {
        let _writer = relock(&self.inner.writer);
        for action in &actions {
            self.apply_and_notify(action);
        }
    }

    /// Dispatch `action` only if `condition` holds for the current state,
    /// checked and applied with no other dispatch in between.
    pub fn dispatch_if(&self, condition: impl FnOnce(&AppState) -> bool, action: Action) -> bool {
        let _writer = relock(&self.inner.writer);
        if !self.read(condition) {
            return false;
        }
        self.apply_and_notify(&action);
        true
    }

    fn apply_and_notify(&self, action: &Action) {
        let snapshot = {
            let mut state = relock(&self.inner.state);
            let next = apply(std::mem::take(&mut *state), action);
            *state = next;
            state.clone()
        };

        tracing::trace!(action = action.kind(), "Action applied");

        let observers = relock(&self.inner.observers).clone();
        for observer in observers {
            observer(action, &snapshot);
        }
    }

    pub fn snapshot(&self) -> AppState {
        relock(&self.inner.state).clone()
    }

    /// Run `f` against the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&relock(&self.inner.state))
    }

    pub fn streaming_id(&self) -> String {
        self.read(|s| s.streaming_id.clone())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.read(|s| s.message_list.clone())
    }

    pub fn selected_chat(&self) -> Option<Chat> {
        self.read(|s| s.selected_chat.clone())
    }

    pub fn current_model(&self) -> String {
        self.read(|s| s.current_model.clone())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &*relock(&self.inner.state))
            .finish()
    }
}
