//! Observers and helpers shared by integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chatline::bus::{EventBus, Topic};
use chatline::state::{Action, StateField, Store};

/// Append one line per dispatched action to `journal`.
///
/// Lines look like `AddMessage user 'hello'`, `UpdateMessage assistant 'Hel'`
/// or `Set streamingId ''`.
pub fn journal_actions(store: &Store, journal: Arc<Mutex<Vec<String>>>) {
    store.observe(move |action, _| {
        let line = match action {
            Action::AddMessage(m) => format!("AddMessage {} '{}'", m.role.as_str(), m.content),
            Action::UpdateMessage(m) => {
                format!("UpdateMessage {} '{}'", m.role.as_str(), m.content)
            }
            Action::RemoveMessage(m) => format!("RemoveMessage {}", m.role.as_str()),
            Action::Set(StateField::StreamingId(id)) if id.is_empty() => {
                "Set streamingId ''".to_string()
            }
            Action::Set(StateField::StreamingId(_)) => "Set streamingId <id>".to_string(),
            Action::Set(field) => format!("Set {}", field.name()),
        };
        journal.lock().unwrap().push(line);
    });
}

/// Count publishes on `topic`.
pub fn count_publishes(bus: &EventBus, topic: Topic) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&count);
    bus.subscribe(topic, move |_| {
        sink.fetch_add(1, Ordering::SeqCst);
    });
    count
}

/// Count states where a non-empty streaming id does not name an assistant
/// message in the list.
pub fn track_streaming_violations(store: &Store) -> Arc<AtomicUsize> {
    let violations = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&violations);
    store.observe(move |_, state| {
        if state.streaming_id.is_empty() {
            return;
        }
        let valid = state
            .message(&state.streaming_id)
            .map_or(false, |m| m.is_assistant());
        if !valid {
            sink.fetch_add(1, Ordering::SeqCst);
        }
    });
    violations
}

/// Poll `condition` until it holds, yielding to other tasks in between.
///
/// Panics after five seconds so a broken test fails instead of hanging.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::task::yield_now().await;
    }
}
