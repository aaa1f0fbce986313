use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::bus::{EventBus, SubscriptionId, Topic};
use crate::error::ChatResult;
use crate::models::Chat;
use crate::traits::ChatRepository;

use super::grouping::{group_by_date, ChatGroup};

#[derive(Debug)]
struct Cursor {
    chats: Vec<Chat>,
    /// Next page to fetch, 1-based
    page: u32,
    has_more: bool,
    /// In-flight latch
    loading: bool,
    /// Bumped by every reset; a fetch started under an older value is stale
    generation: u64,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            chats: Vec::new(),
            page: 1,
            has_more: false,
            loading: false,
            generation: 0,
        }
    }
}

fn lock_cursor(cursor: &Mutex<Cursor>) -> MutexGuard<'_, Cursor> {
    cursor.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the in-flight latch; dropping it releases the latch even when the
/// fetch future is dropped before completing.
struct LoadingLatch {
    cursor: Arc<Mutex<Cursor>>,
}

impl Drop for LoadingLatch {
    fn drop(&mut self) {
        lock_cursor(&self.cursor).loading = false;
    }
}

/// Incrementally loads the conversation list.
///
/// At most one page request is in flight at a time, whichever trigger
/// asked for it. Cloning yields another handle to the same list.
#[derive(Clone)]
pub struct ChatListLoader {
    repository: Arc<dyn ChatRepository>,
    cursor: Arc<Mutex<Cursor>>,
}

impl ChatListLoader {
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self {
            repository,
            cursor: Arc::new(Mutex::new(Cursor::default())),
        }
    }

    fn cursor(&self) -> MutexGuard<'_, Cursor> {
        lock_cursor(&self.cursor)
    }

    /// Fetch the next page.
    ///
    /// Returns `Ok(false)` without fetching when a fetch is already in
    /// flight. On failure the cursor is left where it was.
    pub async fn load_next(&self) -> ChatResult<bool> {
        loop {
            let (page, generation) = {
                let mut cursor = self.cursor();
                if cursor.loading {
                    return Ok(false);
                }
                cursor.loading = true;
                (cursor.page, cursor.generation)
            };
            let latch = LoadingLatch {
                cursor: Arc::clone(&self.cursor),
            };

            tracing::debug!(page, "Fetching chat list page");
            let result = self.repository.list_chats(page).await;
            drop(latch);

            let mut cursor = self.cursor();

            if cursor.generation != generation {
                tracing::debug!(page, "Discarding chat list page fetched before reset");
                continue;
            }

            match result {
                Ok(batch) => {
                    if page == 1 {
                        cursor.chats = batch.list;
                    } else {
                        cursor.chats.extend(batch.list);
                    }
                    cursor.page = page + 1;
                    cursor.has_more = batch.has_more;
                    return Ok(true);
                }
                Err(e) => {
                    tracing::warn!(page, error = %e, "Fetching chat list failed");
                    return Err(e.into());
                }
            }
        }
    }

    /// Start over from page 1.
    ///
    /// If a fetch is in flight its result is dropped and page 1 is fetched
    /// as soon as it lands.
    pub async fn reset(&self) -> ChatResult<bool> {
        {
            let mut cursor = self.cursor();
            cursor.page = 1;
            cursor.generation += 1;
        }
        self.load_next().await
    }

    /// Sentinel at the end of the rendered list became (in)visible.
    pub async fn on_sentinel_visible(&self, visible: bool) -> ChatResult<bool> {
        let wanted = visible && {
            let cursor = self.cursor();
            cursor.has_more && !cursor.loading
        };
        if !wanted {
            return Ok(false);
        }
        self.load_next().await
    }

    /// Reload from page 1 whenever the conversation list changes.
    ///
    /// The reload runs on the ambient tokio runtime; outside one the
    /// notification is dropped.
    pub fn attach(&self, bus: &EventBus) -> SubscriptionId {
        let loader = self.clone();
        bus.subscribe(Topic::ConversationListChanged, move |_| {
            let Ok(handle) = tokio::runtime::Handle::try_current() else {
                tracing::warn!("No runtime to refresh the chat list on");
                return;
            };
            let loader = loader.clone();
            handle.spawn(async move {
                if let Err(e) = loader.reset().await {
                    tracing::warn!(error = %e, "Refreshing chat list failed");
                }
            });
        })
    }

    pub fn chats(&self) -> Vec<Chat> {
        self.cursor().chats.clone()
    }

    pub fn has_more(&self) -> bool {
        self.cursor().has_more
    }

    pub fn is_loading(&self) -> bool {
        self.cursor().loading
    }

    /// Next page that `load_next` would fetch.
    pub fn page(&self) -> u32 {
        self.cursor().page
    }

    pub fn grouped(&self, now: DateTime<Utc>) -> Vec<ChatGroup> {
        group_by_date(&self.cursor().chats, now)
    }
}

impl std::fmt::Debug for ChatListLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatListLoader")
            .field("cursor", &*self.cursor())
            .finish()
    }
}
