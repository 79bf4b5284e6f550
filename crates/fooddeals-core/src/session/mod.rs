//! Session token store.
//!
//! [`TokenStore`] is the single source of truth for the bearer credential.
//! Every change is mirrored to a [`TokenStorage`] and announced to
//! registered listeners and to broadcast receivers (other tasks/threads).
//! Tokens are never logged in full.

mod cookies;
mod storage;

use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use anyhow::Result;
use tokio::sync::broadcast;

pub use cookies::CookieVault;
pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};

/// Capacity of the change channel; slow receivers see `Lagged` and should
/// fall back to [`TokenStore::get`].
const CHANGE_CHANNEL_CAPACITY: usize = 16;

type Listener = Arc<dyn Fn(Option<&str>) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Holds the current access token.
pub struct TokenStore {
    token: RwLock<Option<String>>,
    storage: Box<dyn TokenStorage>,
    listeners: Arc<Mutex<Listeners>>,
    changes: broadcast::Sender<Option<String>>,
}

impl TokenStore {
    /// Creates a store initialized from `storage`.
    ///
    /// # Errors
    /// Returns an error if the persisted token cannot be read.
    pub fn load(storage: impl TokenStorage + 'static) -> Result<Self> {
        let initial = storage.load()?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            token: RwLock::new(initial),
            storage: Box::new(storage),
            listeners: Arc::new(Mutex::new(Listeners::default())),
            changes,
        })
    }

    /// A signed-out store backed by process memory.
    pub fn in_memory() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            token: RwLock::new(None),
            storage: Box::new(MemoryTokenStorage::default()),
            listeners: Arc::new(Mutex::new(Listeners::default())),
            changes,
        }
    }

    /// Current token, if signed in.
    pub fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replaces the token, persists it and notifies subscribers.
    ///
    /// Blank tokens are treated as sign-out. A storage failure is logged
    /// and does not stop the in-memory update or the notification.
    pub fn set(&self, token: Option<String>) {
        let token = token.filter(|t| !t.trim().is_empty());
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token.clone();

        let persisted = match token.as_deref() {
            Some(value) => self.storage.save(value),
            None => self.storage.clear(),
        };
        if let Err(err) = persisted {
            tracing::warn!(error = %format!("{err:#}"), "failed to persist session token");
        }

        tracing::info!(
            signed_in = token.is_some(),
            token = %token.as_deref().map_or_else(|| "-".to_string(), mask_token),
            "session token updated"
        );
        self.notify(token);
    }

    /// Signs out.
    pub fn clear(&self) {
        self.set(None);
    }

    /// Registers `listener`, called after every change with the new value.
    ///
    /// The listener stays registered until the returned handle is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Receiver for token changes made anywhere in the process.
    pub fn watch(&self) -> broadcast::Receiver<Option<String>> {
        self.changes.subscribe()
    }

    /// Adopts the persisted value if another process changed it.
    ///
    /// Returns `true` when the in-memory token changed. Subscribers are
    /// notified as for [`TokenStore::set`], but nothing is written back.
    ///
    /// # Errors
    /// Returns an error if the persisted token cannot be read.
    pub fn sync_from_storage(&self) -> Result<bool> {
        let persisted = self.storage.load()?;
        {
            let mut current = self.token.write().unwrap_or_else(PoisonError::into_inner);
            if *current == persisted {
                return Ok(false);
            }
            current.clone_from(&persisted);
        }

        tracing::debug!(signed_in = persisted.is_some(), "session token changed on disk");
        self.notify(persisted);
        Ok(true)
    }

    fn notify(&self, token: Option<String>) {
        // Snapshot so listeners may subscribe/unsubscribe while being called.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(token.as_deref());
        }

        // No receivers is not an error.
        let _ = self.changes.send(token);
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("signed_in", &self.is_signed_in())
            .finish_non_exhaustive()
    }
}

/// Handle returned by [`TokenStore::subscribe`]; unsubscribes on drop.
#[must_use = "dropping the subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    /// Removes the listener now.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entries
                .retain(|(id, _)| *id != self.id);
        }
    }
}

/// Returns a masked version of a token for display (first 8 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 12 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(8).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn store_with_storage() -> (TokenStore, Arc<MemoryTokenStorage>) {
        let storage = Arc::new(MemoryTokenStorage::default());
        let store = TokenStore::load(Arc::clone(&storage)).unwrap();
        (store, storage)
    }

    #[test]
    fn test_last_set_wins_in_memory_and_storage() {
        let (store, storage) = store_with_storage();
        let sequence = [
            Some("a"),
            None,
            Some("b"),
            Some("c"),
            None,
            Some("d"),
        ];

        for value in sequence {
            store.set(value.map(str::to_string));
            assert_eq!(store.get().as_deref(), value);
            assert_eq!(storage.stored().as_deref(), value);
        }
    }

    #[test]
    fn test_load_reads_persisted_token() {
        let store = TokenStore::load(MemoryTokenStorage::with_token("persisted")).unwrap();
        assert_eq!(store.get().as_deref(), Some("persisted"));
        assert!(store.is_signed_in());
    }

    #[test]
    fn test_blank_token_signs_out() {
        let (store, storage) = store_with_storage();
        store.set(Some("abc".to_string()));
        store.set(Some("   ".to_string()));
        assert_eq!(store.get(), None);
        assert_eq!(storage.stored(), None);
    }

    #[test]
    fn test_listener_sees_every_set_until_unsubscribed() {
        let store = TokenStore::in_memory();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let subscription = store.subscribe(move |token| {
            seen_clone.lock().unwrap().push(token.map(str::to_string));
        });

        store.set(Some("one".to_string()));
        store.set(None);
        subscription.unsubscribe();
        store.set(Some("two".to_string()));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("one".to_string()), None]
        );
    }

    #[test]
    fn test_listener_observes_updated_value() {
        let store = Arc::new(TokenStore::in_memory());
        let store_clone = Arc::clone(&store);
        let matched = Arc::new(AtomicUsize::new(0));
        let matched_clone = Arc::clone(&matched);

        let _subscription = store.subscribe(move |token| {
            if store_clone.get().as_deref() == token {
                matched_clone.fetch_add(1, Ordering::SeqCst);
            }
        });

        store.set(Some("fresh".to_string()));
        store.clear();
        assert_eq!(matched.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_watch_receives_changes() {
        let store = TokenStore::in_memory();
        let mut rx = store.watch();

        store.set(Some("abc".to_string()));
        store.clear();

        assert_eq!(rx.recv().await.unwrap().as_deref(), Some("abc"));
        assert_eq!(rx.recv().await.unwrap(), None);
    }

    #[test]
    fn test_sync_from_storage_adopts_external_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = TokenStore::load(FileTokenStorage::new(&path)).unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let _subscription = store.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        // Another process signs in.
        FileTokenStorage::new(&path).save("from-elsewhere").unwrap();
        assert!(store.sync_from_storage().unwrap());
        assert_eq!(store.get().as_deref(), Some("from-elsewhere"));

        // Nothing changed since.
        assert!(!store.sync_from_storage().unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "***");
        assert_eq!(mask_token("eyJhbGciOiJIUzI1NiJ9.payload"), "eyJhbGci...");
    }
}
