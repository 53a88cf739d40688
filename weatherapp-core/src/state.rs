//! Observable result state.
//!
//! A [`ResultSlot`] holds the latest outcome of a fetch as a [`ResultState`].
//! It has a single writer (the controller) and any number of read-only
//! [`StateWatcher`]s. Each write replaces the whole value under the channel
//! lock, so a watcher never sees a partially updated state.

use tokio::sync::watch;

/// Outcome of a fetch, as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultState<T> {
    Loading,
    Success(T),
    Error(String),
}

impl<T> ResultState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ResultState::Loading)
    }

    /// Success and Error are terminal for the fetch that produced them.
    pub fn is_terminal(&self) -> bool {
        !self.is_loading()
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            ResultState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ResultState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Latest value of a slot. `None` until the first publication.
pub type Snapshot<T> = Option<ResultState<T>>;

#[derive(Debug)]
pub struct ResultSlot<T> {
    tx: watch::Sender<Snapshot<T>>,
}

impl<T> ResultSlot<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> StateWatcher<T> {
        StateWatcher { rx: self.tx.subscribe() }
    }

    /// Publish `state` only if `admit` returns true.
    ///
    /// `admit` runs while the slot is locked for writing, so whatever it
    /// checks cannot change before the state lands.
    pub(crate) fn publish_if<F>(&self, state: ResultState<T>, admit: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        self.tx.send_if_modified(|slot| {
            if !admit() {
                return false;
            }
            *slot = Some(state);
            true
        })
    }
}

impl<T: Clone> ResultSlot<T> {
    pub fn current(&self) -> Snapshot<T> {
        self.tx.borrow().clone()
    }
}

impl<T> Default for ResultSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a [`ResultSlot`].
#[derive(Debug, Clone)]
pub struct StateWatcher<T> {
    rx: watch::Receiver<Snapshot<T>>,
}

impl<T: Clone> StateWatcher<T> {
    pub fn current(&self) -> Snapshot<T> {
        self.rx.borrow().clone()
    }

    /// Current value, marked as seen so [`changed`](Self::changed) only
    /// wakes for newer publications.
    pub fn latest(&mut self) -> Snapshot<T> {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next publication and return the value it left behind.
    ///
    /// Publications that happen faster than the watcher reads are coalesced;
    /// the returned value is always the most recent one. Returns `None` once
    /// the slot has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot<T>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until the slot holds Success or Error.
    pub async fn wait_for_terminal(&mut self) -> Option<ResultState<T>> {
        let snapshot = self
            .rx
            .wait_for(|slot| slot.as_ref().is_some_and(ResultState::is_terminal))
            .await
            .ok()?;
        (*snapshot).clone()
    }
}
