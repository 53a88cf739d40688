//! Fetch controller.
//!
//! [`WeatherController::fetch`] publishes `Loading`, runs one provider call on
//! a spawned task and publishes the outcome into the controller's
//! [`ResultSlot`]. Every task lives inside the controller's cancellation
//! scope; once the scope is cancelled no task publishes again.

use serde::{Deserialize, Serialize};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    ProviderReply, WeatherPayload, WeatherProvider,
    state::{ResultSlot, ResultState, Snapshot, StateWatcher},
};

/// The only message a transport or decoding failure ever surfaces.
pub const LOAD_FAILED: &str = "Failed to load data";

/// What to do when the service answers without usable data
/// (non-success status, or success with an empty body).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncompletePolicy {
    /// Publish an `Error` describing the answer.
    #[default]
    Fail,
    /// Publish nothing; the slot keeps showing `Loading`.
    StayLoading,
}

/// Which of several overlapping fetches gets the last word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseOrdering {
    /// Only the most recently issued fetch may publish.
    #[default]
    LatestRequest,
    /// Whichever fetch resolves last wins, regardless of issue order.
    LastResolver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerOptions {
    pub on_incomplete: IncompletePolicy,
    pub ordering: ResponseOrdering,
}

#[derive(Debug)]
pub struct WeatherController {
    provider: Arc<dyn WeatherProvider>,
    slot: Arc<ResultSlot<WeatherPayload>>,
    generation: Arc<AtomicU64>,
    options: ControllerOptions,
    scope: CancellationToken,
}

impl WeatherController {
    pub fn new(provider: Arc<dyn WeatherProvider>, options: ControllerOptions) -> Self {
        Self {
            provider,
            slot: Arc::new(ResultSlot::new()),
            generation: Arc::new(AtomicU64::new(0)),
            options,
            scope: CancellationToken::new(),
        }
    }

    pub fn subscribe(&self) -> StateWatcher<WeatherPayload> {
        self.slot.subscribe()
    }

    pub fn current(&self) -> Snapshot<WeatherPayload> {
        self.slot.current()
    }

    /// Start fetching current weather for `query`.
    ///
    /// `Loading` is published before this returns. The outcome arrives later
    /// through the slot. Must be called from within a Tokio runtime.
    pub fn fetch(&self, query: impl Into<String>) {
        let query = query.into();

        if self.scope.is_cancelled() {
            warn!(query, "fetch requested after shutdown; ignoring");
            return;
        }

        let mut ticket = 0;
        self.slot.publish_if(ResultState::Loading, || {
            ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            true
        });
        debug!(query, ticket, "published loading");

        let task = FetchTask {
            provider: Arc::clone(&self.provider),
            slot: Arc::clone(&self.slot),
            generation: Arc::clone(&self.generation),
            options: self.options,
            scope: self.scope.clone(),
            ticket,
        };
        tokio::spawn(task.run(query));
    }

    /// Cancel every in-flight fetch. Nothing is published afterwards.
    pub fn shutdown(&self) {
        self.scope.cancel();
    }
}

impl Drop for WeatherController {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

struct FetchTask {
    provider: Arc<dyn WeatherProvider>,
    slot: Arc<ResultSlot<WeatherPayload>>,
    generation: Arc<AtomicU64>,
    options: ControllerOptions,
    scope: CancellationToken,
    ticket: u64,
}

impl FetchTask {
    async fn run(self, query: String) {
        let reply = tokio::select! {
            biased;
            _ = self.scope.cancelled() => {
                debug!(query, ticket = self.ticket, "fetch cancelled");
                return;
            }
            reply = self.provider.current(&query) => reply,
        };

        let state = match reply {
            Ok(ProviderReply::Body(payload)) => Some(ResultState::Success(payload)),
            Ok(ProviderReply::Empty) => {
                self.incomplete(&query, "Weather service returned an empty response".to_string())
            }
            Ok(ProviderReply::Status(code)) => {
                self.incomplete(&query, format!("Weather service returned status {code}"))
            }
            Err(err) => {
                warn!(query, error = %err, "weather fetch failed");
                Some(ResultState::Error(LOAD_FAILED.to_string()))
            }
        };

        if let Some(state) = state {
            self.publish(state);
        }
    }

    fn incomplete(&self, query: &str, message: String) -> Option<ResultState<WeatherPayload>> {
        match self.options.on_incomplete {
            IncompletePolicy::Fail => {
                warn!(query, "{message}");
                Some(ResultState::Error(message))
            }
            IncompletePolicy::StayLoading => {
                warn!(query, "{message}; leaving state as loading");
                None
            }
        }
    }

    fn publish(&self, state: ResultState<WeatherPayload>) {
        let published = self.slot.publish_if(state, || {
            if self.scope.is_cancelled() {
                return false;
            }
            match self.options.ordering {
                ResponseOrdering::LatestRequest => {
                    self.generation.load(Ordering::SeqCst) == self.ticket
                }
                ResponseOrdering::LastResolver => true,
            }
        });

        if published {
            debug!(ticket = self.ticket, "published result");
        } else {
            debug!(ticket = self.ticket, "dropped superseded result");
        }
    }
}
