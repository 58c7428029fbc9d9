// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::LedgerEvent;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

pub type Subscriber = Arc<dyn Fn(&LedgerEvent) + Send + Sync>;

#[derive(Default)]
struct Inner {
    events: Vec<LedgerEvent>,
    subscribers: Vec<Subscriber>,
}

/// Append only record of emitted ledger events. Cloning gives another handle onto the same log
/// so every contract of a deployment writes into one ordered stream.
#[derive(Clone, Default)]
pub struct EventLog {
    inner: Arc<Mutex<Inner>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a callback that sees every subsequently emitted event.
    pub fn subscribe(&self, subscriber: impl Fn(&LedgerEvent) + Send + Sync + 'static) {
        self.inner().subscribers.push(Arc::new(subscriber));
    }

    /// Subscribers run after the event is recorded and outside the lock, so they may read the
    /// log or emit follow up events.
    pub fn emit(&self, event: impl Into<LedgerEvent>) {
        let event = event.into();
        trace!(evt = %event, "emit");
        let subscribers = {
            let mut inner = self.inner();
            inner.events.push(event.clone());
            inner.subscribers.clone()
        };
        for subscriber in subscribers {
            subscriber(&event);
        }
    }

    pub fn events(&self) -> Vec<LedgerEvent> {
        self.inner().events.clone()
    }

    pub fn len(&self) -> usize {
        self.inner().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner().events.is_empty()
    }

    pub fn last(&self) -> Option<LedgerEvent> {
        self.inner().events.last().cloned()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("events", &self.len())
            .finish()
    }
}
