//! Request generations for callers that re-issue lookups (e.g. a search box
//! refetching on every keystroke). Issuing a new ticket cancels the previous
//! one, and results stamped with an old generation are rejected by `accept`.
//! The aggregators never see any of this.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::gateway::LookupError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamped<T> {
    pub generation: u64,
    pub value: T,
}

#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    cancel: CancellationToken,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs `fut` unless this ticket is cancelled first.
    pub async fn run<F, T>(&self, fut: F) -> Result<Stamped<T>, LookupError>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(generation = self.generation, "request abandoned");
                Err(LookupError::Cancelled)
            }
            value = fut => Ok(Stamped { generation: self.generation, value }),
        }
    }
}

#[derive(Debug, Default)]
pub struct Generations {
    latest: AtomicU64,
    current: Mutex<Option<CancellationToken>>,
}

impl Generations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next ticket and cancels the one before it.
    pub fn next(&self) -> Ticket {
        let cancel = CancellationToken::new();
        // Numbering and token swap happen under one lock so the newest
        // generation always owns the live token.
        let (generation, previous) = {
            let mut current = self
                .current
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            (generation, current.replace(cancel.clone()))
        };
        if let Some(previous) = previous {
            previous.cancel();
        }
        Ticket { generation, cancel }
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.latest()
    }

    /// Returns the value only when it belongs to the newest request.
    pub fn accept<T>(&self, stamped: Stamped<T>) -> Option<T> {
        if self.is_current(stamped.generation) {
            Some(stamped.value)
        } else {
            debug!(
                generation = stamped.generation,
                latest = self.latest(),
                "discarding stale result"
            );
            None
        }
    }
}
