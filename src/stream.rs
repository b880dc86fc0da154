//! Reference-counted multiplexing of long-lived external data streams.
//!
//! Many independent consumers (chart, book, explorer panels) want the
//! same underlying feed. The registry keys live streams by a string
//! identity: the first subscriber starts the producer, later subscribers
//! share the in-flight stream, and the last detach cancels it. Dedup
//! keys on the stream id alone, never on producer closure identity.
//!
//! The registry is an explicit value owned by the caller (normally in an
//! `Arc` created at application start), not process-global state, so
//! tests run isolated registries side by side.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

struct StreamEntry {
    cancel: CancellationToken,
    consumers: usize,
    /// Distinguishes successive incarnations of the same stream id, so a
    /// failed producer's cleanup never tears down a successor entry.
    generation: u64,
}

pub struct StreamRegistry {
    streams: Mutex<HashMap<String, StreamEntry>>,
    next_generation: AtomicU64,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Attach a consumer to the stream identified by `stream_id`.
    ///
    /// If no live entry exists, `producer` is invoked exactly once with a
    /// fresh cancellation token and spawned; otherwise the existing
    /// stream is shared and `producer` is dropped unused. The returned
    /// guard detaches on [`StreamGuard::detach`] or on drop; when the
    /// last consumer detaches, the token is cancelled before the detach
    /// call returns and the entry is removed.
    ///
    /// A producer that resolves with an error (or panics) has its entry
    /// removed so a later subscribe retries from scratch instead of
    /// sharing a dead stream.
    pub fn subscribe<F, Fut>(self: &Arc<Self>, stream_id: &str, producer: F) -> StreamGuard
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut streams = self.lock_streams();
        if let Some(entry) = streams.get_mut(stream_id) {
            entry.consumers += 1;
            debug!(stream_id, consumers = entry.consumers, "stream shared");
            return StreamGuard {
                registry: Arc::clone(self),
                stream_id: stream_id.to_string(),
                generation: entry.generation,
                detached: false,
            };
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        streams.insert(
            stream_id.to_string(),
            StreamEntry {
                cancel: cancel.clone(),
                consumers: 1,
                generation,
            },
        );
        drop(streams);
        debug!(stream_id, generation, "stream started");

        let registry = Arc::clone(self);
        let id = stream_id.to_string();
        // The producer runs as its own task so a panic is contained and
        // observed as a join error instead of leaving a wedged entry.
        let producer_task = tokio::spawn(producer(cancel));
        tokio::spawn(async move {
            let failure = match producer_task.await {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(join_err) => Some(join_err.to_string()),
            };
            if let Some(reason) = failure {
                warn!(stream_id = %id, %reason, "stream producer failed");
                registry.remove_generation(&id, generation);
            }
        });

        StreamGuard {
            registry: Arc::clone(self),
            stream_id: stream_id.to_string(),
            generation,
            detached: false,
        }
    }

    /// Number of attached consumers for a stream id, if live.
    pub fn consumer_count(&self, stream_id: &str) -> Option<usize> {
        self.lock_streams().get(stream_id).map(|e| e.consumers)
    }

    /// Ids of all live streams.
    pub fn active_streams(&self) -> Vec<String> {
        self.lock_streams().keys().cloned().collect()
    }

    fn lock_streams(&self) -> std::sync::MutexGuard<'_, HashMap<String, StreamEntry>> {
        self.streams
            .lock()
            .expect("stream registry lock poisoned")
    }

    /// Remove an entry if it still belongs to `generation`.
    fn remove_generation(&self, stream_id: &str, generation: u64) {
        let mut streams = self.lock_streams();
        if streams
            .get(stream_id)
            .is_some_and(|e| e.generation == generation)
        {
            if let Some(entry) = streams.remove(stream_id) {
                entry.cancel.cancel();
            }
        }
    }

    fn detach(&self, stream_id: &str, generation: u64) {
        let mut streams = self.lock_streams();
        let Some(entry) = streams.get_mut(stream_id) else {
            return;
        };
        if entry.generation != generation {
            // The guard outlived its incarnation (producer failed and a
            // newer stream took the id). Nothing to release.
            return;
        }
        entry.consumers -= 1;
        let remaining = entry.consumers;
        if remaining == 0 {
            debug!(stream_id, generation, "last consumer detached, cancelling");
            if let Some(entry) = streams.remove(stream_id) {
                entry.cancel.cancel();
            }
        } else {
            debug!(stream_id, consumers = remaining, "consumer detached");
        }
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// One consumer's attachment to a shared stream. Detaches explicitly via
/// [`StreamGuard::detach`] or implicitly on drop.
pub struct StreamGuard {
    registry: Arc<StreamRegistry>,
    stream_id: String,
    generation: u64,
    detached: bool,
}

impl StreamGuard {
    pub fn detach(mut self) {
        self.release();
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    fn release(&mut self) {
        if !self.detached {
            self.detached = true;
            self.registry.detach(&self.stream_id, self.generation);
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.release();
    }
}
