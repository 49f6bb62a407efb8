//! Poster artwork cache.
//!
//! Each URL is loaded at most once per session: concurrent requests share the
//! same load, successes are kept, failures are remembered and never retried.
//! A semaphore bounds how many loads run at the same time.

use crate::item::PosterUrl;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{Semaphore, oneshot};

pub const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PosterError {
    #[error("Failed to load poster '{url}': {reason}")]
    Load { url: String, reason: String },
    #[error("Poster cache shut down")]
    Closed,
}

impl PosterError {
    pub fn load(url: &PosterUrl, reason: impl ToString) -> Self {
        Self::Load {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Fetches and decodes the image behind a poster URL.
pub trait PosterLoader: Send + Sync + 'static {
    type Image: Clone + Send + Sync + 'static;

    fn load(
        &self,
        url: &PosterUrl,
    ) -> impl Future<Output = Result<Self::Image, PosterError>> + Send;
}

#[derive(Debug, Clone, PartialEq)]
pub enum PosterState<I> {
    Ready(I),
    Pending,
    Failed,
}

/// Called once when a pending load finishes, whatever its result.
pub type ReadyCallback = Box<dyn FnOnce() + Send>;

enum Entry<I> {
    Loading {
        waiters: Vec<oneshot::Sender<Result<I, PosterError>>>,
        callbacks: Vec<ReadyCallback>,
    },
    Ready(I),
    Failed(PosterError),
}

pub struct PosterCache<L: PosterLoader> {
    loader: Arc<L>,
    entries: Mutex<HashMap<PosterUrl, Entry<L::Image>>>,
    permits: Arc<Semaphore>,
    runtime: Handle,
}

impl<L: PosterLoader> PosterCache<L> {
    pub fn new(loader: L, concurrency: usize, runtime: Handle) -> Arc<Self> {
        Arc::new(Self {
            loader: Arc::new(loader),
            entries: Mutex::new(HashMap::new()),
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            runtime,
        })
    }

    /// Non-blocking lookup for the renderer. A URL seen for the first time
    /// starts loading; `on_ready` fires when a pending load completes.
    ///
    /// A pending URL holds at most one callback, later ones are dropped.
    pub fn lookup(
        self: &Arc<Self>,
        url: &PosterUrl,
        on_ready: Option<ReadyCallback>,
    ) -> PosterState<L::Image> {
        let (state, start) = {
            let mut entries = self.entries.lock();
            match entries.get_mut(url) {
                Some(Entry::Ready(image)) => (PosterState::Ready(image.clone()), false),
                Some(Entry::Failed(_)) => (PosterState::Failed, false),
                Some(Entry::Loading { callbacks, .. }) => {
                    if callbacks.is_empty() {
                        callbacks.extend(on_ready);
                    }
                    (PosterState::Pending, false)
                }
                None => {
                    entries.insert(
                        url.clone(),
                        Entry::Loading {
                            waiters: Vec::new(),
                            callbacks: on_ready.into_iter().collect(),
                        },
                    );
                    (PosterState::Pending, true)
                }
            }
        };
        if start {
            self.spawn_load(url.clone());
        }
        state
    }

    /// Resolve the image for `url`, sharing any load already in flight.
    pub async fn get(self: &Arc<Self>, url: &PosterUrl) -> Result<L::Image, PosterError> {
        let (rx, start) = {
            let mut entries = self.entries.lock();
            match entries.get_mut(url) {
                Some(Entry::Ready(image)) => return Ok(image.clone()),
                Some(Entry::Failed(e)) => return Err(e.clone()),
                Some(Entry::Loading { waiters, .. }) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    (rx, false)
                }
                None => {
                    let (tx, rx) = oneshot::channel();
                    entries.insert(
                        url.clone(),
                        Entry::Loading {
                            waiters: vec![tx],
                            callbacks: Vec::new(),
                        },
                    );
                    (rx, true)
                }
            }
        };
        if start {
            self.spawn_load(url.clone());
        }
        rx.await.unwrap_or(Err(PosterError::Closed))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn spawn_load(self: &Arc<Self>, url: PosterUrl) {
        let cache = Arc::clone(self);
        self.runtime.spawn(async move {
            let result = match cache.permits.clone().acquire_owned().await {
                Ok(_permit) => cache.loader.load(&url).await,
                Err(_) => Err(PosterError::Closed),
            };
            cache.finish(url, result);
        });
    }

    fn finish(&self, url: PosterUrl, result: Result<L::Image, PosterError>) {
        match &result {
            Ok(_) => log::debug!("Loaded poster {}", url),
            Err(e) => log::warn!("{}", e),
        }

        let entry = match &result {
            Ok(image) => Entry::Ready(image.clone()),
            Err(e) => Entry::Failed(e.clone()),
        };
        let previous = self.entries.lock().insert(url, entry);

        if let Some(Entry::Loading { waiters, callbacks }) = previous {
            for callback in callbacks {
                callback();
            }
            for waiter in waiters {
                let _ = waiter.send(result.clone());
            }
        }
    }
}
