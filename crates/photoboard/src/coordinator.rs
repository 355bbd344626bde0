use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::ResourceCache;
use crate::display::DisplayHandle;
use crate::id::ResourceId;
use crate::source::{Decoder, Fetcher};

/// What [`FetchCoordinator::request`] did.
#[derive(Debug)]
pub enum Dispatch {
    /// Cache hit; the callback already ran.
    Cached,
    /// A fetch was spawned. Dropping the handle does not cancel it.
    Fetching(JoinHandle<()>),
}

impl Dispatch {
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached)
    }
}

/// Cache check, remote fetch, decode, store, and callback delivery.
///
/// Failed fetches and decodes are logged and dropped: the callback never
/// runs and nothing is remembered, so the next request for the same
/// identifier fetches again. Concurrent misses for one identifier each fetch.
///
/// Nothing is evicted, so the cache grows until it is cleared. A fetch that is
/// still in flight when the cache is cleared stores its result afterwards,
/// which can leave entries for identifiers the caller has already dropped.
pub struct FetchCoordinator<D: Decoder> {
    cache: ResourceCache<D::Output>,
    fetcher: Arc<dyn Fetcher>,
    decoder: Arc<D>,
    runtime: Handle,
    display: DisplayHandle,
}

impl<D: Decoder> FetchCoordinator<D> {
    pub fn new(
        cache: ResourceCache<D::Output>,
        fetcher: Arc<dyn Fetcher>,
        decoder: D,
        runtime: Handle,
        display: DisplayHandle,
    ) -> Self {
        Self {
            cache,
            fetcher,
            decoder: Arc::new(decoder),
            runtime,
            display,
        }
    }

    pub fn cache(&self) -> &ResourceCache<D::Output> {
        &self.cache
    }

    /// Deliver the resource for `id` to `on_ready`.
    ///
    /// On a hit `on_ready` runs right here, before this returns. On a miss it
    /// runs later on the display context, and only if the fetch and decode
    /// succeed. Callers must treat a late delivery as possibly stale.
    pub fn request<F>(&self, id: &ResourceId, on_ready: F) -> Dispatch
    where
        F: FnOnce(D::Output) + Send + 'static,
    {
        if let Some(resource) = self.cache.lookup(id) {
            on_ready(resource);
            return Dispatch::Cached;
        }

        let id = id.clone();
        let cache = self.cache.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let decoder = Arc::clone(&self.decoder);
        let display = self.display.clone();

        Dispatch::Fetching(self.runtime.spawn(async move {
            let bytes = match fetcher.fetch(&id).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("fetch failed for {id}: {e}");
                    return;
                }
            };

            let resource = match tokio::task::spawn_blocking(move || decoder.decode(&bytes)).await
            {
                Ok(Ok(resource)) => resource,
                Ok(Err(e)) => {
                    warn!("decode failed for {id}: {e}");
                    return;
                }
                Err(e) => {
                    warn!("decode task for {id} did not finish: {e}");
                    return;
                }
            };

            cache.store(id.clone(), resource.clone());
            if !display.post(move || on_ready(resource)) {
                debug!("display context gone, dropping result for {id}");
            }
        }))
    }
}
