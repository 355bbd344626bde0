//! Fake collaborators shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::{PhotoBoardError, Result};
use crate::id::ResourceId;
use crate::source::{Decoder, Fetcher};

/// Serves the locator text back as the payload. Ids starting with `fail`
/// error out; ids starting with `bad` return bytes that are not UTF-8.
#[derive(Default)]
pub struct EchoFetcher {
    calls: AtomicUsize,
}

impl EchoFetcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for EchoFetcher {
    fn fetch<'a>(&'a self, id: &'a ResourceId) -> BoxFuture<'a, Result<Vec<u8>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if id.as_str().starts_with("fail") {
                Err(PhotoBoardError::Status {
                    url: id.to_string(),
                    status: 503,
                })
            } else if id.as_str().starts_with("bad") {
                Ok(vec![0xff, 0xfe])
            } else {
                Ok(id.as_str().as_bytes().to_vec())
            }
        }
        .boxed()
    }
}

/// Like [`EchoFetcher`], but each fetch waits until its id is released.
#[derive(Default)]
pub struct GatedFetcher {
    gates: Mutex<AHashMap<ResourceId, Arc<Notify>>>,
    calls: AtomicUsize,
}

impl GatedFetcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Let one pending (or the next) fetch of `id` complete.
    pub fn release(&self, id: &ResourceId) {
        self.gate(id).notify_one();
    }

    fn gate(&self, id: &ResourceId) -> Arc<Notify> {
        Arc::clone(self.gates.lock().entry(id.clone()).or_default())
    }
}

impl Fetcher for GatedFetcher {
    fn fetch<'a>(&'a self, id: &'a ResourceId) -> BoxFuture<'a, Result<Vec<u8>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate(id);
        async move {
            gate.notified().await;
            Ok(id.as_str().as_bytes().to_vec())
        }
        .boxed()
    }
}

pub struct Utf8Decoder;

impl Decoder for Utf8Decoder {
    type Output = String;

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| PhotoBoardError::Other(e.to_string()))
    }
}
