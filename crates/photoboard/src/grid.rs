use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, info, trace};

use crate::cache::ResourceCache;
use crate::config::BoardOptions;
use crate::coordinator::FetchCoordinator;
use crate::display::DisplayHandle;
use crate::error::Result;
use crate::id::{IdentifierSet, ResourceId};
use crate::locator::LocatorTemplate;
use crate::source::{Decoder, HttpFetcher, ImageDecoder};

/// What a slot currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotContent<R> {
    Empty,
    /// Waiting for a fetch; the host shows its placeholder.
    Pending,
    Ready(R),
}

/// Handle to a pooled slot. Stays valid for the lifetime of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey(pub usize);

/// Point-in-time view of a slot.
#[derive(Debug, Clone)]
pub struct SlotSnapshot<R> {
    pub position: Option<usize>,
    pub id: Option<ResourceId>,
    pub content: SlotContent<R>,
}

/// Captured at request time; a completion applies only if it still matches.
struct Ticket {
    generation: u64,
    id: ResourceId,
}

/// A recyclable display unit. Every rebind or reset bumps `generation`.
struct ConsumerSlot<R> {
    generation: u64,
    binding: Option<(usize, ResourceId)>,
    content: SlotContent<R>,
}

impl<R: Clone> ConsumerSlot<R> {
    fn new() -> Self {
        Self {
            generation: 0,
            binding: None,
            content: SlotContent::Empty,
        }
    }

    fn bind(&mut self, position: usize, id: ResourceId) -> Ticket {
        self.generation += 1;
        self.binding = Some((position, id.clone()));
        self.content = SlotContent::Pending;
        Ticket {
            generation: self.generation,
            id,
        }
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.binding = None;
        self.content = SlotContent::Empty;
    }

    fn apply(&mut self, ticket: &Ticket, resource: R) -> bool {
        let current = self.generation == ticket.generation
            && matches!(self.binding, Some((_, ref id)) if *id == ticket.id);
        if current {
            self.content = SlotContent::Ready(resource);
        }
        current
    }

    fn snapshot(&self) -> SlotSnapshot<R> {
        SlotSnapshot {
            position: self.binding.as_ref().map(|(position, _)| *position),
            id: self.binding.as_ref().map(|(_, id)| id.clone()),
            content: self.content.clone(),
        }
    }
}

type SharedSlot<R> = Arc<Mutex<ConsumerSlot<R>>>;

/// Headless image grid: the identifier set plus a pool of recycled slots.
///
/// All methods are meant to be called from the display context, the same
/// thread that drains the [`DisplayQueue`](crate::DisplayQueue) the
/// coordinator posts into.
pub struct ImageGrid<D: Decoder> {
    coordinator: FetchCoordinator<D>,
    locator: LocatorTemplate,
    initial_count: usize,
    ids: IdentifierSet,
    slots: Vec<SharedSlot<D::Output>>,
    free: Vec<SlotKey>,
}

impl ImageGrid<ImageDecoder> {
    /// Grid backed by [`HttpFetcher`] and [`ImageDecoder`].
    pub fn with_http(options: &BoardOptions, runtime: Handle, display: DisplayHandle) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(options)?);
        let coordinator =
            FetchCoordinator::new(ResourceCache::new(), fetcher, ImageDecoder, runtime, display);
        Self::new(coordinator, options)
    }
}

impl<D: Decoder> ImageGrid<D> {
    /// Create an empty grid. Call [`ImageGrid::reload_all`] to populate it.
    pub fn new(coordinator: FetchCoordinator<D>, options: &BoardOptions) -> Result<Self> {
        Ok(Self {
            coordinator,
            locator: LocatorTemplate::new(&options.base_url)?,
            initial_count: options.initial_count,
            ids: IdentifierSet::new(),
            slots: Vec::new(),
            free: Vec::new(),
        })
    }

    pub fn coordinator(&self) -> &FetchCoordinator<D> {
        &self.coordinator
    }

    pub fn cache(&self) -> &ResourceCache<D::Output> {
        self.coordinator.cache()
    }

    pub fn identifiers(&self) -> &IdentifierSet {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Drop every cached resource and replace all identifiers with fresh ones.
    ///
    /// Bound slots are rebound to their position under the new identifiers.
    /// Slots whose position no longer exists are left empty but stay checked
    /// out: the caller still owns them and must hand them back with
    /// [`ImageGrid::recycle_slot`].
    ///
    /// Fetches already in flight are not cancelled. Their results still land
    /// in the cache after the clear, under identifiers that are no longer in
    /// the set, and stay there until the next reload.
    pub fn reload_all(&mut self) {
        self.coordinator.cache().clear();

        let fresh: Vec<ResourceId> = (0..self.initial_count)
            .map(|_| self.locator.next_id())
            .collect();
        self.ids.replace(fresh);
        info!("reloaded {} identifiers", self.ids.len());

        for index in 0..self.slots.len() {
            let position = self.slots[index].lock().binding.as_ref().map(|(p, _)| *p);
            match position {
                Some(position) if position < self.ids.len() => self.bind(SlotKey(index), position),
                Some(_) => self.slots[index].lock().reset(),
                None => {}
            }
        }
    }

    /// Append one fresh identifier and return its position.
    pub fn add_image(&mut self) -> usize {
        let id = self.locator.next_id();
        let position = self.ids.push(id);
        debug!("added identifier at position {position}");
        position
    }

    /// Take a slot from the pool, bind it to `position` and request its image.
    ///
    /// Returns `None` if `position` is out of range.
    pub fn dequeue_slot(&mut self, position: usize) -> Option<SlotKey> {
        if position >= self.ids.len() {
            return None;
        }
        let key = match self.free.pop() {
            Some(key) => key,
            None => {
                self.slots.push(Arc::new(Mutex::new(ConsumerSlot::new())));
                SlotKey(self.slots.len() - 1)
            }
        };
        self.bind(key, position);
        Some(key)
    }

    /// Return a slot to the pool. In-flight results for it will be discarded.
    pub fn recycle_slot(&mut self, key: SlotKey) -> bool {
        let Some(slot) = self.slots.get(key.0) else {
            return false;
        };
        if self.free.contains(&key) {
            return false;
        }
        slot.lock().reset();
        self.free.push(key);
        true
    }

    pub fn slot(&self, key: SlotKey) -> Option<SlotSnapshot<D::Output>> {
        self.slots.get(key.0).map(|slot| slot.lock().snapshot())
    }

    fn bind(&self, key: SlotKey, position: usize) {
        let Some(id) = self.ids.get(position).cloned() else {
            return;
        };
        let slot = Arc::clone(&self.slots[key.0]);
        // The lock must be released before `request`: a cache hit calls back
        // synchronously.
        let ticket = slot.lock().bind(position, id.clone());

        self.coordinator.request(&id, move |resource| {
            if !slot.lock().apply(&ticket, resource) {
                trace!("discarding stale result for {}", ticket.id);
            }
        });
    }
}
