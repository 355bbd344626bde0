//! # photoboard
//!
//! In-memory image cache plus a fetch-and-populate coordinator for grids
//! whose display slots are recycled while fetches are still in flight.
//!
//! ```no_run
//! use photoboard::{display_channel, BoardOptions, ImageGrid, SlotContent};
//!
//! # async fn example() -> photoboard::Result<()> {
//! let (display, mut queue) = display_channel();
//! let mut grid = ImageGrid::with_http(
//!     &BoardOptions::default(),
//!     tokio::runtime::Handle::current(),
//!     display,
//! )?;
//! grid.reload_all();
//!
//! let slot = grid.dequeue_slot(0).expect("grid is not empty");
//! while matches!(grid.slot(slot).map(|s| s.content), Some(SlotContent::Pending)) {
//!     queue.run_next().await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod display;
pub mod error;
pub mod grid;
pub mod id;
pub mod locator;
pub mod source;

#[cfg(test)]
mod testing;

pub use cache::ResourceCache;
pub use config::BoardOptions;
pub use coordinator::{Dispatch, FetchCoordinator};
pub use display::{display_channel, DisplayHandle, DisplayQueue};
pub use error::{PhotoBoardError, Result};
pub use grid::{ImageGrid, SlotContent, SlotKey, SlotSnapshot};
pub use id::{IdentifierSet, ResourceId};
pub use locator::LocatorTemplate;
pub use source::{DecodedImage, Decoder, Fetcher, HttpFetcher, ImageDecoder};
