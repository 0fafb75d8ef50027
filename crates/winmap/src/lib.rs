//! A sliding-window memory-map cache manager.
//!
//! Clients obtain a [`Cursor`] over a file from a [`StaticWindowMapManager`] (one
//! region per file, spanning the whole file) or a [`SlidingWindowMapManager`] (many
//! bounded regions, grown to fill the gap between neighbors). Both flavors share
//! usage accounting and LRU eviction of idle regions bounded by a soft memory budget
//! and a hard handle-count budget.
//!
//! This crate is single-threaded: a manager and its cursors are not `Send`/`Sync`.
//! Concurrent access from multiple threads is the caller's responsibility.

mod config;
mod cursor;
mod error;
mod file_id;
mod manager;
mod platform;
mod region;
mod region_list;
mod window;

pub use config::{ManagerConfig, WindowSize};
pub use cursor::Cursor;
pub use error::{Error, Result};
pub use file_id::FileId;
pub use manager::{SlidingWindowMapManager, StaticWindowMapManager};
pub use platform::{file_size, is_64_bit, page_size};
