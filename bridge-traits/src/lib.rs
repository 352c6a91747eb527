//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host.
//!
//! ## Overview
//!
//! This crate defines the contract between the library core and the
//! environment it runs in. Each trait represents a capability the core
//! requires but that may be provided differently per host (local disk,
//! network share, test doubles).
//!
//! ## Traits
//!
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Directory lifecycle and file I/O
//! - [`Clock`](time::Clock) - Time source for audit stamps and deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Host
//! implementations should convert platform-specific errors into it and keep
//! the original `std::io::Error` where one exists, so callers can still
//! inspect its kind.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod error;
pub mod platform;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use storage::{FileMetadata, FileSystemAccess};
pub use time::{Clock, ManualClock, SystemClock};
