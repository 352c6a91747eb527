//! # Repositories
//!
//! Read access to persisted entities plus the [`ChangeStore`](crate::unit_of_work::ChangeStore)
//! implementations that write them.

pub mod library;
pub mod pagination;

pub use library::{LibraryRepository, SqliteLibraryRepository, SqliteLibrarySource};
pub use pagination::{PageRequest, PagedResult};
