//! # Paginated Queries
//!
//! - [`sort`] resolves caller-supplied column/direction strings into a total
//!   ordering over a closed set of columns.
//! - [`executor`] turns any ordered, filtered [`PageSource`] into a
//!   [`PagedResult`](crate::repositories::PagedResult).
//! - [`memory`] provides an in-process source; the SQLite source lives with
//!   the library repository.
//! - [`library`] holds the library-specific request and columns.

pub mod executor;
pub mod library;
pub mod memory;
pub mod sort;

pub use executor::{PageQueryExecutor, PageSource};
pub use library::{LibraryQuery, LibrarySortColumn};
pub use memory::InMemorySource;
pub use sort::{SortColumn, SortDirection, SortSpec};
