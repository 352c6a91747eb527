//! # Library Management Module
//!
//! Owns the catalogue of comic libraries and the folder each one maps to.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite schema, migrations and the connection pool
//! - Folder-name normalization and the on-disk library folders
//! - A unit of work that stamps audit timestamps at commit
//! - Filtered, sorted and paginated queries

pub mod db;
pub mod error;
pub mod models;
pub mod normalize;
pub mod query;
pub mod repositories;
pub mod service;
pub mod storage;
pub mod unit_of_work;

pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{ErrorCategory, LibraryError, Result};
pub use models::{Library, LibraryId};
pub use normalize::normalize;
pub use query::{LibraryQuery, LibrarySortColumn, PageQueryExecutor, PageSource, SortSpec};
pub use repositories::{LibraryRepository, PageRequest, PagedResult, SqliteLibraryRepository};
pub use service::{LibraryService, PageLimits};
pub use storage::{FolderError, LibraryFolderStore};
pub use unit_of_work::{AuditingUnitOfWork, ChangeStore, EntityState};
