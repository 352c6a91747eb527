//! Library repository trait and SQLite implementation
//!
//! Reads go through [`LibraryRepository`]; writes only happen through
//! [`ChangeStore::save_changes`], driven by an
//! [`AuditingUnitOfWork`](crate::unit_of_work::AuditingUnitOfWork).

use crate::error::{LibraryError, Result};
use crate::models::Library;
use crate::query::{LibraryQuery, LibrarySortColumn, PageQueryExecutor, PageSource, SortSpec};
use crate::repositories::PagedResult;
use crate::unit_of_work::{ChangeStore, EntityEntry, EntityState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, query_scalar, FromRow, Sqlite, SqlitePool, Transaction};
use tracing::debug;

const LIBRARY_COLUMNS: &str = "id, name, relative_path, created_on_utc, modified_on_utc";

/// Library repository interface for data access operations
#[async_trait]
pub trait LibraryRepository: Send + Sync {
    /// Find a library by its ID
    ///
    /// # Returns
    /// - `Ok(Some(library))` if found
    /// - `Ok(None)` if not found
    /// - `Err` if database error occurs
    async fn find_by_id(&self, id: &str) -> Result<Option<Library>>;

    /// Find the library owning a normalized folder name
    async fn find_by_relative_path(&self, relative_path: &str) -> Result<Option<Library>>;

    /// Filter, sort and paginate libraries
    ///
    /// Unknown sort columns fall back to the identifier; the total count
    /// reflects the search filter.
    async fn query(&self, request: &LibraryQuery) -> Result<PagedResult<Library>>;

    /// Count total libraries
    async fn count(&self) -> Result<i64>;
}

#[derive(Debug, FromRow)]
struct LibraryRow {
    id: String,
    name: String,
    relative_path: String,
    created_on_utc: i64,
    modified_on_utc: Option<i64>,
}

impl From<LibraryRow> for Library {
    fn from(row: LibraryRow) -> Self {
        Library::from_storage(
            row.id,
            row.name,
            row.relative_path,
            DateTime::from_timestamp_micros(row.created_on_utc),
            row.modified_on_utc.and_then(DateTime::from_timestamp_micros),
        )
    }
}

fn to_micros(at: Option<DateTime<Utc>>) -> Option<i64> {
    at.map(|t| t.timestamp_micros())
}

/// SQLite implementation of LibraryRepository
#[derive(Debug, Clone)]
pub struct SqliteLibraryRepository {
    pool: SqlitePool,
}

impl SqliteLibraryRepository {
    /// Create a new SqliteLibraryRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Page source for `request`'s filter and ordering.
    pub fn source(&self, request: &LibraryQuery) -> SqliteLibrarySource {
        SqliteLibrarySource {
            pool: self.pool.clone(),
            search: request.search_term(),
            sort: request.sort_spec(),
        }
    }

    fn validate(library: &Library) -> Result<()> {
        library.validate().map_err(|e| LibraryError::InvalidInput {
            field: "Library".to_string(),
            message: e,
        })
    }

    async fn apply(tx: &mut Transaction<'_, Sqlite>, entry: &EntityEntry<Library>) -> Result<u64> {
        let library = entry.entity();
        let affected = match entry.state() {
            EntityState::Unchanged => return Ok(0),
            EntityState::Added => {
                Self::validate(library)?;
                let created = to_micros(library.created_on_utc()).ok_or_else(|| {
                    LibraryError::InvalidInput {
                        field: "created_on_utc".to_string(),
                        message: "new libraries must be stamped before insertion".to_string(),
                    }
                })?;
                query(
                    r#"
                    INSERT INTO libraries (id, name, relative_path, created_on_utc, modified_on_utc)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&library.id)
                .bind(library.name())
                .bind(library.relative_path())
                .bind(created)
                .bind(to_micros(library.modified_on_utc()))
                .execute(&mut **tx)
                .await
                .map_err(|e| map_unique_violation(e, library))?
                .rows_affected()
            }
            EntityState::Modified => {
                Self::validate(library)?;
                query(
                    r#"
                    UPDATE libraries
                    SET name = ?, relative_path = ?, modified_on_utc = ?
                    WHERE id = ?
                    "#,
                )
                .bind(library.name())
                .bind(library.relative_path())
                .bind(to_micros(library.modified_on_utc()))
                .bind(&library.id)
                .execute(&mut **tx)
                .await
                .map_err(|e| map_unique_violation(e, library))?
                .rows_affected()
            }
            EntityState::Deleted => query("DELETE FROM libraries WHERE id = ?")
                .bind(&library.id)
                .execute(&mut **tx)
                .await?
                .rows_affected(),
        };

        if affected == 0 {
            return Err(LibraryError::NotFound {
                entity_type: "Library".to_string(),
                id: library.id.clone(),
            });
        }
        Ok(affected)
    }
}

fn map_unique_violation(err: sqlx::Error, library: &Library) -> LibraryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => LibraryError::AlreadyExists {
            entity_type: "Library".to_string(),
            key: library.relative_path().to_string(),
        },
        _ => LibraryError::Database(err),
    }
}

#[async_trait]
impl LibraryRepository for SqliteLibraryRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Library>> {
        let row = query_as::<_, LibraryRow>(&format!(
            "SELECT {LIBRARY_COLUMNS} FROM libraries WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Library::from))
    }

    async fn find_by_relative_path(&self, relative_path: &str) -> Result<Option<Library>> {
        let row = query_as::<_, LibraryRow>(&format!(
            "SELECT {LIBRARY_COLUMNS} FROM libraries WHERE relative_path = ? LIMIT 1"
        ))
        .bind(relative_path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Library::from))
    }

    async fn query(&self, request: &LibraryQuery) -> Result<PagedResult<Library>> {
        PageQueryExecutor::execute(&self.source(request), request.page_request()).await
    }

    async fn count(&self) -> Result<i64> {
        let count = query_scalar::<_, i64>("SELECT COUNT(*) FROM libraries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl ChangeStore<Library> for SqliteLibraryRepository {
    type Error = LibraryError;

    /// Apply every staged entry in one transaction.
    async fn save_changes(&self, entries: &[EntityEntry<Library>]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0u64;
        for entry in entries {
            affected += Self::apply(&mut tx, entry).await?;
        }
        tx.commit().await?;

        debug!(affected, "Saved library changes");
        Ok(affected as usize)
    }
}

/// Filtered, ordered view of the `libraries` table.
#[derive(Debug, Clone)]
pub struct SqliteLibrarySource {
    pool: SqlitePool,
    search: Option<String>,
    sort: SortSpec<LibrarySortColumn>,
}

impl SqliteLibrarySource {
    fn where_clause(&self) -> &'static str {
        if self.search.is_some() {
            r" WHERE relative_path LIKE ? ESCAPE '\'"
        } else {
            ""
        }
    }

    fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|term| format!("%{}%", escape_like(term)))
    }

    async fn count_in<'c, E>(&self, executor: E) -> Result<u64>
    where
        E: sqlx::Executor<'c, Database = Sqlite>,
    {
        let sql = format!("SELECT COUNT(*) FROM libraries{}", self.where_clause());
        let mut count = query_scalar::<_, i64>(&sql);
        if let Some(pattern) = self.search_pattern() {
            count = count.bind(pattern);
        }
        let total = count.fetch_one(executor).await?;
        Ok(total.max(0) as u64)
    }

    async fn fetch_in<'c, E>(&self, executor: E, offset: u64, limit: u64) -> Result<Vec<Library>>
    where
        E: sqlx::Executor<'c, Database = Sqlite>,
    {
        let sql = format!(
            "SELECT {LIBRARY_COLUMNS} FROM libraries{} {} LIMIT ? OFFSET ?",
            self.where_clause(),
            self.sort.order_by_clause()
        );
        let mut rows = query_as::<_, LibraryRow>(&sql);
        if let Some(pattern) = self.search_pattern() {
            rows = rows.bind(pattern);
        }
        let rows = rows
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(executor)
            .await?;
        Ok(rows.into_iter().map(Library::from).collect())
    }
}

#[async_trait]
impl PageSource for SqliteLibrarySource {
    type Item = Library;
    type Error = LibraryError;

    async fn count(&self) -> Result<u64> {
        self.count_in(&self.pool).await
    }

    async fn fetch(&self, offset: u64, limit: u64) -> Result<Vec<Library>> {
        self.fetch_in(&self.pool, offset, limit).await
    }

    /// Count and fetch inside one read transaction so both see the same snapshot.
    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<(u64, Vec<Library>)> {
        let mut tx = self.pool.begin().await?;
        let total = self.count_in(&mut *tx).await?;
        let items = self.fetch_in(&mut *tx, offset, limit).await?;
        tx.commit().await?;
        Ok((total, items))
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
