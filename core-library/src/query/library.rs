//! Query request and sortable columns for libraries.

use super::sort::{SortColumn, SortSpec};
use crate::models::Library;
use crate::normalize::normalize;
use crate::repositories::PageRequest;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sortable library columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LibrarySortColumn {
    #[default]
    Id,
    Name,
    RelativePath,
    CreatedOn,
    ModifiedOn,
}

impl SortColumn for LibrarySortColumn {
    type Entity = Library;

    const ALL: &'static [Self] = &[
        LibrarySortColumn::Id,
        LibrarySortColumn::Name,
        LibrarySortColumn::RelativePath,
        LibrarySortColumn::CreatedOn,
        LibrarySortColumn::ModifiedOn,
    ];

    fn names(&self) -> &'static [&'static str] {
        match self {
            LibrarySortColumn::Id => &["id"],
            LibrarySortColumn::Name => &["name"],
            LibrarySortColumn::RelativePath => &["relativePath", "relative_path", "path"],
            LibrarySortColumn::CreatedOn => &["createdOnUtc", "created_on_utc", "created"],
            LibrarySortColumn::ModifiedOn => &["modifiedOnUtc", "modified_on_utc", "modified"],
        }
    }

    fn sql_expression(&self) -> &'static str {
        match self {
            LibrarySortColumn::Id => "id",
            LibrarySortColumn::Name => "name",
            LibrarySortColumn::RelativePath => "relative_path",
            LibrarySortColumn::CreatedOn => "created_on_utc",
            LibrarySortColumn::ModifiedOn => "modified_on_utc",
        }
    }

    fn compare(&self, a: &Library, b: &Library) -> Ordering {
        match self {
            LibrarySortColumn::Id => a.id.cmp(&b.id),
            LibrarySortColumn::Name => a.name().cmp(b.name()),
            LibrarySortColumn::RelativePath => a.relative_path().cmp(b.relative_path()),
            LibrarySortColumn::CreatedOn => a.created_on_utc().cmp(&b.created_on_utc()),
            LibrarySortColumn::ModifiedOn => a.modified_on_utc().cmp(&b.modified_on_utc()),
        }
    }
}

/// Library listing request as received from the API/UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryQuery {
    /// Free-text filter matched against the normalized library name
    pub search: Option<String>,
    /// Column name, see [`LibrarySortColumn`]
    pub sort_column: Option<String>,
    /// `"asc"` or `"desc"`
    pub sort_order: Option<String>,
    /// 1-indexed page number
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    PageRequest::default().page
}

fn default_page_size() -> u32 {
    PageRequest::default().page_size
}

impl Default for LibraryQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort_column: None,
            sort_order: None,
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl LibraryQuery {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            ..Self::default()
        }
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_sort(mut self, column: impl Into<String>, order: impl Into<String>) -> Self {
        self.sort_column = Some(column.into());
        self.sort_order = Some(order.into());
        self
    }

    pub fn sort_spec(&self) -> SortSpec<LibrarySortColumn> {
        SortSpec::resolve(self.sort_column.as_deref(), self.sort_order.as_deref())
    }

    /// Normalized search term, `None` when absent or blank.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(normalize)
            .filter(|term| !term.is_empty())
    }

    /// In-memory equivalent of the repository's search filter.
    pub fn matches(&self, library: &Library) -> bool {
        match self.search_term() {
            Some(term) => library.relative_path().contains(&term),
            None => true,
        }
    }
}
