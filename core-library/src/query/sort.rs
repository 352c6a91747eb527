//! Caller-supplied sort parameters resolved against a closed set of columns.
//!
//! A column name from the outside world ("name", "relativePath", ...) is
//! matched case-insensitively against the columns a [`SortColumn`] type
//! declares. Anything unknown falls back to the column's default, which must
//! be the entity identifier, so every resolved ordering is total.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Debug;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Parse `"asc"` / `"desc"` (case-insensitive); anything else is ascending.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("desc") || v.eq_ignore_ascii_case("descending") => {
                SortDirection::Descending
            }
            _ => SortDirection::Ascending,
        }
    }

    pub fn is_ascending(self) -> bool {
        self == SortDirection::Ascending
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// A closed set of sortable fields of `Entity`.
///
/// `Default` must be the identifier column: it is used for unknown names and
/// as the tie-breaker of every other column.
pub trait SortColumn: Copy + Default + Eq + Debug + Send + Sync + 'static {
    type Entity;

    /// Every column, used for name lookup.
    const ALL: &'static [Self];

    /// Names accepted for this column, compared case-insensitively.
    fn names(&self) -> &'static [&'static str];

    /// SQL expression used in `ORDER BY`.
    fn sql_expression(&self) -> &'static str;

    /// Compare two entities by this column's key.
    fn compare(&self, a: &Self::Entity, b: &Self::Entity) -> Ordering;

    fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.iter().copied().find(|column| {
            column
                .names()
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(name))
        })
    }
}

/// A resolved ordering: one column plus a direction, with the identifier as
/// ascending tie-breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<C> {
    pub column: C,
    pub direction: SortDirection,
}

impl<C: SortColumn> SortSpec<C> {
    pub fn new(column: C, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    /// Resolve optional, untrusted sort parameters.
    ///
    /// ```
    /// use core_library::query::{LibrarySortColumn, SortDirection, SortSpec};
    ///
    /// let spec = SortSpec::<LibrarySortColumn>::resolve(None, None);
    /// assert_eq!(spec.column, LibrarySortColumn::Id);
    /// assert_eq!(spec.direction, SortDirection::Ascending);
    ///
    /// let spec = SortSpec::<LibrarySortColumn>::resolve(Some("NAME"), Some("desc"));
    /// assert_eq!(spec.column, LibrarySortColumn::Name);
    /// assert!(!spec.ascending());
    /// ```
    pub fn resolve(column: Option<&str>, direction: Option<&str>) -> Self {
        Self {
            column: column.and_then(C::from_name).unwrap_or_default(),
            direction: SortDirection::parse(direction),
        }
    }

    pub fn ascending(&self) -> bool {
        self.direction.is_ascending()
    }

    /// Total order over entities.
    pub fn compare(&self, a: &C::Entity, b: &C::Entity) -> Ordering {
        self.direction
            .apply(self.column.compare(a, b))
            .then_with(|| C::default().compare(a, b))
    }

    /// `ORDER BY` clause matching [`compare`](Self::compare).
    pub fn order_by_clause(&self) -> String {
        let primary = format!(
            "{} {}",
            self.column.sql_expression(),
            self.direction.as_sql()
        );
        if self.column == C::default() {
            format!("ORDER BY {primary}")
        } else {
            format!(
                "ORDER BY {primary}, {} ASC",
                C::default().sql_expression()
            )
        }
    }
}

impl<C: SortColumn> Default for SortSpec<C> {
    fn default() -> Self {
        Self::new(C::default(), SortDirection::Ascending)
    }
}
