//! Domain models for the comic library
//!
//! This module contains domain models with validation and database mapping.

use crate::normalize::normalize;
use crate::unit_of_work::{Auditable, Entity};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// ID Types
// =============================================================================

/// Unique identifier for a library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LibraryId(pub Uuid);

impl LibraryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for LibraryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LibraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Domain Models
// =============================================================================

/// A comic/book library bound 1:1 to a folder under the configured root.
///
/// `relative_path` is always `normalize(name)`; it is recomputed by
/// [`Library::new`] and [`Library::rename`] and never set from outside.
/// The audit timestamps are owned by the unit of work and stamped at commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    /// Unique identifier (hyphenated UUID)
    pub id: String,
    /// Display name as entered by the user
    name: String,
    /// Folder name under the library root
    relative_path: String,
    /// Set once, at first successful commit
    created_on_utc: Option<DateTime<Utc>>,
    /// Set on every later commit that modifies the library
    modified_on_utc: Option<DateTime<Utc>>,
}

impl Library {
    /// Create a new, never persisted library
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: LibraryId::new().to_string(),
            relative_path: normalize(&name),
            name,
            created_on_utc: None,
            modified_on_utc: None,
        }
    }

    /// Rebuild a library loaded from storage.
    pub(crate) fn from_storage(
        id: String,
        name: String,
        relative_path: String,
        created_on_utc: Option<DateTime<Utc>>,
        modified_on_utc: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            name,
            relative_path,
            created_on_utc,
            modified_on_utc,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn created_on_utc(&self) -> Option<DateTime<Utc>> {
        self.created_on_utc
    }

    pub fn modified_on_utc(&self) -> Option<DateTime<Utc>> {
        self.modified_on_utc
    }

    /// Change the display name; the folder name follows.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.relative_path = normalize(&self.name);
    }

    /// Validate library data
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Library name cannot be empty".to_string());
        }

        if self.relative_path.is_empty() {
            return Err("Library name has no usable characters for a folder".to_string());
        }

        if self.relative_path != normalize(&self.name) {
            return Err("Library relative path does not match its name".to_string());
        }

        Ok(())
    }
}

impl Entity for Library {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Auditable for Library {
    fn created_on_utc(&self) -> Option<DateTime<Utc>> {
        self.created_on_utc
    }

    fn modified_on_utc(&self) -> Option<DateTime<Utc>> {
        self.modified_on_utc
    }

    fn set_created_on_utc(&mut self, at: Option<DateTime<Utc>>) {
        self.created_on_utc = at.map(|t| t.trunc_subsecs(6));
    }

    fn set_modified_on_utc(&mut self, at: Option<DateTime<Utc>>) {
        self.modified_on_utc = at.map(|t| t.trunc_subsecs(6));
    }
}
