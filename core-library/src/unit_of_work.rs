//! # Auditing Unit of Work
//!
//! Stages entity changes for a single logical request and commits them in one
//! call to a [`ChangeStore`]. Right before delegating, every staged entity is
//! audit-stamped from the injected [`Clock`]:
//!
//! - `Added` entities get `created_on_utc`
//! - `Modified` entities get `modified_on_utc` (never earlier than, nor equal
//!   to, their `created_on_utc`)
//! - `Deleted` and `Unchanged` entities are left alone
//!
//! If the store fails, the previous stamps are put back and the staged states
//! are kept, so the same unit of work can be retried.
//!
//! `commit` takes `&mut self`; a unit of work cannot be committed from two
//! tasks at once. Create one per request.

use async_trait::async_trait;
use bridge_traits::platform::PlatformSendSync;
use bridge_traits::time::Clock;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::sync::Arc;
use tracing::debug;

/// An entity with a stable identity.
pub trait Entity {
    fn key(&self) -> &str;
}

/// Capability of entities carrying creation and modification stamps.
pub trait Auditable {
    fn created_on_utc(&self) -> Option<DateTime<Utc>>;
    fn modified_on_utc(&self) -> Option<DateTime<Utc>>;
    fn set_created_on_utc(&mut self, at: Option<DateTime<Utc>>);
    fn set_modified_on_utc(&mut self, at: Option<DateTime<Utc>>);
}

/// Tracking state of a staged entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityState {
    Added,
    Modified,
    Unchanged,
    Deleted,
}

/// An entity together with its tracking state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityEntry<E> {
    entity: E,
    state: EntityState,
}

impl<E> EntityEntry<E> {
    pub fn new(entity: E, state: EntityState) -> Self {
        Self { entity, state }
    }

    pub fn entity(&self) -> &E {
        &self.entity
    }

    pub fn state(&self) -> EntityState {
        self.state
    }
}

/// Persistence backend receiving the staged changes of a unit of work.
///
/// Implementations must apply all entries atomically: either every change is
/// persisted or none is. The returned count is the number of rows affected.
#[async_trait]
pub trait ChangeStore<E>: PlatformSendSync
where
    E: Send + Sync + 'static,
{
    type Error: Send;

    async fn save_changes(&self, entries: &[EntityEntry<E>]) -> Result<usize, Self::Error>;
}

/// Stages changes and stamps audit timestamps at commit time.
pub struct AuditingUnitOfWork<E, S> {
    store: S,
    clock: Arc<dyn Clock>,
    entries: Vec<EntityEntry<E>>,
}

impl<E, S> AuditingUnitOfWork<E, S>
where
    E: Entity + Auditable + Send + Sync + 'static,
    S: ChangeStore<E>,
{
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            entries: Vec::new(),
        }
    }

    /// Stage a new entity for insertion.
    pub fn add(&mut self, entity: E) {
        self.put(EntityEntry::new(entity, EntityState::Added));
    }

    /// Track an already persisted entity without marking it changed.
    pub fn attach(&mut self, entity: E) {
        self.put(EntityEntry::new(entity, EntityState::Unchanged));
    }

    /// Stage a persisted entity as modified.
    ///
    /// An entity still pending insertion stays `Added` with the new values.
    pub fn update(&mut self, entity: E) {
        match self.position(entity.key()) {
            Some(index) if self.entries[index].state == EntityState::Added => {
                self.entries[index].entity = entity;
            }
            Some(index) => {
                self.entries[index] = EntityEntry::new(entity, EntityState::Modified);
            }
            None => self
                .entries
                .push(EntityEntry::new(entity, EntityState::Modified)),
        }
    }

    /// Stage an entity for deletion.
    ///
    /// Removing an entity that was only added in this unit of work simply
    /// forgets it.
    pub fn remove(&mut self, entity: E) {
        match self.position(entity.key()) {
            Some(index) if self.entries[index].state == EntityState::Added => {
                self.entries.remove(index);
            }
            Some(index) => {
                self.entries[index] = EntityEntry::new(entity, EntityState::Deleted);
            }
            None => self
                .entries
                .push(EntityEntry::new(entity, EntityState::Deleted)),
        }
    }

    /// Mutate a tracked entity in place, marking it modified.
    ///
    /// Returns `false` when no tracked entity has `key` or it is staged for
    /// deletion.
    pub fn modify<F>(&mut self, key: &str, f: F) -> bool
    where
        F: FnOnce(&mut E),
    {
        let Some(index) = self.position(key) else {
            return false;
        };
        let entry = &mut self.entries[index];
        if entry.state == EntityState::Deleted {
            return false;
        }

        f(&mut entry.entity);
        if entry.state == EntityState::Unchanged {
            entry.state = EntityState::Modified;
        }
        true
    }

    pub fn get(&self, key: &str) -> Option<&E> {
        self.position(key).map(|index| &self.entries[index].entity)
    }

    pub fn state_of(&self, key: &str) -> Option<EntityState> {
        self.position(key).map(|index| self.entries[index].state)
    }

    pub fn entries(&self) -> &[EntityEntry<E>] {
        &self.entries
    }

    /// True when at least one entry would be written by `commit`.
    pub fn has_changes(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.state != EntityState::Unchanged)
    }

    /// Stamp audit timestamps and persist every staged change.
    ///
    /// Returns the number of rows affected, or the store's error unchanged.
    pub async fn commit(&mut self) -> Result<usize, S::Error> {
        if !self.has_changes() {
            debug!("Unit of work has no pending changes");
            return Ok(0);
        }

        let now = self.clock.now().trunc_subsecs(6);
        let previous: Vec<_> = self
            .entries
            .iter()
            .map(|entry| {
                (
                    entry.entity.created_on_utc(),
                    entry.entity.modified_on_utc(),
                )
            })
            .collect();

        let stamped = self.stamp(now);

        match self.store.save_changes(&self.entries).await {
            Ok(affected) => {
                self.accept_changes();
                debug!(affected, stamped, "Committed unit of work");
                Ok(affected)
            }
            Err(err) => {
                for (entry, (created, modified)) in self.entries.iter_mut().zip(previous) {
                    entry.entity.set_created_on_utc(created);
                    entry.entity.set_modified_on_utc(modified);
                }
                Err(err)
            }
        }
    }

    fn stamp(&mut self, now: DateTime<Utc>) -> usize {
        let mut stamped = 0;
        for entry in &mut self.entries {
            match entry.state {
                EntityState::Added => {
                    entry.entity.set_created_on_utc(Some(now));
                    stamped += 1;
                }
                EntityState::Modified => {
                    let at = match entry.entity.created_on_utc() {
                        Some(created) if now <= created => created + Duration::microseconds(1),
                        _ => now,
                    };
                    entry.entity.set_modified_on_utc(Some(at));
                    stamped += 1;
                }
                EntityState::Unchanged | EntityState::Deleted => {}
            }
        }
        stamped
    }

    fn accept_changes(&mut self) {
        self.entries
            .retain(|entry| entry.state != EntityState::Deleted);
        for entry in &mut self.entries {
            entry.state = EntityState::Unchanged;
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.entity.key() == key)
    }

    fn put(&mut self, entry: EntityEntry<E>) {
        match self.position(entry.entity.key()) {
            Some(index) => self.entries[index] = entry,
            None => self.entries.push(entry),
        }
    }
}
