//! In-process [`PageSource`] over a vector.

use super::executor::PageSource;
use super::sort::{SortColumn, SortSpec};
use async_trait::async_trait;
use std::convert::Infallible;

/// A snapshot of items with filtering and ordering applied eagerly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemorySource<T> {
    items: Vec<T>,
}

impl<T> InMemorySource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Keep only items matching `predicate`.
    pub fn filter<P>(mut self, predicate: P) -> Self
    where
        P: FnMut(&T) -> bool,
    {
        self.items.retain(predicate);
        self
    }

    /// Order items by `spec`.
    pub fn order_by<C>(mut self, spec: SortSpec<C>) -> Self
    where
        C: SortColumn<Entity = T>,
    {
        self.items.sort_by(|a, b| spec.compare(a, b));
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl<T> PageSource for InMemorySource<T>
where
    T: Clone + Send + Sync,
{
    type Item = T;
    type Error = Infallible;

    async fn count(&self) -> Result<u64, Infallible> {
        Ok(self.items.len() as u64)
    }

    async fn fetch(&self, offset: u64, limit: u64) -> Result<Vec<T>, Infallible> {
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self.items.iter().skip(offset).take(limit).cloned().collect())
    }
}
