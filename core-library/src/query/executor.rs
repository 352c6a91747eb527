//! Turns an ordered, filtered source into one [`PagedResult`].

use crate::repositories::{PageRequest, PagedResult};
use async_trait::async_trait;
use bridge_traits::platform::PlatformSendSync;
use tracing::debug;

/// An already filtered and ordered collection that can be counted and sliced.
///
/// `fetch` must return items in the source's order; the executor never
/// re-sorts.
#[async_trait]
pub trait PageSource: PlatformSendSync {
    type Item: Send;
    type Error: Send;

    /// Number of items in the whole (filtered) source.
    async fn count(&self) -> Result<u64, Self::Error>;

    /// At most `limit` items starting at `offset`.
    async fn fetch(&self, offset: u64, limit: u64) -> Result<Vec<Self::Item>, Self::Error>;

    /// Count and slice together.
    ///
    /// The default runs [`count`](Self::count) then [`fetch`](Self::fetch);
    /// sources that can read both from one snapshot should override it.
    async fn fetch_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<(u64, Vec<Self::Item>), Self::Error> {
        let total = self.count().await?;
        let items = self.fetch(offset, limit).await?;
        Ok((total, items))
    }
}

/// Executes a count plus skip/take pair against a [`PageSource`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PageQueryExecutor;

impl PageQueryExecutor {
    /// Produce page `request.page` of `source`.
    ///
    /// Page 0 or page size 0 is not an error: the result carries the total
    /// count and no items. Source errors are returned unchanged.
    pub async fn execute<S>(
        source: &S,
        request: PageRequest,
    ) -> Result<PagedResult<S::Item>, S::Error>
    where
        S: PageSource + ?Sized,
    {
        if !request.is_valid() {
            let total = source.count().await?;
            debug!(page = request.page, page_size = request.page_size, "Out of range page request");
            return Ok(PagedResult::new(Vec::new(), total, request));
        }

        let (total, mut items) = source.fetch_page(request.offset(), request.limit()).await?;
        items.truncate(request.page_size as usize);

        debug!(
            page = request.page,
            page_size = request.page_size,
            total,
            returned = items.len(),
            "Executed page query"
        );
        Ok(PagedResult::new(items, total, request))
    }
}
