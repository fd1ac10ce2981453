use async_trait::async_trait;

use crate::util;

/// Candidate hydrators enrich fetched candidates with context the source
/// did not have on hand. The returned vector must line up one-to-one with
/// the input slice.
#[async_trait]
pub trait Hydrator<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Whether this hydrator applies to the query.
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// Produce enriched copies of the candidates, in input order.
    async fn hydrate(&self, query: &Q, candidates: &[C]) -> Result<Vec<C>, String>;

    /// Merge one enriched copy back into the live candidate. Copy only the
    /// fields this hydrator owns.
    fn update(&self, candidate: &mut C, hydrated: C);

    /// Stable name for logs.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
