use async_trait::async_trait;

use crate::util;

/// What a filter did with the candidates: the kept set flows on to the next
/// stage, the removed set is retained for reporting.
pub struct FilterResult<C> {
    pub kept: Vec<C>,
    pub removed: Vec<C>,
}

/// Filters run sequentially and partition the candidate set. Removal is
/// never silent: removed candidates surface in the pipeline result.
#[async_trait]
pub trait Filter<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Whether this filter applies to the query.
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// Partition candidates into kept and removed sets.
    async fn filter(&self, query: &Q, candidates: Vec<C>) -> Result<FilterResult<C>, String>;

    /// Stable name for logs.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
