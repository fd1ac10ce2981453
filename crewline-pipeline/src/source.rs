use async_trait::async_trait;

use crate::util;

/// A source produces the initial candidate set for a query. Multiple sources
/// can contribute; their candidates are concatenated before later stages.
#[async_trait]
pub trait Source<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Whether this source should run for the query. Sources with no data to
    /// offer should opt out here instead of returning an empty set, so the
    /// distinction is visible in logs.
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// Fetch candidates. A source error aborts the pipeline run: the stages
    /// after it cannot compensate for a missing candidate universe.
    async fn get_candidates(&self, query: &Q) -> Result<Vec<C>, String>;

    /// Stable name for logs.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
