use async_trait::async_trait;

use crate::util;

/// Scorers compute ranking signals over the whole candidate set at once, so
/// they can consider cross-candidate context. Like hydrators they return
/// scored copies in input order and merge their fields back via `update`.
#[async_trait]
pub trait Scorer<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Whether this scorer applies to the query.
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// Produce scored copies of the candidates, in input order.
    async fn score(&self, query: &Q, candidates: &[C]) -> Result<Vec<C>, String>;

    /// Merge one scored copy back into the live candidate. Copy only the
    /// score fields this scorer owns.
    fn update(&self, candidate: &mut C, scored: C);

    /// Stable name for logs.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
