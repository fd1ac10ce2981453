use async_trait::async_trait;

use crate::util;

/// Query hydrators run before any candidates are fetched and fill in query
/// fields the caller left unresolved (defaults, derived context, universes).
/// They run concurrently, so each one must only touch its own fields.
#[async_trait]
pub trait QueryHydrator<Q>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
{
    /// Whether this hydrator applies to the query at all.
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// Produce a copy of the query with this hydrator's fields filled in.
    async fn hydrate(&self, query: &Q) -> Result<Q, String>;

    /// Merge the hydrated fields back into the live query. Copy only the
    /// fields this hydrator owns.
    fn update(&self, query: &mut Q, hydrated: Q);

    /// Stable name for logs.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
