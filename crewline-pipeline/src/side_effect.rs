use async_trait::async_trait;
use std::sync::Arc;

use crate::util;

/// What side effects get to see once selection is done.
#[derive(Clone)]
pub struct SideEffectInput<Q, C> {
    pub query: Arc<Q>,
    pub selected_candidates: Vec<C>,
}

/// Side effects run after selection and cannot change the result: logging,
/// caching, notifications. A failing side effect is logged and ignored.
#[async_trait]
pub trait SideEffect<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Whether this side effect should run.
    fn enable(&self, _query: Arc<Q>) -> bool {
        true
    }

    /// Perform the side effect.
    async fn run(&self, input: Arc<SideEffectInput<Q, C>>) -> Result<(), String>;

    /// Stable name for logs.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
