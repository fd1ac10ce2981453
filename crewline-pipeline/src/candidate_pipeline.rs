//! The pipeline executor.
//!
//! A candidate pipeline runs a fixed sequence of pluggable stages:
//! query hydration → sourcing → candidate hydration → filtering → scoring →
//! selection → post-selection passes → side effects. Concrete pipelines
//! supply the stage components; `execute` supplies the control flow.

use async_trait::async_trait;
use std::sync::Arc;

use crate::filter::Filter;
use crate::hydrator::Hydrator;
use crate::query_hydrator::QueryHydrator;
use crate::scorer::Scorer;
use crate::selector::Selector;
use crate::side_effect::{SideEffect, SideEffectInput};
use crate::source::Source;

/// Queries carry a request id so every log line can be tied back to the
/// originating tool call.
pub trait HasRequestId {
    fn request_id(&self) -> &str;
}

/// Everything a pipeline run produced, including what it threw away.
/// Filtered candidates are kept so callers can report on exclusions instead
/// of having them vanish.
#[derive(Clone, Debug)]
pub struct PipelineResult<Q, C> {
    pub query: Q,
    /// Candidates as fetched from the sources, before filtering.
    pub retrieved_candidates: Vec<C>,
    /// Candidates removed by any filter stage.
    pub filtered_candidates: Vec<C>,
    /// The final ranked, truncated selection.
    pub selected_candidates: Vec<C>,
}

#[async_trait]
pub trait CandidatePipeline<Q, C>: Send + Sync
where
    Q: HasRequestId + Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    fn query_hydrators(&self) -> &[Box<dyn QueryHydrator<Q>>];
    fn sources(&self) -> &[Box<dyn Source<Q, C>>];
    fn hydrators(&self) -> &[Box<dyn Hydrator<Q, C>>];
    fn filters(&self) -> &[Box<dyn Filter<Q, C>>];
    fn scorers(&self) -> &[Box<dyn Scorer<Q, C>>];
    fn selector(&self) -> &dyn Selector<Q, C>;
    fn post_selection_hydrators(&self) -> &[Box<dyn Hydrator<Q, C>>];
    fn post_selection_filters(&self) -> &[Box<dyn Filter<Q, C>>];
    fn side_effects(&self) -> Arc<Vec<Box<dyn SideEffect<Q, C>>>>;
    fn result_size(&self) -> usize;

    /// Run the full stage sequence.
    ///
    /// Source, filter, and scorer errors abort the run: a missing candidate
    /// universe or a failed ranking signal cannot be papered over. Hydrator
    /// and side-effect errors are logged and skipped, since they only enrich
    /// or observe.
    async fn execute(&self, query: Q) -> Result<PipelineResult<Q, C>, String> {
        let mut query = query;

        let enabled: Vec<&Box<dyn QueryHydrator<Q>>> = self
            .query_hydrators()
            .iter()
            .filter(|hydrator| hydrator.enable(&query))
            .collect();
        let hydrated =
            futures::future::join_all(enabled.iter().map(|hydrator| hydrator.hydrate(&query)))
                .await;
        for (hydrator, result) in enabled.iter().zip(hydrated) {
            match result {
                Ok(filled) => hydrator.update(&mut query, filled),
                Err(err) => log::warn!(
                    "request_id={} query hydrator {} failed: {}",
                    query.request_id(),
                    hydrator.name(),
                    err,
                ),
            }
        }

        let mut candidates: Vec<C> = Vec::new();
        for source in self.sources() {
            if !source.enable(&query) {
                continue;
            }
            let mut fetched = source
                .get_candidates(&query)
                .await
                .map_err(|err| format!("source {}: {}", source.name(), err))?;
            candidates.append(&mut fetched);
        }
        let retrieved = candidates.clone();

        run_hydrators(self.hydrators(), &query, &mut candidates).await;

        let mut removed_total: Vec<C> = Vec::new();
        for filter in self.filters() {
            if !filter.enable(&query) {
                continue;
            }
            let result = filter
                .filter(&query, candidates)
                .await
                .map_err(|err| format!("filter {}: {}", filter.name(), err))?;
            candidates = result.kept;
            removed_total.extend(result.removed);
        }

        for scorer in self.scorers() {
            if !scorer.enable(&query) {
                continue;
            }
            let scored = scorer
                .score(&query, &candidates)
                .await
                .map_err(|err| format!("scorer {}: {}", scorer.name(), err))?;
            for (candidate, scored) in candidates.iter_mut().zip(scored) {
                scorer.update(candidate, scored);
            }
        }

        let mut selected = self.selector().select(&query, candidates);
        selected.truncate(self.result_size());

        run_hydrators(self.post_selection_hydrators(), &query, &mut selected).await;
        for filter in self.post_selection_filters() {
            if !filter.enable(&query) {
                continue;
            }
            let result = filter
                .filter(&query, selected)
                .await
                .map_err(|err| format!("filter {}: {}", filter.name(), err))?;
            selected = result.kept;
            removed_total.extend(result.removed);
        }

        let input = Arc::new(SideEffectInput {
            query: Arc::new(query.clone()),
            selected_candidates: selected.clone(),
        });
        for effect in self.side_effects().iter() {
            if !effect.enable(Arc::clone(&input.query)) {
                continue;
            }
            if let Err(err) = effect.run(Arc::clone(&input)).await {
                log::warn!(
                    "request_id={} side effect {} failed: {}",
                    query.request_id(),
                    effect.name(),
                    err,
                );
            }
        }

        Ok(PipelineResult {
            query,
            retrieved_candidates: retrieved,
            filtered_candidates: removed_total,
            selected_candidates: selected,
        })
    }
}

async fn run_hydrators<Q, C>(
    hydrators: &[Box<dyn Hydrator<Q, C>>],
    query: &Q,
    candidates: &mut Vec<C>,
) where
    Q: HasRequestId + Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    for hydrator in hydrators {
        if !hydrator.enable(query) {
            continue;
        }
        match hydrator.hydrate(query, candidates).await {
            Ok(hydrated) => {
                for (candidate, hydrated) in candidates.iter_mut().zip(hydrated) {
                    hydrator.update(candidate, hydrated);
                }
            }
            Err(err) => log::warn!(
                "request_id={} hydrator {} failed: {}",
                query.request_id(),
                hydrator.name(),
                err,
            ),
        }
    }
}
