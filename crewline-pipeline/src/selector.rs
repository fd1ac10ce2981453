use crate::util;

/// Selectors order the scored candidates and cut the list down to the
/// requested size.
pub trait Selector<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Sort, then truncate when a size is configured.
    fn select(&self, _query: &Q, candidates: Vec<C>) -> Vec<C> {
        let mut sorted = self.sort(candidates);
        if let Some(limit) = self.size() {
            sorted.truncate(limit);
        }
        sorted
    }

    /// Whether this selector applies to the query.
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// The primary ranking score for one candidate.
    fn score(&self, candidate: &C) -> f64;

    /// Descending sort by score. NaN scores sink to the end of the list so
    /// broken arithmetic can never float to the top of a report. Override
    /// for multi-key orderings.
    fn sort(&self, candidates: Vec<C>) -> Vec<C> {
        let mut sorted = candidates;
        sorted.sort_by(|a, b| {
            let score_a = self.score(a);
            let score_b = self.score(b);
            match (score_a.is_nan(), score_b.is_nan()) {
                (true, true) => std::cmp::Ordering::Equal,
                (true, false) => std::cmp::Ordering::Greater,
                (false, true) => std::cmp::Ordering::Less,
                (false, false) => score_b
                    .partial_cmp(&score_a)
                    .unwrap_or(std::cmp::Ordering::Equal),
            }
        });
        sorted
    }

    /// Maximum number of candidates to keep, if any.
    fn size(&self) -> Option<usize> {
        None
    }

    /// Stable name for logs.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
