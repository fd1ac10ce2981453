use async_trait::async_trait;
use std::collections::HashSet;

use crewline_core::resolve::{branch_key, resolve_branch};

use crate::filter::{Filter, FilterResult};
use crate::types::{BenchmarkQuery, BranchStanding};

/// Applies the optional branch-scope restriction: standings outside the
/// requested subset are removed (and reported as excluded, not dropped
/// silently). Scope entries are free text and resolve with the same rules
/// as a single-branch estimate, so an unresolvable entry is an error rather
/// than a quietly empty ranking.
pub struct BranchScopeFilter;

#[async_trait]
impl Filter<BenchmarkQuery, BranchStanding> for BranchScopeFilter {
    fn enable(&self, query: &BenchmarkQuery) -> bool {
        query.branch_scope.is_some()
    }

    async fn filter(
        &self,
        query: &BenchmarkQuery,
        candidates: Vec<BranchStanding>,
    ) -> Result<FilterResult<BranchStanding>, String> {
        let scope = query.branch_scope.as_deref().unwrap_or_default();
        let mut wanted: HashSet<String> = HashSet::with_capacity(scope.len());
        for requested in scope {
            let resolved = resolve_branch(requested, &query.branches)
                .map_err(|err| err.to_string())?;
            wanted.insert(branch_key(&resolved));
        }

        let (kept, removed): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|standing| wanted.contains(&branch_key(&standing.branch)));

        Ok(FilterResult { kept, removed })
    }
}
