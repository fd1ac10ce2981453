//! Branch-name and period resolution.
//!
//! Branch names in requests are free text typed by an agent or a human, so
//! matching is deliberately forgiving: exact case-insensitive first, then a
//! unique substring match in either direction. Anything ambiguous is an
//! error, never a guess.

use crate::error::{StaffingError, StaffingResult};
use crate::types::{DaysSource, Period};

/// Canonical comparison key for a branch name: trimmed, lowercased, inner
/// whitespace collapsed to single spaces.
pub fn branch_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Outcome of matching a requested branch name against the known set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BranchMatch {
    /// Case-insensitive exact match.
    Exact(String),
    /// Exactly one known branch contains the request, or vice versa.
    Unique(String),
    /// More than one known branch matched the request.
    Ambiguous(Vec<String>),
    NoMatch,
}

/// Match `requested` against `known`, trying exact case-insensitive equality
/// first, then substring containment in either direction.
pub fn match_branch(requested: &str, known: &[String]) -> BranchMatch {
    let wanted = branch_key(requested);
    if wanted.is_empty() || known.is_empty() {
        return BranchMatch::NoMatch;
    }

    for name in known {
        if branch_key(name) == wanted {
            return BranchMatch::Exact(name.clone());
        }
    }

    let partial: Vec<&String> = known
        .iter()
        .filter(|name| {
            let key = branch_key(name);
            key.contains(&wanted) || wanted.contains(&key)
        })
        .collect();

    match partial.as_slice() {
        [] => BranchMatch::NoMatch,
        [single] => BranchMatch::Unique((*single).clone()),
        many => BranchMatch::Ambiguous(many.iter().map(|name| (*name).clone()).collect()),
    }
}

/// Resolve a requested branch name to its canonical spelling, or fail with a
/// resolution error.
pub fn resolve_branch(requested: &str, known: &[String]) -> StaffingResult<String> {
    match match_branch(requested, known) {
        BranchMatch::Exact(name) | BranchMatch::Unique(name) => Ok(name),
        BranchMatch::Ambiguous(matches) => Err(StaffingError::AmbiguousBranch {
            requested: requested.to_string(),
            matches,
        }),
        BranchMatch::NoMatch => Err(StaffingError::BranchNotFound(requested.to_string())),
    }
}

/// Pick the item whose period is nearest the target by absolute day distance
/// between period-start dates. Ties go to the earlier period, so the
/// selection is deterministic and direction-agnostic.
pub fn nearest_by_period<'a, T>(
    items: &[&'a T],
    target: Period,
    period_of: impl Fn(&T) -> Period,
) -> Option<&'a T> {
    items
        .iter()
        .min_by_key(|item| {
            let period = period_of(item);
            (period.day_distance(&target), period)
        })
        .copied()
}

/// Calendar days in the period, or the 30-day assumption when no period is
/// available at all.
pub fn days_in_period(period: Option<Period>) -> (u32, DaysSource) {
    match period {
        Some(period) => (period.day_count(), DaysSource::Calendar),
        None => (30, DaysSource::AssumedThirty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<String> {
        vec![
            "Jnah".to_string(),
            "Hamra Main".to_string(),
            "Hamra Annex".to_string(),
            "Tripoli".to_string(),
        ]
    }

    #[test]
    fn branch_key_collapses_whitespace_and_case() {
        assert_eq!(branch_key("  Hamra   Main "), "hamra main");
    }

    #[test]
    fn exact_match_is_case_insensitive() {
        assert_eq!(
            match_branch("jnah", &known()),
            BranchMatch::Exact("Jnah".to_string())
        );
    }

    #[test]
    fn unique_substring_matches_either_direction() {
        // request contained in a known branch
        assert_eq!(
            match_branch("Tripo", &known()),
            BranchMatch::Unique("Tripoli".to_string())
        );
        // known branch contained in the request
        assert_eq!(
            match_branch("Jnah seaside road", &known()),
            BranchMatch::Unique("Jnah".to_string())
        );
    }

    #[test]
    fn ambiguous_substring_is_an_error() {
        assert!(matches!(
            match_branch("Hamra", &known()),
            BranchMatch::Ambiguous(matches) if matches.len() == 2
        ));
        assert!(matches!(
            resolve_branch("Hamra", &known()),
            Err(StaffingError::AmbiguousBranch { .. })
        ));
    }

    #[test]
    fn unknown_branch_is_not_found() {
        assert!(matches!(
            resolve_branch("Saida", &known()),
            Err(StaffingError::BranchNotFound(name)) if name == "Saida"
        ));
        assert_eq!(match_branch("Jnah", &[]), BranchMatch::NoMatch);
    }

    #[test]
    fn nearest_period_prefers_smallest_day_distance() {
        let periods: Vec<Period> = ["2025-01", "2025-04", "2025-09"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let refs: Vec<&Period> = periods.iter().collect();
        let target: Period = "2025-05".parse().unwrap();
        // 2025-04 is 30 days out, 2025-09 is 123, 2025-01 is 120.
        let chosen = nearest_by_period(&refs, target, |p| *p).unwrap();
        assert_eq!(chosen.to_string(), "2025-04");
    }

    #[test]
    fn nearest_period_ties_go_to_the_earlier_period() {
        let periods: Vec<Period> = ["2025-03", "2025-07"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let refs: Vec<&Period> = periods.iter().collect();
        let target: Period = "2025-05".parse().unwrap();
        // 2025-03-01 -> 61 days, 2025-07-01 -> 61 days: tie, earlier wins.
        let chosen = nearest_by_period(&refs, target, |p| *p).unwrap();
        assert_eq!(chosen.to_string(), "2025-03");
    }

    #[test]
    fn days_in_period_falls_back_to_thirty() {
        let (days, source) = days_in_period(Some("2025-02".parse().unwrap()));
        assert_eq!(days, 28);
        assert_eq!(source, DaysSource::Calendar);
        let (days, source) = days_in_period(None);
        assert_eq!(days, 30);
        assert_eq!(source, DaysSource::AssumedThirty);
    }
}
