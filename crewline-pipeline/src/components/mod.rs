pub mod benchmark_log_side_effect;
pub mod branch_estimate_source;
pub mod branch_scope_filter;
pub mod branch_universe_hydrator;
pub mod gap_rank_selector;
pub mod headcount_gap_scorer;
