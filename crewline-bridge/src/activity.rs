//! The bounded tool activity log.
//!
//! The only shared mutable state in the system: a mutex-protected ring of
//! recent tool invocations, newest first, capped at a fixed capacity. It
//! lives behind the [`ActivityLog`] trait so the analytics core never sees
//! it and tests can swap in a no-op.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Default number of events retained.
pub const DEFAULT_CAPACITY: usize = 50;

/// Maximum characters kept of any recorded text field.
const PREVIEW_CHARS: usize = 160;

/// One recorded tool invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// Monotonically increasing id, assigned by the log.
    pub event_id: u64,
    /// RFC 3339 UTC timestamp, assigned by the log.
    pub timestamp: String,
    pub tool_name: String,
    pub request_id: String,
    pub success: bool,
    /// Compacted payload or error preview, never the full body.
    pub detail: String,
}

/// Sink for tool activity. Injected into the gateway; implementations must
/// be safe to share across tasks.
pub trait ActivityLog: Send + Sync {
    fn record(&self, tool_name: &str, request_id: &str, success: bool, detail: &str);
    fn list(&self, limit: usize) -> Vec<ActivityEvent>;
}

struct LogInner {
    events: VecDeque<ActivityEvent>,
    next_id: u64,
}

/// Mutex-protected bounded log, newest events first.
pub struct BoundedActivityLog {
    capacity: usize,
    inner: Mutex<LogInner>,
}

impl BoundedActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(LogInner {
                events: VecDeque::new(),
                next_id: 0,
            }),
        }
    }
}

impl Default for BoundedActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ActivityLog for BoundedActivityLog {
    fn record(&self, tool_name: &str, request_id: &str, success: bool, detail: &str) {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("activity log lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        inner.next_id += 1;
        let event = ActivityEvent {
            event_id: inner.next_id,
            timestamp: Utc::now().to_rfc3339(),
            tool_name: tool_name.to_string(),
            request_id: request_id.to_string(),
            success,
            detail: compact(detail),
        };
        inner.events.push_front(event);
        inner.events.truncate(self.capacity);
    }

    fn list(&self, limit: usize) -> Vec<ActivityEvent> {
        let inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("activity log lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        let limit = limit.clamp(1, self.capacity);
        inner.events.iter().take(limit).cloned().collect()
    }
}

/// Discards everything. For tests and for deployments that opt out of
/// activity tracking; the gateway works identically either way.
pub struct NoopActivityLog;

impl ActivityLog for NoopActivityLog {
    fn record(&self, _tool_name: &str, _request_id: &str, _success: bool, _detail: &str) {}

    fn list(&self, _limit: usize) -> Vec<ActivityEvent> {
        Vec::new()
    }
}

/// Collapse whitespace and truncate to the preview length.
fn compact(text: &str) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.chars().count() <= PREVIEW_CHARS {
        return normalized;
    }
    let truncated: String = normalized.chars().take(PREVIEW_CHARS - 3).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_newest_first_with_increasing_ids() {
        let log = BoundedActivityLog::new(10);
        log.record("estimate_staffing", "r1", true, "ok");
        log.record("benchmark_staffing", "r2", true, "ok");
        let events = log.list(10);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].tool_name, "benchmark_staffing");
        assert!(events[0].event_id > events[1].event_id);
    }

    #[test]
    fn capacity_bound_holds() {
        let log = BoundedActivityLog::new(3);
        for i in 0..10 {
            log.record("estimate_staffing", &format!("r{}", i), true, "ok");
        }
        let events = log.list(50);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].request_id, "r9");
        assert_eq!(events[2].request_id, "r7");
    }

    #[test]
    fn list_clamps_the_limit() {
        let log = BoundedActivityLog::new(5);
        for i in 0..5 {
            log.record("estimate_staffing", &format!("r{}", i), true, "ok");
        }
        assert_eq!(log.list(0).len(), 1);
        assert_eq!(log.list(2).len(), 2);
        assert_eq!(log.list(100).len(), 5);
    }

    #[test]
    fn detail_previews_are_compacted() {
        let log = BoundedActivityLog::new(5);
        let noisy = format!("a   b\n\nc{}", "x".repeat(500));
        log.record("estimate_staffing", "r1", false, &noisy);
        let events = log.list(1);
        assert!(events[0].detail.starts_with("a b c"));
        assert!(events[0].detail.ends_with("..."));
        assert!(events[0].detail.chars().count() <= 160);
    }

    #[test]
    fn failures_are_recorded_too() {
        let log = BoundedActivityLog::new(5);
        log.record("estimate_staffing", "r1", false, "branch 'Saida' not found");
        let events = log.list(1);
        assert!(!events[0].success);
        assert!(events[0].detail.contains("Saida"));
    }
}
