//! The audit wrapper around every tool handler invocation.
//!
//! Records `{action, arguments}` before dispatch and appends
//! `{result | error, durationMs, timestamp}` on return. A failure to persist
//! the audit entry is logged and does not affect the dispatch result — the
//! caller always sees the handler's own outcome.

use std::fmt::Display;
use std::future::Future;

use chrono::{DateTime, Utc};
use rpgkernel_db::AuditRepository;
use rpgkernel_types::{AuditEntry, AuditEntryId};
use serde::Serialize;

use crate::clock::SimClock;

/// Wrap a tool handler invocation with audit recording.
///
/// `handler` is invoked exactly once; its `Result` is returned to the caller
/// unchanged regardless of whether the audit entry itself persists.
pub async fn record_call<R, F, Fut, T, E>(
    audit: &R,
    clock: &SimClock,
    action: &str,
    arguments: serde_json::Value,
    request_id: Option<String>,
    handler: F,
) -> Result<T, E>
where
    R: AuditRepository,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    T: Serialize,
    E: Display,
{
    let started_at: DateTime<Utc> = clock.now();
    let outcome = handler().await;
    let finished_at = clock.now();
    let duration_ms = duration_millis(started_at, finished_at);

    let (result, error) = match &outcome {
        Ok(value) => (serde_json::to_value(value).ok(), None),
        Err(err) => (None, Some(err.to_string())),
    };

    let entry = AuditEntry {
        id: AuditEntryId::new(),
        action: action.to_owned(),
        arguments,
        result,
        error,
        duration_ms,
        timestamp: finished_at,
        request_id,
    };
    if let Err(db_err) = audit.append(&entry).await {
        tracing::warn!(action, error = %db_err, "failed to persist audit entry");
    }

    outcome
}

fn duration_millis(started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> u64 {
    let millis = (finished_at - started_at).num_milliseconds();
    u64::try_from(millis).unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::Utc;
    use rpgkernel_db::InMemoryAuditRepository;

    use super::*;

    #[derive(Debug, PartialEq, Eq, Serialize)]
    struct Payload {
        ok: bool,
    }

    #[tokio::test]
    async fn successful_call_records_a_result() {
        let audit = InMemoryAuditRepository::default();
        let clock = SimClock::new(Utc::now());
        let outcome: Result<Payload, String> = record_call(&audit, &clock, "world_generate", serde_json::json!({"seed": "s"}), None, || async {
            Ok(Payload { ok: true })
        })
        .await;
        assert!(outcome.is_ok());
        let entries = audit.list_all().await.expect("list");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.first().map(|e| e.action.as_str()), Some("world_generate"));
        assert!(entries.first().is_some_and(|e| e.error.is_none()));
    }

    #[tokio::test]
    async fn failed_call_records_the_error_and_still_returns_it() {
        let audit = InMemoryAuditRepository::default();
        let clock = SimClock::new(Utc::now());
        let outcome: Result<Payload, String> = record_call(&audit, &clock, "combat_execute_action", serde_json::json!({}), None, || async {
            Err("not your turn".to_owned())
        })
        .await;
        assert_eq!(outcome, Err("not your turn".to_owned()));
        let entries = audit.list_all().await.expect("list");
        assert!(entries.first().is_some_and(|e| e.error.as_deref() == Some("not your turn")));
    }

    #[tokio::test]
    async fn timestamps_advance_monotonically_across_calls() {
        let audit = InMemoryAuditRepository::default();
        let clock = SimClock::new(Utc::now());
        let _: Result<Payload, String> = record_call(&audit, &clock, "a", serde_json::json!({}), None, || async { Ok(Payload { ok: true }) }).await;
        let _: Result<Payload, String> = record_call(&audit, &clock, "b", serde_json::json!({}), None, || async { Ok(Payload { ok: true }) }).await;
        let entries = audit.list_all().await.expect("list");
        assert_eq!(entries.len(), 2);
        let timestamps: Vec<_> = entries.iter().map(|e| e.timestamp).collect();
        assert!(timestamps.is_sorted());
    }
}
