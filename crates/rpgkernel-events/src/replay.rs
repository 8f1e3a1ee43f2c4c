//! Log-driven state reconstruction.
//!
//! Feeding an audit log and the same initial seed through [`replay`] must
//! reproduce the original post-state byte-for-byte. That property is
//! verified by the caller (typically by comparing a kernel snapshot before
//! and after); this module only owns the replay control flow: a missing
//! handler is skipped with a warning, and an individual handler error is
//! recorded and replay continues.

use std::collections::BTreeMap;

use rpgkernel_types::AuditEntry;

/// A type-erased handler invoked during replay, keyed by action name.
/// Takes the recorded `arguments` and re-executes the corresponding
/// tool handler against live state.
pub type ReplayHandler = Box<dyn Fn(&serde_json::Value) -> Result<(), String> + Send + Sync>;

/// Maps action names to the handler that replays them.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, ReplayHandler>,
}

impl HandlerRegistry {
    /// Register the handler invoked for a given action name during replay.
    pub fn register(&mut self, action: impl Into<String>, handler: ReplayHandler) {
        self.handlers.insert(action.into(), handler);
    }
}

/// Summary of a replay pass over an audit log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Entries whose handler ran (successfully or not).
    pub entries_replayed: u32,
    /// Entries skipped because no handler was registered for their action.
    pub skipped_missing_handler: u32,
    /// Entries whose handler ran but returned an error.
    pub handler_errors: u32,
}

/// Re-execute an audit log in recorded order against `registry`.
pub fn replay(registry: &HandlerRegistry, log: &[AuditEntry]) -> ReplayReport {
    let mut report = ReplayReport::default();
    for entry in log {
        let Some(handler) = registry.handlers.get(&entry.action) else {
            tracing::warn!(action = %entry.action, "no handler registered for replay; skipping entry");
            report.skipped_missing_handler = report.skipped_missing_handler.saturating_add(1);
            continue;
        };
        report.entries_replayed = report.entries_replayed.saturating_add(1);
        if let Err(reason) = handler(&entry.arguments) {
            tracing::warn!(action = %entry.action, reason, "handler failed during replay; continuing");
            report.handler_errors = report.handler_errors.saturating_add(1);
        }
    }
    report
}
