/*!
 * Permission Audit Trail
 * Records who changed what on which holder
 */

use crate::core::limits::{MAX_AUDIT_EVENTS, MAX_AUDIT_EVENTS_PER_TARGET};
use crate::holder::HolderId;
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// Actor recorded for mutations issued by the core itself (sweeper, loads)
pub const INTERNAL_ACTOR: &str = "internal";

/// One administrative action
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuditEntry {
    pub actor: String,
    pub target: HolderId,
    /// Friendly name of the target at the time of the action
    pub target_name: String,
    /// Short verb phrase, e.g. `permission settemp`, `parent add`
    pub action: String,
    pub parameters: Vec<String>,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub timestamp: SystemTime,
}

impl AuditEntry {
    pub fn new(
        actor: impl Into<String>,
        target: HolderId,
        target_name: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            actor: actor.into(),
            target,
            target_name: target_name.into(),
            action: action.into(),
            parameters: Vec::new(),
            timestamp: SystemTime::now(),
        }
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameters.push(parameter.into());
        self
    }

    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters.extend(parameters.into_iter().map(Into::into));
        self
    }
}

/// Destination for audit entries
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// In-memory audit log
pub struct AuditLogger {
    /// Global entry log (ring buffer)
    entries: RwLock<VecDeque<AuditEntry>>,
    /// Per-target entry logs
    by_target: DashMap<HolderId, VecDeque<AuditEntry>, RandomState>,
    recorded: AtomicU64,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(MAX_AUDIT_EVENTS)),
            by_target: DashMap::with_hasher(RandomState::new()),
            recorded: AtomicU64::new(0),
        }
    }

    /// Most recent entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read();
        entries.iter().rev().take(limit).cloned().collect()
    }

    /// Entries for one holder, newest first
    pub fn for_target(&self, target: &HolderId, limit: usize) -> Vec<AuditEntry> {
        self.by_target
            .get(target)
            .map(|entry| entry.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Clear logs for a holder
    pub fn clear_target(&self, target: &HolderId) {
        self.by_target.remove(target);
    }

    /// Clear all logs
    pub fn clear_all(&self) {
        self.entries.write().clear();
        self.by_target.clear();
    }

    /// Get statistics
    pub fn stats(&self) -> AuditStats {
        AuditStats {
            total_entries: self.entries.read().len(),
            total_recorded: self.recorded.load(Ordering::Relaxed),
            targets_tracked: self.by_target.len(),
        }
    }
}

impl AuditSink for AuditLogger {
    fn record(&self, entry: AuditEntry) {
        let target = entry.target.clone();
        self.recorded.fetch_add(1, Ordering::Relaxed);

        {
            let mut entries = self.entries.write();
            if entries.len() >= MAX_AUDIT_EVENTS {
                entries.pop_front();
            }
            entries.push_back(entry.clone());
        }

        let mut per_target = self
            .by_target
            .entry(target)
            .or_insert_with(|| VecDeque::with_capacity(MAX_AUDIT_EVENTS_PER_TARGET));
        if per_target.len() >= MAX_AUDIT_EVENTS_PER_TARGET {
            per_target.pop_front();
        }
        per_target.push_back(entry);
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Audit statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub total_entries: usize,
    pub total_recorded: u64,
    pub targets_tracked: usize,
}
