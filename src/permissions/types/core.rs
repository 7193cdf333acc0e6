/*!
 * Permission Types
 * Mutation policy, outcome taxonomy, and sweep reporting
 */

use crate::core::errors::ConfigError;
use crate::node::Node;
use crate::storage::PendingSave;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a new temporary node interacts with an equivalent live one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemporaryModifier {
    /// Reject the new grant and report the existing one
    #[default]
    Deny,
    /// Drop the existing grant, keep the new expiry
    Replace,
    /// Extend the existing expiry by the new grant's duration
    Accumulate,
}

impl FromStr for TemporaryModifier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deny" => Ok(TemporaryModifier::Deny),
            "replace" => Ok(TemporaryModifier::Replace),
            "accumulate" => Ok(TemporaryModifier::Accumulate),
            other => Err(ConfigError::UnknownModifier(other.to_string())),
        }
    }
}

impl fmt::Display for TemporaryModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TemporaryModifier::Deny => "deny",
            TemporaryModifier::Replace => "replace",
            TemporaryModifier::Accumulate => "accumulate",
        };
        f.write_str(name)
    }
}

/// Result taxonomy exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutateOutcome {
    Success,
    /// An equivalent grant already exists (DENY policy or identical permanent node)
    AlreadyHas,
    /// Rejected by a precondition inside the core
    Fail,
    /// Nothing to do
    NoChange,
}

impl MutateOutcome {
    /// Whether state changed
    pub fn as_bool(self) -> bool {
        matches!(self, MutateOutcome::Success)
    }
}

/// Outcome plus the node the caller should report
#[derive(Debug)]
pub struct MutationResult {
    pub outcome: MutateOutcome,
    /// Final node on success, the blocking node on `AlreadyHas`,
    /// the rejected node otherwise
    pub node: Node,
    /// Node displaced by this mutation, if any
    pub previous: Option<Node>,
    /// Pending persistence of the change, when storage is configured
    pub save: Option<PendingSave>,
}

impl MutationResult {
    pub(crate) fn new(outcome: MutateOutcome, node: Node) -> Self {
        Self {
            outcome,
            node,
            previous: None,
            save: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.as_bool()
    }

    /// A permanent node changed value in place
    pub fn is_update(&self) -> bool {
        self.is_success() && self.previous.is_some()
    }
}

/// Summary of one expiry sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SweepReport {
    pub holders_scanned: usize,
    pub holders_changed: usize,
    pub nodes_removed: usize,
}

impl SweepReport {
    pub fn merge(&mut self, other: SweepReport) {
        self.holders_scanned += other.holders_scanned;
        self.holders_changed += other.holders_changed;
        self.nodes_removed += other.nodes_removed;
    }
}
