/*!
 * Node
 * A single permission or inheritance grant
 */

use super::keys::{self, MetaEntry};
use crate::context::{ImmutableContextSet, MutableContextSet};
use crate::core::errors::NodeError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSecondsWithFrac};
use std::fmt;
use std::time::{Duration, SystemTime};

/// Committed grant
///
/// A node with `expiry <= now` is dead: it never contributes to effective
/// permissions, whether or not the sweeper has removed it yet.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Node {
    key: String,
    value: bool,
    #[serde(default, skip_serializing_if = "ImmutableContextSet::is_empty")]
    context: ImmutableContextSet,
    #[serde_as(as = "Option<TimestampSecondsWithFrac<f64>>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    expiry: Option<SystemTime>,
}

impl Node {
    pub fn builder(key: impl Into<String>) -> NodeBuilder {
        NodeBuilder::new(key)
    }

    /// Inheritance edge towards `group`
    pub fn group(group: &str) -> NodeBuilder {
        NodeBuilder::new(keys::group_key(group))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> bool {
        self.value
    }

    pub fn context(&self) -> &ImmutableContextSet {
        &self.context
    }

    pub fn expiry(&self) -> Option<SystemTime> {
        self.expiry
    }

    pub fn is_temporary(&self) -> bool {
        self.expiry.is_some()
    }

    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        matches!(self.expiry, Some(expiry) if expiry <= now)
    }

    /// Time left before expiry; None for permanent nodes
    pub fn remaining_at(&self, now: SystemTime) -> Option<Duration> {
        self.expiry
            .map(|expiry| expiry.duration_since(now).unwrap_or(Duration::ZERO))
    }

    /// Lowercased key used for lookups
    pub fn lookup_key(&self) -> String {
        self.key.to_lowercase()
    }

    /// Group referenced by this node, if it is an inheritance edge
    pub fn group_name(&self) -> Option<String> {
        keys::parse_group(&self.key)
    }

    pub fn is_group_node(&self) -> bool {
        self.group_name().is_some()
    }

    pub fn meta_entry(&self) -> Option<MetaEntry> {
        keys::parse_meta(&self.key)
    }

    /// Same key (case-insensitive) and same context
    ///
    /// Value and expiry are deliberately not compared: this is the identity
    /// used by the merge engine to detect a re-grant.
    pub fn equivalent_to(&self, other: &Node) -> bool {
        self.context == other.context && self.key.to_lowercase() == other.key.to_lowercase()
    }

    pub fn is_satisfied_by(&self, query: &ImmutableContextSet) -> bool {
        self.context.is_satisfied_by(query)
    }

    /// Alive at `now` and applicable to `query`
    pub fn applies_at(&self, query: &ImmutableContextSet, now: SystemTime) -> bool {
        !self.is_expired_at(now) && self.is_satisfied_by(query)
    }

    pub(crate) fn with_expiry(&self, expiry: SystemTime) -> Node {
        Node {
            expiry: Some(expiry),
            ..self.clone()
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)?;
        if !self.context.is_empty() {
            write!(f, " [{}]", self.context)?;
        }
        if let Some(remaining) = self.remaining_at(SystemTime::now()) {
            write!(f, " (expires in {}s)", remaining.as_secs())?;
        }
        Ok(())
    }
}

/// Node builder
///
/// Validation happens in [`NodeBuilder::build`]: an empty key, a zero
/// duration, or an expiry that is not in the future is rejected.
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    key: String,
    value: bool,
    context: MutableContextSet,
    expiry: Option<SystemTime>,
    duration: Option<Duration>,
}

impl NodeBuilder {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: true,
            context: MutableContextSet::new(),
            expiry: None,
            duration: None,
        }
    }

    pub fn value(mut self, value: bool) -> Self {
        self.value = value;
        self
    }

    pub fn context(mut self, context: &ImmutableContextSet) -> Self {
        self.context.add_all(context);
        self
    }

    pub fn with_context(mut self, key: &str, value: &str) -> Self {
        self.context.add(key, value);
        self
    }

    /// Absolute expiry
    pub fn expiry(mut self, expiry: SystemTime) -> Self {
        self.expiry = Some(expiry);
        self.duration = None;
        self
    }

    /// Expiry relative to the instant `build` is called
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self.expiry = None;
        self
    }

    pub fn build(self) -> Result<Node, NodeError> {
        self.build_at(SystemTime::now())
    }

    pub fn build_at(self, now: SystemTime) -> Result<Node, NodeError> {
        let key = self.key.trim();
        if key.is_empty() {
            return Err(NodeError::EmptyKey);
        }

        let expiry = match (self.duration, self.expiry) {
            (Some(duration), _) if duration.is_zero() => {
                return Err(NodeError::NonPositiveDuration)
            }
            (Some(duration), _) => Some(
                now.checked_add(duration)
                    .ok_or(NodeError::DurationOverflow)?,
            ),
            (None, expiry) => expiry,
        };

        if matches!(expiry, Some(expiry) if expiry <= now) {
            return Err(NodeError::ExpiryInPast);
        }

        Ok(Node {
            key: key.to_string(),
            value: self.value,
            context: self.context.into_immutable(),
            expiry,
        })
    }
}
