/*!
 * Cached View
 * Flattened permissions and options for one holder in one context
 */

use crate::context::ImmutableContextSet;
use crate::core::types::Tristate;
use crate::holder::GroupRef;
use crate::node::{keys, MetaEntry, Node};
use ahash::RandomState;
use std::collections::HashMap;
use std::time::SystemTime;

/// Immutable result of one inheritance walk
///
/// Readers hold an `Arc<CachedView>`; invalidation only drops the map entry,
/// so a view already handed out stays valid for its reader.
#[derive(Debug, Clone)]
pub struct CachedView {
    context: ImmutableContextSet,
    permissions: HashMap<String, bool, RandomState>,
    prefix: Option<String>,
    suffix: Option<String>,
    meta: HashMap<String, String, RandomState>,
    parents: Vec<GroupRef>,
    inherited: Vec<String>,
    valid_until: Option<SystemTime>,
    built_at: SystemTime,
}

impl CachedView {
    pub fn context(&self) -> &ImmutableContextSet {
        &self.context
    }

    /// Effective value of a permission, keys compared case-insensitively
    pub fn permission_value(&self, permission: &str) -> Tristate {
        self.permissions
            .get(&permission.trim().to_lowercase())
            .copied()
            .into()
    }

    /// `prefix` and `suffix` map to chat metadata, anything else to meta
    pub fn option(&self, key: &str) -> Option<&str> {
        let key = key.trim().to_lowercase();
        match key.as_str() {
            keys::PREFIX_KEY => self.prefix.as_deref(),
            keys::SUFFIX_KEY => self.suffix.as_deref(),
            _ => self.meta.get(&key).map(String::as_str),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    pub fn meta(&self) -> &HashMap<String, String, RandomState> {
        &self.meta
    }

    pub fn permissions(&self) -> &HashMap<String, bool, RandomState> {
        &self.permissions
    }

    /// Direct parents in precedence order
    pub fn parents(&self) -> &[GroupRef] {
        &self.parents
    }

    /// Every group reached by the walk, in visit order
    pub fn inherited(&self) -> &[String] {
        &self.inherited
    }

    pub fn valid_until(&self) -> Option<SystemTime> {
        self.valid_until
    }

    pub fn built_at(&self) -> SystemTime {
        self.built_at
    }

    /// A contributing temporary node has expired by `now`
    pub fn is_stale_at(&self, now: SystemTime) -> bool {
        matches!(self.valid_until, Some(until) if until <= now)
    }
}

/// Accumulates holder levels, nearest first
pub(crate) struct ViewBuilder {
    context: ImmutableContextSet,
    now: SystemTime,
    permissions: HashMap<String, bool, RandomState>,
    prefix: Option<String>,
    suffix: Option<String>,
    meta: HashMap<String, String, RandomState>,
    inherited: Vec<String>,
    valid_until: Option<SystemTime>,
}

impl ViewBuilder {
    pub(crate) fn new(context: ImmutableContextSet, now: SystemTime) -> Self {
        Self {
            context,
            now,
            permissions: HashMap::with_hasher(RandomState::new()),
            prefix: None,
            suffix: None,
            meta: HashMap::with_hasher(RandomState::new()),
            inherited: Vec::new(),
            valid_until: None,
        }
    }

    /// Fold one holder's nodes into the view
    ///
    /// Keys already set by a nearer level are kept. Inside a level, temporary
    /// nodes are applied before permanent ones, and the highest priority
    /// prefix/suffix wins.
    pub(crate) fn accumulate(&mut self, nodes: &[Node]) {
        let mut prefix: Option<(i32, &str)> = None;
        let mut suffix: Option<(i32, &str)> = None;

        let (context, now) = (&self.context, self.now);
        let applicable = nodes
            .iter()
            .filter(|node| node.is_temporary())
            .chain(nodes.iter().filter(|node| !node.is_temporary()))
            .filter(|node| node.applies_at(context, now));

        for node in applicable {
            if let Some(expiry) = node.expiry() {
                self.valid_until = Some(match self.valid_until {
                    Some(current) => current.min(expiry),
                    None => expiry,
                });
            }

            self.permissions
                .entry(node.lookup_key())
                .or_insert(node.value());

            if !node.value() {
                continue;
            }
            match node.meta_entry() {
                Some(MetaEntry::Prefix { priority, .. }) => {
                    if prefix.map_or(true, |(best, _)| priority > best) {
                        prefix = Some((priority, chat_value(node)));
                    }
                }
                Some(MetaEntry::Suffix { priority, .. }) => {
                    if suffix.map_or(true, |(best, _)| priority > best) {
                        suffix = Some((priority, chat_value(node)));
                    }
                }
                Some(MetaEntry::Meta { key, value }) => {
                    self.meta.entry(key).or_insert(value);
                }
                None => {}
            }
        }

        if self.prefix.is_none() {
            self.prefix = prefix.map(|(_, value)| value.to_string());
        }
        if self.suffix.is_none() {
            self.suffix = suffix.map(|(_, value)| value.to_string());
        }
    }

    /// Record a group reached by the walk; implies `group.<name>`
    pub(crate) fn inherit(&mut self, group: &str) {
        self.permissions
            .entry(keys::group_key(group))
            .or_insert(true);
        self.inherited.push(group.to_string());
    }

    pub(crate) fn build(self, parents: Vec<GroupRef>) -> CachedView {
        CachedView {
            context: self.context,
            permissions: self.permissions,
            prefix: self.prefix,
            suffix: self.suffix,
            meta: self.meta,
            parents,
            inherited: self.inherited,
            valid_until: self.valid_until,
            built_at: self.now,
        }
    }
}

/// Value part of a `prefix.<priority>.<value>` key, original case kept
fn chat_value(node: &Node) -> &str {
    node.key()
        .splitn(3, '.')
        .nth(2)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn node(key: &str) -> Node {
        Node::builder(key).build().unwrap()
    }

    #[test]
    fn test_nearest_level_wins() {
        let now = SystemTime::now();
        let mut builder = ViewBuilder::new(ImmutableContextSet::empty(), now);
        builder.accumulate(&[Node::builder("Fly").value(false).build().unwrap()]);
        builder.accumulate(&[node("fly"), node("build")]);
        let view = builder.build(Vec::new());

        assert_eq!(view.permission_value("FLY"), Tristate::False);
        assert_eq!(view.permission_value("build"), Tristate::True);
        assert_eq!(view.permission_value("walk"), Tristate::Undefined);
    }

    #[test]
    fn test_context_filtering() {
        let now = SystemTime::now();
        let nether = Node::builder("fly").with_context("world", "nether").build().unwrap();

        let mut builder = ViewBuilder::new(ImmutableContextSet::singleton("world", "end"), now);
        builder.accumulate(&[nether.clone()]);
        assert_eq!(builder.build(Vec::new()).permission_value("fly"), Tristate::Undefined);

        let query = ImmutableContextSet::of([("world", "nether"), ("server", "survival")]);
        let mut builder = ViewBuilder::new(query, now);
        builder.accumulate(&[nether]);
        assert_eq!(builder.build(Vec::new()).permission_value("fly"), Tristate::True);
    }

    #[test]
    fn test_chat_meta_priority() {
        let now = SystemTime::now();
        let mut builder = ViewBuilder::new(ImmutableContextSet::empty(), now);
        builder.accumulate(&[
            node(&keys::prefix_key(10, "[Mod] ")),
            node(&keys::prefix_key(50, "[Admin] ")),
            node(&keys::meta_key("Home", "Spawn")),
        ]);
        builder.accumulate(&[
            node(&keys::prefix_key(100, "[Owner] ")),
            node(&keys::suffix_key(1, " *")),
            node(&keys::meta_key("home", "Nether")),
        ]);
        let view = builder.build(Vec::new());

        assert_eq!(view.option("prefix"), Some("[Admin] "));
        assert_eq!(view.option("SUFFIX"), Some(" *"));
        assert_eq!(view.option("home"), Some("Spawn"));
        assert_eq!(view.option("missing"), None);
    }

    #[test]
    fn test_valid_until_tracks_earliest_expiry() {
        let now = SystemTime::now();
        let short = Node::builder("a")
            .duration(Duration::from_secs(5))
            .build_at(now)
            .unwrap();
        let long = Node::builder("b")
            .duration(Duration::from_secs(50))
            .build_at(now)
            .unwrap();

        let mut builder = ViewBuilder::new(ImmutableContextSet::empty(), now);
        builder.accumulate(&[long, short.clone()]);
        let view = builder.build(Vec::new());

        assert_eq!(view.valid_until(), short.expiry());
        assert!(!view.is_stale_at(now));
        assert!(view.is_stale_at(now + Duration::from_secs(5)));
    }

    #[test]
    fn test_inherit_sets_group_key() {
        let mut builder = ViewBuilder::new(ImmutableContextSet::empty(), SystemTime::now());
        builder.inherit("admin");
        let view = builder.build(Vec::new());

        assert_eq!(view.permission_value("group.admin"), Tristate::True);
        assert_eq!(view.inherited(), ["admin".to_string()]);
    }
}
