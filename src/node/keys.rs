/*!
 * Node Key Encodings
 *
 * Special key shapes carried inside plain permission nodes:
 * - `group.<name>` inheritance edge
 * - `prefix.<priority>.<value>` / `suffix.<priority>.<value>` chat metadata
 * - `meta.<key>.<value>` free-form option
 */

use serde::{Deserialize, Serialize};

pub const GROUP_PREFIX: &str = "group.";
pub const PREFIX_PREFIX: &str = "prefix.";
pub const SUFFIX_PREFIX: &str = "suffix.";
pub const META_PREFIX: &str = "meta.";

/// Option keys answered from prefix/suffix nodes rather than meta nodes
pub const PREFIX_KEY: &str = "prefix";
pub const SUFFIX_KEY: &str = "suffix";

/// Case-insensitive prefix strip
fn strip_prefix_ci<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    if key.len() >= prefix.len() && key.is_char_boundary(prefix.len()) {
        let (head, tail) = key.split_at(prefix.len());
        if head.eq_ignore_ascii_case(prefix) {
            return Some(tail);
        }
    }
    None
}

/// Build an inheritance key for a group
pub fn group_key(name: &str) -> String {
    format!("{}{}", GROUP_PREFIX, name.trim().to_lowercase())
}

/// Group name referenced by an inheritance key, lowercased
pub fn parse_group(key: &str) -> Option<String> {
    strip_prefix_ci(key, GROUP_PREFIX)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_lowercase)
}

pub fn prefix_key(priority: i32, value: &str) -> String {
    format!("{}{}.{}", PREFIX_PREFIX, priority, value)
}

pub fn suffix_key(priority: i32, value: &str) -> String {
    format!("{}{}.{}", SUFFIX_PREFIX, priority, value)
}

pub fn meta_key(key: &str, value: &str) -> String {
    format!("{}{}.{}", META_PREFIX, key.trim().to_lowercase(), value)
}

/// Decoded metadata node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum MetaEntry {
    Prefix { priority: i32, value: String },
    Suffix { priority: i32, value: String },
    Meta { key: String, value: String },
}

fn parse_chat(rest: &str) -> Option<(i32, String)> {
    let (priority, value) = rest.split_once('.')?;
    let priority = priority.trim().parse::<i32>().ok()?;
    Some((priority, value.to_string()))
}

/// Decode a metadata key. Values keep their original case
pub fn parse_meta(key: &str) -> Option<MetaEntry> {
    if let Some(rest) = strip_prefix_ci(key, PREFIX_PREFIX) {
        return parse_chat(rest).map(|(priority, value)| MetaEntry::Prefix { priority, value });
    }
    if let Some(rest) = strip_prefix_ci(key, SUFFIX_PREFIX) {
        return parse_chat(rest).map(|(priority, value)| MetaEntry::Suffix { priority, value });
    }
    if let Some(rest) = strip_prefix_ci(key, META_PREFIX) {
        let (meta_key, value) = rest.split_once('.')?;
        let meta_key = meta_key.trim();
        if meta_key.is_empty() {
            return None;
        }
        return Some(MetaEntry::Meta {
            key: meta_key.to_lowercase(),
            value: value.to_string(),
        });
    }
    None
}
