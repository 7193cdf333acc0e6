/*!
 * Implicit Parents and Options
 */

use super::types::DefaultsProvider;
use crate::context::ImmutableContextSet;
use crate::core::Config;
use crate::holder::HolderKind;
use std::collections::BTreeMap;

/// Defaults taken from [`Config`]
///
/// Users inherit `default_user_groups` then `global_default_groups`; groups
/// only the global list. Options are context-independent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfiguredDefaults {
    user_groups: Vec<String>,
    global_groups: Vec<String>,
    options: BTreeMap<String, String>,
}

impl ConfiguredDefaults {
    pub fn new(
        user_groups: Vec<String>,
        global_groups: Vec<String>,
        options: BTreeMap<String, String>,
    ) -> Self {
        let options = options
            .into_iter()
            .map(|(key, value)| (key.trim().to_lowercase(), value))
            .collect();
        Self {
            user_groups,
            global_groups,
            options,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.default_user_groups.clone(),
            config.global_default_groups.clone(),
            config.default_options.clone(),
        )
    }
}

impl DefaultsProvider for ConfiguredDefaults {
    fn default_parents(&self, kind: HolderKind, _context: &ImmutableContextSet) -> Vec<String> {
        let kind_specific: &[String] = match kind {
            HolderKind::User => &self.user_groups,
            HolderKind::Group => &[],
        };
        kind_specific
            .iter()
            .chain(self.global_groups.iter())
            .cloned()
            .collect()
    }

    fn default_option(
        &self,
        _kind: HolderKind,
        _context: &ImmutableContextSet,
        key: &str,
    ) -> Option<String> {
        self.options.get(&key.trim().to_lowercase()).cloned()
    }
}

/// No implicit parents or options
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDefaults;

impl DefaultsProvider for NoDefaults {
    fn default_parents(&self, _kind: HolderKind, _context: &ImmutableContextSet) -> Vec<String> {
        Vec::new()
    }

    fn default_option(
        &self,
        _kind: HolderKind,
        _context: &ImmutableContextSet,
        _key: &str,
    ) -> Option<String> {
        None
    }
}
