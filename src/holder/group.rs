/*!
 * Group
 */

use super::holder::PermissionHolder;
use super::types::HolderId;
use crate::core::errors::HolderError;
use crate::core::limits::DEFAULT_GROUP_WEIGHT;
use crate::core::types::Weight;
use crate::node::Node;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI32, Ordering};

/// Lightweight reference handed to platform adapters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupRef {
    pub name: String,
    pub weight: Weight,
}

/// Named holder with an inheritance weight
#[derive(Debug)]
pub struct Group {
    holder: PermissionHolder,
    name: String,
    weight: AtomicI32,
}

impl Group {
    pub fn new(name: &str) -> Result<Self, HolderError> {
        Self::with_nodes(name, DEFAULT_GROUP_WEIGHT, Vec::new())
    }

    pub fn with_nodes(name: &str, weight: Weight, nodes: Vec<Node>) -> Result<Self, HolderError> {
        let name = validate_name(name)?;
        Ok(Self {
            holder: PermissionHolder::with_nodes(HolderId::Group(name.clone()), nodes),
            name,
            weight: AtomicI32::new(weight),
        })
    }

    pub fn holder(&self) -> &PermissionHolder {
        &self.holder
    }

    /// Lowercased unique name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> Weight {
        self.weight.load(Ordering::Acquire)
    }

    /// Raw setter; callers go through the manager so caches are invalidated
    pub(crate) fn store_weight(&self, weight: Weight) {
        self.weight.store(weight, Ordering::Release);
    }

    pub fn to_ref(&self) -> GroupRef {
        GroupRef {
            name: self.name.clone(),
            weight: self.weight(),
        }
    }
}

/// Normalize and check a group name
pub fn validate_name(name: &str) -> Result<String, HolderError> {
    let normalized = name.trim().to_lowercase();
    if normalized.is_empty()
        || normalized.contains('.')
        || normalized.chars().any(char::is_whitespace)
    {
        return Err(HolderError::InvalidGroupName(name.to_string()));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_validation() {
        assert_eq!(validate_name(" Admin ").unwrap(), "admin");
        assert!(validate_name("").is_err());
        assert!(validate_name("a.b").is_err());
        assert!(validate_name("two words").is_err());
    }

    #[test]
    fn test_group_defaults() {
        let group = Group::new("Mod").unwrap();
        assert_eq!(group.name(), "mod");
        assert_eq!(group.weight(), 0);
        assert_eq!(group.holder().id(), &HolderId::Group("mod".to_string()));
        assert_eq!(
            group.to_ref(),
            GroupRef {
                name: "mod".to_string(),
                weight: 0
            }
        );
    }
}
