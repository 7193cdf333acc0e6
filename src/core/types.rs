/*!
 * Core Types
 * Common types used across the crate
 */

use serde::{Deserialize, Serialize};

/// Common result type for fallible operations
pub type KernelResult<T> = Result<T, super::errors::KernelError>;

/// Group weight, higher wins during inheritance ordering
pub type Weight = i32;

/// Three-valued permission lookup result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tristate {
    True,
    False,
    #[default]
    Undefined,
}

impl Tristate {
    /// Undefined collapses to false
    #[inline]
    pub fn as_bool(self) -> bool {
        matches!(self, Tristate::True)
    }

    #[inline]
    pub fn is_defined(self) -> bool {
        !matches!(self, Tristate::Undefined)
    }
}

impl From<bool> for Tristate {
    fn from(value: bool) -> Self {
        if value {
            Tristate::True
        } else {
            Tristate::False
        }
    }
}

impl From<Option<bool>> for Tristate {
    fn from(value: Option<bool>) -> Self {
        value.map(Tristate::from).unwrap_or(Tristate::Undefined)
    }
}
