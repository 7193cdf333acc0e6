/*!
 * System Limits and Constants
 *
 * Centralized location for limits, thresholds, and default values.
 * Organized by domain for maintainability and discoverability.
 */

use std::time::Duration;

// =============================================================================
// INHERITANCE
// =============================================================================

/// Maximum inheritance depth walked when building a cached view
/// Chains deeper than this are truncated, not rejected
pub const DEFAULT_MAX_INHERITANCE_DEPTH: usize = 16;

/// Default weight assigned to a freshly created group
pub const DEFAULT_GROUP_WEIGHT: i32 = 0;

/// Group every user inherits when no explicit default is configured
pub const DEFAULT_USER_GROUP: &str = "default";

// =============================================================================
// EXPIRY SWEEPER
// =============================================================================

/// Interval between expiry sweeps (3s)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(3);

/// Lower bound on sweep interval
/// [PERF] Sub-100ms sweeps burn CPU without improving correctness, reads
/// already filter expired nodes
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(100);

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Attempts per save before the failure is surfaced
pub const DEFAULT_SAVE_ATTEMPTS: u32 = 3;

/// Fixed delay between save attempts (100ms)
pub const DEFAULT_SAVE_RETRY_DELAY: Duration = Duration::from_millis(100);

// =============================================================================
// AUDIT
// =============================================================================

/// Maximum audit entries kept in the global ring buffer
pub const MAX_AUDIT_EVENTS: usize = 10_000;

/// Maximum audit entries kept per target holder
pub const MAX_AUDIT_EVENTS_PER_TARGET: usize = 256;
