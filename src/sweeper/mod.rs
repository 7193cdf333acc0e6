/*!
 * Sweeper Module
 * Background removal of expired nodes
 */

mod task;

pub use task::{ExpirySweeper, SweeperCommand, SweeperStats};
