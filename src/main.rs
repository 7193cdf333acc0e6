/*!
 * Permissions Kernel - Main Entry Point
 *
 * Builds the permission manager over in-memory storage, keeps the
 * configured default groups loaded, and runs the expiry sweeper until
 * interrupted.
 */

use anyhow::Context;
use perms_kernel::core::limits::DEFAULT_GROUP_WEIGHT;
use perms_kernel::{init_tracing, Config, ExpirySweeper, MemoryStorage, PermissionManager};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Permissions kernel starting...");

    let config = Config::from_env().context("loading configuration")?;
    info!(
        modifier = %config.temporary_modifier,
        sweep_interval = ?config.sweep_interval,
        max_depth = config.max_inheritance_depth,
        "Configuration loaded"
    );

    let sweep_interval = config.sweep_interval;
    let mut defaults: Vec<String> = config
        .default_user_groups
        .iter()
        .chain(config.global_default_groups.iter())
        .cloned()
        .collect();
    defaults.sort();
    defaults.dedup();

    let manager = PermissionManager::builder()
        .config(config)
        .storage(Arc::new(MemoryStorage::new()))
        .build()
        .context("building permission manager")?;

    let loaded = manager
        .load_groups(&defaults)
        .await
        .context("preloading default groups")?;
    for name in &defaults {
        if !loaded.iter().any(|group| group.name().eq_ignore_ascii_case(name.trim())) {
            manager
                .create_group(name, DEFAULT_GROUP_WEIGHT)
                .with_context(|| format!("creating default group '{}'", name))?;
        }
    }
    info!(groups = defaults.len(), "Default groups ready");

    let sweeper = ExpirySweeper::spawn(manager.clone(), sweep_interval);

    info!("Permissions kernel ready, press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    info!("Shutting down...");
    sweeper.shutdown().await;

    let stats = manager.cache_stats();
    info!(
        views = stats.size,
        hit_rate = stats.hit_rate(),
        "Permissions kernel stopped"
    );
    Ok(())
}
