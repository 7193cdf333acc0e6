/*!
 * Expiry Tests
 * Lazy expiry on read and removal by sweep
 */

use crate::common::{global, group, manager, temporary, user};
use perms_kernel::{Node, TemporaryModifier, Tristate};
use pretty_assertions::assert_eq;
use std::time::{Duration, SystemTime};

#[test]
fn test_expired_node_not_reported_before_sweep() {
    let manager = manager();
    let user = user(&manager);
    manager.set_permission(&user, temporary("fly", 30), TemporaryModifier::Deny);

    let now = SystemTime::now();
    let live = manager.view_at(&user, &global(), now);
    assert_eq!(live.permission_value("fly"), Tristate::True);

    // A read past the expiry must not reuse the cached view
    let later = now + Duration::from_secs(31);
    let expired = manager.view_at(&user, &global(), later);
    assert_eq!(expired.permission_value("fly"), Tristate::Undefined);

    // No sweep ran: the node is still stored
    assert_eq!(user.holder().nodes().len(), 1);
}

#[test]
fn test_expired_parent_edge_stops_inheritance() {
    let manager = manager();
    let vip = group(&manager, "vip", 0);
    let user = user(&manager);
    manager.set_permission(&vip, Node::builder("fly").build().unwrap(), TemporaryModifier::Deny);

    let edge = Node::group("vip")
        .duration(Duration::from_secs(10))
        .build()
        .unwrap();
    manager.set_permission(&user, edge, TemporaryModifier::Deny);

    let now = SystemTime::now();
    assert_eq!(manager.view_at(&user, &global(), now).permission_value("fly"), Tristate::True);

    let later = now + Duration::from_secs(11);
    let view = manager.view_at(&user, &global(), later);
    assert_eq!(view.permission_value("fly"), Tristate::Undefined);
    assert!(view.parents().is_empty());
}

#[test]
fn test_sweep_removes_only_expired() {
    let manager = manager();
    let user = user(&manager);
    manager.set_permission(&user, temporary("fly", 30), TemporaryModifier::Deny);
    manager.set_permission(&user, temporary("build", 600), TemporaryModifier::Deny);

    let report = manager.sweep_expired(SystemTime::now() + Duration::from_secs(60));
    assert_eq!(report.nodes_removed, 1);
    assert_eq!(report.holders_changed, 1);

    let nodes = user.holder().nodes();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].key(), "build");
}

#[tokio::test]
async fn test_sweeper_task_runs() {
    let manager = manager();
    let user = user(&manager);
    manager.set_permission(&user, temporary("fly", 1), TemporaryModifier::Deny);

    let sweeper = perms_kernel::ExpirySweeper::spawn(manager.clone(), Duration::from_millis(100));
    for _ in 0..100 {
        if user.holder().nodes().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(user.holder().nodes().is_empty());
    sweeper.shutdown().await;
}
