/*!
 * Temporary Modifier Tests
 * DENY, REPLACE and ACCUMULATE collisions through the manager
 */

use crate::common::{global, manager, permanent, temporary, user};
use perms_kernel::permissions::MutateOutcome;
use perms_kernel::{Node, TemporaryModifier, Tristate};
use pretty_assertions::assert_eq;
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, SystemTime};

fn remaining(node: &Node) -> Duration {
    node.remaining_at(SystemTime::now()).expect("temporary node")
}

#[test]
fn test_deny_keeps_existing_grant() {
    let manager = manager();
    let user = user(&manager);

    let first = manager.set_permission(&user, temporary("fly", 60), TemporaryModifier::Deny);
    assert_eq!(first.outcome, MutateOutcome::Success);

    let second = manager.set_permission(&user, temporary("fly", 600), TemporaryModifier::Deny);
    assert_eq!(second.outcome, MutateOutcome::AlreadyHas);
    assert!(remaining(&second.node) <= Duration::from_secs(60));
    assert_eq!(user.holder().nodes().len(), 1);
}

#[test]
fn test_replace_takes_new_grant() {
    let manager = manager();
    let user = user(&manager);

    manager.set_permission(&user, temporary("fly", 600), TemporaryModifier::Deny);
    let result = manager.set_permission(&user, temporary("fly", 30), TemporaryModifier::Replace);

    assert_eq!(result.outcome, MutateOutcome::Success);
    let nodes = user.holder().nodes();
    assert_eq!(nodes.len(), 1);
    assert!(remaining(&nodes[0]) <= Duration::from_secs(30));
}

#[test]
fn test_accumulate_extends_grant() {
    let manager = manager();
    let user = user(&manager);

    manager.set_permission(&user, temporary("fly", 60), TemporaryModifier::Accumulate);
    let result = manager.set_permission(&user, temporary("fly", 60), TemporaryModifier::Accumulate);

    assert_eq!(result.outcome, MutateOutcome::Success);
    let nodes = user.holder().nodes();
    assert_eq!(nodes.len(), 1);
    let left = remaining(&nodes[0]);
    assert!(left > Duration::from_secs(115), "remaining {:?}", left);
    assert!(left <= Duration::from_secs(120), "remaining {:?}", left);
}

#[test]
fn test_configured_modifier_is_default() {
    let mut config = crate::common::config();
    config.temporary_modifier = TemporaryModifier::Replace;
    let manager = perms_kernel::PermissionManager::in_memory(config);
    assert_eq!(manager.temporary_modifier(), TemporaryModifier::Replace);
}

#[test]
fn test_permanent_value_flip_is_update() {
    let manager = manager();
    let user = user(&manager);

    manager.set_permission(&user, permanent("build"), TemporaryModifier::Deny);
    let denied = Node::builder("build").value(false).build().unwrap();
    let result = manager.set_permission(&user, denied, TemporaryModifier::Deny);

    assert!(result.is_update());
    assert_eq!(
        manager.get_permission_value(&user, &global(), "build"),
        Tristate::False
    );
}

#[test]
fn test_unset_missing_is_no_change() {
    let manager = manager();
    let user = user(&manager);

    let result = manager.unset_permission(&user, permanent("ghost"));
    assert_eq!(result.outcome, MutateOutcome::NoChange);
    assert!(result.save.is_none());
}

// =============================================================================
// Concurrent grants
// =============================================================================

const THREADS: usize = 8;

#[test]
fn test_concurrent_deny_admits_one_grant() {
    let manager = manager();

    for _ in 0..20 {
        let user = user(&manager);
        let barrier = Barrier::new(THREADS);

        let outcomes: Vec<MutateOutcome> = thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        let node = temporary("fly", 60);
                        barrier.wait();
                        manager
                            .set_permission(&user, node, TemporaryModifier::Deny)
                            .outcome
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let successes = outcomes
            .iter()
            .filter(|outcome| **outcome == MutateOutcome::Success)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(outcomes.len() - successes, THREADS - 1);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, MutateOutcome::Success | MutateOutcome::AlreadyHas)));
        assert_eq!(user.holder().nodes().len(), 1);
    }
}

#[test]
fn test_concurrent_accumulate_sums_every_grant() {
    let manager = manager();
    let user = user(&manager);
    let barrier = Barrier::new(THREADS);

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                let node = temporary("fly", 60);
                barrier.wait();
                let result = manager.set_permission(&user, node, TemporaryModifier::Accumulate);
                assert_eq!(result.outcome, MutateOutcome::Success);
            });
        }
    });

    let nodes = user.holder().nodes();
    assert_eq!(nodes.len(), 1);
    let total = Duration::from_secs(60 * THREADS as u64);
    let left = remaining(&nodes[0]);
    assert!(left <= total, "remaining {:?}", left);
    assert!(left > total - Duration::from_secs(5), "remaining {:?}", left);
}

#[test]
fn test_sweep_racing_grants_loses_nothing() {
    let manager = manager();
    let user = user(&manager);

    // Short-lived nodes for the sweeper to find
    for i in 0..THREADS {
        let node = Node::builder(format!("short.{}", i))
            .duration(Duration::from_millis(200))
            .build()
            .unwrap();
        manager.set_permission(&user, node, TemporaryModifier::Deny);
    }
    thread::sleep(Duration::from_millis(300));

    let barrier = Barrier::new(THREADS + 1);
    thread::scope(|scope| {
        scope.spawn(|| {
            barrier.wait();
            for _ in 0..50 {
                manager.sweep_expired(SystemTime::now());
            }
        });
        for i in 0..THREADS {
            let barrier = &barrier;
            let manager = &manager;
            let user = &user;
            scope.spawn(move || {
                barrier.wait();
                for round in 0..10 {
                    let node = temporary(&format!("long.{}.{}", i, round), 600);
                    manager.set_permission(user, node, TemporaryModifier::Deny);
                }
            });
        }
    });
    manager.sweep_expired(SystemTime::now());

    let nodes = user.holder().nodes();
    assert_eq!(nodes.len(), THREADS * 10);
    assert!(nodes.iter().all(|node| node.key().starts_with("long.")));
    assert_eq!(
        manager.get_permission_value(&user, &global(), "long.3.7"),
        Tristate::True
    );
}
