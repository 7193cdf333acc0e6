/*!
 * Invalidation Tests
 * Changes to a group reach every cached dependent
 */

use crate::common::{global, group, manager, permanent, user};
use perms_kernel::{Node, PermissionSource, TemporaryModifier, Tristate};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[test]
fn test_two_level_propagation() {
    let manager = manager();
    let base = group(&manager, "base", 0);
    let staff = group(&manager, "staff", 10);
    let user = user(&manager);

    manager.set_permission(&staff, Node::group("base").build().unwrap(), TemporaryModifier::Deny);
    manager.set_permission(&user, Node::group("staff").build().unwrap(), TemporaryModifier::Deny);

    // Warm the user's cache before the grandparent changes
    assert_eq!(manager.get_permission_value(&user, &global(), "fly"), Tristate::Undefined);
    let before = manager.view(&user, &global());

    manager.set_permission(&base, permanent("fly"), TemporaryModifier::Deny);

    let after = manager.view(&user, &global());
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.permission_value("fly"), Tristate::True);

    manager.unset_permission(&base, permanent("fly"));
    assert_eq!(manager.get_permission_value(&user, &global(), "fly"), Tristate::Undefined);
}

#[test]
fn test_unchanged_holder_keeps_view() {
    let manager = manager();
    let user = user(&manager);
    manager.set_permission(&user, permanent("fly"), TemporaryModifier::Deny);

    let first = manager.view(&user, &global());
    let second = manager.view(&user, &global());
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_registry_tracks_dependents() {
    let manager = manager();
    group(&manager, "staff", 0);
    let user = user(&manager);
    manager.set_permission(&user, Node::group("staff").build().unwrap(), TemporaryModifier::Deny);

    manager.view(&user, &global());
    assert_eq!(manager.registry().dependents_of("staff"), vec![user.id().clone()]);
}

#[test]
fn test_subject_invalidation() {
    let manager = manager();
    let user = user(&manager);
    manager.set_permission(&user, permanent("fly"), TemporaryModifier::Deny);

    let subject = manager.subject(user.clone());
    assert_eq!(subject.permission_value(&global(), "fly"), Tristate::True);
    let cached = manager.view(&user, &global());

    subject.invalidate_caches();
    assert!(!Arc::ptr_eq(&cached, &manager.view(&user, &global())));
}

#[test]
fn test_concurrent_reads_during_writes() {
    let manager = manager();
    let staff = group(&manager, "staff", 0);
    let user = user(&manager);
    manager.set_permission(&user, Node::group("staff").build().unwrap(), TemporaryModifier::Deny);

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let manager = manager.clone();
            let user = user.clone();
            std::thread::spawn(move || {
                for _ in 0..500 {
                    manager.get_permission_value(&user, &global(), "fly");
                }
            })
        })
        .collect();

    for i in 0..50 {
        let node = Node::builder("fly").value(i % 2 == 0).build().unwrap();
        manager.set_permission(&staff, node, TemporaryModifier::Deny);
    }
    for reader in readers {
        reader.join().unwrap();
    }

    // Last write set fly=false; no stale view may survive
    assert_eq!(manager.get_permission_value(&user, &global(), "fly"), Tristate::False);
}
