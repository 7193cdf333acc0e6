/*!
 * Inheritance Tests
 * Context satisfaction, weight precedence, and cycle safety
 */

use crate::common::{global, group, manager, permanent, user};
use perms_kernel::{ImmutableContextSet, Node, TemporaryModifier, Tristate};
use pretty_assertions::assert_eq;

fn inherit(manager: &perms_kernel::PermissionManager, child: &perms_kernel::HolderHandle, parent: &str) {
    let node = Node::group(parent).build().unwrap();
    assert!(manager
        .set_permission(child, node, TemporaryModifier::Deny)
        .is_success());
}

#[test]
fn test_context_must_be_satisfied() {
    let manager = manager();
    let user = user(&manager);

    let node = Node::builder("build")
        .with_context("world", "nether")
        .build()
        .unwrap();
    manager.set_permission(&user, node, TemporaryModifier::Deny);

    let nether = ImmutableContextSet::singleton("world", "nether");
    let nether_day = ImmutableContextSet::of([("world", "nether"), ("time", "day")]);
    let overworld = ImmutableContextSet::singleton("world", "overworld");

    assert_eq!(manager.get_permission_value(&user, &nether, "build"), Tristate::True);
    assert_eq!(manager.get_permission_value(&user, &nether_day, "build"), Tristate::True);
    assert_eq!(manager.get_permission_value(&user, &overworld, "build"), Tristate::Undefined);
    assert_eq!(manager.get_permission_value(&user, &global(), "build"), Tristate::Undefined);
}

#[test]
fn test_contextual_parent_edge() {
    let manager = manager();
    let user = user(&manager);
    group(&manager, "builder", 0);

    let edge = Node::group("builder")
        .with_context("server", "creative")
        .build()
        .unwrap();
    manager.set_permission(&user, edge, TemporaryModifier::Deny);

    let creative = ImmutableContextSet::singleton("server", "creative");
    assert!(manager.is_child_of(&user, &creative, "builder"));
    assert!(!manager.is_child_of(&user, &global(), "builder"));
}

#[test]
fn test_heavier_parent_wins() {
    let manager = manager();
    let user = user(&manager);
    let admin = group(&manager, "admin", 20);
    let helper = group(&manager, "helper", 10);

    let deny = Node::builder("kick").value(false).build().unwrap();
    manager.set_permission(&admin, deny, TemporaryModifier::Deny);
    manager.set_permission(&helper, permanent("kick"), TemporaryModifier::Deny);

    // Inherit the lighter group first; order of grants must not matter
    inherit(&manager, &user, "helper");
    inherit(&manager, &user, "admin");

    assert_eq!(manager.get_permission_value(&user, &global(), "kick"), Tristate::False);
    let parents: Vec<String> = manager
        .parents(&user, &global())
        .into_iter()
        .map(|parent| parent.name)
        .collect();
    assert_eq!(parents, vec!["admin".to_string(), "helper".to_string()]);
}

#[test]
fn test_own_node_beats_inherited() {
    let manager = manager();
    let user = user(&manager);
    let admin = group(&manager, "admin", 20);

    manager.set_permission(&admin, permanent("kick"), TemporaryModifier::Deny);
    inherit(&manager, &user, "admin");
    let deny = Node::builder("kick").value(false).build().unwrap();
    manager.set_permission(&user, deny, TemporaryModifier::Deny);

    assert_eq!(manager.get_permission_value(&user, &global(), "kick"), Tristate::False);
}

#[test]
fn test_cycle_terminates() {
    let manager = manager();
    let a = group(&manager, "a", 0);
    let b = group(&manager, "b", 0);
    let user = user(&manager);

    manager.set_permission(&a, permanent("from.a"), TemporaryModifier::Deny);
    manager.set_permission(&b, permanent("from.b"), TemporaryModifier::Deny);
    inherit(&manager, &a, "b");
    inherit(&manager, &b, "a");
    inherit(&manager, &user, "a");

    assert_eq!(manager.get_permission_value(&user, &global(), "from.a"), Tristate::True);
    assert_eq!(manager.get_permission_value(&user, &global(), "from.b"), Tristate::True);
    assert!(manager.is_child_of(&user, &global(), "b"));
    assert!(manager.is_child_of(&a, &global(), "b"));
}

#[test]
fn test_dangling_parent_is_skipped() {
    let manager = manager();
    let user = user(&manager);

    inherit(&manager, &user, "missing");
    assert!(manager.parents(&user, &global()).is_empty());
    assert!(manager.resolve_parents(&user, &global()).is_empty());
    assert!(!manager.is_child_of(&user, &global(), "missing"));

    // Loading the group later makes the same edge count
    group(&manager, "missing", 0);
    assert!(manager.is_child_of(&user, &global(), "Missing"));
}
