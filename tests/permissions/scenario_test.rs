/*!
 * End-to-End Scenario
 * Ranked groups, temporary membership, and persistence
 */

use crate::common::{config, global};
use perms_kernel::permissions::MutateOutcome;
use perms_kernel::{
    HolderHandle, MemoryStorage, Node, PermissionManager, TemporaryModifier, Tristate,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

fn parent_names(manager: &PermissionManager, user: &HolderHandle) -> Vec<String> {
    manager
        .resolve_parents(user, &global())
        .iter()
        .map(|group| group.name().to_string())
        .collect()
}

#[tokio::test]
async fn test_ranked_groups_with_temporary_membership() {
    let storage = Arc::new(MemoryStorage::new());
    let manager = PermissionManager::builder()
        .config(config())
        .storage(storage.clone())
        .build()
        .unwrap();

    let admin: HolderHandle = manager.create_group("admin", 20).unwrap().into();
    let moderator: HolderHandle = manager.create_group("mod", 10).unwrap().into();
    manager.set_permission(&admin, Node::builder("server.ban").build().unwrap(), TemporaryModifier::Deny);
    manager.set_permission(&admin, Node::builder("prefix.100.[Admin]").build().unwrap(), TemporaryModifier::Deny);
    manager.set_permission(&moderator, Node::builder("server.kick").build().unwrap(), TemporaryModifier::Deny);
    manager.set_permission(&moderator, Node::builder("prefix.50.[Mod]").build().unwrap(), TemporaryModifier::Deny);

    let uuid = Uuid::new_v4();
    let user: HolderHandle = manager
        .get_or_create_user(uuid, Some("alice".to_string()))
        .into();
    assert!(user.holder().nodes().is_empty());

    // Permanent membership in admin
    let grant = manager.set_permission(&user, Node::group("admin").build().unwrap(), TemporaryModifier::Accumulate);
    assert_eq!(grant.outcome, MutateOutcome::Success);
    assert_eq!(parent_names(&manager, &user), vec!["admin".to_string()]);

    // Temporary membership in mod, granted twice
    let trial = || {
        Node::group("mod")
            .duration(Duration::from_secs(60))
            .build()
            .unwrap()
    };
    let issued = SystemTime::now();
    let first = manager.set_permission(&user, trial(), TemporaryModifier::Accumulate);
    assert_eq!(first.outcome, MutateOutcome::Success);
    let second = manager.set_permission(&user, trial(), TemporaryModifier::Accumulate);
    assert_eq!(second.outcome, MutateOutcome::Success);

    let expiry = second.node.expiry().expect("membership is temporary");
    let span = expiry.duration_since(issued).unwrap();
    assert!(span > Duration::from_secs(115), "expiry {:?} after issue", span);
    assert!(span < Duration::from_secs(121), "expiry {:?} after issue", span);

    assert_eq!(
        parent_names(&manager, &user),
        vec!["admin".to_string(), "mod".to_string()]
    );
    assert_eq!(manager.get_permission_value(&user, &global(), "server.ban"), Tristate::True);
    assert_eq!(manager.get_permission_value(&user, &global(), "server.kick"), Tristate::True);
    assert_eq!(manager.get_option(&user, &global(), "prefix").as_deref(), Some("[Admin]"));

    // Membership in mod lapses lazily once the accumulated time runs out
    let after = expiry + Duration::from_secs(1);
    let view = manager.view_at(&user, &global(), after);
    assert_eq!(view.permission_value("server.kick"), Tristate::Undefined);
    assert_eq!(view.permission_value("server.ban"), Tristate::True);

    // The last save carries the user's final node list
    second.save.expect("storage configured").wait().await.unwrap();
    let stored = storage.user(uuid).expect("user persisted");
    assert_eq!(stored.nodes.len(), 2);
    assert_eq!(stored.name.as_deref(), Some("alice"));
}
