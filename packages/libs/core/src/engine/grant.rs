//! 권한 부여/회수
//!
//! grant edge `(holder, permission_id, pivot)`는 유일하며, 이미 있는 edge를 다시
//! 부여하는 것은 아무 효과가 없습니다. 저장되지 않은 actor는 [`PendingGrant`]로
//! 부여를 미뤄 두었다가 저장 후 한 번만 적용합니다.

use std::collections::BTreeSet;

use super::{Access, Padlock};
use crate::actor::Authorizable;
use crate::error::{Error, Result};
use crate::model::{GrantEdge, Holder};
use crate::request::PermissionRequest;
use crate::scope::RevokeFilter;

/// 저장되지 않은 actor를 위해 보류된 권한 부여
///
/// [`PendingGrant::commit`]은 토큰을 소비하므로 정확히 한 번만 적용됩니다.
/// 토큰은 복제할 수 없습니다.
///
/// ```compile_fail
/// use padlock_core::{Actor, Padlock};
///
/// let padlock = Padlock::default();
/// padlock.create_permission("publish", None)?;
/// let user = Actor::unsaved("app::User");
/// let pending = padlock.for_actor(&user).stage_grant("publish")?;
/// let again = pending.clone();
/// # Ok::<(), padlock_core::Error>(())
/// ```
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a staged grant does nothing until it is committed"]
pub struct PendingGrant {
    holder_type: String,
    edges: Vec<GrantEdge>,
}

impl PendingGrant {
    pub fn holder_type(&self) -> &str {
        &self.holder_type
    }

    pub fn edges(&self) -> &[GrantEdge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// 저장된 actor에 보류된 edge 적용, 실제 추가된 수 반환
    pub fn commit<A: Authorizable + ?Sized>(self, padlock: &Padlock, actor: &A) -> Result<usize> {
        if actor.holder_type() != self.holder_type {
            return Err(Error::HolderMismatch {
                expected: self.holder_type,
                actual: actor.holder_type().to_string(),
            });
        }

        let access = padlock.for_actor(actor);
        let holder = access.holder()?;
        access.attach(&holder, self.edges)
    }
}

impl<'a, A: Authorizable + ?Sized> Access<'a, A> {
    /// 권한 부여
    ///
    /// 저장되지 않은 actor는 `ActorNotPersisted`로 실패합니다 ([`Access::stage_grant`] 사용).
    pub fn give_permission_to(&self, request: impl Into<PermissionRequest>) -> Result<&Self> {
        let request = request.into();
        let holder = self.holder()?;
        let edges = self.prepare_grant(&request)?;
        self.attach(&holder, edges)?;
        Ok(self)
    }

    /// 저장 전 actor를 위한 2단계 부여
    ///
    /// 권한 조회, guard 검사, strict 검사는 지금 수행하고 edge 저장은 `commit`까지 미룹니다.
    pub fn stage_grant(&self, request: impl Into<PermissionRequest>) -> Result<PendingGrant> {
        let request = request.into();
        let edges = self.prepare_grant(&request)?;

        tracing::debug!(
            holder_type = %self.actor.holder_type(),
            edges = edges.len(),
            "grant staged"
        );
        Ok(PendingGrant {
            holder_type: self.actor.holder_type().to_string(),
            edges,
        })
    }

    /// 권한 회수
    ///
    /// 권한마다 매칭되는 edge를 삭제하며, 하나도 없으면 `PermissionNotAssigned`로
    /// 중단합니다 (앞서 삭제된 edge는 유지).
    pub fn revoke_permission_to(&self, request: impl Into<PermissionRequest>) -> Result<&Self> {
        let request = request.into();
        let holder = self.holder()?;
        let guard = self.guard_for(&request);
        let pivot = self.padlock.resolve_pivot(request.target.as_ref())?;
        let recursive = request
            .recursive
            .unwrap_or(self.padlock.config.revoke_recursion);
        let filter = RevokeFilter::new(pivot, recursive);

        for permission in &request.permissions {
            let permission = self.padlock.resolve_permission(permission, &guard)?;
            let removed = self
                .padlock
                .store
                .detach_grants(&holder, permission.id, &filter)?;

            if removed == 0 {
                return Err(Error::PermissionNotAssigned {
                    permission: permission.name,
                    to_id: filter.pivot().to_id().to_string(),
                    to_type: filter.pivot().to_type().to_string(),
                });
            }

            self.padlock.invalidate(&holder);
            tracing::debug!(
                holder = %holder,
                permission = %permission.name,
                removed,
                recursive,
                "permission revoked"
            );
        }

        Ok(self)
    }

    /// 직접 권한 전부 해제 후 다시 부여
    pub fn sync_permissions(&self, request: impl Into<PermissionRequest>) -> Result<&Self> {
        let holder = self.holder()?;
        let detached = self.padlock.store.detach_all_grants(&holder)?;
        self.padlock.invalidate(&holder);
        tracing::debug!(holder = %holder, detached, "direct permissions cleared for sync");

        self.give_permission_to(request)
    }

    fn prepare_grant(&self, request: &PermissionRequest) -> Result<Vec<GrantEdge>> {
        let guard = self.guard_for(request);
        let mut seen = BTreeSet::new();
        let mut edges = Vec::new();

        for permission in request.permissions.iter().filter(|p| !p.is_empty()) {
            let permission = self.padlock.resolve_permission(permission, &guard)?;
            self.ensure_shares_guard(&permission.guard_name)?;

            if request.target.is_none() && self.padlock.config.strict.permission_assignment {
                tracing::warn!(
                    holder_type = %self.actor.holder_type(),
                    permission = %permission.name,
                    "rejected unscoped assignment in strict mode"
                );
                return Err(Error::StrictModeRestriction);
            }

            let pivot = self.padlock.resolve_pivot(request.target.as_ref())?;
            let edge = GrantEdge::new(permission.id, pivot);
            if seen.insert(edge.clone()) {
                edges.push(edge);
            }
        }

        Ok(edges)
    }

    fn attach(&self, holder: &Holder, edges: Vec<GrantEdge>) -> Result<usize> {
        let existing = self.padlock.store.grants(holder)?;
        let fresh: Vec<GrantEdge> = edges
            .into_iter()
            .filter(|edge| !existing.contains(edge))
            .collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        let attached = self.padlock.store.attach_grants(holder, &fresh)?;
        self.padlock.invalidate(holder);
        tracing::debug!(holder = %holder, attached, "permissions granted");
        Ok(attached)
    }
}

#[cfg(test)]
mod tests {
    use crate::actor::Actor;
    use crate::config::PadlockConfig;
    use crate::engine::Padlock;
    use crate::error::Error;
    use crate::model::Holder;
    use crate::request::PermissionRequest;
    use crate::scope::{Pivot, ResourceRef};

    fn padlock() -> Padlock {
        let padlock = Padlock::new(PadlockConfig {
            resource_types: vec!["blog::Post".to_string()],
            ..Default::default()
        });
        for name in ["edit-post", "delete-post", "publish"] {
            padlock.create_permission(name, None).unwrap();
        }
        padlock
    }

    fn grant_count(padlock: &Padlock, actor: &Actor) -> usize {
        padlock
            .store()
            .grants(&actor.key().map(Holder::Actor).unwrap())
            .unwrap()
            .len()
    }

    #[test]
    fn test_give_is_idempotent() {
        let padlock = padlock();
        let user = Actor::persisted("app::User", 1);
        let access = padlock.for_actor(&user);

        access.give_permission_to("edit-post").unwrap();
        access.give_permission_to("edit-post").unwrap();
        access
            .give_permission_to(vec!["edit-post", "edit-post"])
            .unwrap();

        assert_eq!(grant_count(&padlock, &user), 1);
    }

    #[test]
    fn test_give_then_revoke_round_trip() {
        let padlock = padlock();
        let user = Actor::persisted("app::User", 1);
        let post = ResourceRef::persisted("blog::Post", 5);
        let access = padlock.for_actor(&user);

        access.give_permission_to(("edit-post", &post)).unwrap();
        assert!(access.has_permission_to(("edit-post", &post)).unwrap());

        access.revoke_permission_to(("edit-post", &post)).unwrap();
        assert!(!access.has_permission_to(("edit-post", &post)).unwrap());
        assert_eq!(grant_count(&padlock, &user), 0);
    }

    #[test]
    fn test_empty_names_are_skipped() {
        let padlock = padlock();
        let user = Actor::persisted("app::User", 1);

        padlock
            .for_actor(&user)
            .give_permission_to(vec!["", "publish", "  "])
            .unwrap();

        assert_eq!(grant_count(&padlock, &user), 1);
    }

    #[test]
    fn test_give_unknown_permission() {
        let padlock = padlock();
        let user = Actor::persisted("app::User", 1);

        let err = padlock
            .for_actor(&user)
            .give_permission_to("fly")
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDoesNotExist { permission, .. } if permission == "fly"));
    }

    #[test]
    fn test_cross_guard_assignment_rejected() {
        let padlock = padlock();
        padlock.create_permission("read-api", Some("api")).unwrap();
        let user = Actor::persisted("app::User", 1).with_guard("web");

        let err = padlock
            .for_actor(&user)
            .give_permission_to(PermissionRequest::from("read-api").guard("api"))
            .unwrap_err();

        assert!(matches!(err, Error::GuardDoesNotMatch { given, .. } if given == "api"));
        assert_eq!(grant_count(&padlock, &user), 0);
    }

    #[test]
    fn test_multi_guard_actor_accepts_any_of_its_guards() {
        let padlock = padlock();
        padlock.create_permission("read-api", Some("api")).unwrap();
        let user = Actor::persisted("app::User", 1)
            .with_guard("web")
            .with_guard("api");
        let access = padlock.for_actor(&user);

        access
            .give_permission_to(PermissionRequest::from("read-api").guard("api"))
            .unwrap();

        assert!(access
            .has_permission_to(PermissionRequest::from("read-api").guard("api"))
            .unwrap());
    }

    #[test]
    fn test_strict_mode_requires_target() {
        let padlock = Padlock::new(PadlockConfig {
            resource_types: vec!["blog::Post".to_string()],
            strict: crate::config::StrictConfig {
                permission_assignment: true,
            },
            ..Default::default()
        });
        padlock.create_permission("edit-post", None).unwrap();
        let user = Actor::persisted("app::User", 1);
        let access = padlock.for_actor(&user);

        let err = access.give_permission_to("edit-post").unwrap_err();
        assert!(matches!(err, Error::StrictModeRestriction));

        access
            .give_permission_to(PermissionRequest::from("edit-post").on_type("blog::Post"))
            .unwrap();
        assert_eq!(grant_count(&padlock, &user), 1);
    }

    #[test]
    fn test_revoke_missing_grant_fails() {
        let padlock = padlock();
        let user = Actor::persisted("app::User", 1);

        let err = padlock
            .for_actor(&user)
            .revoke_permission_to("edit-post")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::PermissionNotAssigned { permission, to_id, to_type }
                if permission == "edit-post" && to_id == "*" && to_type == "*"
        ));
    }

    #[test]
    fn test_revoke_aborts_but_keeps_earlier_removals() {
        let padlock = padlock();
        let user = Actor::persisted("app::User", 1);
        let access = padlock.for_actor(&user);
        access.give_permission_to("edit-post").unwrap();

        let err = access
            .revoke_permission_to(vec!["edit-post", "publish"])
            .unwrap_err();

        assert!(matches!(err, Error::PermissionNotAssigned { permission, .. } if permission == "publish"));
        assert!(!access.has_permission_to("edit-post").unwrap());
    }

    #[test]
    fn test_recursive_revoke() {
        let padlock = padlock();
        let user = Actor::persisted("app::User", 1);
        let access = padlock.for_actor(&user);
        let post5 = ResourceRef::persisted("blog::Post", 5);
        let post7 = ResourceRef::persisted("blog::Post", 7);

        access.give_permission_to("edit-post").unwrap();
        access.give_permission_to(("edit-post", &post5)).unwrap();
        access.give_permission_to(("edit-post", &post7)).unwrap();

        // 비-recursive 회수는 (*, *) edge만 삭제
        access.revoke_permission_to("edit-post").unwrap();
        assert_eq!(grant_count(&padlock, &user), 2);
        assert!(access.has_permission_to(("edit-post", &post5)).unwrap());

        access
            .revoke_permission_to(PermissionRequest::from("edit-post").recursive(true))
            .unwrap();
        assert_eq!(grant_count(&padlock, &user), 0);
    }

    #[test]
    fn test_recursive_revoke_by_type() {
        let padlock = padlock();
        let user = Actor::persisted("app::User", 1);
        let access = padlock.for_actor(&user);

        access
            .give_permission_to(PermissionRequest::from("edit-post").on_type("blog::Post"))
            .unwrap();
        access
            .give_permission_to(("edit-post", ResourceRef::persisted("blog::Post", 5)))
            .unwrap();

        access
            .revoke_permission_to(
                PermissionRequest::from("edit-post")
                    .on_type("blog::Post")
                    .recursive(true),
            )
            .unwrap();
        assert_eq!(grant_count(&padlock, &user), 0);
    }

    #[test]
    fn test_revoke_recursion_default_from_config() {
        let padlock = Padlock::new(PadlockConfig {
            revoke_recursion: true,
            ..Default::default()
        });
        padlock.create_permission("edit-post", None).unwrap();
        let user = Actor::persisted("app::User", 1);
        let access = padlock.for_actor(&user);

        access
            .give_permission_to(("edit-post", ResourceRef::persisted("blog::Post", 5)))
            .unwrap();
        access.revoke_permission_to("edit-post").unwrap();

        assert_eq!(grant_count(&padlock, &user), 0);
    }

    #[test]
    fn test_normalized_revoke_uses_configured_recursion() {
        let padlock = Padlock::new(PadlockConfig {
            resource_types: vec!["blog::Post".to_string()],
            revoke_recursion: true,
            ..Default::default()
        });
        padlock.create_permission("edit-post", None).unwrap();
        let user = Actor::persisted("app::User", 1);
        let access = padlock.for_actor(&user);
        access.give_permission_to("edit-post").unwrap();
        access
            .give_permission_to(("edit-post", ResourceRef::persisted("blog::Post", 5)))
            .unwrap();

        let request = padlock
            .normalize(vec!["edit-post".into(), "blog::Post".into()])
            .unwrap();
        assert_eq!(request.recursive, Some(true));
        access.revoke_permission_to(request).unwrap();

        assert_eq!(grant_count(&padlock, &user), 1);
        assert!(access.has_permission_to("edit-post").unwrap());

        let request = padlock
            .normalize(vec!["edit-post".into(), false.into()])
            .unwrap();
        access.revoke_permission_to(request).unwrap();
        assert_eq!(grant_count(&padlock, &user), 0);
    }

    #[test]
    fn test_sync_permissions_replaces_direct_grants() {
        let padlock = padlock();
        let user = Actor::persisted("app::User", 1);
        let access = padlock.for_actor(&user);

        access.give_permission_to("edit-post|delete-post").unwrap();
        access.sync_permissions("publish").unwrap();

        let names = access.get_permission_names().unwrap();
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["publish"]);
    }

    #[test]
    fn test_unsaved_actor_must_stage() {
        let padlock = padlock();
        let mut user = Actor::unsaved("app::User");

        let err = padlock
            .for_actor(&user)
            .give_permission_to("edit-post")
            .unwrap_err();
        assert!(matches!(err, Error::ActorNotPersisted { holder_type } if holder_type == "app::User"));

        let pending = padlock
            .for_actor(&user)
            .stage_grant("edit-post|publish")
            .unwrap();
        assert_eq!(pending.edges().len(), 2);

        user.mark_saved(9);
        assert_eq!(pending.commit(&padlock, &user).unwrap(), 2);
        assert!(padlock.for_actor(&user).has_permission_to("publish").unwrap());
    }

    #[test]
    fn test_committed_grant_stays_revoked() {
        let padlock = padlock();
        let mut user = Actor::unsaved("app::User");
        let pending = padlock.for_actor(&user).stage_grant("publish").unwrap();

        user.mark_saved(1);
        assert_eq!(pending.commit(&padlock, &user).unwrap(), 1);

        let access = padlock.for_actor(&user);
        access.revoke_permission_to("publish").unwrap();
        assert!(!access.has_permission_to("publish").unwrap());
        assert_eq!(grant_count(&padlock, &user), 0);
    }

    #[test]
    fn test_commit_rejects_other_holder_type() {
        let padlock = padlock();
        let user = Actor::unsaved("app::User");
        let pending = padlock.for_actor(&user).stage_grant("publish").unwrap();

        let admin = Actor::persisted("app::Admin", 1);
        let err = pending.commit(&padlock, &admin).unwrap_err();
        assert!(matches!(err, Error::HolderMismatch { expected, actual }
            if expected == "app::User" && actual == "app::Admin"));
    }

    #[test]
    fn test_commit_skips_existing_edges() {
        let padlock = padlock();
        let mut user = Actor::unsaved("app::User");
        let pending = padlock.for_actor(&user).stage_grant("publish").unwrap();

        user.mark_saved(3);
        padlock.for_actor(&user).give_permission_to("publish").unwrap();

        assert_eq!(pending.commit(&padlock, &user).unwrap(), 0);
        assert_eq!(grant_count(&padlock, &user), 1);
    }

    #[test]
    fn test_commit_requires_saved_actor() {
        let padlock = padlock();
        let user = Actor::unsaved("app::User");
        let pending = padlock.for_actor(&user).stage_grant("publish").unwrap();

        let err = pending.commit(&padlock, &user).unwrap_err();
        assert!(matches!(err, Error::ActorNotPersisted { .. }));
    }

    #[test]
    fn test_grant_invalidates_cache() {
        let padlock = padlock();
        let user = Actor::persisted("app::User", 1);
        let access = padlock.for_actor(&user);

        assert!(!access.has_permission_to("publish").unwrap());
        assert_eq!(padlock.cache().len(), 1);

        access.give_permission_to("publish").unwrap();
        assert!(padlock.cache().is_empty());
        assert!(access.has_permission_to("publish").unwrap());
    }

    #[test]
    fn test_role_holder_gets_pivot_scoped_grant() {
        let padlock = padlock();
        let writer = padlock.create_role("writer", None).unwrap();
        let post = ResourceRef::persisted("blog::Post", 5);

        padlock
            .for_actor(&writer)
            .give_permission_to(("edit-post", &post))
            .unwrap();

        let edges = padlock.store().grants(&Holder::role(writer.id)).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].pivot, Pivot::instance("5", "blog::Post"));
    }
}
