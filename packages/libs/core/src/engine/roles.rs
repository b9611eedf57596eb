//! Role 멤버십
//!
//! role 이름은 actor의 기본 guard에서 조회합니다. role 자체는 role을 가질 수 없습니다.

use std::collections::BTreeSet;

use super::Access;
use crate::actor::Authorizable;
use crate::error::{Error, Result};
use crate::model::{ActorKey, Holder, Role, RoleId};
use crate::request::RoleRequest;

impl<'a, A: Authorizable + ?Sized> Access<'a, A> {
    /// role 부여 (이미 가진 role은 건너뜀)
    pub fn assign_role(&self, roles: impl Into<RoleRequest>) -> Result<&Self> {
        let (holder, key) = self.actor_key()?;
        let ids = self.resolve_roles(&roles.into(), true)?;

        let attached = self.padlock.store.attach_roles(&key, &ids)?;
        self.padlock.invalidate(&holder);
        tracing::debug!(holder = %holder, attached, "roles assigned");
        Ok(self)
    }

    /// role 해제
    pub fn remove_role(&self, roles: impl Into<RoleRequest>) -> Result<&Self> {
        let (holder, key) = self.actor_key()?;
        let ids = self.resolve_roles(&roles.into(), false)?;

        let removed = self.padlock.store.detach_roles(&key, &ids)?;
        self.padlock.invalidate(&holder);
        tracing::debug!(holder = %holder, removed, "roles removed");
        Ok(self)
    }

    /// 보유 role을 주어진 목록으로 교체
    pub fn sync_roles(&self, roles: impl Into<RoleRequest>) -> Result<&Self> {
        let roles = roles.into();
        let (holder, key) = self.actor_key()?;
        // 교체 전에 전부 해석해서 실패 시 기존 role 유지
        let ids = self.resolve_roles(&roles, true)?;

        self.padlock.store.detach_all_roles(&key)?;
        let attached = self.padlock.store.attach_roles(&key, &ids)?;
        self.padlock.invalidate(&holder);
        tracing::debug!(holder = %holder, attached, "roles synced");
        Ok(self)
    }

    /// 주어진 role 중 하나라도 보유하는지 (guard 지정 시 해당 guard의 role만)
    pub fn has_role(&self, roles: impl Into<RoleRequest>, guard: Option<&str>) -> Result<bool> {
        let loaded = self.loaded_roles(guard)?;
        Ok(roles
            .into()
            .roles
            .iter()
            .any(|role| loaded.iter().any(|held| role.refers_to(held))))
    }

    pub fn has_any_role(&self, roles: impl Into<RoleRequest>, guard: Option<&str>) -> Result<bool> {
        self.has_role(roles, guard)
    }

    /// 주어진 role을 전부 보유하는지
    pub fn has_all_roles(&self, roles: impl Into<RoleRequest>, guard: Option<&str>) -> Result<bool> {
        let loaded = self.loaded_roles(guard)?;
        Ok(roles
            .into()
            .roles
            .iter()
            .all(|role| loaded.iter().any(|held| role.refers_to(held))))
    }

    /// 보유 role 이름
    pub fn get_role_names(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .snapshot()?
            .roles
            .iter()
            .map(|role| role.name.clone())
            .collect())
    }

    fn actor_key(&self) -> Result<(Holder, ActorKey)> {
        match self.holder()? {
            Holder::Actor(key) => Ok((Holder::Actor(key.clone()), key)),
            Holder::Role { .. } => Err(Error::InvalidArgument {
                position: 0,
                reason: "roles cannot be assigned to a role".to_string(),
            }),
        }
    }

    fn resolve_roles(&self, request: &RoleRequest, check_guard: bool) -> Result<Vec<RoleId>> {
        let guard = self.default_guard();
        let mut ids = Vec::with_capacity(request.roles.len());
        for role in &request.roles {
            let role = self.padlock.resolve_role(role, &guard)?;
            if check_guard {
                self.ensure_shares_guard(&role.guard_name)?;
            }
            if !ids.contains(&role.id) {
                ids.push(role.id);
            }
        }
        Ok(ids)
    }

    fn loaded_roles(&self, guard: Option<&str>) -> Result<Vec<Role>> {
        Ok(self
            .snapshot()?
            .roles
            .iter()
            .filter(|role| guard.map_or(true, |g| role.guard_name == g))
            .cloned()
            .collect())
    }
}
