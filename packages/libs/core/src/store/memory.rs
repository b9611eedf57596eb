//! 프로세스 내 저장소

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;

use super::PermissionStore;
use crate::error::{Error, Result};
use crate::model::{ActorKey, GrantEdge, Holder, Permission, PermissionId, Role, RoleId};
use crate::scope::{Pivot, RevokeFilter};

/// 메모리 저장소
///
/// 정렬된 맵을 사용하므로 조회 결과 순서가 결정적입니다.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    permissions: BTreeMap<PermissionId, Permission>,
    roles: BTreeMap<RoleId, Role>,
    grants: BTreeMap<Holder, BTreeSet<GrantEdge>>,
    actor_roles: BTreeMap<ActorKey, BTreeSet<RoleId>>,
    next_permission_id: PermissionId,
    next_role_id: RoleId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing_permission(permission: String, guard: &str) -> Error {
    Error::PermissionDoesNotExist {
        permission,
        guard: guard.to_string(),
    }
}

fn missing_role(role: String, guard: &str) -> Error {
    Error::RoleDoesNotExist {
        role,
        guard: guard.to_string(),
    }
}

impl PermissionStore for MemoryStore {
    fn create_permission(&self, name: &str, guard: &str) -> Result<Permission> {
        let mut state = self.state.write();
        let exists = state
            .permissions
            .values()
            .any(|p| p.name == name && p.guard_name == guard);
        if exists {
            return Err(Error::PermissionAlreadyExists {
                name: name.to_string(),
                guard: guard.to_string(),
            });
        }

        state.next_permission_id += 1;
        let permission = Permission::new(state.next_permission_id, name, guard);
        state.permissions.insert(permission.id, permission.clone());
        Ok(permission)
    }

    fn create_role(&self, name: &str, guard: &str) -> Result<Role> {
        let mut state = self.state.write();
        let exists = state
            .roles
            .values()
            .any(|r| r.name == name && r.guard_name == guard);
        if exists {
            return Err(Error::RoleAlreadyExists {
                name: name.to_string(),
                guard: guard.to_string(),
            });
        }

        state.next_role_id += 1;
        let role = Role::new(state.next_role_id, name, guard);
        state.roles.insert(role.id, role.clone());
        Ok(role)
    }

    fn find_permission_by_name(&self, name: &str, guard: &str) -> Result<Permission> {
        self.state
            .read()
            .permissions
            .values()
            .find(|p| p.name == name && p.guard_name == guard)
            .cloned()
            .ok_or_else(|| missing_permission(name.to_string(), guard))
    }

    fn find_permission_by_id(&self, id: PermissionId, guard: &str) -> Result<Permission> {
        self.state
            .read()
            .permissions
            .get(&id)
            .filter(|p| p.guard_name == guard)
            .cloned()
            .ok_or_else(|| missing_permission(format!("#{}", id), guard))
    }

    fn find_role_by_name(&self, name: &str, guard: &str) -> Result<Role> {
        self.state
            .read()
            .roles
            .values()
            .find(|r| r.name == name && r.guard_name == guard)
            .cloned()
            .ok_or_else(|| missing_role(name.to_string(), guard))
    }

    fn find_role_by_id(&self, id: RoleId, guard: &str) -> Result<Role> {
        self.state
            .read()
            .roles
            .get(&id)
            .filter(|r| r.guard_name == guard)
            .cloned()
            .ok_or_else(|| missing_role(format!("#{}", id), guard))
    }

    fn permissions_by_ids(&self, ids: &[PermissionId]) -> Result<Vec<Permission>> {
        let state = self.state.read();
        let ids: BTreeSet<_> = ids.iter().copied().collect();
        Ok(ids
            .into_iter()
            .filter_map(|id| state.permissions.get(&id).cloned())
            .collect())
    }

    fn grants(&self, holder: &Holder) -> Result<Vec<GrantEdge>> {
        Ok(self
            .state
            .read()
            .grants
            .get(holder)
            .map(|edges| edges.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn attach_grants(&self, holder: &Holder, edges: &[GrantEdge]) -> Result<usize> {
        if edges.is_empty() {
            return Ok(0);
        }
        let mut state = self.state.write();
        let owned = state.grants.entry(holder.clone()).or_default();
        Ok(edges
            .iter()
            .filter(|edge| owned.insert((*edge).clone()))
            .count())
    }

    fn detach_grants(
        &self,
        holder: &Holder,
        permission_id: PermissionId,
        filter: &RevokeFilter,
    ) -> Result<usize> {
        let mut state = self.state.write();
        let Some(owned) = state.grants.get_mut(holder) else {
            return Ok(0);
        };

        let before = owned.len();
        owned.retain(|edge| !(edge.permission_id == permission_id && filter.matches(&edge.pivot)));
        let removed = before - owned.len();

        if owned.is_empty() {
            state.grants.remove(holder);
        }
        Ok(removed)
    }

    fn detach_all_grants(&self, holder: &Holder) -> Result<usize> {
        Ok(self
            .state
            .write()
            .grants
            .remove(holder)
            .map(|edges| edges.len())
            .unwrap_or(0))
    }

    fn roles_of(&self, actor: &ActorKey) -> Result<Vec<Role>> {
        let state = self.state.read();
        Ok(state
            .actor_roles
            .get(actor)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.roles.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn attach_roles(&self, actor: &ActorKey, roles: &[RoleId]) -> Result<usize> {
        if roles.is_empty() {
            return Ok(0);
        }
        let mut state = self.state.write();
        let owned = state.actor_roles.entry(actor.clone()).or_default();
        Ok(roles.iter().filter(|id| owned.insert(**id)).count())
    }

    fn detach_roles(&self, actor: &ActorKey, roles: &[RoleId]) -> Result<usize> {
        let mut state = self.state.write();
        let Some(owned) = state.actor_roles.get_mut(actor) else {
            return Ok(0);
        };

        let removed = roles.iter().filter(|id| owned.remove(*id)).count();
        if owned.is_empty() {
            state.actor_roles.remove(actor);
        }
        Ok(removed)
    }

    fn detach_all_roles(&self, actor: &ActorKey) -> Result<usize> {
        Ok(self
            .state
            .write()
            .actor_roles
            .remove(actor)
            .map(|ids| ids.len())
            .unwrap_or(0))
    }

    fn holders_with_grant(
        &self,
        permission_ids: &[PermissionId],
        pivot: &Pivot,
    ) -> Result<Vec<Holder>> {
        let state = self.state.read();
        Ok(state
            .grants
            .iter()
            .filter(|(_, edges)| {
                edges
                    .iter()
                    .any(|e| permission_ids.contains(&e.permission_id) && e.pivot == *pivot)
            })
            .map(|(holder, _)| holder.clone())
            .collect())
    }

    fn actors_with_roles(&self, roles: &[RoleId]) -> Result<Vec<ActorKey>> {
        let state = self.state.read();
        Ok(state
            .actor_roles
            .iter()
            .filter(|(_, ids)| roles.iter().any(|id| ids.contains(id)))
            .map(|(actor, _)| actor.clone())
            .collect())
    }
}
