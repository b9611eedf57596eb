//! 권한 판정
//!
//! 판정 계열 메서드는 요청의 첫 번째 권한만 평가합니다.
//! 저장된 edge의 `*` 축은 어떤 요청 값과도 매칭됩니다 ([`Pivot::covers`]).

use std::collections::BTreeSet;

use super::Access;
use crate::actor::Authorizable;
use crate::error::{Error, Result};
use crate::model::{Permission, PermissionId};
use crate::request::PermissionRequest;
use crate::scope::Pivot;

impl<'a, A: Authorizable + ?Sized> Access<'a, A> {
    /// 직접 권한 또는 role 경유 권한 보유 여부
    pub fn has_permission_to(&self, request: impl Into<PermissionRequest>) -> Result<bool> {
        let (permission, pivot) = self.checked(&request.into())?;
        Ok(self.holds(permission.id, &pivot)? || self.holds_via_role(&permission, &pivot)?)
    }

    /// `has_permission_to`와 같지만 존재하지 않는 권한은 `false`
    pub fn check_permission_to(&self, request: impl Into<PermissionRequest>) -> Result<bool> {
        match self.has_permission_to(request) {
            Err(err) if err.is_missing_permission() => Ok(false),
            other => other,
        }
    }

    /// 직접 권한 보유 여부
    pub fn has_direct_permission(&self, request: impl Into<PermissionRequest>) -> Result<bool> {
        let (permission, pivot) = self.checked(&request.into())?;
        self.holds(permission.id, &pivot)
    }

    /// role 경유 권한 보유 여부 (role holder는 항상 `false`)
    pub fn has_permission_via_role(&self, request: impl Into<PermissionRequest>) -> Result<bool> {
        let (permission, pivot) = self.checked(&request.into())?;
        self.holds_via_role(&permission, &pivot)
    }

    /// 하나라도 보유하면 `true` (존재하지 않는 권한은 건너뜀)
    pub fn has_any_permission<I>(&self, requests: I) -> Result<bool>
    where
        I: IntoIterator,
        I::Item: Into<PermissionRequest>,
    {
        for request in requests {
            if self.check_permission_to(request)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// 전부 보유하면 `true` (존재하지 않는 권한은 에러)
    pub fn has_all_permissions<I>(&self, requests: I) -> Result<bool>
    where
        I: IntoIterator,
        I::Item: Into<PermissionRequest>,
    {
        for request in requests {
            if !self.has_permission_to(request)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// 직접 부여된 권한 (id 오름차순)
    pub fn get_direct_permissions(&self) -> Result<Vec<Permission>> {
        let ids = self.direct_permission_ids()?;
        self.padlock.store.permissions_by_ids(&ids)
    }

    /// role을 통해 얻은 권한 (id 오름차순)
    pub fn get_permissions_via_roles(&self) -> Result<Vec<Permission>> {
        let ids = self.role_permission_ids()?;
        self.padlock.store.permissions_by_ids(&ids)
    }

    /// 직접 권한과 role 경유 권한의 합집합 (id 오름차순, 중복 제거)
    pub fn get_all_permissions(&self) -> Result<Vec<Permission>> {
        let mut ids = self.direct_permission_ids()?;
        ids.extend(self.role_permission_ids()?);
        ids.sort_unstable();
        ids.dedup();
        self.padlock.store.permissions_by_ids(&ids)
    }

    /// 직접 부여된 권한 이름
    pub fn get_permission_names(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .get_direct_permissions()?
            .into_iter()
            .map(|permission| permission.name)
            .collect())
    }

    /// 요청을 (권한, pivot)으로 해석
    fn checked(&self, request: &PermissionRequest) -> Result<(Permission, Pivot)> {
        let guard = self.guard_for(request);
        let Some(first) = request.first() else {
            return Err(Error::PermissionDoesNotExist {
                permission: String::new(),
                guard,
            });
        };

        let permission = self.padlock.resolve_permission(first, &guard)?;
        let pivot = self.padlock.resolve_pivot(request.target.as_ref())?;
        Ok((permission, pivot))
    }

    fn holds(&self, permission_id: PermissionId, pivot: &Pivot) -> Result<bool> {
        Ok(self
            .snapshot()?
            .grants
            .iter()
            .any(|edge| edge.grants(permission_id, pivot)))
    }

    /// role도 직접 권한 규칙을 그대로 따름
    fn holds_via_role(&self, permission: &Permission, pivot: &Pivot) -> Result<bool> {
        for role in &self.snapshot()?.roles {
            if self.padlock.for_actor(role).holds(permission.id, pivot)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn direct_permission_ids(&self) -> Result<Vec<PermissionId>> {
        let ids: BTreeSet<PermissionId> = self
            .snapshot()?
            .grants
            .iter()
            .map(|edge| edge.permission_id)
            .collect();
        Ok(ids.into_iter().collect())
    }

    fn role_permission_ids(&self) -> Result<Vec<PermissionId>> {
        let mut ids = BTreeSet::new();
        for role in &self.snapshot()?.roles {
            ids.extend(self.padlock.for_actor(role).direct_permission_ids()?);
        }
        Ok(ids.into_iter().collect())
    }
}
