//! 권한 엔진
//!
//! # 개요
//!
//! [`Padlock`]은 설정, 저장소, 캐시, 리소스 타입 레지스트리를 묶는 레지스트라입니다.
//! actor별 권한 기능은 [`Padlock::for_actor`]가 돌려주는 [`Access`]를 통해 사용합니다.
//!
//! ```text
//! caller → PermissionRequest → Access ─┬─ grant   (give / revoke / sync / stage)
//!                                      ├─ resolve (has_permission_to / via role)
//!                                      └─ roles   (assign / remove / has_role)
//!                                           │
//!                              PermissionStore + PermissionCache
//! ```
//!
//! # 모듈 구조
//!
//! - `grant`: 권한 부여/회수, 2단계 부여 ([`PendingGrant`])
//! - `resolve`: 직접 권한 + role 경유 권한 판정
//! - `roles`: role 부여/해제/확인

mod grant;
mod resolve;
mod roles;

pub use grant::PendingGrant;

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::actor::Authorizable;
use crate::cache::{CacheKey, HolderSnapshot, MemoryCache, NullCache, PermissionCache};
use crate::config::PadlockConfig;
use crate::error::{Error, Result};
use crate::model::{ActorKey, Holder, Permission, Role};
use crate::request::{self, Arg, PermissionRef, PermissionRequest, RoleRef};
use crate::scope::{Pivot, Target, TypeRegistry};
use crate::store::{MemoryStore, PermissionStore};

/// 권한 레지스트라
#[derive(Debug)]
pub struct Padlock {
    config: PadlockConfig,
    store: Arc<dyn PermissionStore>,
    cache: Arc<dyn PermissionCache>,
    types: RwLock<TypeRegistry>,
}

impl Padlock {
    /// 메모리 저장소와 설정에 맞는 캐시로 생성
    pub fn new(config: PadlockConfig) -> Self {
        let cache: Arc<dyn PermissionCache> = if config.cache.enabled {
            Arc::new(MemoryCache::new())
        } else {
            Arc::new(NullCache)
        };
        Self::with_backends(config, Arc::new(MemoryStore::new()), cache)
    }

    /// 저장소/캐시 백엔드 지정
    pub fn with_backends(
        config: PadlockConfig,
        store: Arc<dyn PermissionStore>,
        cache: Arc<dyn PermissionCache>,
    ) -> Self {
        let types = TypeRegistry::new(config.resource_types.iter().cloned());
        Self {
            config,
            store,
            cache,
            types: RwLock::new(types),
        }
    }

    pub fn config(&self) -> &PadlockConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn PermissionStore {
        self.store.as_ref()
    }

    pub fn cache(&self) -> &dyn PermissionCache {
        self.cache.as_ref()
    }

    /// actor(또는 role)에 대한 권한 컴포넌트
    pub fn for_actor<'a, A: Authorizable + ?Sized>(&'a self, actor: &'a A) -> Access<'a, A> {
        Access {
            padlock: self,
            actor,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Resource types / argument normalization
    // ─────────────────────────────────────────────────────────────────────────────

    /// 타입 문자열 target으로 쓸 수 있는 리소스 타입 등록
    pub fn register_resource_type(&self, type_name: impl Into<String>) -> bool {
        self.types.write().register(type_name)
    }

    /// target → pivot
    pub fn resolve_pivot(&self, target: Option<&Target>) -> Result<Pivot> {
        self.types.read().resolve(target)
    }

    /// 위치 인자 목록 정규화 (설정의 구분자와 `revoke_recursion` 사용)
    pub fn normalize(&self, args: Vec<Arg>) -> Result<PermissionRequest> {
        request::normalize(args, &self.config.type_separator, self.config.revoke_recursion)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reference data
    // ─────────────────────────────────────────────────────────────────────────────

    fn guard_or_default<'g>(&'g self, guard: Option<&'g str>) -> &'g str {
        guard.unwrap_or(&self.config.default_guard)
    }

    /// 권한 생성 (guard 생략 시 기본 guard)
    pub fn create_permission(&self, name: &str, guard: Option<&str>) -> Result<Permission> {
        let guard = self.guard_or_default(guard);
        let permission = self.store.create_permission(name, guard)?;
        tracing::info!(permission = %permission.name, guard = %guard, "permission created");
        Ok(permission)
    }

    /// 권한 조회, 없으면 생성
    pub fn find_or_create_permission(&self, name: &str, guard: Option<&str>) -> Result<Permission> {
        let guard = self.guard_or_default(guard);
        match self.store.find_permission_by_name(name, guard) {
            Err(Error::PermissionDoesNotExist { .. }) => self.create_permission(name, Some(guard)),
            found => found,
        }
    }

    /// 이름으로 권한 조회
    pub fn find_permission(&self, name: &str, guard: Option<&str>) -> Result<Permission> {
        self.store
            .find_permission_by_name(name, self.guard_or_default(guard))
    }

    /// role 생성
    pub fn create_role(&self, name: &str, guard: Option<&str>) -> Result<Role> {
        let guard = self.guard_or_default(guard);
        let role = self.store.create_role(name, guard)?;
        tracing::info!(role = %role.name, guard = %guard, "role created");
        Ok(role)
    }

    /// role 조회, 없으면 생성
    pub fn find_or_create_role(&self, name: &str, guard: Option<&str>) -> Result<Role> {
        let guard = self.guard_or_default(guard);
        match self.store.find_role_by_name(name, guard) {
            Err(Error::RoleDoesNotExist { .. }) => self.create_role(name, Some(guard)),
            found => found,
        }
    }

    /// 이름으로 role 조회
    pub fn find_role(&self, name: &str, guard: Option<&str>) -> Result<Role> {
        self.store.find_role_by_name(name, self.guard_or_default(guard))
    }

    pub(crate) fn resolve_permission(&self, permission: &PermissionRef, guard: &str) -> Result<Permission> {
        match permission {
            PermissionRef::Name(name) => self.store.find_permission_by_name(name, guard),
            PermissionRef::Id(id) => self.store.find_permission_by_id(*id, guard),
            PermissionRef::Object(permission) => Ok(permission.clone()),
        }
    }

    pub(crate) fn resolve_role(&self, role: &RoleRef, guard: &str) -> Result<Role> {
        match role {
            RoleRef::Name(name) => self.store.find_role_by_name(name, guard),
            RoleRef::Id(id) => self.store.find_role_by_id(*id, guard),
            RoleRef::Object(role) => Ok(role.clone()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Cache
    // ─────────────────────────────────────────────────────────────────────────────

    /// 전체 캐시 무효화
    pub fn forget_cached_permissions(&self) {
        self.cache.flush();
        tracing::debug!("permission cache flushed");
    }

    pub(crate) fn invalidate(&self, holder: &Holder) {
        self.cache.forget(holder);
    }

    /// holder 스냅샷 (캐시 우선)
    pub(crate) fn snapshot(&self, holder: &Holder, guard: &str) -> Result<Arc<HolderSnapshot>> {
        let key = CacheKey::new(guard, holder.clone());
        self.cache.get_or_load(&key, &|| self.load_snapshot(holder))
    }

    fn load_snapshot(&self, holder: &Holder) -> Result<HolderSnapshot> {
        let grants = self.store.grants(holder)?;
        let roles = match holder.as_actor() {
            Some(actor) => self.store.roles_of(actor)?,
            None => Vec::new(),
        };
        Ok(HolderSnapshot { grants, roles })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Lifecycle / query scope
    // ─────────────────────────────────────────────────────────────────────────────

    /// 삭제된 actor의 모든 grant edge와 role 해제
    pub fn purge<A: Authorizable + ?Sized>(&self, actor: &A) -> Result<()> {
        let Some(holder) = actor.holder() else {
            return Ok(());
        };

        let grants = self.store.detach_all_grants(&holder)?;
        let roles = match holder.as_actor() {
            Some(key) => self.store.detach_all_roles(key)?,
            None => 0,
        };
        self.invalidate(&holder);

        tracing::info!(holder = %holder, grants, roles, "holder purged");
        Ok(())
    }

    /// 요청한 권한 중 하나를 정확히 같은 pivot으로 (직접 또는 role 경유) 가진 actor
    pub fn actors_with_permission(
        &self,
        request: impl Into<PermissionRequest>,
    ) -> Result<Vec<ActorKey>> {
        let request = request.into();
        let guard = self.guard_or_default(request.guard.as_deref());

        let mut permission_ids = Vec::with_capacity(request.permissions.len());
        for permission in request.permissions.iter().filter(|p| !p.is_empty()) {
            permission_ids.push(self.resolve_permission(permission, guard)?.id);
        }
        let pivot = self.resolve_pivot(request.target.as_ref())?;

        let mut actors = BTreeSet::new();
        let mut role_ids = Vec::new();
        for holder in self.store.holders_with_grant(&permission_ids, &pivot)? {
            match holder {
                Holder::Actor(key) => {
                    actors.insert(key);
                }
                Holder::Role { id } => role_ids.push(id),
            }
        }
        if !role_ids.is_empty() {
            actors.extend(self.store.actors_with_roles(&role_ids)?);
        }

        Ok(actors.into_iter().collect())
    }
}

impl Default for Padlock {
    fn default() -> Self {
        Self::new(PadlockConfig::default())
    }
}

/// actor 하나에 대한 권한 컴포넌트
///
/// 호스트 엔티티는 상속 대신 이 컴포넌트를 합성해 권한 기능을 얻습니다.
/// role도 [`Authorizable`]이므로 같은 API로 role의 권한을 관리할 수 있습니다.
#[derive(Debug)]
pub struct Access<'a, A: Authorizable + ?Sized> {
    padlock: &'a Padlock,
    actor: &'a A,
}

impl<'a, A: Authorizable + ?Sized> Access<'a, A> {
    pub fn actor(&self) -> &A {
        self.actor
    }

    /// 유효한 guard 목록 (actor가 지정하지 않았으면 설정의 기본 guard)
    pub fn guard_names(&self) -> Vec<String> {
        let names = self.actor.guard_names();
        if names.is_empty() {
            vec![self.padlock.config.default_guard.clone()]
        } else {
            names
        }
    }

    pub fn default_guard(&self) -> String {
        self.guard_names()
            .into_iter()
            .next()
            .unwrap_or_else(|| self.padlock.config.default_guard.clone())
    }

    fn holder(&self) -> Result<Holder> {
        self.actor.holder().ok_or_else(|| Error::ActorNotPersisted {
            holder_type: self.actor.holder_type().to_string(),
        })
    }

    fn guard_for(&self, request: &PermissionRequest) -> String {
        request.guard.clone().unwrap_or_else(|| self.default_guard())
    }

    fn ensure_shares_guard(&self, guard_name: &str) -> Result<()> {
        let expected = self.guard_names();
        if expected.iter().any(|g| g == guard_name) {
            return Ok(());
        }

        tracing::warn!(
            holder_type = %self.actor.holder_type(),
            guard = %guard_name,
            "rejected cross-guard assignment"
        );
        Err(Error::GuardDoesNotMatch {
            given: guard_name.to_string(),
            expected,
        })
    }

    /// 저장되지 않은 holder는 빈 스냅샷
    fn snapshot(&self) -> Result<Arc<HolderSnapshot>> {
        match self.actor.holder() {
            Some(holder) => self.padlock.snapshot(&holder, &self.default_guard()),
            None => Ok(Arc::new(HolderSnapshot::default())),
        }
    }
}
