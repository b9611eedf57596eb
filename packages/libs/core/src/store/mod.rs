//! Permission/Role 저장소
//!
//! 엔진은 [`PermissionStore`] trait만 사용합니다. 모든 조회는 guard 범위 안에서 이루어지며
//! 같은 이름이라도 guard가 다르면 별개의 엔티티입니다.
//!
//! # 구현체
//!
//! - [`MemoryStore`]: 프로세스 내 저장소 (기본값, 테스트용)
//! - 관계형 저장소는 `padlock-sql`이 생성하는 SQL로 구현합니다

mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::model::{ActorKey, GrantEdge, Holder, Permission, PermissionId, Role, RoleId};
use crate::scope::{Pivot, RevokeFilter};

/// 권한 저장소
///
/// 외부 백엔드가 실패할 수 있으므로 모든 메서드는 `Result`를 반환합니다.
pub trait PermissionStore: Send + Sync + std::fmt::Debug {
    // ─────────────────────────────────────────────────────────────────────────────
    // Reference data
    // ─────────────────────────────────────────────────────────────────────────────

    /// 권한 생성 (`(name, guard)` 중복 시 `PermissionAlreadyExists`)
    fn create_permission(&self, name: &str, guard: &str) -> Result<Permission>;

    /// Role 생성 (`(name, guard)` 중복 시 `RoleAlreadyExists`)
    fn create_role(&self, name: &str, guard: &str) -> Result<Role>;

    /// 이름으로 권한 조회 (없으면 `PermissionDoesNotExist`)
    fn find_permission_by_name(&self, name: &str, guard: &str) -> Result<Permission>;

    /// id로 권한 조회 (guard가 다르면 없는 것으로 취급)
    fn find_permission_by_id(&self, id: PermissionId, guard: &str) -> Result<Permission>;

    /// 이름으로 role 조회 (없으면 `RoleDoesNotExist`)
    fn find_role_by_name(&self, name: &str, guard: &str) -> Result<Role>;

    /// id로 role 조회
    fn find_role_by_id(&self, id: RoleId, guard: &str) -> Result<Role>;

    /// id 목록에 해당하는 권한 (id 오름차순, 없는 id는 무시)
    fn permissions_by_ids(&self, ids: &[PermissionId]) -> Result<Vec<Permission>>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Grant edges
    // ─────────────────────────────────────────────────────────────────────────────

    /// holder의 직접 grant edge 목록
    fn grants(&self, holder: &Holder) -> Result<Vec<GrantEdge>>;

    /// edge 추가 (이미 있는 edge는 건너뜀), 실제 추가된 수 반환
    fn attach_grants(&self, holder: &Holder, edges: &[GrantEdge]) -> Result<usize>;

    /// 필터에 매칭되는 해당 권한의 edge 삭제, 삭제된 수 반환
    fn detach_grants(
        &self,
        holder: &Holder,
        permission_id: PermissionId,
        filter: &RevokeFilter,
    ) -> Result<usize>;

    /// holder의 모든 edge 삭제
    fn detach_all_grants(&self, holder: &Holder) -> Result<usize>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Role membership
    // ─────────────────────────────────────────────────────────────────────────────

    /// actor가 가진 role (id 오름차순)
    fn roles_of(&self, actor: &ActorKey) -> Result<Vec<Role>>;

    /// role 부여 (이미 있으면 건너뜀), 추가된 수 반환
    fn attach_roles(&self, actor: &ActorKey, roles: &[RoleId]) -> Result<usize>;

    /// role 해제, 삭제된 수 반환
    fn detach_roles(&self, actor: &ActorKey, roles: &[RoleId]) -> Result<usize>;

    /// actor의 모든 role 해제
    fn detach_all_roles(&self, actor: &ActorKey) -> Result<usize>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Reverse lookups (query scope)
    // ─────────────────────────────────────────────────────────────────────────────

    /// 주어진 권한 중 하나를 정확히 같은 pivot으로 가진 holder
    fn holders_with_grant(&self, permission_ids: &[PermissionId], pivot: &Pivot)
        -> Result<Vec<Holder>>;

    /// 주어진 role 중 하나를 가진 actor
    fn actors_with_roles(&self, roles: &[RoleId]) -> Result<Vec<ActorKey>>;
}
