//! 권한 요청 정규화
//!
//! grant/revoke/check 호출의 입력을 정규화된 [`PermissionRequest`]로 만듭니다.
//!
//! # 모듈 구조
//!
//! - `mod`: 요청 구조체와 타입 기반 빌더
//! - `args`: 느슨한 위치 인자 목록을 판별 규칙에 따라 정규화

mod args;

pub use args::{normalize, Arg, MAX_ARGUMENTS};

use serde::{Deserialize, Serialize};

use crate::model::{Permission, PermissionId, Role, RoleId};
use crate::scope::{ResourceRef, Target};

/// 권한 참조 (이름, id, 객체)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionRef {
    Name(String),
    Id(PermissionId),
    Object(Permission),
}

impl PermissionRef {
    /// 빈 이름 여부 (grant 시 건너뜀)
    pub fn is_empty(&self) -> bool {
        matches!(self, PermissionRef::Name(name) if name.trim().is_empty())
    }

    /// 로그/에러 메시지용 표시 이름
    pub fn label(&self) -> String {
        match self {
            PermissionRef::Name(name) => name.clone(),
            PermissionRef::Id(id) => format!("#{}", id),
            PermissionRef::Object(permission) => permission.name.clone(),
        }
    }
}

impl From<&str> for PermissionRef {
    fn from(name: &str) -> Self {
        PermissionRef::Name(name.to_string())
    }
}

impl From<String> for PermissionRef {
    fn from(name: String) -> Self {
        PermissionRef::Name(name)
    }
}

impl From<PermissionId> for PermissionRef {
    fn from(id: PermissionId) -> Self {
        PermissionRef::Id(id)
    }
}

impl From<Permission> for PermissionRef {
    fn from(permission: Permission) -> Self {
        PermissionRef::Object(permission)
    }
}

impl From<&Permission> for PermissionRef {
    fn from(permission: &Permission) -> Self {
        PermissionRef::Object(permission.clone())
    }
}

/// Role 참조 (이름, id, 객체)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleRef {
    Name(String),
    Id(RoleId),
    Object(Role),
}

impl RoleRef {
    pub fn label(&self) -> String {
        match self {
            RoleRef::Name(name) => name.clone(),
            RoleRef::Id(id) => format!("#{}", id),
            RoleRef::Object(role) => role.name.clone(),
        }
    }

    /// 로드된 role과 같은 대상을 가리키는지
    pub fn refers_to(&self, role: &Role) -> bool {
        match self {
            RoleRef::Name(name) => role.name == *name,
            RoleRef::Id(id) => role.id == *id,
            RoleRef::Object(other) => role.id == other.id,
        }
    }
}

impl From<&str> for RoleRef {
    fn from(name: &str) -> Self {
        RoleRef::Name(name.to_string())
    }
}

impl From<String> for RoleRef {
    fn from(name: String) -> Self {
        RoleRef::Name(name)
    }
}

impl From<RoleId> for RoleRef {
    fn from(id: RoleId) -> Self {
        RoleRef::Id(id)
    }
}

impl From<Role> for RoleRef {
    fn from(role: Role) -> Self {
        RoleRef::Object(role)
    }
}

impl From<&Role> for RoleRef {
    fn from(role: &Role) -> Self {
        RoleRef::Object(role.clone())
    }
}

/// role 목록 요청 (`"writer|editor"`, id, 객체, 목록)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRequest {
    pub roles: Vec<RoleRef>,
}

impl RoleRequest {
    pub fn new<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleRef>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// 파이프 구분 문자열 (빈 이름 제외)
    pub fn parse(spec: &str) -> Self {
        Self::new(split_pipe(spec).into_iter().filter(|name| !name.is_empty()))
    }
}

impl From<&str> for RoleRequest {
    fn from(spec: &str) -> Self {
        Self::parse(spec)
    }
}

impl From<String> for RoleRequest {
    fn from(spec: String) -> Self {
        Self::parse(&spec)
    }
}

impl From<RoleId> for RoleRequest {
    fn from(id: RoleId) -> Self {
        Self::new([id])
    }
}

impl From<Role> for RoleRequest {
    fn from(role: Role) -> Self {
        Self::new([role])
    }
}

impl From<&Role> for RoleRequest {
    fn from(role: &Role) -> Self {
        Self::new([role])
    }
}

impl From<RoleRef> for RoleRequest {
    fn from(role: RoleRef) -> Self {
        Self::new([role])
    }
}

impl<R: Into<RoleRef>> From<Vec<R>> for RoleRequest {
    fn from(roles: Vec<R>) -> Self {
        Self::new(roles)
    }
}

/// 정규화된 권한 요청
///
/// `recursive`가 `None`이면 설정의 `revoke_recursion`을 따릅니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRequest {
    pub permissions: Vec<PermissionRef>,
    #[serde(default)]
    pub target: Option<Target>,
    #[serde(default)]
    pub guard: Option<String>,
    #[serde(default)]
    pub recursive: Option<bool>,
}

impl PermissionRequest {
    /// 권한 목록으로 요청 생성
    pub fn new<I, P>(permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionRef>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// 파이프 구분 문자열로 요청 생성 (`"edit|delete"`)
    pub fn parse(spec: &str) -> Self {
        Self::new(split_pipe(spec))
    }

    /// 엔티티 또는 타입 target 지정
    pub fn on(mut self, target: impl Into<Target>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// 타입 이름 target 지정
    pub fn on_type(mut self, type_name: impl Into<String>) -> Self {
        self.target = Some(Target::Type(type_name.into()));
        self
    }

    /// guard 지정
    pub fn guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }

    /// recursive 플래그 지정
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = Some(recursive);
        self
    }

    /// 첫 번째 권한 (check 계열은 이것만 평가)
    pub fn first(&self) -> Option<&PermissionRef> {
        self.permissions.first()
    }
}

impl From<&str> for PermissionRequest {
    fn from(spec: &str) -> Self {
        Self::parse(spec)
    }
}

impl From<String> for PermissionRequest {
    fn from(spec: String) -> Self {
        Self::parse(&spec)
    }
}

impl From<PermissionId> for PermissionRequest {
    fn from(id: PermissionId) -> Self {
        Self::new([id])
    }
}

impl From<Permission> for PermissionRequest {
    fn from(permission: Permission) -> Self {
        Self::new([permission])
    }
}

impl From<&Permission> for PermissionRequest {
    fn from(permission: &Permission) -> Self {
        Self::new([permission])
    }
}

impl From<PermissionRef> for PermissionRequest {
    fn from(permission: PermissionRef) -> Self {
        Self::new([permission])
    }
}

impl<P: Into<PermissionRef>> From<Vec<P>> for PermissionRequest {
    fn from(permissions: Vec<P>) -> Self {
        Self::new(permissions)
    }
}

impl From<(&str, ResourceRef)> for PermissionRequest {
    fn from((spec, target): (&str, ResourceRef)) -> Self {
        Self::parse(spec).on(target)
    }
}

impl From<(&str, &ResourceRef)> for PermissionRequest {
    fn from((spec, target): (&str, &ResourceRef)) -> Self {
        Self::parse(spec).on(target)
    }
}

/// 파이프 구분 문자열 분리
///
/// 양 끝이 같은 따옴표(`'` 또는 `"`)로 감싸진 2자 이상 문자열은 하나의 이름으로 취급하고
/// 따옴표를 벗겨냅니다. 그 외에는 `|`로 분리합니다.
pub fn split_pipe(spec: &str) -> Vec<String> {
    let trimmed = spec.trim();

    let mut chars = trimmed.chars();
    if let (Some(first), Some(last)) = (chars.next(), chars.next_back()) {
        if first == last && (first == '\'' || first == '"') {
            return vec![trimmed[1..trimmed.len() - 1].to_string()];
        }
    }

    trimmed.split('|').map(|s| s.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pipe() {
        assert_eq!(split_pipe("edit|delete"), vec!["edit", "delete"]);
        assert_eq!(split_pipe(" edit | delete "), vec!["edit", "delete"]);
        assert_eq!(split_pipe("edit"), vec!["edit"]);
        assert_eq!(split_pipe("a"), vec!["a"]);
    }

    #[test]
    fn test_split_pipe_quoted_literal() {
        assert_eq!(split_pipe("'edit|delete'"), vec!["edit|delete"]);
        assert_eq!(split_pipe("\"edit|delete\""), vec!["edit|delete"]);
        // 따옴표 종류가 다르면 분리
        assert_eq!(split_pipe("'edit|delete\""), vec!["'edit", "delete\""]);
        // 한 글자 따옴표는 리터럴 취급하지 않음
        assert_eq!(split_pipe("'"), vec!["'"]);
        assert_eq!(split_pipe("''"), vec![""]);
    }

    #[test]
    fn test_builder() {
        let post = ResourceRef::persisted("blog::Post", 5);
        let request = PermissionRequest::parse("edit|delete")
            .on(&post)
            .guard("api")
            .recursive(true);

        assert_eq!(
            request.permissions,
            vec![PermissionRef::from("edit"), PermissionRef::from("delete")]
        );
        assert_eq!(request.target, Some(Target::Entity(post)));
        assert_eq!(request.guard.as_deref(), Some("api"));
        assert_eq!(request.recursive, Some(true));
    }

    #[test]
    fn test_conversions() {
        let from_str: PermissionRequest = "edit-post".into();
        assert_eq!(from_str.first(), Some(&PermissionRef::from("edit-post")));

        let from_id: PermissionRequest = 42u64.into();
        assert_eq!(from_id.first(), Some(&PermissionRef::Id(42)));

        let from_tuple: PermissionRequest = ("edit-post", ResourceRef::unsaved("blog::Post")).into();
        assert!(from_tuple.target.is_some());
        assert!(from_tuple.recursive.is_none());
    }

    #[test]
    fn test_role_ref_matching() {
        let role = Role::new(3, "writer", "web");

        assert!(RoleRef::from("writer").refers_to(&role));
        assert!(RoleRef::from(3u64).refers_to(&role));
        assert!(RoleRef::from(&role).refers_to(&role));
        assert!(!RoleRef::from("admin").refers_to(&role));
    }

    #[test]
    fn test_role_request() {
        let request = RoleRequest::from("writer| |editor");
        assert_eq!(
            request.roles,
            vec![RoleRef::from("writer"), RoleRef::from("editor")]
        );

        let by_id: RoleRequest = 7u64.into();
        assert_eq!(by_id.roles, vec![RoleRef::Id(7)]);
    }
}
