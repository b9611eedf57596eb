//! 권한 모델 엔티티
//!
//! Permission, Role, 그리고 grant edge를 소유하는 Holder를 정의합니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scope::Pivot;

pub type PermissionId = u64;
pub type RoleId = u64;

/// 이름이 붙은 권한 (guard 안에서 이름이 유일)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    pub guard_name: String,
    pub created_at: DateTime<Utc>,
}

/// 권한 묶음
///
/// Role 자체도 grant edge를 소유하는 holder입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub guard_name: String,
    pub created_at: DateTime<Utc>,
}

impl Permission {
    pub fn new(id: PermissionId, name: impl Into<String>, guard_name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            guard_name: guard_name.into(),
            created_at: Utc::now(),
        }
    }
}

impl Role {
    pub fn new(id: RoleId, name: impl Into<String>, guard_name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            guard_name: guard_name.into(),
            created_at: Utc::now(),
        }
    }
}

/// 저장된 actor의 식별자
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorKey {
    pub actor_type: String,
    pub actor_id: String,
}

impl ActorKey {
    pub fn new(actor_type: impl Into<String>, actor_id: impl Into<String>) -> Self {
        Self {
            actor_type: actor_type.into(),
            actor_id: actor_id.into(),
        }
    }
}

/// grant edge 소유자
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Holder {
    Actor(ActorKey),
    Role { id: RoleId },
}

impl Holder {
    pub fn actor(actor_type: impl Into<String>, actor_id: impl Into<String>) -> Self {
        Holder::Actor(ActorKey::new(actor_type, actor_id))
    }

    pub fn role(id: RoleId) -> Self {
        Holder::Role { id }
    }

    pub fn as_actor(&self) -> Option<&ActorKey> {
        match self {
            Holder::Actor(key) => Some(key),
            Holder::Role { .. } => None,
        }
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Holder::Actor(key) => write!(f, "{}#{}", key.actor_type, key.actor_id),
            Holder::Role { id } => write!(f, "role#{}", id),
        }
    }
}

/// 직접 권한 부여의 최소 단위
///
/// `(holder, permission_id, to_id, to_type)`로 유일하며, 수정되지 않고 생성/삭제만 됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GrantEdge {
    pub permission_id: PermissionId,
    #[serde(flatten)]
    pub pivot: Pivot,
}

impl GrantEdge {
    pub fn new(permission_id: PermissionId, pivot: Pivot) -> Self {
        Self {
            permission_id,
            pivot,
        }
    }

    /// 같은 권한이고 저장된 pivot이 요청 pivot을 포함하는지
    pub fn grants(&self, permission_id: PermissionId, requested: &Pivot) -> bool {
        self.permission_id == permission_id && self.pivot.covers(requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holder_display() {
        assert_eq!(Holder::actor("app::User", "1").to_string(), "app::User#1");
        assert_eq!(Holder::role(3).to_string(), "role#3");
    }

    #[test]
    fn test_holder_serde() {
        let json = serde_json::to_string(&Holder::role(7)).unwrap();
        assert_eq!(json, r#"{"kind":"role","id":7}"#);

        let parsed: Holder =
            serde_json::from_str(r#"{"kind":"actor","actor_type":"app::User","actor_id":"1"}"#)
                .unwrap();
        assert_eq!(parsed, Holder::actor("app::User", "1"));
    }

    #[test]
    fn test_grant_edge_matching() {
        let edge = GrantEdge::new(1, Pivot::of_type("blog::Post"));

        assert!(edge.grants(1, &Pivot::instance("5", "blog::Post")));
        assert!(!edge.grants(2, &Pivot::instance("5", "blog::Post")));
        assert!(!edge.grants(1, &Pivot::of_type("blog::Comment")));
    }
}
