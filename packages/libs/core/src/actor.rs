//! 권한 보유 주체
//!
//! 호스트 애플리케이션의 엔티티(User, Admin, 서비스 계정 등)는 [`Authorizable`]을 구현해
//! 엔진에 식별자와 guard를 알려줍니다. 권한 관리 기능은 상속이 아니라
//! [`crate::Padlock::for_actor`]가 돌려주는 `Access` 컴포넌트를 통해 합성됩니다.

use serde::{Deserialize, Serialize};

use crate::model::{ActorKey, Holder, Role};

/// 권한/role을 보유할 수 있는 엔티티
pub trait Authorizable {
    /// 타입 이름 (예: `app::User`)
    fn holder_type(&self) -> &str;

    /// 저장된 경우 holder 식별자, 아직 저장되지 않았으면 `None`
    fn holder(&self) -> Option<Holder>;

    /// 유효한 guard 이름 목록 (첫 번째가 기본 guard)
    ///
    /// 비어 있으면 설정의 `default_guard`를 사용합니다.
    fn guard_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// 범용 actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub actor_type: String,
    pub id: Option<String>,
    #[serde(default)]
    pub guards: Vec<String>,
}

impl Actor {
    /// 아직 저장되지 않은 actor
    pub fn unsaved(actor_type: impl Into<String>) -> Self {
        Self {
            actor_type: actor_type.into(),
            id: None,
            guards: Vec::new(),
        }
    }

    /// 저장된 actor
    pub fn persisted(actor_type: impl Into<String>, id: impl ToString) -> Self {
        Self {
            actor_type: actor_type.into(),
            id: Some(id.to_string()),
            guards: Vec::new(),
        }
    }

    /// guard 추가
    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guards.push(guard.into());
        self
    }

    /// 저장 완료 후 id 설정
    pub fn mark_saved(&mut self, id: impl ToString) {
        self.id = Some(id.to_string());
    }

    pub fn key(&self) -> Option<ActorKey> {
        self.id
            .as_ref()
            .map(|id| ActorKey::new(self.actor_type.as_str(), id.as_str()))
    }
}

impl Authorizable for Actor {
    fn holder_type(&self) -> &str {
        &self.actor_type
    }

    fn holder(&self) -> Option<Holder> {
        self.key().map(Holder::Actor)
    }

    fn guard_names(&self) -> Vec<String> {
        self.guards.clone()
    }
}

impl Authorizable for Role {
    fn holder_type(&self) -> &str {
        "role"
    }

    fn holder(&self) -> Option<Holder> {
        Some(Holder::role(self.id))
    }

    fn guard_names(&self) -> Vec<String> {
        vec![self.guard_name.clone()]
    }
}
