//! padlock-core: 리소스 스코프 RBAC 권한 엔진
//!
//! actor(User 등)와 role에 이름 있는 권한을 부여/회수하고, 권한을 특정 엔티티 인스턴스,
//! 엔티티 타입 전체, 또는 전역으로 스코프할 수 있습니다.
//!
//! # 모듈 구조
//!
//! - `model`: Permission, Role, holder, grant edge
//! - `request`: 권한 요청 정규화 (타입 빌더 + 위치 인자 판별)
//! - `scope`: target → pivot 변환, pivot 매칭, 회수 필터
//! - `store`: 저장소 trait 및 메모리 구현
//! - `cache`: holder 스냅샷 캐시
//! - `engine`: 레지스트라 ([`Padlock`])와 actor별 컴포넌트 ([`Access`])
//! - `actor`: 권한 보유 주체 trait
//! - `config`: 설정 (YAML/JSON + 환경 변수)
//! - `error`: 공통 에러 타입
//!
//! # 예시
//!
//! ```
//! use padlock_core::{Actor, Padlock, ResourceRef};
//!
//! let padlock = Padlock::default();
//! padlock.create_permission("edit-post", None)?;
//!
//! let user = Actor::persisted("app::User", 1);
//! let post = ResourceRef::persisted("blog::Post", 5);
//! let access = padlock.for_actor(&user);
//!
//! access.give_permission_to(("edit-post", &post))?;
//! assert!(access.has_permission_to(("edit-post", &post))?);
//! assert!(!access.has_permission_to(("edit-post", ResourceRef::persisted("blog::Post", 7)))?);
//! # Ok::<(), padlock_core::Error>(())
//! ```

pub mod actor;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod request;
pub mod scope;
pub mod store;

pub use actor::{Actor, Authorizable};
pub use cache::{CacheKey, HolderSnapshot, MemoryCache, NullCache, PermissionCache};
pub use config::PadlockConfig;
pub use engine::{Access, Padlock, PendingGrant};
pub use error::{Error, Result};
pub use model::{ActorKey, GrantEdge, Holder, Permission, PermissionId, Role, RoleId};
pub use request::{Arg, PermissionRef, PermissionRequest, RoleRef, RoleRequest};
pub use scope::{Pivot, PivotConstraint, Resource, ResourceRef, RevokeFilter, Target, WILDCARD};
pub use store::{MemoryStore, PermissionStore};
