//! padlock-sql: 권한 저장소의 관계형 스키마와 SQL 생성
//!
//! `PadlockConfig`의 테이블/컬럼 이름을 기반으로 PostgreSQL 문을 생성합니다.
//! SeaQuery를 사용하여 값은 항상 이스케이프됩니다.
//!
//! # 모듈 구조
//!
//! - `ddl`: 테이블/인덱스/외래키 DDL 생성기
//! - `reference`: permission/role 조회 및 생성
//! - `grants`: grant edge와 role 멤버십 조회/추가/삭제
//! - `scope`: 권한을 가진 actor id 조회 (직접 + role 경유)

pub mod ddl;
pub mod grants;
pub mod reference;
pub mod scope;

pub use ddl::DdlGenerator;
pub use grants::GrantQueries;
pub use reference::{Reference, ReferenceQueries};
pub use scope::ScopeQuery;

use sea_query::Iden;

/// 설정에서 온 동적 테이블/컬럼 식별자
#[derive(Debug, Clone)]
pub(crate) struct DynIden(pub(crate) String);

impl DynIden {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Iden for DynIden {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "{}", self.0).unwrap();
    }
}

/// 고정 컬럼 이름
pub(crate) mod columns {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const GUARD_NAME: &str = "guard_name";
    pub const CREATED_AT: &str = "created_at";
    pub const PERMISSION_ID: &str = "permission_id";
    pub const ROLE_ID: &str = "role_id";
    pub const MODEL_TYPE: &str = "model_type";
    pub const TO_ID: &str = "to_id";
    pub const TO_TYPE: &str = "to_type";
}
