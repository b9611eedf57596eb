//! 권한 보유 actor 조회
//!
//! pivot은 와일드카드 확장 없이 정확히 같은 값만 매칭합니다.
//!
//! ```text
//! SELECT model_id FROM model_has_permissions WHERE model_type = ? AND permission_id IN (...) AND pivot
//! UNION
//! SELECT model_id FROM model_has_roles WHERE model_type = ?
//!   AND role_id IN (SELECT role_id FROM role_has_permissions WHERE permission_id IN (...) AND pivot)
//! ```

use sea_query::{Expr, PostgresQueryBuilder, Query, SelectStatement, UnionType};

use padlock_core::config::PadlockConfig;
use padlock_core::{Pivot, PermissionId};

use crate::columns::*;
use crate::DynIden;

/// 권한 보유 actor id 쿼리 빌더
pub struct ScopeQuery<'a> {
    config: &'a PadlockConfig,
}

impl<'a> ScopeQuery<'a> {
    pub fn new(config: &'a PadlockConfig) -> Self {
        Self { config }
    }

    /// `actor_type` actor 중 주어진 권한을 pivot에 대해 가진 actor의 id
    pub fn actors_with_permission(
        &self,
        actor_type: &str,
        permission_ids: &[PermissionId],
        pivot: &Pivot,
    ) -> String {
        let names = &self.config.table_names;
        let model_key = self.config.column_names.model_morph_key.as_str();

        let mut direct = Query::select();
        direct
            .column(DynIden::new(model_key))
            .from(DynIden::new(names.model_has_permissions.as_str()))
            .and_where(Expr::col(DynIden::new(MODEL_TYPE)).eq(actor_type));
        with_grant(&mut direct, permission_ids, pivot);

        let mut role_grants = Query::select();
        role_grants
            .column(DynIden::new(ROLE_ID))
            .from(DynIden::new(names.role_has_permissions.as_str()));
        with_grant(&mut role_grants, permission_ids, pivot);

        let mut via_roles = Query::select();
        via_roles
            .column(DynIden::new(model_key))
            .from(DynIden::new(names.model_has_roles.as_str()))
            .and_where(Expr::col(DynIden::new(MODEL_TYPE)).eq(actor_type))
            .and_where(Expr::col(DynIden::new(ROLE_ID)).in_subquery(role_grants));

        direct
            .union(UnionType::Distinct, via_roles)
            .to_string(PostgresQueryBuilder)
    }
}

fn with_grant(query: &mut SelectStatement, permission_ids: &[PermissionId], pivot: &Pivot) {
    query
        .and_where(Expr::col(DynIden::new(PERMISSION_ID)).is_in(permission_ids.iter().copied()))
        .and_where(Expr::col(DynIden::new(TO_ID)).eq(pivot.to_id()))
        .and_where(Expr::col(DynIden::new(TO_TYPE)).eq(pivot.to_type()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_and_role_branches() {
        let config = PadlockConfig::default();
        let sql = ScopeQuery::new(&config).actors_with_permission(
            "app::User",
            &[1, 2],
            &Pivot::instance("5", "blog::Post"),
        );

        assert!(sql.contains("FROM \"model_has_permissions\""));
        assert!(sql.contains("UNION"));
        assert!(sql.contains("FROM \"model_has_roles\""));
        assert!(sql.contains("\"role_id\" IN (SELECT \"role_id\" FROM \"role_has_permissions\""));
        assert!(sql.contains("\"permission_id\" IN (1, 2)"));
        assert!(sql.contains("\"to_id\" = '5'"));
        assert!(sql.contains("\"to_type\" = 'blog::Post'"));
    }

    #[test]
    fn test_wildcard_pivot_is_exact() {
        let config = PadlockConfig::default();
        let sql = ScopeQuery::new(&config).actors_with_permission("app::User", &[1], &Pivot::any());

        assert!(sql.contains("\"to_id\" = '*'"));
        assert!(sql.contains("\"to_type\" = '*'"));
    }
}
