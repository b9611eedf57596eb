//! permission/role 조회 및 생성 SQL

use sea_query::{Expr, Order, PostgresQueryBuilder, Query, SelectStatement};

use padlock_core::config::PadlockConfig;
use padlock_core::{ActorKey, PermissionId};

use crate::columns::*;
use crate::DynIden;

/// 참조 데이터 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Permission,
    Role,
}

/// permission/role 테이블 SQL 빌더
pub struct ReferenceQueries<'a> {
    config: &'a PadlockConfig,
}

impl<'a> ReferenceQueries<'a> {
    pub fn new(config: &'a PadlockConfig) -> Self {
        Self { config }
    }

    fn table(&self, kind: Reference) -> &str {
        match kind {
            Reference::Permission => &self.config.table_names.permissions,
            Reference::Role => &self.config.table_names.roles,
        }
    }

    fn select_all(&self, kind: Reference) -> SelectStatement {
        let table = self.table(kind);
        Query::select()
            .columns([ID, NAME, GUARD_NAME, CREATED_AT].map(|col| {
                (DynIden::new(table), DynIden::new(col))
            }))
            .from(DynIden::new(table))
            .to_owned()
    }

    /// `(name, guard_name)`으로 조회
    pub fn find_by_name(&self, kind: Reference, name: &str, guard: &str) -> String {
        self.select_all(kind)
            .and_where(Expr::col(DynIden::new(NAME)).eq(name))
            .and_where(Expr::col(DynIden::new(GUARD_NAME)).eq(guard))
            .limit(1)
            .to_string(PostgresQueryBuilder)
    }

    /// id로 조회 (guard 범위 안에서)
    pub fn find_by_id(&self, kind: Reference, id: u64, guard: &str) -> String {
        self.select_all(kind)
            .and_where(Expr::col(DynIden::new(ID)).eq(id))
            .and_where(Expr::col(DynIden::new(GUARD_NAME)).eq(guard))
            .to_string(PostgresQueryBuilder)
    }

    /// 생성 (unique 위반을 `*AlreadyExists`로 매핑하는 것은 호출자 몫)
    pub fn insert(&self, kind: Reference, name: &str, guard: &str) -> String {
        Query::insert()
            .into_table(DynIden::new(self.table(kind)))
            .columns([DynIden::new(NAME), DynIden::new(GUARD_NAME)])
            .values_panic([Expr::val(name).into(), Expr::val(guard).into()])
            .returning(Query::returning().columns([DynIden::new(ID), DynIden::new(CREATED_AT)]))
            .to_string(PostgresQueryBuilder)
    }

    /// id 목록의 권한 (id 오름차순)
    pub fn permissions_by_ids(&self, ids: &[PermissionId]) -> String {
        self.select_all(Reference::Permission)
            .and_where(Expr::col(DynIden::new(ID)).is_in(ids.iter().copied()))
            .order_by(DynIden::new(ID), Order::Asc)
            .to_string(PostgresQueryBuilder)
    }

    /// actor가 가진 role (id 오름차순)
    pub fn roles_of(&self, actor: &ActorKey) -> String {
        let roles = self.config.table_names.roles.as_str();
        let pivot = self.config.table_names.model_has_roles.as_str();
        let model_key = self.config.column_names.model_morph_key.as_str();

        self.select_all(Reference::Role)
            .inner_join(
                DynIden::new(pivot),
                Expr::col((DynIden::new(pivot), DynIden::new(ROLE_ID)))
                    .equals((DynIden::new(roles), DynIden::new(ID))),
            )
            .and_where(
                Expr::col((DynIden::new(pivot), DynIden::new(MODEL_TYPE)))
                    .eq(actor.actor_type.as_str()),
            )
            .and_where(
                Expr::col((DynIden::new(pivot), DynIden::new(model_key)))
                    .eq(actor.actor_id.as_str()),
            )
            .order_by((DynIden::new(roles), DynIden::new(ID)), Order::Asc)
            .to_string(PostgresQueryBuilder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_name() {
        let config = PadlockConfig::default();
        let sql = ReferenceQueries::new(&config).find_by_name(Reference::Permission, "edit-post", "web");

        assert!(sql.contains("FROM \"permissions\""));
        assert!(sql.contains("\"name\" = 'edit-post'"));
        assert!(sql.contains("\"guard_name\" = 'web'"));
        assert!(sql.contains("LIMIT 1"));
    }

    #[test]
    fn test_insert_returns_id() {
        let config = PadlockConfig::default();
        let sql = ReferenceQueries::new(&config).insert(Reference::Role, "writer", "api");

        assert!(sql.contains("INSERT INTO \"roles\""));
        assert!(sql.contains("'writer'"));
        assert!(sql.contains("RETURNING \"id\""));
    }

    #[test]
    fn test_roles_of_joins_membership() {
        let config = PadlockConfig::default();
        let actor = ActorKey::new("app::User", "7");
        let sql = ReferenceQueries::new(&config).roles_of(&actor);

        assert!(sql.contains("INNER JOIN \"model_has_roles\""));
        assert!(sql.contains("\"model_has_roles\".\"model_type\" = 'app::User'"));
        assert!(sql.contains("\"model_has_roles\".\"model_id\" = '7'"));
        assert!(sql.contains("ORDER BY \"roles\".\"id\" ASC"));
    }

    #[test]
    fn test_permissions_by_ids() {
        let config = PadlockConfig::default();
        let sql = ReferenceQueries::new(&config).permissions_by_ids(&[3, 1]);

        assert!(sql.contains("\"id\" IN (3, 1)"));
        assert!(sql.contains("ORDER BY \"id\" ASC"));
    }
}
