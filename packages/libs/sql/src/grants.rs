//! grant edge / role 멤버십 SQL
//!
//! actor의 edge는 `model_has_permissions`에, role의 edge는 `role_has_permissions`에 저장됩니다.
//! 회수 조건은 `RevokeFilter::constraint()`를 그대로 WHERE 절로 옮깁니다.

use sea_query::{
    DeleteStatement, Expr, OnConflict, Order, PostgresQueryBuilder, Query, SimpleExpr,
};

use padlock_core::config::PadlockConfig;
use padlock_core::{ActorKey, GrantEdge, Holder, PermissionId, RevokeFilter, RoleId};

use crate::columns::*;
use crate::DynIden;

/// grant edge / role 멤버십 SQL 빌더
pub struct GrantQueries<'a> {
    config: &'a PadlockConfig,
}

impl<'a> GrantQueries<'a> {
    pub fn new(config: &'a PadlockConfig) -> Self {
        Self { config }
    }

    fn model_key(&self) -> &str {
        &self.config.column_names.model_morph_key
    }

    /// holder의 edge 테이블
    fn holder_table(&self, holder: &Holder) -> &str {
        match holder {
            Holder::Actor(_) => &self.config.table_names.model_has_permissions,
            Holder::Role { .. } => &self.config.table_names.role_has_permissions,
        }
    }

    fn holder_columns(&self, holder: &Holder) -> Vec<&str> {
        match holder {
            Holder::Actor(_) => vec![MODEL_TYPE, self.model_key()],
            Holder::Role { .. } => vec![ROLE_ID],
        }
    }

    fn holder_values(holder: &Holder) -> Vec<SimpleExpr> {
        match holder {
            Holder::Actor(key) => vec![
                Expr::val(key.actor_type.as_str()).into(),
                Expr::val(key.actor_id.as_str()).into(),
            ],
            Holder::Role { id } => vec![Expr::val(*id).into()],
        }
    }

    fn holder_conditions(&self, holder: &Holder) -> Vec<SimpleExpr> {
        self.holder_columns(holder)
            .into_iter()
            .zip(Self::holder_values(holder))
            .map(|(column, value)| Expr::col(DynIden::new(column)).eq(value))
            .collect()
    }

    fn actor_conditions(&self, actor: &ActorKey) -> [SimpleExpr; 2] {
        [
            Expr::col(DynIden::new(MODEL_TYPE)).eq(actor.actor_type.as_str()),
            Expr::col(DynIden::new(self.model_key())).eq(actor.actor_id.as_str()),
        ]
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Grant edges
    // ─────────────────────────────────────────────────────────────────────────────

    /// holder의 직접 edge
    pub fn select(&self, holder: &Holder) -> String {
        let mut query = Query::select();
        query
            .columns([PERMISSION_ID, TO_ID, TO_TYPE].map(DynIden::new))
            .from(DynIden::new(self.holder_table(holder)));
        for condition in self.holder_conditions(holder) {
            query.and_where(condition);
        }
        query
            .order_by(DynIden::new(PERMISSION_ID), Order::Asc)
            .to_string(PostgresQueryBuilder)
    }

    /// edge 추가 (중복은 `ON CONFLICT DO NOTHING`), 추가할 edge가 없으면 `None`
    pub fn insert(&self, holder: &Holder, edges: &[GrantEdge]) -> Option<String> {
        if edges.is_empty() {
            return None;
        }

        let holder_columns = self.holder_columns(holder);
        let mut columns = vec![PERMISSION_ID];
        columns.extend(holder_columns.iter().copied());
        columns.extend([TO_ID, TO_TYPE]);

        let mut query = Query::insert();
        query
            .into_table(DynIden::new(self.holder_table(holder)))
            .columns(columns.iter().map(|c| DynIden::new(*c)));

        for edge in edges {
            let mut values: Vec<SimpleExpr> = vec![Expr::val(edge.permission_id).into()];
            values.extend(Self::holder_values(holder));
            values.push(Expr::val(edge.pivot.to_id()).into());
            values.push(Expr::val(edge.pivot.to_type()).into());
            query.values_panic(values);
        }

        query.on_conflict(
            OnConflict::columns(columns.iter().map(|c| DynIden::new(*c)))
                .do_nothing()
                .to_owned(),
        );
        Some(query.to_string(PostgresQueryBuilder))
    }

    /// 필터에 매칭되는 edge 삭제
    pub fn revoke(&self, holder: &Holder, permission_id: PermissionId, filter: &RevokeFilter) -> String {
        let mut query = self.delete_edges(holder);
        query.and_where(Expr::col(DynIden::new(PERMISSION_ID)).eq(permission_id));

        let constraint = filter.constraint();
        if let Some(to_type) = constraint.to_type {
            query.and_where(Expr::col(DynIden::new(TO_TYPE)).eq(to_type));
        }
        if let Some(to_id) = constraint.to_id {
            query.and_where(Expr::col(DynIden::new(TO_ID)).eq(to_id));
        }

        query.to_string(PostgresQueryBuilder)
    }

    /// holder의 모든 edge 삭제
    pub fn detach_all(&self, holder: &Holder) -> String {
        self.delete_edges(holder).to_string(PostgresQueryBuilder)
    }

    fn delete_edges(&self, holder: &Holder) -> DeleteStatement {
        let mut query = Query::delete();
        query.from_table(DynIden::new(self.holder_table(holder)));
        for condition in self.holder_conditions(holder) {
            query.and_where(condition);
        }
        query
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Role membership
    // ─────────────────────────────────────────────────────────────────────────────

    /// role 부여, 부여할 role이 없으면 `None`
    pub fn attach_roles(&self, actor: &ActorKey, roles: &[RoleId]) -> Option<String> {
        if roles.is_empty() {
            return None;
        }

        let columns = [ROLE_ID, MODEL_TYPE, self.model_key()];
        let mut query = Query::insert();
        query
            .into_table(DynIden::new(self.config.table_names.model_has_roles.as_str()))
            .columns(columns.map(DynIden::new));

        for role in roles {
            query.values_panic([
                Expr::val(*role).into(),
                Expr::val(actor.actor_type.as_str()).into(),
                Expr::val(actor.actor_id.as_str()).into(),
            ]);
        }

        query.on_conflict(OnConflict::columns(columns.map(DynIden::new)).do_nothing().to_owned());
        Some(query.to_string(PostgresQueryBuilder))
    }

    /// role 해제
    pub fn detach_roles(&self, actor: &ActorKey, roles: &[RoleId]) -> String {
        let mut query = self.delete_memberships(actor);
        query.and_where(Expr::col(DynIden::new(ROLE_ID)).is_in(roles.iter().copied()));
        query.to_string(PostgresQueryBuilder)
    }

    /// actor의 모든 role 해제
    pub fn detach_all_roles(&self, actor: &ActorKey) -> String {
        self.delete_memberships(actor).to_string(PostgresQueryBuilder)
    }

    fn delete_memberships(&self, actor: &ActorKey) -> DeleteStatement {
        let mut query = Query::delete();
        query.from_table(DynIden::new(self.config.table_names.model_has_roles.as_str()));
        for condition in self.actor_conditions(actor) {
            query.and_where(condition);
        }
        query
    }
}
