//! DDL 생성기
//!
//! 다섯 개 테이블을 의존 순서대로 생성합니다.
//!
//! | 테이블 | 키 |
//! |--------|----|
//! | permissions / roles | `id`, unique `(name, guard_name)` |
//! | model_has_permissions | `(permission_id, model_id, model_type, to_id, to_type)` |
//! | role_has_permissions | `(permission_id, role_id, to_id, to_type)` |
//! | model_has_roles | `(role_id, model_id, model_type)` |
//!
//! edge 테이블의 외래키는 모두 `ON DELETE CASCADE`입니다.

use sea_query::{
    ColumnDef, Expr, ForeignKey, ForeignKeyAction, Index, IndexCreateStatement,
    PostgresQueryBuilder, Table, TableCreateStatement,
};

use padlock_core::config::PadlockConfig;
use padlock_core::WILDCARD;

use crate::columns::*;
use crate::DynIden;

/// DDL 생성기
pub struct DdlGenerator<'a> {
    config: &'a PadlockConfig,
}

impl<'a> DdlGenerator<'a> {
    pub fn new(config: &'a PadlockConfig) -> Self {
        Self { config }
    }

    /// 전체 스키마 DDL (테이블 → 인덱스 순)
    pub fn generate(&self) -> Vec<String> {
        let mut statements: Vec<String> = self
            .tables()
            .iter()
            .map(|table| table.to_string(PostgresQueryBuilder))
            .collect();
        statements.extend(
            self.indexes()
                .iter()
                .map(|index| index.to_string(PostgresQueryBuilder)),
        );
        statements
    }

    /// 전체 스키마 삭제 (역순)
    pub fn drop_all(&self) -> Vec<String> {
        let names = &self.config.table_names;
        [
            &names.model_has_roles,
            &names.role_has_permissions,
            &names.model_has_permissions,
            &names.roles,
            &names.permissions,
        ]
        .into_iter()
        .map(|name| {
            Table::drop()
                .table(DynIden::new(name.as_str()))
                .if_exists()
                .to_string(PostgresQueryBuilder)
        })
        .collect()
    }

    fn tables(&self) -> Vec<TableCreateStatement> {
        let names = &self.config.table_names;
        vec![
            self.reference_table(&names.permissions),
            self.reference_table(&names.roles),
            self.model_has_permissions(),
            self.role_has_permissions(),
            self.model_has_roles(),
        ]
    }

    fn indexes(&self) -> Vec<IndexCreateStatement> {
        let names = &self.config.table_names;
        let model_key = &self.config.column_names.model_morph_key;

        let mut indexes: Vec<IndexCreateStatement> = [&names.permissions, &names.roles]
            .into_iter()
            .map(|table| {
                Index::create()
                    .name(format!("uq_{}_name_guard", table))
                    .table(DynIden::new(table.as_str()))
                    .col(DynIden::new(NAME))
                    .col(DynIden::new(GUARD_NAME))
                    .unique()
                    .if_not_exists()
                    .to_owned()
            })
            .collect();

        // actor 기준 조회
        for table in [&names.model_has_permissions, &names.model_has_roles] {
            indexes.push(
                Index::create()
                    .name(format!("idx_{}_model", table))
                    .table(DynIden::new(table.as_str()))
                    .col(DynIden::new(model_key.as_str()))
                    .col(DynIden::new(MODEL_TYPE))
                    .if_not_exists()
                    .to_owned(),
            );
        }

        indexes
    }

    fn reference_table(&self, name: &str) -> TableCreateStatement {
        Table::create()
            .table(DynIden::new(name))
            .if_not_exists()
            .col(
                ColumnDef::new(DynIden::new(ID))
                    .big_integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(DynIden::new(NAME)).string().not_null())
            .col(ColumnDef::new(DynIden::new(GUARD_NAME)).string().not_null())
            .col(
                ColumnDef::new(DynIden::new(CREATED_AT))
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            )
            .to_owned()
    }

    fn model_has_permissions(&self) -> TableCreateStatement {
        let names = &self.config.table_names;
        let model_key = self.config.column_names.model_morph_key.as_str();
        let table = names.model_has_permissions.as_str();

        Table::create()
            .table(DynIden::new(table))
            .if_not_exists()
            .col(ColumnDef::new(DynIden::new(PERMISSION_ID)).big_integer().not_null())
            .col(ColumnDef::new(DynIden::new(MODEL_TYPE)).string().not_null())
            .col(ColumnDef::new(DynIden::new(model_key)).string().not_null())
            .col(&mut pivot_column(TO_ID))
            .col(&mut pivot_column(TO_TYPE))
            .primary_key(
                Index::create()
                    .col(DynIden::new(PERMISSION_ID))
                    .col(DynIden::new(model_key))
                    .col(DynIden::new(MODEL_TYPE))
                    .col(DynIden::new(TO_ID))
                    .col(DynIden::new(TO_TYPE)),
            )
            .foreign_key(
                ForeignKey::create()
                    .name(format!("fk_{}_permission", table))
                    .from(DynIden::new(table), DynIden::new(PERMISSION_ID))
                    .to(DynIden::new(names.permissions.as_str()), DynIden::new(ID))
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned()
    }

    fn role_has_permissions(&self) -> TableCreateStatement {
        let names = &self.config.table_names;
        let table = names.role_has_permissions.as_str();

        Table::create()
            .table(DynIden::new(table))
            .if_not_exists()
            .col(ColumnDef::new(DynIden::new(PERMISSION_ID)).big_integer().not_null())
            .col(ColumnDef::new(DynIden::new(ROLE_ID)).big_integer().not_null())
            .col(&mut pivot_column(TO_ID))
            .col(&mut pivot_column(TO_TYPE))
            .primary_key(
                Index::create()
                    .col(DynIden::new(PERMISSION_ID))
                    .col(DynIden::new(ROLE_ID))
                    .col(DynIden::new(TO_ID))
                    .col(DynIden::new(TO_TYPE)),
            )
            .foreign_key(
                ForeignKey::create()
                    .name(format!("fk_{}_permission", table))
                    .from(DynIden::new(table), DynIden::new(PERMISSION_ID))
                    .to(DynIden::new(names.permissions.as_str()), DynIden::new(ID))
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .foreign_key(
                ForeignKey::create()
                    .name(format!("fk_{}_role", table))
                    .from(DynIden::new(table), DynIden::new(ROLE_ID))
                    .to(DynIden::new(names.roles.as_str()), DynIden::new(ID))
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned()
    }

    fn model_has_roles(&self) -> TableCreateStatement {
        let names = &self.config.table_names;
        let model_key = self.config.column_names.model_morph_key.as_str();
        let table = names.model_has_roles.as_str();

        Table::create()
            .table(DynIden::new(table))
            .if_not_exists()
            .col(ColumnDef::new(DynIden::new(ROLE_ID)).big_integer().not_null())
            .col(ColumnDef::new(DynIden::new(MODEL_TYPE)).string().not_null())
            .col(ColumnDef::new(DynIden::new(model_key)).string().not_null())
            .primary_key(
                Index::create()
                    .col(DynIden::new(ROLE_ID))
                    .col(DynIden::new(model_key))
                    .col(DynIden::new(MODEL_TYPE)),
            )
            .foreign_key(
                ForeignKey::create()
                    .name(format!("fk_{}_role", table))
                    .from(DynIden::new(table), DynIden::new(ROLE_ID))
                    .to(DynIden::new(names.roles.as_str()), DynIden::new(ID))
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned()
    }
}

/// pivot 컬럼 (기본값 `*`)
fn pivot_column(name: &str) -> ColumnDef {
    ColumnDef::new(DynIden::new(name))
        .string()
        .not_null()
        .default(WILDCARD)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_default_schema() {
        let config = PadlockConfig::default();
        let statements = DdlGenerator::new(&config).generate();

        assert_eq!(statements.len(), 9);
        assert!(statements[0].contains("CREATE TABLE IF NOT EXISTS \"permissions\""));
        assert!(statements[1].contains("CREATE TABLE IF NOT EXISTS \"roles\""));
        assert!(statements[2].contains("\"model_has_permissions\""));
        assert!(statements[2].contains("\"to_type\""));
        assert!(statements[2].contains("DEFAULT '*'"));
        assert!(statements[3].contains("REFERENCES \"roles\""));
        assert!(statements[3].contains("\"to_id\""));
        assert!(statements[3].contains("DEFAULT '*'"));
        assert!(statements[4].contains("ON DELETE CASCADE"));
        assert!(statements[5].contains("UNIQUE INDEX"));
        assert!(statements[5].contains("\"uq_permissions_name_guard\""));
    }

    #[test]
    fn test_configured_names() {
        let mut config = PadlockConfig::default();
        config.table_names.model_has_permissions = "user_grants".to_string();
        config.column_names.model_morph_key = "user_uuid".to_string();

        let statements = DdlGenerator::new(&config).generate();
        let grants = &statements[2];

        assert!(grants.contains("CREATE TABLE IF NOT EXISTS \"user_grants\""));
        assert!(grants.contains("\"user_uuid\""));
        assert!(!grants.contains("\"model_id\""));
    }

    #[test]
    fn test_drop_all_in_reverse_order() {
        let config = PadlockConfig::default();
        let statements = DdlGenerator::new(&config).drop_all();

        assert_eq!(statements.len(), 5);
        assert!(statements[0].contains("DROP TABLE IF EXISTS \"model_has_roles\""));
        assert!(statements[4].contains("\"permissions\""));
    }
}
