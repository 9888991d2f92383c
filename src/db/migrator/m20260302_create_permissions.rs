use crate::constants;
use crate::entities::{permissions, prelude::*};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        manager
            .create_table(
                schema
                    .create_table_from_entity(Permissions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(UsersPermissions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let mut insert = sea_orm_migration::sea_query::Query::insert();
        insert
            .into_table(Permissions)
            .columns([permissions::Column::Code]);
        for code in constants::permissions::CATALOGUE {
            insert.values_panic([(*code).into()]);
        }

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UsersPermissions).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Permissions).to_owned())
            .await
    }
}
