use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OperationLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OperationLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OperationLogs::Operator)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OperationLogs::Action)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(OperationLogs::Target).string_len(128))
                    .col(ColumnDef::new(OperationLogs::Detail).text())
                    .col(
                        ColumnDef::new(OperationLogs::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_operation_logs_created_at")
                    .table(OperationLogs::Table)
                    .col(OperationLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OperationLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OperationLogs {
    Table,
    Id,
    Operator,
    Action,
    Target,
    Detail,
    CreatedAt,
}
