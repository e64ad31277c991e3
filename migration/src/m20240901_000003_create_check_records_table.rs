use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CheckRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CheckRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CheckRecords::StudentId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CheckRecords::Status)
                            .string_len(8)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CheckRecords::CheckTime)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CheckRecords::Recorder)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CheckRecords::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 派生状态查询按 (student_id, check_time) 扫描
        manager
            .create_index(
                Index::create()
                    .name("idx_check_records_student_time")
                    .table(CheckRecords::Table)
                    .col(CheckRecords::StudentId)
                    .col(CheckRecords::CheckTime)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CheckRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CheckRecords {
    Table,
    Id,
    StudentId,
    Status,
    CheckTime,
    Recorder,
    CreatedAt,
}
