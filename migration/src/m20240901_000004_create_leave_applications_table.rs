use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LeaveApplications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeaveApplications::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LeaveApplications::StudentId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveApplications::StudentName)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveApplications::ClassName)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveApplications::LeaveDates)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveApplications::Reason)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveApplications::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(LeaveApplications::ApplyTime)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(LeaveApplications::Reviewer).string_len(64))
                    .col(ColumnDef::new(LeaveApplications::ReviewTime).timestamp())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leave_applications_student_id")
                    .table(LeaveApplications::Table)
                    .col(LeaveApplications::StudentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leave_applications_status")
                    .table(LeaveApplications::Table)
                    .col(LeaveApplications::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LeaveApplications::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LeaveApplications {
    Table,
    Id,
    StudentId,
    StudentName,
    ClassName,
    LeaveDates,
    Reason,
    Status,
    ApplyTime,
    Reviewer,
    ReviewTime,
}
