use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FingerprintMappings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FingerprintMappings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FingerprintMappings::DeviceId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FingerprintMappings::FingerprintId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FingerprintMappings::StudentId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(FingerprintMappings::FingerIndex).integer())
                    .col(
                        ColumnDef::new(FingerprintMappings::EnrollmentStatus)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(FingerprintMappings::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(FingerprintMappings::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // (device_id, fingerprint_id) 对唯一
        manager
            .create_index(
                Index::create()
                    .name("uk_fingerprint_mappings_device_slot")
                    .table(FingerprintMappings::Table)
                    .col(FingerprintMappings::DeviceId)
                    .col(FingerprintMappings::FingerprintId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_fingerprint_mappings_student_id")
                    .table(FingerprintMappings::Table)
                    .col(FingerprintMappings::StudentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FingerprintMappings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FingerprintMappings {
    Table,
    Id,
    DeviceId,
    FingerprintId,
    StudentId,
    FingerIndex,
    EnrollmentStatus,
    CreatedAt,
    UpdatedAt,
}
