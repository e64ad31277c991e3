use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Students::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Students::StudentId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Students::Name).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Students::Gender)
                            .string_len(8)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Students::ClassName)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Students::Building)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Students::Area)
                            .string_len(32)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Students::Floor)
                            .string_len(8)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Students::Room).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Students::Bed)
                            .string_len(8)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Students::CounselorName)
                            .string_len(64)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Students::CounselorPhone)
                            .string_len(32)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Students::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Students::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建索引
        manager
            .create_index(
                Index::create()
                    .name("idx_students_class_name")
                    .table(Students::Table)
                    .col(Students::ClassName)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_students_building")
                    .table(Students::Table)
                    .col(Students::Building)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Students {
    Table,
    Id,
    StudentId,
    Name,
    Gender,
    ClassName,
    Building,
    Area,
    Floor,
    Room,
    Bed,
    CounselorName,
    CounselorPhone,
    CreatedAt,
    UpdatedAt,
}
