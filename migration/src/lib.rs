pub use sea_orm_migration::prelude::*;

mod m20240901_000001_create_users_table;
mod m20240901_000002_create_students_table;
mod m20240901_000003_create_check_records_table;
mod m20240901_000004_create_leave_applications_table;
mod m20240901_000005_create_devices_table;
mod m20240901_000006_create_fingerprint_mappings_table;
mod m20240901_000007_create_operation_logs_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240901_000001_create_users_table::Migration),
            Box::new(m20240901_000002_create_students_table::Migration),
            Box::new(m20240901_000003_create_check_records_table::Migration),
            Box::new(m20240901_000004_create_leave_applications_table::Migration),
            Box::new(m20240901_000005_create_devices_table::Migration),
            Box::new(m20240901_000006_create_fingerprint_mappings_table::Migration),
            Box::new(m20240901_000007_create_operation_logs_table::Migration),
        ]
    }
}
