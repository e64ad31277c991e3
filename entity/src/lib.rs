//! # Entity 模块
//!
//! 包含所有 Sea-ORM 实体定义

pub mod users;
pub mod students;
pub mod check_records;
pub mod leave_applications;
pub mod fingerprint_mappings;
pub mod devices;
pub mod operation_logs;

pub use users::Entity as Users;
pub use students::Entity as Students;
pub use check_records::Entity as CheckRecords;
pub use leave_applications::Entity as LeaveApplications;
pub use fingerprint_mappings::Entity as FingerprintMappings;
pub use devices::Entity as Devices;
pub use operation_logs::Entity as OperationLogs;
