//! # 领域类型
//!
//! 状态枚举与日期辅助函数

pub mod domain;

pub use domain::{
    CheckStatus, DerivedStatus, DeviceStatus, EnrollmentStatus, LeaveStatus, day_bounds,
    parse_leave_dates, serialize_leave_dates,
};
