//! # 领域状态枚举与日期工具
//!
//! 数据库中状态一律以字符串存储（签到状态沿用中文标签），
//! 业务代码通过这里的枚举做解析与匹配。

use crate::error::{DormError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 签到记录状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    /// 在寝
    Present,
    /// 离寝
    Out,
    /// 请假
    OnLeave,
}

impl CheckStatus {
    /// 数据库存储值（中文标签，与历史数据保持一致）
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Present => "在寝",
            Self::Out => "离寝",
            Self::OnLeave => "请假",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckStatus {
    type Err = DormError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "在寝" => Ok(Self::Present),
            "离寝" => Ok(Self::Out),
            "请假" => Ok(Self::OnLeave),
            other => Err(DormError::validation(format!("未知签到状态: {other}"))),
        }
    }
}

/// 派生状态（签到状态加"未签到"哨兵值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerivedStatus {
    /// 当日存在签到记录，取最新一条的状态
    Checked(CheckStatus),
    /// 当日无任何记录
    NotCheckedIn,
}

impl DerivedStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Checked(status) => status.as_str(),
            Self::NotCheckedIn => "未签到",
        }
    }

    #[must_use]
    pub const fn is_on_leave(self) -> bool {
        matches!(self, Self::Checked(CheckStatus::OnLeave))
    }
}

impl fmt::Display for DerivedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CheckStatus> for DerivedStatus {
    fn from(status: CheckStatus) -> Self {
        Self::Checked(status)
    }
}

/// 请假申请状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// 展示用中文标签
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "待审核",
            Self::Approved => "已批准",
            Self::Rejected => "已驳回",
            Self::Cancelled => "已取消",
        }
    }

    /// 是否为终态（approved / rejected / cancelled 不可再迁移）
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaveStatus {
    type Err = DormError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DormError::validation(format!("未知申请状态: {other}"))),
        }
    }
}

/// 指纹录入状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Enrolled,
    Failed,
}

impl EnrollmentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Enrolled => "enrolled",
            Self::Failed => "failed",
        }
    }

    /// pending 与 enrolled 的映射占用槽位，failed 不占用
    #[must_use]
    pub const fn occupies_slot(self) -> bool {
        matches!(self, Self::Pending | Self::Enrolled)
    }
}

impl FromStr for EnrollmentStatus {
    type Err = DormError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "enrolled" => Ok(Self::Enrolled),
            "failed" => Ok(Self::Failed),
            other => Err(DormError::validation(format!("未知录入状态: {other}"))),
        }
    }
}

/// 设备状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Active,
    Inactive,
    Maintenance,
}

impl DeviceStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Maintenance => "maintenance",
        }
    }
}

impl FromStr for DeviceStatus {
    type Err = DormError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "maintenance" => Ok(Self::Maintenance),
            other => Err(DormError::validation(format!("未知设备状态: {other}"))),
        }
    }
}

/// 某个日历日的起止时间（`[00:00:00, 次日 00:00:00)`）
#[must_use]
pub fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(NaiveTime::MIN);
    let end = start + chrono::Duration::days(1);
    (start, end)
}

/// 解析 JSON 数组字符串形式的请假日期列表
pub fn parse_leave_dates(raw: &str) -> Result<Vec<NaiveDate>> {
    let strings: Vec<String> = serde_json::from_str(raw)?;
    strings
        .iter()
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| DormError::validation(format!("日期格式错误: {s}")))
        })
        .collect()
}

/// 将日期列表序列化为 JSON 数组字符串
pub fn serialize_leave_dates(dates: &[NaiveDate]) -> String {
    let strings: Vec<String> = dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
    serde_json::to_string(&strings).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(CheckStatus::Present, "在寝")]
    #[case(CheckStatus::Out, "离寝")]
    #[case(CheckStatus::OnLeave, "请假")]
    fn check_status_round_trip(#[case] status: CheckStatus, #[case] label: &str) {
        assert_eq!(status.as_str(), label);
        assert_eq!(label.parse::<CheckStatus>().unwrap(), status);
    }

    #[test]
    fn unknown_check_status_is_rejected() {
        assert!("午睡".parse::<CheckStatus>().is_err());
    }

    #[test]
    fn derived_status_sentinel() {
        assert_eq!(DerivedStatus::NotCheckedIn.as_str(), "未签到");
        assert_eq!(
            DerivedStatus::from(CheckStatus::OnLeave).as_str(),
            "请假"
        );
        assert!(DerivedStatus::Checked(CheckStatus::OnLeave).is_on_leave());
        assert!(!DerivedStatus::NotCheckedIn.is_on_leave());
    }

    #[test]
    fn leave_status_terminality() {
        assert!(!LeaveStatus::Pending.is_terminal());
        assert!(LeaveStatus::Approved.is_terminal());
        assert!(LeaveStatus::Rejected.is_terminal());
        assert!(LeaveStatus::Cancelled.is_terminal());
    }

    #[test]
    fn enrollment_slot_occupancy() {
        assert!(EnrollmentStatus::Pending.occupies_slot());
        assert!(EnrollmentStatus::Enrolled.occupies_slot());
        assert!(!EnrollmentStatus::Failed.occupies_slot());
    }

    #[test]
    fn leave_dates_round_trip() {
        let raw = r#"["2025-01-10","2025-01-11"]"#;
        let dates = parse_leave_dates(raw).unwrap();
        assert_eq!(dates.len(), 2);
        assert_eq!(serialize_leave_dates(&dates), raw);

        assert!(parse_leave_dates(r#"["2025-13-40"]"#).is_err());
    }

    #[test]
    fn day_bounds_cover_full_day() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let (start, end) = day_bounds(date);
        assert_eq!(start.date(), date);
        assert_eq!(end - start, chrono::Duration::days(1));
    }
}
