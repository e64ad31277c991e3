//! # 请假申请实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 请假申请实体
///
/// `leave_dates` 以 JSON 数组字符串存储（如 `["2025-01-10","2025-01-11"]`）。
/// 状态机：pending -> approved / rejected / cancelled，终态不可再迁移。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_applications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 学号
    pub student_id: String,
    pub student_name: String,
    pub class_name: String,
    /// 请假日期列表（JSON 数组字符串）
    pub leave_dates: String,
    pub reason: String,
    /// 状态：pending / approved / rejected / cancelled
    pub status: String,
    pub apply_time: DateTime,
    pub reviewer: Option<String>,
    pub review_time: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
