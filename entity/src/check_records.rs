//! # 签到记录实体定义
//!
//! 归寝状态事件的 Sea-ORM 实体模型

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 签到记录实体
///
/// 只追加不更新。某学生某日的"当前状态"由该日 `(check_time, id)`
/// 最大的一行派生，任何读取都重新计算，不做物化列。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "check_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 学号
    pub student_id: String,
    /// 状态：在寝 / 离寝 / 请假
    pub status: String,
    pub check_time: DateTime,
    /// 记录来源：管理端用户名或设备号
    pub recorder: String,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
