//! # 操作日志实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 操作日志实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "operation_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 操作者（管理端用户名或设备号）
    pub operator: String,
    pub action: String,
    pub target: Option<String>,
    pub detail: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
