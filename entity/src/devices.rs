//! # 指纹设备实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 指纹设备实体
///
/// 在线/离线不入库，由 `last_seen` 距当前时间是否超过阈值派生。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "devices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 设备号（自然键）
    #[sea_orm(unique)]
    pub device_id: String,
    pub name: String,
    pub building: String,
    pub sequence: i32,
    pub max_fingerprints: i32,
    /// 状态：active / inactive / maintenance
    pub status: String,
    pub last_seen: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
