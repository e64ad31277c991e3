//! # 指纹映射实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 指纹映射实体
///
/// `(device_id, fingerprint_id)` 对唯一，最多映射到一个学生；
/// 同一学生允许在多台设备上持有映射。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "fingerprint_mappings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 设备号
    pub device_id: String,
    /// 指纹槽位（0..=999）
    pub fingerprint_id: i32,
    /// 学号
    pub student_id: String,
    pub finger_index: Option<i32>,
    /// 录入状态：pending / enrolled / failed
    pub enrollment_status: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
