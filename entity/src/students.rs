//! # 学生实体定义
//!
//! 学生基础信息与住宿位置的 Sea-ORM 实体模型

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 学生实体
///
/// `student_id` 为学号（自然键）。签到记录与指纹映射均通过学号关联，
/// 删除学生不级联清理关联表。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 学号
    #[sea_orm(unique)]
    pub student_id: String,
    pub name: String,
    pub gender: String,
    pub class_name: String,
    /// 楼栋
    pub building: String,
    /// 园区
    pub area: String,
    pub floor: String,
    pub room: String,
    pub bed: String,
    pub counselor_name: String,
    pub counselor_phone: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
