//! # 用户管理服务
//!
//! 管理端账号（管理员/辅导员）的增删改查，仅管理员可操作。

use bcrypt::{DEFAULT_COST, hash};
use chrono::Utc;
use entity::{users, users::Entity as Users};
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

use crate::error::{DormError, Result};
use crate::management::response::Pagination;
use crate::management::server::AppState;

use super::shared::{PaginationParams, build_page};

/// 用户列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// 创建用户请求
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub role: String,
}

/// 更新用户请求
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// 重置密码请求
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// 用户响应
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<String>,
    pub created_at: String,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            role: user.role,
            is_active: user.is_active,
            last_login: user
                .last_login
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            created_at: user.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ListUsersResult {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

fn validate_role(role: &str) -> Result<()> {
    match role {
        "admin" | "counselor" => Ok(()),
        other => Err(DormError::validation(format!("未知角色: {other}"))),
    }
}

fn hash_password(password: &str) -> Result<(String, String)> {
    if password.len() < 6 {
        return Err(DormError::validation("密码长度不能少于 6 位"));
    }
    let salt: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let password_hash =
        hash(password, DEFAULT_COST).map_err(|e| DormError::internal_with_source("密码哈希失败", e))?;
    Ok((password_hash, salt))
}

/// 用户管理服务
pub struct UsersService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UsersService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: state.database.as_ref(),
        }
    }

    #[must_use]
    pub const fn with_db(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// 分页查询用户
    pub async fn list(&self, query: &UserQuery) -> Result<ListUsersResult> {
        let params = PaginationParams::new(query.page, query.limit, 20, 100);

        let mut select = Users::find();
        if let Some(role) = &query.role {
            select = select.filter(users::Column::Role.eq(role));
        }
        if let Some(is_active) = query.is_active {
            select = select.filter(users::Column::IsActive.eq(is_active));
        }

        let total = select.clone().count(self.db).await?;
        let rows = select
            .order_by_asc(users::Column::Id)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db)
            .await?;

        Ok(ListUsersResult {
            users: rows.into_iter().map(UserResponse::from).collect(),
            pagination: build_page(total, params).into(),
        })
    }

    /// 创建用户
    pub async fn create(&self, request: &CreateUserRequest) -> Result<UserResponse> {
        if request.username.trim().is_empty() {
            return Err(DormError::validation("用户名不能为空"));
        }
        validate_role(&request.role)?;

        let exists = Users::find()
            .filter(users::Column::Username.eq(&request.username))
            .one(self.db)
            .await?;
        if exists.is_some() {
            return Err(DormError::conflict(format!(
                "用户名 {} 已存在",
                request.username
            )));
        }

        let (password_hash, salt) = hash_password(&request.password)?;
        let now = Utc::now().naive_utc();
        let user = users::ActiveModel {
            username: Set(request.username.trim().to_string()),
            password_hash: Set(password_hash),
            salt: Set(salt),
            display_name: Set(request.display_name.clone()),
            role: Set(request.role.clone()),
            is_active: Set(true),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(user.insert(self.db).await?.into())
    }

    /// 更新用户
    pub async fn update(&self, id: i32, request: &UpdateUserRequest) -> Result<UserResponse> {
        let user = Users::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| DormError::not_found(format!("用户 {id} 不存在")))?;

        let mut active: users::ActiveModel = user.into();
        if let Some(display_name) = &request.display_name {
            active.display_name = Set(display_name.clone());
        }
        if let Some(role) = &request.role {
            validate_role(role)?;
            active.role = Set(role.clone());
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().naive_utc());
        Ok(active.update(self.db).await?.into())
    }

    /// 删除用户（不允许删除自己）
    pub async fn delete(&self, id: i32, operator_id: i32) -> Result<()> {
        if id == operator_id {
            return Err(DormError::business("不能删除当前登录账号"));
        }
        let result = Users::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(DormError::not_found(format!("用户 {id} 不存在")));
        }
        Ok(())
    }

    /// 重置密码
    pub async fn reset_password(&self, id: i32, request: &ResetPasswordRequest) -> Result<()> {
        let user = Users::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| DormError::not_found(format!("用户 {id} 不存在")))?;

        let (password_hash, salt) = hash_password(&request.new_password)?;
        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.salt = Set(salt);
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::helpers::create_test_db;
    use pretty_assertions::assert_eq;

    fn create_request(username: &str, role: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            password: "pass123".to_string(),
            display_name: "测试账号".to_string(),
            role: role.to_string(),
        }
    }

    #[tokio::test]
    async fn create_list_update_delete() {
        let db = create_test_db().await.unwrap();
        let service = UsersService::with_db(&db);

        let admin = service.create(&create_request("admin2", "admin")).await.unwrap();
        service
            .create(&create_request("counselor01", "counselor"))
            .await
            .unwrap();

        let listed = service
            .list(&UserQuery {
                role: Some("counselor".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(listed.users.len(), 1);
        assert_eq!(listed.users[0].username, "counselor01");

        let updated = service
            .update(
                admin.id,
                &UpdateUserRequest {
                    display_name: Some("超级管理员".to_string()),
                    role: None,
                    is_active: Some(false),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.display_name, "超级管理员");
        assert!(!updated.is_active);

        // 不能删除自己
        let err = service.delete(admin.id, admin.id).await.unwrap_err();
        assert_eq!(err.status_and_code().1, "BUSINESS_ERROR");
        service.delete(admin.id, 999).await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_username_and_bad_role_are_rejected() {
        let db = create_test_db().await.unwrap();
        let service = UsersService::with_db(&db);

        service.create(&create_request("dup", "admin")).await.unwrap();
        let err = service.create(&create_request("dup", "admin")).await.unwrap_err();
        assert_eq!(err.status_and_code().1, "RESOURCE_CONFLICT");

        assert!(service.create(&create_request("x1", "teacher")).await.is_err());

        let mut short = create_request("x2", "admin");
        short.password = "123".to_string();
        assert!(service.create(&short).await.is_err());
    }

    #[tokio::test]
    async fn reset_password_changes_hash() {
        let db = create_test_db().await.unwrap();
        let service = UsersService::with_db(&db);
        let user = service.create(&create_request("reset", "admin")).await.unwrap();

        service
            .reset_password(
                user.id,
                &ResetPasswordRequest {
                    new_password: "newpass456".to_string(),
                },
            )
            .await
            .unwrap();

        let stored = Users::find_by_id(user.id).one(&db).await.unwrap().unwrap();
        assert!(bcrypt::verify("newpass456", &stored.password_hash).unwrap());
        assert!(!bcrypt::verify("pass123", &stored.password_hash).unwrap());
    }
}
