//! # 管理端登录服务

use chrono::Utc;
use entity::{users, users::Entity as Users};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

use crate::auth::JwtManager;
use crate::error::{DormError, Result};
use crate::management::server::AppState;

/// 登录请求
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 登录响应
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i32,
    pub username: String,
    pub display_name: String,
    pub role: String,
}

/// 管理端登录服务
pub struct AuthService<'a> {
    db: &'a DatabaseConnection,
    jwt: &'a JwtManager,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: state.database.as_ref(),
            jwt: &state.jwt,
        }
    }

    #[must_use]
    pub const fn with_parts(db: &'a DatabaseConnection, jwt: &'a JwtManager) -> Self {
        Self { db, jwt }
    }

    /// 账号密码登录，成功后更新 last_login 并签发 JWT
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let user = Users::find()
            .filter(users::Column::Username.eq(&request.username))
            .one(self.db)
            .await?
            .ok_or_else(|| DormError::auth("用户名或密码错误"))?;

        if !user.is_active {
            return Err(DormError::auth("账号已停用"));
        }

        let matched = bcrypt::verify(&request.password, &user.password_hash)
            .map_err(|e| DormError::internal_with_source("密码校验失败", e))?;
        if !matched {
            return Err(DormError::auth("用户名或密码错误"));
        }

        let token = self.jwt.generate_token(user.id, &user.username, &user.role)?;

        let response = LoginResponse {
            token,
            user_id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            role: user.role.clone(),
        };

        let mut active: users::ActiveModel = user.into();
        active.last_login = Set(Some(Utc::now().naive_utc()));
        active.update(self.db).await?;

        Ok(response)
    }
}
