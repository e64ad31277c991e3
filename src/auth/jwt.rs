//! # JWT 令牌管理
//!
//! 管理端会话令牌的签发与校验

use crate::auth_error;
use crate::config::AuthConfig;
use crate::error::Result;
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};

/// JWT 声明
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// 用户ID
    pub user_id: i32,
    /// 用户名
    pub username: String,
    /// 角色：admin / counselor
    pub role: String,
    /// 是否为管理员
    pub is_admin: bool,
    /// 过期时间（Unix 秒）
    pub exp: i64,
    /// 签发时间（Unix 秒）
    pub iat: i64,
    /// 令牌唯一标识
    pub jti: String,
}

impl JwtClaims {
    #[must_use]
    pub fn new(user_id: i32, username: String, role: String, expires_in: i64) -> Self {
        let now = Utc::now().timestamp();
        let is_admin = role == "admin";
        Self {
            user_id,
            username,
            role,
            is_admin,
            exp: now + expires_in,
            iat: now,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// 检查令牌是否已过期
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }
}

/// JWT 令牌管理器
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in: i64,
}

impl JwtManager {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 30; // 30 秒容差

        Self {
            encoding_key,
            decoding_key,
            validation,
            expires_in: config.jwt_expires_in,
        }
    }

    /// 生成访问令牌
    pub fn generate_token(&self, user_id: i32, username: &str, role: &str) -> Result<String> {
        let claims = JwtClaims::new(
            user_id,
            username.to_string(),
            role.to_string(),
            self.expires_in,
        );
        let header = Header::new(Algorithm::HS256);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| crate::internal_error!("令牌生成失败: {}", e))
    }

    /// 校验并解析令牌
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        let token_data: TokenData<JwtClaims> = decode(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    auth_error!("认证令牌已过期")
                }
                _ => auth_error!("认证令牌无效"),
            })?;

        let claims = token_data.claims;
        if claims.is_expired() {
            return Err(auth_error!("认证令牌已过期"));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> JwtManager {
        JwtManager::new(&AuthConfig {
            jwt_secret: "test-secret-please-ignore".to_string(),
            jwt_expires_in: 3600,
        })
    }

    #[test]
    fn token_round_trip() {
        let manager = manager();
        let token = manager.generate_token(1, "admin", "admin").unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.user_id, 1);
        assert_eq!(claims.username, "admin");
        assert!(claims.is_admin);
        assert!(!claims.is_expired());
    }

    #[test]
    fn counselor_is_not_admin() {
        let manager = manager();
        let token = manager.generate_token(2, "counselor01", "counselor").unwrap();
        let claims = manager.validate_token(&token).unwrap();
        assert!(!claims.is_admin);
        assert_eq!(claims.role, "counselor");
    }

    #[test]
    fn garbage_token_is_rejected() {
        let manager = manager();
        assert!(manager.validate_token("not-a-token").is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = manager().generate_token(1, "admin", "admin").unwrap();
        let other = JwtManager::new(&AuthConfig {
            jwt_secret: "another-secret".to_string(),
            jwt_expires_in: 3600,
        });
        assert!(other.validate_token(&token).is_err());
    }
}
