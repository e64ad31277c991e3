//! # 认证模块
//!
//! 三种强度不同的认证能力：
//! - 管理端账号的 JWT 会话（admin / counselor）
//! - 学生自助端的弱身份校验（学号 + 姓名 + 验证码，无密码）
//! - 硬件端的静态 Bearer Token

pub mod captcha;
pub mod jwt;

pub use captcha::{CaptchaChallenge, CaptchaService};
pub use jwt::{JwtClaims, JwtManager};

/// 从 `Authorization` 头中提取 Bearer Token
#[must_use]
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_extraction() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Bearer  abc123 "), Some("abc123"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}
