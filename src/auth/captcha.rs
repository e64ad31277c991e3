//! # 算术验证码
//!
//! 学生自助端的验证码能力：签发一道算术题，答案带 TTL 存入缓存，
//! 校验成功即消耗（一次性）。

use crate::cache::{CacheKey, CacheProvider, MemoryCache};
use crate::error::{DormError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// 下发给前端的验证码挑战
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaChallenge {
    pub captcha_id: String,
    /// 题面，如 `3 + 7 = ?`
    pub question: String,
}

/// 验证码服务
pub struct CaptchaService {
    cache: Arc<MemoryCache>,
    ttl: Duration,
}

impl CaptchaService {
    #[must_use]
    pub fn new(cache: Arc<MemoryCache>, ttl_seconds: u64) -> Self {
        Self {
            cache,
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    /// 签发一个新的验证码
    pub async fn issue(&self) -> Result<CaptchaChallenge> {
        // ThreadRng 不跨 await 持有
        let (a, b) = {
            let mut rng = rand::thread_rng();
            (rng.gen_range(1..=9_u32), rng.gen_range(1..=9_u32))
        };
        let answer = (a + b).to_string();

        let captcha_id = uuid::Uuid::new_v4().to_string();
        let key = CacheKey::Captcha {
            captcha_id: captcha_id.clone(),
        }
        .build();
        self.cache.set(&key, answer, Some(self.ttl)).await?;

        Ok(CaptchaChallenge {
            captcha_id,
            question: format!("{a} + {b} = ?"),
        })
    }

    /// 校验验证码；成功与失败都会消耗该验证码
    pub async fn verify(&self, captcha_id: &str, answer: &str) -> Result<()> {
        let key = CacheKey::Captcha {
            captcha_id: captcha_id.to_string(),
        }
        .build();

        let expected: Option<String> = self.cache.get(&key).await?;
        // 单次有效：取出即删除，答错也不允许重试同一题
        self.cache.delete(&key).await?;

        match expected {
            Some(expected) if expected == answer.trim() => Ok(()),
            Some(_) => Err(DormError::validation("验证码错误")),
            None => Err(DormError::validation("验证码已过期，请重新获取")),
        }
    }
}
