//! 访问令牌声明读取
//!
//! 客户端不持有签名密钥，因此不校验签名直接解码。
//! 结果只用于跳过注定失败的请求，是否有效仍以服务端为准。

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;

/// 访问令牌与刷新令牌携带的声明
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// 账户 id（视服务端配置为数字或字符串）
    #[serde(default)]
    pub user_id: Option<Value>,

    /// 过期时间（unix 秒）
    #[serde(default)]
    pub exp: Option<i64>,

    /// "access" 或 "refresh"
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenClaims {
    pub fn user_id(&self) -> Option<i64> {
        match self.user_id.as_ref()? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp?, 0)
    }
}

/// 不校验签名解码声明；非 JWT 令牌返回 `None`
pub fn peek_claims(token: &str) -> Option<TokenClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    match decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            tracing::debug!("Token is not a decodable JWT: {:?}", e.kind());
            None
        }
    }
}

/// 令牌是否已过 `exp`；本地无法判断时返回 `None`
pub fn is_expired(token: &str, now: DateTime<Utc>) -> Option<bool> {
    let expires_at = peek_claims(token)?.expires_at()?;
    Some(expires_at <= now)
}
