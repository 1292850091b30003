//! 配置系统
//! 从环境变量加载客户端配置（前缀 CONSULAR_）

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use url::Url;

/// 默认 API 地址（本地开发后端）
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API 根地址，例如 "https://consulat.example/api"
    pub base_url: String,
    /// 单个请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 刷新令牌接口路径
    pub refresh_path: String,
}

impl ApiConfig {
    /// 解析 API 根地址，非法时回退到默认地址
    pub fn resolved_base_url(&self) -> Result<Url, url::ParseError> {
        match validate_base_url(&self.base_url) {
            Some(url) => Ok(url),
            None => {
                tracing::warn!(
                    configured = %self.base_url,
                    fallback = DEFAULT_API_BASE_URL,
                    "Invalid API base URL, using default"
                );
                Url::parse(DEFAULT_API_BASE_URL)
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 会话快照所在目录
    pub dir: String,
    /// 会话存储键名
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    /// 会话失效后跳转的登录路由
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub routes: RouteConfig,
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        settings = settings
            .set_default("api.base_url", DEFAULT_API_BASE_URL)?
            .set_default("api.request_timeout_secs", 30)?
            .set_default("api.refresh_path", "/auth/refresh/")?
            .set_default("storage.dir", ".consular")?
            .set_default("storage.key", crate::auth::session::SESSION_STORAGE_KEY)?
            .set_default("routes.login", crate::auth::policy::LOGIN_ROUTE)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?;

        // 从环境变量加载配置（前缀为 CONSULAR_）
        settings = settings.add_source(
            Environment::with_prefix("CONSULAR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: ClientConfig = settings.build()?.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    fn validate(&self) -> Result<(), ConfigError> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        if self.api.request_timeout_secs == 0 || self.api.request_timeout_secs > 300 {
            return Err(ConfigError::Message(
                "request_timeout_secs must be between 1 and 300".to_string(),
            ));
        }

        if !self.api.refresh_path.starts_with('/') {
            return Err(ConfigError::Message(
                "refresh_path must start with '/'".to_string(),
            ));
        }

        if self.storage.key.trim().is_empty() {
            return Err(ConfigError::Message("storage key must not be empty".to_string()));
        }

        Ok(())
    }
}

/// 校验 API 根地址：必须是带有效主机名的 http(s) 地址
pub fn validate_base_url(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.starts_with("http") {
        return None;
    }

    // 形如 http:///api 的地址缺少主机名
    if trimmed.starts_with("http:///") || trimmed.starts_with("https:///") {
        return None;
    }

    let url = Url::parse(trimmed).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?;
    if host.is_empty() || host.starts_with('.') || host == "undefined" || host == "null" {
        return None;
    }

    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "CONSULAR_API__BASE_URL",
            "CONSULAR_API__REQUEST_TIMEOUT_SECS",
            "CONSULAR_LOGGING__LEVEL",
            "CONSULAR_LOGGING__FORMAT",
            "CONSULAR_STORAGE__KEY",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env();

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.api.refresh_path, "/auth/refresh/");
        assert_eq!(config.storage.key, "embassy-auth");
        assert_eq!(config.routes.login, "/login");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    #[serial]
    fn test_config_env_override() {
        clear_env();
        std::env::set_var("CONSULAR_API__BASE_URL", "https://consulat.example/api");
        std::env::set_var("CONSULAR_API__REQUEST_TIMEOUT_SECS", "10");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.api.base_url, "https://consulat.example/api");
        assert_eq!(config.api.request_timeout_secs, 10);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_validation_invalid_log_level() {
        clear_env();
        std::env::set_var("CONSULAR_LOGGING__LEVEL", "verbose");

        assert!(ClientConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_validation_timeout_out_of_range() {
        clear_env();
        std::env::set_var("CONSULAR_API__REQUEST_TIMEOUT_SECS", "0");

        assert!(ClientConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    fn test_validate_base_url() {
        assert!(validate_base_url("https://consulat.example/api").is_some());
        assert!(validate_base_url("  http://192.168.1.20:8000/api ").is_some());
        assert!(validate_base_url("http:///api").is_none());
        assert!(validate_base_url("https:///api").is_none());
        assert!(validate_base_url("ftp://consulat.example").is_none());
        assert!(validate_base_url("http://undefined/api").is_none());
        assert!(validate_base_url("").is_none());
        assert!(validate_base_url("/api").is_none());
    }

    #[test]
    fn test_resolved_base_url_falls_back() {
        let api = ApiConfig {
            base_url: "http:///api".to_string(),
            request_timeout_secs: 30,
            refresh_path: "/auth/refresh/".to_string(),
        };
        assert_eq!(api.resolved_base_url().unwrap().as_str(), DEFAULT_API_BASE_URL);
    }
}
