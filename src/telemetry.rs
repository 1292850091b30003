//! 日志与指标
//! 初始化结构化日志，并集中定义客户端指标名称

use crate::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 请求计数（标签：method, status）
pub const METRIC_REQUESTS_TOTAL: &str = "consular_client_requests_total";
/// 请求耗时（秒）
pub const METRIC_REQUEST_DURATION_SECONDS: &str = "consular_client_request_duration_seconds";
/// 令牌刷新计数（标签：outcome）
pub const METRIC_TOKEN_REFRESH_TOTAL: &str = "consular_client_token_refresh_total";
/// 会话过期（强制登出）计数
pub const METRIC_SESSION_EXPIRED_TOTAL: &str = "consular_client_session_expired_total";

/// 初始化日志与追踪系统
pub fn init_telemetry(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let log_layer = match config.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .boxed(),
        "pretty" => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer().with_target(false).boxed(),
    };

    // 重复初始化（例如测试中）时忽略错误
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(log_layer)
        .try_init();

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        level = %config.level,
        format = %config.format,
        "Telemetry initialized"
    );
}

/// 按状态码归类，避免指标标签基数过高
pub fn status_class(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        401 => "401",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}
