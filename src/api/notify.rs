//! 用户提示与页面跳转钩子
//!
//! 客户端不负责渲染：提示和跳转以数据形式交给调用方注入的实现。

use crate::error::{ClientError, FailureKind};
use std::time::Duration;

const ERROR_TOAST_DURATION: Duration = Duration::from_millis(5000);
const NETWORK_TOAST_DURATION: Duration = Duration::from_millis(6000);
const INFO_TOAST_DURATION: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// 一条短暂显示的提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub title: String,
    pub message: String,
    pub duration: Duration,
}

impl Toast {
    /// 按失败分类生成提示；网络问题使用警告级别并显示更久
    pub fn from_error(error: &ClientError) -> Self {
        let (level, duration) = match error.kind() {
            FailureKind::NetworkUnreachable => (ToastLevel::Warning, NETWORK_TOAST_DURATION),
            _ => (ToastLevel::Error, ERROR_TOAST_DURATION),
        };
        Self {
            level,
            title: error.title().to_string(),
            message: error.user_message(),
            duration,
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            title: title.into(),
            message: message.into(),
            duration: INFO_TOAST_DURATION,
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            title: title.into(),
            message: message.into(),
            duration: INFO_TOAST_DURATION,
        }
    }

    /// "标题: 消息" 形式的单行文本
    pub fn text(&self) -> String {
        format!("{}: {}", self.title, self.message)
    }
}

/// 提示出口
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// 跳转出口
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// 把提示写入日志（命令行与无界面环境）
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Error => tracing::error!(title = %toast.title, "{}", toast.message),
            ToastLevel::Warning => tracing::warn!(title = %toast.title, "{}", toast.message),
            ToastLevel::Info | ToastLevel::Success => {
                tracing::info!(title = %toast.title, "{}", toast.message)
            }
        }
    }
}

/// 只记录跳转目标
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn navigate(&self, route: &str) {
        tracing::info!(route, "Navigation requested");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldErrors;

    #[test]
    fn test_network_toast_is_warning() {
        let toast = Toast::from_error(&ClientError::Network("connection refused".to_string()));
        assert_eq!(toast.level, ToastLevel::Warning);
        assert_eq!(toast.duration, Duration::from_secs(6));
        assert_eq!(toast.title, "Problème de connexion");
    }

    #[test]
    fn test_error_toast_text() {
        let toast = Toast::from_error(&ClientError::BadRequest(FieldErrors::default()));
        assert_eq!(toast.level, ToastLevel::Error);
        assert_eq!(toast.duration, Duration::from_secs(5));
        assert!(toast.text().starts_with("Données invalides: "));
    }
}
