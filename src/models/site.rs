//! 站点设置、用户反馈与后台统计

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// 站点开关与停用提示（公开接口与管理接口共用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(default = "enabled")]
    pub registration_enabled: bool,
    #[serde(default)]
    pub registration_message: String,
    #[serde(default = "enabled")]
    pub appointments_enabled: bool,
    #[serde(default)]
    pub appointments_message: String,
    #[serde(default = "enabled")]
    pub applications_enabled: bool,
    #[serde(default)]
    pub applications_message: String,
    #[serde(default = "enabled")]
    pub payments_enabled: bool,
    #[serde(default)]
    pub payments_message: String,
    #[serde(default)]
    pub site_maintenance_mode: bool,
    #[serde(default)]
    pub maintenance_message: String,
}

impl SiteSettings {
    /// 维护模式下所有公开功能都视为关闭
    pub fn registration_open(&self) -> bool {
        self.registration_enabled && !self.site_maintenance_mode
    }

    pub fn appointments_open(&self) -> bool {
        self.appointments_enabled && !self.site_maintenance_mode
    }

    pub fn applications_open(&self) -> bool {
        self.applications_enabled && !self.site_maintenance_mode
    }

    pub fn payments_open(&self) -> bool {
        self.payments_enabled && !self.site_maintenance_mode
    }
}

/// 部分更新；未设置的字段不发送
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteSettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointments_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointments_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applications_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applications_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payments_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payments_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_maintenance_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackRating {
    Positive,
    Negative,
}

/// 页面反馈（匿名用户也可提交）
#[derive(Debug, Clone, Serialize, Validate)]
pub struct FeedbackRequest {
    #[validate(length(min = 1, max = 100))]
    pub page: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub context: Option<String>,
    pub rating: FeedbackRating,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// 服务端汇总的全站统计
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerStatistics {
    #[serde(default)]
    pub appointments: Map<String, Value>,
    #[serde(default)]
    pub applications: Map<String, Value>,
    #[serde(default)]
    pub payments: Map<String, Value>,
    #[serde(default)]
    pub users: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServerStatistics {
    /// 读取某一分组下的计数，如 `count("appointments", "pending")`
    pub fn count(&self, section: &str, key: &str) -> Option<u64> {
        let group = match section {
            "appointments" => &self.appointments,
            "applications" => &self.applications,
            "payments" => &self.payments,
            "users" => &self.users,
            _ => return None,
        };
        group.get(key)?.as_u64()
    }
}

fn enabled() -> bool {
    true
}
