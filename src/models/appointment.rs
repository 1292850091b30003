//! 预约模型

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 预约状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    CheckedIn,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
    #[serde(other)]
    Unknown,
}

impl AppointmentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "En attente",
            AppointmentStatus::Confirmed => "Confirmé",
            AppointmentStatus::CheckedIn => "Enregistré",
            AppointmentStatus::InProgress => "En cours",
            AppointmentStatus::Completed => "Terminé",
            AppointmentStatus::Cancelled => "Annulé",
            AppointmentStatus::NoShow => "Absent",
            AppointmentStatus::Unknown => "Inconnu",
        }
    }

    /// 是否仍可取消
    pub fn is_cancellable(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

/// 预约（服务端记录）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    #[serde(default)]
    pub reference_number: Option<String>,
    pub appointment_date: NaiveDate,
    #[serde(default)]
    pub appointment_time: Option<NaiveTime>,
    pub status: AppointmentStatus,
    /// 预约人：可能是嵌套对象，也可能只是 id
    #[serde(default)]
    pub user: Option<Value>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Appointment {
    /// 预约人 id
    pub fn user_id(&self) -> Option<i64> {
        match self.user.as_ref()? {
            Value::Number(n) => n.as_i64(),
            Value::Object(obj) => obj.get("id").and_then(Value::as_i64),
            _ => None,
        }
    }
}

/// 创建预约请求
#[derive(Debug, Clone, Serialize)]
pub struct CreateAppointmentRequest {
    pub office: i64,
    pub service_type: i64,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_notes: Option<String>,
}

/// 更新预约状态请求
#[derive(Debug, Clone, Serialize)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appointment_deserialize_keeps_extra_fields() {
        let json = r#"{
            "id": 12,
            "reference_number": "RDV-2025-0012",
            "appointment_date": "2025-03-14",
            "appointment_time": "09:30:00",
            "status": "CHECKED_IN",
            "user": {"id": 4, "email": "a@b.com"},
            "created_at": "2025-03-01T08:00:00Z",
            "office_name": "Consulat de Lyon"
        }"#;
        let apt: Appointment = serde_json::from_str(json).unwrap();
        assert_eq!(apt.status, AppointmentStatus::CheckedIn);
        assert_eq!(apt.user_id(), Some(4));
        assert_eq!(apt.extra.get("office_name").and_then(Value::as_str), Some("Consulat de Lyon"));
    }

    #[test]
    fn test_unknown_status_is_tolerated() {
        let status: AppointmentStatus = serde_json::from_str("\"RESCHEDULED\"").unwrap();
        assert_eq!(status, AppointmentStatus::Unknown);
    }

    #[test]
    fn test_user_id_from_plain_number() {
        let json = r#"{"id": 1, "appointment_date": "2025-03-14", "status": "PENDING", "user": 9, "created_at": "2025-03-01T08:00:00+01:00"}"#;
        let apt: Appointment = serde_json::from_str(json).unwrap();
        assert_eq!(apt.user_id(), Some(9));
        assert!(apt.status.is_cancellable());
    }
}
