//! 领事申请模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 申请状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    InfoRequired,
    PaymentPending,
    PaymentReceived,
    Processing,
    Ready,
    Completed,
    Rejected,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// 进度条的线性顺序
const TRACKER_ORDER: [ApplicationStatus; 8] = [
    ApplicationStatus::Submitted,
    ApplicationStatus::UnderReview,
    ApplicationStatus::InfoRequired,
    ApplicationStatus::PaymentPending,
    ApplicationStatus::PaymentReceived,
    ApplicationStatus::Processing,
    ApplicationStatus::Ready,
    ApplicationStatus::Completed,
];

impl ApplicationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "Brouillon",
            ApplicationStatus::Submitted => "Soumis",
            ApplicationStatus::UnderReview => "En cours de vérification",
            ApplicationStatus::InfoRequired => "Informations supplémentaires requises",
            ApplicationStatus::PaymentPending => "En attente de paiement",
            ApplicationStatus::PaymentReceived => "Paiement reçu",
            ApplicationStatus::Processing => "En traitement",
            ApplicationStatus::Ready => "Prêt pour retrait",
            ApplicationStatus::Completed => "Terminé",
            ApplicationStatus::Rejected => "Rejeté",
            ApplicationStatus::Cancelled => "Annulé",
            ApplicationStatus::Unknown => "Inconnu",
        }
    }

    /// 在进度条中的位置；草稿、拒绝、取消不在进度条上
    pub fn progress_step(&self) -> Option<usize> {
        TRACKER_ORDER.iter().position(|s| s == self)
    }

    /// 进度百分比（0-100）
    pub fn progress_percent(&self) -> Option<u8> {
        let step = self.progress_step()?;
        let last = TRACKER_ORDER.len() - 1;
        Some(((step * 100) / last) as u8)
    }

    /// 终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Completed | ApplicationStatus::Rejected | ApplicationStatus::Cancelled
        )
    }

    /// 仅草稿可以提交
    pub fn can_submit(&self) -> bool {
        matches!(self, ApplicationStatus::Draft)
    }
}

/// 申请类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationType {
    #[serde(rename = "VISA")]
    Visa,
    #[serde(rename = "PASSPORT")]
    Passport,
    #[serde(rename = "PASSPORT_RENEWAL")]
    PassportRenewal,
    #[serde(rename = "BIRTH_CERT")]
    BirthCertificate,
    #[serde(rename = "MARRIAGE_CERT")]
    MarriageCertificate,
    #[serde(rename = "LEGALIZATION")]
    Legalization,
    #[serde(rename = "ATTESTATION")]
    Attestation,
    #[serde(rename = "OTHER", other)]
    Other,
}

/// 申请（服务端记录）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    #[serde(default)]
    pub reference_number: Option<String>,
    pub application_type: ApplicationType,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub status_display: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Application {
    /// 优先使用服务端的本地化状态名
    pub fn status_text(&self) -> &str {
        self.status_display
            .as_deref()
            .unwrap_or_else(|| self.status.label())
    }
}

/// 创建申请请求
#[derive(Debug, Clone, Serialize)]
pub struct CreateApplicationRequest {
    pub application_type: ApplicationType,
    pub service_type: i64,
    pub office: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant_notes: Option<String>,
    /// 按服务类型变化的表单数据
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_data: Option<Value>,
}

/// 取消申请请求
#[derive(Debug, Clone, Default, Serialize)]
pub struct CancelApplicationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// 更新申请状态请求（工作人员）
#[derive(Debug, Clone, Serialize)]
pub struct UpdateApplicationStatusRequest {
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// 要求申请人补交材料（工作人员）
#[derive(Debug, Clone, Default, Serialize)]
pub struct MissingDocumentsRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_documents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
