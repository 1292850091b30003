//! 支付记录模型
//!
//! 金额由服务端以十进制字符串返回（如 `"15000.00"`），这里原样保留。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Refunded,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "En attente",
            PaymentStatus::Processing => "En cours",
            PaymentStatus::Completed => "Terminé",
            PaymentStatus::Failed => "Échoué",
            PaymentStatus::Cancelled => "Annulé",
            PaymentStatus::Refunded => "Remboursé",
            PaymentStatus::Unknown => "Inconnu",
        }
    }
}

/// 支付方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "CARD")]
    Card,
    #[serde(rename = "STRIPE")]
    Stripe,
    #[serde(rename = "ORANGE")]
    OrangeMoney,
    #[serde(rename = "WAVE")]
    Wave,
    #[serde(rename = "TRANSFER")]
    BankTransfer,
    #[serde(rename = "CASH")]
    Cash,
    #[serde(rename = "OTHER")]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub application: i64,
    #[serde(default)]
    pub application_reference: Option<String>,
    #[serde(deserialize_with = "decimal_string")]
    pub amount: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    #[serde(default)]
    pub receipt_number: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Payment {
    pub fn is_successful(&self) -> bool {
        self.status == PaymentStatus::Completed
    }
}

/// 为申请发起支付
#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentRequest {
    pub application: i64,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_currency() -> String {
    "XOF".to_string()
}

/// 兼容字符串与数字两种金额写法
fn decimal_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected decimal amount, got {}",
            other
        ))),
    }
}
