//! 统一错误模型
//! 将 HTTP 状态、传输失败与本地校验失败归一为客户端错误类型

use reqwest::StatusCode;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// 客户端错误类型
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid request: {0}")]
    BadRequest(FieldErrors),

    #[error("Unprocessable request: {0}")]
    Unprocessable(FieldErrors),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Authentication failed")]
    Unauthorized,

    #[error("Session expired")]
    SessionExpired,

    #[error("Access denied")]
    Forbidden,

    #[error("Resource not found")]
    NotFound,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Server error ({0})")]
    Server(u16),

    #[error("Unexpected status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 面向用户的失败分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    Unauthenticated,
    Forbidden,
    NotFound,
    RateLimited,
    ServerError,
    NetworkUnreachable,
    Other,
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// 根据响应状态码与响应体构造错误
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status.as_u16() {
            400 => ClientError::BadRequest(FieldErrors::from_body(body)),
            401 => ClientError::Unauthorized,
            403 => ClientError::Forbidden,
            404 => ClientError::NotFound,
            422 => ClientError::Unprocessable(FieldErrors::from_body(body)),
            429 => ClientError::RateLimitExceeded,
            500 => ClientError::Server(500),
            code => {
                let fields = FieldErrors::from_body(body);
                let message = fields
                    .summary()
                    .map(str::to_string)
                    .or_else(|| status.canonical_reason().map(str::to_string))
                    .unwrap_or_else(|| "Une erreur est survenue".to_string());
                ClientError::Http {
                    status: code,
                    message,
                }
            }
        }
    }

    /// 获取对应的 HTTP 状态码（本地错误没有状态码）
    pub fn status_code(&self) -> Option<StatusCode> {
        let code = match self {
            ClientError::BadRequest(_) => 400,
            ClientError::Unauthorized | ClientError::SessionExpired => 401,
            ClientError::Forbidden => 403,
            ClientError::NotFound => 404,
            ClientError::Unprocessable(_) => 422,
            ClientError::RateLimitExceeded => 429,
            ClientError::Server(code) => *code,
            ClientError::Http { status, .. } => *status,
            _ => return None,
        };
        StatusCode::from_u16(code).ok()
    }

    /// 获取错误码
    pub fn code(&self) -> Option<u16> {
        self.status_code().map(|s| s.as_u16())
    }

    /// 失败分类
    pub fn kind(&self) -> FailureKind {
        match self {
            ClientError::BadRequest(_) | ClientError::Unprocessable(_) | ClientError::Validation(_) => {
                FailureKind::InvalidInput
            }
            ClientError::Unauthorized | ClientError::SessionExpired => FailureKind::Unauthenticated,
            ClientError::Forbidden => FailureKind::Forbidden,
            ClientError::NotFound => FailureKind::NotFound,
            ClientError::RateLimitExceeded => FailureKind::RateLimited,
            ClientError::Server(_) => FailureKind::ServerError,
            ClientError::Http { status, .. } if *status >= 500 => FailureKind::ServerError,
            ClientError::Network(_) => FailureKind::NetworkUnreachable,
            _ => FailureKind::Other,
        }
    }

    /// 通知标题
    pub fn title(&self) -> &'static str {
        match self {
            ClientError::BadRequest(_) | ClientError::Validation(_) => "Données invalides",
            ClientError::Unprocessable(_) => "Validation échouée",
            ClientError::Unauthorized => "Non autorisé",
            ClientError::SessionExpired => "Session expirée",
            ClientError::Forbidden => "Accès refusé",
            ClientError::NotFound => "Non trouvé",
            ClientError::RateLimitExceeded => "Trop de requêtes",
            ClientError::Server(_) => "Erreur serveur",
            ClientError::Network(_) => "Problème de connexion",
            _ => "Erreur",
        }
    }

    /// 获取用户友好的错误消息（不包含传输或解析细节）
    pub fn user_message(&self) -> String {
        match self {
            ClientError::BadRequest(_) => {
                "Les données fournies ne sont pas valides. Vérifiez les champs requis.".to_string()
            }
            ClientError::Unprocessable(_) => {
                "Les données fournies ne respectent pas les règles de validation.".to_string()
            }
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Unauthorized => {
                "Votre session a expiré. Veuillez vous reconnecter.".to_string()
            }
            ClientError::SessionExpired => "Session expirée. Veuillez vous reconnecter.".to_string(),
            ClientError::Forbidden => {
                "Vous n'avez pas les permissions nécessaires pour cette action.".to_string()
            }
            ClientError::NotFound => "La ressource demandée n'a pas été trouvée.".to_string(),
            ClientError::RateLimitExceeded => {
                "Trop de tentatives. Veuillez attendre quelques minutes avant de réessayer."
                    .to_string()
            }
            ClientError::Server(_) => {
                "Erreur interne du serveur. Veuillez réessayer plus tard.".to_string()
            }
            ClientError::Http { message, .. } => message.clone(),
            ClientError::Network(_) => "Impossible de joindre le serveur. Vérifiez votre connexion internet.".to_string(),
            ClientError::Config(_) => "Erreur de configuration".to_string(),
            ClientError::Storage(_) | ClientError::Serialization(_) => {
                "Une erreur est survenue".to_string()
            }
        }
    }

    /// 表单字段错误（仅 400/422）
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ClientError::BadRequest(fields) | ClientError::Unprocessable(fields) => Some(fields),
            _ => None,
        }
    }
}

/// 服务端返回的字段级错误（`{"field": ["message"]}`）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
    summary: Option<String>,
}

impl FieldErrors {
    /// 从响应体解析，无法解析时返回空集合
    pub fn from_body(body: &str) -> Self {
        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
            return Self::default();
        };

        let mut errors = Self::default();
        for (key, value) in map {
            let messages = collect_messages(&value);
            if messages.is_empty() {
                continue;
            }
            match key.as_str() {
                "detail" | "error" | "non_field_errors" => {
                    if errors.summary.is_none() {
                        errors.summary = messages.first().cloned();
                    }
                }
                _ => {
                    errors.fields.insert(key, messages);
                }
            }
        }
        errors
    }

    /// 某个字段的错误消息
    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.summary.is_none()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(summary) = &self.summary {
            return write!(f, "{}", summary);
        }
        let names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        if names.is_empty() {
            write!(f, "no details")
        } else {
            write!(f, "invalid fields: {}", names.join(", "))
        }
    }
}

fn collect_messages(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(collect_messages).collect(),
        Value::Object(map) => map.values().flat_map(collect_messages).collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(e: config::ConfigError) -> Self {
        ClientError::Config(e.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        ClientError::Config(format!("invalid URL: {}", e))
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(e: validator::ValidationErrors) -> Self {
        let errors = e.field_errors();
        let mut fields: Vec<&str> = errors.keys().map(|k| k.as_ref()).collect();
        fields.sort_unstable();
        ClientError::Validation(format!("Champs invalides: {}", fields.join(", ")))
    }
}
