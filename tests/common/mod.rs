//! 测试公共模块
//! 脚本化传输层、记录型提示/跳转钩子与测试数据

#![allow(dead_code)]

use async_trait::async_trait;
use consular_client::{
    api::{ApiClient, ApiRequest, ApiResponse, Navigator, Notifier, Toast, Transport, TransportError},
    auth::{MemoryStorage, SessionStore, SESSION_STORAGE_KEY},
    models::user::User,
};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Handler = Arc<dyn Fn(&ApiRequest, Option<&str>) -> Result<ApiResponse, TransportError> + Send + Sync>;

/// 一次被记录的请求
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub token: Option<String>,
    pub body: Option<Value>,
    pub retried: bool,
}

/// 按 (方法, 路径) 分派到脚本的传输层
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), Handler>>,
    calls: Mutex<Vec<RecordedCall>>,
    latency: Mutex<Option<Duration>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 自定义处理函数
    pub fn route<F>(&self, method: Method, path: &str, handler: F)
    where
        F: Fn(&ApiRequest, Option<&str>) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Arc::new(handler));
    }

    /// 固定响应
    pub fn json(&self, method: Method, path: &str, status: u16, body: Value) {
        let body = body.to_string();
        self.route(method, path, move |_, _| {
            Ok(ApiResponse::new(StatusCode::from_u16(status).unwrap(), body.clone()))
        });
    }

    /// 仅当令牌匹配时成功，否则 401
    pub fn json_for_token(&self, method: Method, path: &str, token: &str, body: Value) {
        let expected = token.to_string();
        let body = body.to_string();
        self.route(method, path, move |_, used| {
            if used == Some(expected.as_str()) {
                Ok(ApiResponse::new(StatusCode::OK, body.clone()))
            } else {
                Ok(unauthorized())
            }
        });
    }

    /// 模拟无响应
    pub fn network_error(&self, method: Method, path: &str) {
        self.route(method, path, |_, _| {
            Err(TransportError::Connect("connection refused".to_string()))
        });
    }

    /// 每个请求的模拟延迟
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<ApiResponse, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method.clone(),
            path: request.path.clone(),
            query: request.query.clone(),
            token: token.map(str::to_string),
            body: request.body.clone(),
            retried: request.retried,
        });

        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let handler = self
            .routes
            .lock()
            .unwrap()
            .get(&(request.method.clone(), request.path.clone()))
            .cloned();

        match handler {
            Some(handler) => handler(request, token),
            None => Ok(ApiResponse::new(
                StatusCode::NOT_FOUND,
                json!({"detail": "Not found."}).to_string(),
            )),
        }
    }
}

pub fn unauthorized() -> ApiResponse {
    ApiResponse::new(
        StatusCode::UNAUTHORIZED,
        json!({"detail": "Given token not valid for any token type"}).to_string(),
    )
}

/// 记录所有提示
#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.toasts().into_iter().map(|t| t.title).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}

/// 记录所有跳转
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

/// 组装好的测试环境
pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
    pub storage: Arc<MemoryStorage>,
    pub session: SessionStore,
    pub api: Arc<ApiClient>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_storage(MemoryStorage::new())
    }

    /// 预置持久化内容
    pub fn with_storage(storage: MemoryStorage) -> Self {
        let transport = Arc::new(MockTransport::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let storage = Arc::new(storage);
        let session = SessionStore::new(storage.clone(), SESSION_STORAGE_KEY);

        let api = ApiClient::new(transport.clone(), session.clone())
            .with_notifier(notifier.clone())
            .with_navigator(navigator.clone());

        Self {
            transport,
            notifier,
            navigator,
            storage,
            session,
            api: Arc::new(api),
        }
    }

    /// 已登录的环境
    pub fn authenticated(role: &str, token: &str, refresh: Option<&str>) -> Self {
        let harness = Self::new();
        harness
            .session
            .set_auth(user(1, role), token.to_string(), refresh.map(str::to_string));
        harness
    }
}

// ===== 测试数据 =====

pub fn user_json(id: i64, role: &str) -> Value {
    json!({
        "id": id,
        "email": format!("user{}@consulat.test", id),
        "first_name": "Awa",
        "last_name": "Diallo",
        "role": role,
        "is_verified": true,
        "is_active": true
    })
}

pub fn user(id: i64, role: &str) -> User {
    serde_json::from_value(user_json(id, role)).unwrap()
}

/// 持久化快照
pub fn persisted_snapshot(user: Value, token: Option<&str>, refresh: Option<&str>) -> String {
    json!({
        "state": {
            "user": user,
            "token": token,
            "refreshToken": refresh,
            "isAuthenticated": token.is_some()
        },
        "version": 0
    })
    .to_string()
}

/// 使用服务端密钥签发的 JWT（客户端不校验签名）
pub fn jwt(exp_offset_secs: i64) -> String {
    let claims = json!({
        "token_type": "access",
        "user_id": 1,
        "exp": chrono::Utc::now().timestamp() + exp_offset_secs,
        "jti": uuid::Uuid::new_v4().to_string(),
    });
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"server-only-signing-key"),
    )
    .unwrap()
}

pub fn appointment_json(id: i64, date: &str, time: Option<&str>, status: &str, user_id: Option<i64>, created_at: &str) -> Value {
    json!({
        "id": id,
        "reference_number": format!("RDV-{:04}", id),
        "appointment_date": date,
        "appointment_time": time,
        "status": status,
        "user": user_id.map(|id| json!({"id": id})),
        "created_at": created_at,
    })
}

pub fn application_json(id: i64, status: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "reference_number": format!("APP-{:04}", id),
        "application_type": "VISA",
        "status": status,
        "created_at": created_at,
    })
}
