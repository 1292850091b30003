//! 认证 API 网关
//!
//! 所有请求都经过 `ApiClient`：附加会话中的访问令牌，遇到 401 时刷新一次令牌并
//! 重放一次，失败时映射为 `ClientError` 并通过 `Notifier` 提示用户。
//! 刷新是单飞的：并发的 401 只会触发一次刷新，其余请求复用新令牌。
//! 请求发出后若会话已切换（登出或换人登录），该请求不再刷新或重放。

use crate::api::notify::{LoggingNavigator, Navigator, Notifier, Toast, TracingNotifier};
use crate::api::transport::{ApiRequest, ApiResponse, HttpTransport, Transport, TransportError};
use crate::auth::policy::LOGIN_ROUTE;
use crate::auth::session::SessionStore;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::auth::{RefreshTokenRequest, RefreshTokenResponse};
use crate::models::common::ListEnvelope;
use crate::telemetry::{
    status_class, METRIC_REQUESTS_TOTAL, METRIC_REQUEST_DURATION_SECONDS,
    METRIC_SESSION_EXPIRED_TOTAL, METRIC_TOKEN_REFRESH_TOTAL,
};
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex as TokioMutex;

/// 默认刷新接口
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh/";
/// 跟随分页链接的页数上限
const MAX_LIST_PAGES: usize = 100;

/// 刷新失败的原因
enum RefreshFailure {
    /// 请求发出后会话已切换
    SessionChanged,
    Failed(String),
}

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: SessionStore,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    refresh_path: String,
    login_route: String,
    /// 串行化刷新
    refresh_lock: TokioMutex<()>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("refresh_path", &self.refresh_path)
            .field("login_route", &self.login_route)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: SessionStore) -> Self {
        Self {
            transport,
            session,
            notifier: Arc::new(TracingNotifier),
            navigator: Arc::new(LoggingNavigator),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            login_route: LOGIN_ROUTE.to_string(),
            refresh_lock: TokioMutex::new(()),
        }
    }

    /// 按配置创建 HTTP 网关
    pub fn from_config(config: &ClientConfig, session: SessionStore) -> ClientResult<Self> {
        let transport = HttpTransport::new(&config.api)?;
        tracing::debug!(base_url = %transport.base_url(), "API gateway configured");

        Ok(Self::new(Arc::new(transport), session)
            .with_refresh_path(config.api.refresh_path.clone())
            .with_login_route(config.routes.login.clone()))
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// 发送请求
    pub async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let (session, generation) = self.session.snapshot_with_generation();
        let token = request
            .bearer
            .clone()
            .or_else(|| session.access_token().map(str::to_string));

        let response = match self.dispatch(&request, token.as_deref()).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(&request, e.into())),
        };

        if response.is_success() {
            return Ok(response);
        }

        if response.status == StatusCode::UNAUTHORIZED && request.allow_refresh && !request.retried
        {
            return self
                .refresh_and_replay(&request, token.as_deref(), generation)
                .await;
        }

        let error = ClientError::from_status(response.status, &response.body);
        Err(self.fail(&request, error))
    }

    /// 发送请求并解析响应体
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        let silent = request.silent;
        let path = request.path.clone();
        let response = self.send(request).await?;
        response.json().map_err(|e| {
            tracing::warn!(path = %path, error = %e, "Unexpected response body");
            if !silent {
                self.notifier.notify(Toast::from_error(&e));
            }
            e
        })
    }

    /// 发送请求并忽略响应体
    pub async fn send_empty(&self, request: ApiRequest) -> ClientResult<()> {
        self.send(request).await.map(|_| ())
    }

    /// 列表接口（兼容裸数组与分页封装）；分页时沿 `next` 链接取完所有页
    pub async fn list<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<Vec<T>> {
        let silent = request.silent;
        let path = request.path.clone();

        let envelope: ListEnvelope<T> = self.send_json(request).await?;
        let total = envelope.total();
        let (mut items, mut next) = envelope.into_page();
        let mut pages = 1;

        while let Some(url) = next.take() {
            if pages >= MAX_LIST_PAGES {
                tracing::warn!(path = %path, pages, "Too many list pages, stopping");
                break;
            }
            let mut page_request = ApiRequest::get(url);
            if silent {
                page_request = page_request.silent();
            }
            let envelope: ListEnvelope<T> = self.send_json(page_request).await?;
            let (page, following) = envelope.into_page();
            items.extend(page);
            next = following;
            pages += 1;
        }

        if pages > 1 {
            tracing::debug!(path = %path, pages, total, fetched = items.len(), "Fetched paginated list");
        }
        Ok(items)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send_json(ApiRequest::get(path)).await
    }

    /// 直接用刷新令牌换取新的访问令牌，不经过会话，也不弹出提示
    pub async fn exchange_refresh_token(&self, refresh: &str) -> ClientResult<RefreshTokenResponse> {
        let request = ApiRequest::post(self.refresh_path.as_str())
            .json(&RefreshTokenRequest {
                refresh: refresh.to_string(),
            })?
            .without_refresh()
            .silent();

        let response = self.dispatch(&request, None).await?;
        if !response.is_success() {
            return Err(ClientError::from_status(response.status, &response.body));
        }
        response.json()
    }

    /// 强制结束会话：登出、跳转登录页并提示（每次会话只提示一次）
    pub fn expire_session(&self, reason: &str) -> ClientError {
        self.expire_generation(self.session.generation(), reason)
    }

    /// 仅结束发起请求的那次会话
    fn expire_generation(&self, generation: u64, reason: &str) -> ClientError {
        if self.session.logout_generation(generation) {
            metrics::counter!(METRIC_SESSION_EXPIRED_TOTAL).increment(1);
            tracing::warn!(reason, "Session expired, logging out");
            self.navigator.navigate(&self.login_route);
            self.notifier
                .notify(Toast::from_error(&ClientError::SessionExpired));
        }
        ClientError::SessionExpired
    }

    async fn refresh_and_replay(
        &self,
        request: &ApiRequest,
        stale_token: Option<&str>,
        generation: u64,
    ) -> ClientResult<ApiResponse> {
        let (session, current) = self.session.snapshot_with_generation();
        if current != generation {
            return Err(self.abandon(request));
        }
        if !session.is_authenticated {
            return Err(self.fail(request, ClientError::Unauthorized));
        }

        let access = match self.refresh_access_token(stale_token, generation).await {
            Ok(access) => access,
            Err(RefreshFailure::SessionChanged) => return Err(self.abandon(request)),
            Err(RefreshFailure::Failed(reason)) => {
                return Err(self.expire_generation(generation, &reason))
            }
        };

        if self.session.generation() != generation {
            return Err(self.abandon(request));
        }

        let replay = request.replay();
        let response = match self.dispatch(&replay, Some(&access)).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(&replay, e.into())),
        };

        if response.is_success() {
            return Ok(response);
        }
        if response.status == StatusCode::UNAUTHORIZED {
            return Err(self.expire_generation(generation, "request rejected after token refresh"));
        }

        let error = ClientError::from_status(response.status, &response.body);
        Err(self.fail(&replay, error))
    }

    /// 获取可用于重放的新访问令牌；同一时刻只有一个刷新在进行
    async fn refresh_access_token(
        &self,
        stale_token: Option<&str>,
        generation: u64,
    ) -> Result<String, RefreshFailure> {
        let _guard = self.refresh_lock.lock().await;

        let (session, current) = self.session.snapshot_with_generation();
        if current != generation {
            return Err(RefreshFailure::SessionChanged);
        }
        if !session.is_authenticated {
            return Err(RefreshFailure::Failed(
                "session ended while waiting for refresh".to_string(),
            ));
        }

        // 其他请求已经刷新过
        if let Some(token) = session.access_token() {
            if Some(token) != stale_token {
                metrics::counter!(METRIC_TOKEN_REFRESH_TOTAL, "outcome" => "reused").increment(1);
                tracing::debug!("Reusing access token refreshed by a concurrent request");
                return Ok(token.to_string());
            }
        }

        let Some(refresh) = session
            .refresh_token
            .as_ref()
            .map(|t| t.expose_secret().clone())
        else {
            metrics::counter!(METRIC_TOKEN_REFRESH_TOTAL, "outcome" => "missing").increment(1);
            return Err(RefreshFailure::Failed("no refresh token".to_string()));
        };

        match self.exchange_refresh_token(&refresh).await {
            Ok(tokens) => {
                metrics::counter!(METRIC_TOKEN_REFRESH_TOTAL, "outcome" => "success").increment(1);
                tracing::info!(rotated = tokens.refresh.is_some(), "Access token refreshed");
                if !self
                    .session
                    .replace_tokens_for(generation, tokens.access.clone(), tokens.refresh)
                {
                    return Err(RefreshFailure::SessionChanged);
                }
                Ok(tokens.access)
            }
            Err(e) => {
                metrics::counter!(METRIC_TOKEN_REFRESH_TOTAL, "outcome" => "failure").increment(1);
                tracing::warn!(error = %e, "Token refresh failed");
                Err(RefreshFailure::Failed(format!("token refresh failed: {}", e)))
            }
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<ApiResponse, TransportError> {
        let method = request.method.as_str().to_string();
        tracing::debug!(
            request_id = %request.request_id,
            method = %method,
            path = %request.path,
            retried = request.retried,
            "Sending API request"
        );

        let started = Instant::now();
        let result = self.transport.execute(request, token).await;
        let elapsed = started.elapsed();

        let status = match &result {
            Ok(response) => status_class(response.status.as_u16()),
            Err(_) => "network",
        };
        metrics::counter!(METRIC_REQUESTS_TOTAL, "method" => method.clone(), "status" => status)
            .increment(1);
        metrics::histogram!(METRIC_REQUEST_DURATION_SECONDS).record(elapsed.as_secs_f64());

        match &result {
            Ok(response) => tracing::debug!(
                request_id = %request.request_id,
                status = response.status.as_u16(),
                elapsed_ms = elapsed.as_millis() as u64,
                "API response received"
            ),
            Err(e) => tracing::warn!(
                request_id = %request.request_id,
                method = %method,
                path = %request.path,
                error = %e,
                "API request got no response"
            ),
        }

        result
    }

    /// 会话已切换：放弃重放，不登出新会话也不提示
    fn abandon(&self, request: &ApiRequest) -> ClientError {
        metrics::counter!(METRIC_TOKEN_REFRESH_TOTAL, "outcome" => "abandoned").increment(1);
        tracing::info!(
            request_id = %request.request_id,
            path = %request.path,
            "Session changed while request was in flight, not replaying"
        );
        ClientError::SessionExpired
    }

    fn fail(&self, request: &ApiRequest, error: ClientError) -> ClientError {
        tracing::debug!(
            request_id = %request.request_id,
            path = %request.path,
            error = %error,
            "API request failed"
        );
        if !request.silent {
            self.notifier.notify(Toast::from_error(&error));
        }
        error
    }
}
