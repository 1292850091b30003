//! 认证接口（`/auth/...`）

use crate::{
    api::{ApiClient, ApiRequest},
    error::ClientResult,
    models::{auth::*, user::*},
};
use serde_json::Value;
use std::sync::Arc;

pub struct AuthRepository {
    api: Arc<ApiClient>,
}

impl AuthRepository {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// 登录（401 表示凭据错误，不走刷新流程）
    pub async fn login(&self, req: &LoginRequest) -> ClientResult<LoginResponse> {
        let request = ApiRequest::post("/auth/login/").json(req)?.without_refresh();
        self.api.send_json(request).await
    }

    /// 注册
    pub async fn register(&self, req: &RegisterRequest) -> ClientResult<RegisterResponse> {
        let request = ApiRequest::post("/auth/register/").json(req)?.without_refresh();
        self.api.send_json(request).await
    }

    /// 邮箱验证
    pub async fn verify_email(&self, req: &VerifyEmailRequest) -> ClientResult<MessageResponse> {
        let request = ApiRequest::post("/auth/verify-email/")
            .json(req)?
            .without_refresh();
        self.send_message(request).await
    }

    /// 重新发送验证码
    pub async fn resend_code(&self, req: &ResendCodeRequest) -> ClientResult<MessageResponse> {
        let request = ApiRequest::post("/auth/resend-code/")
            .json(req)?
            .without_refresh();
        self.send_message(request).await
    }

    /// 当前用户资料（含 profile）
    pub async fn get_profile(&self) -> ClientResult<User> {
        self.api.get_json("/auth/profile/").await
    }

    /// 更新资料；服务端只返回 profile 部分
    pub async fn update_profile(&self, req: &UpdateProfileRequest) -> ClientResult<Value> {
        let request = ApiRequest::put("/auth/profile/").json(req)?;
        self.api.send_json(request).await
    }

    /// 用指定令牌校验会话（启动恢复时使用：静默，不刷新）
    pub async fn user_info(&self, token: &str) -> ClientResult<User> {
        let request = ApiRequest::get("/auth/user-info/")
            .bearer(token)
            .without_refresh()
            .silent();
        self.api.send_json(request).await
    }

    /// 修改密码
    pub async fn change_password(&self, req: &ChangePasswordRequest) -> ClientResult<MessageResponse> {
        let request = ApiRequest::post("/auth/password/change/").json(req)?;
        self.send_message(request).await
    }

    /// 消息类响应可能为空
    async fn send_message(&self, request: ApiRequest) -> ClientResult<MessageResponse> {
        let response: Option<MessageResponse> = self.api.send_json(request).await?;
        Ok(response.unwrap_or_default())
    }
}
