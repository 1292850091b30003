//! 申请接口（`/applications/...`）

use crate::{
    api::{ApiClient, ApiRequest},
    auth::policy,
    error::{ClientError, ClientResult},
    models::{application::*, user::Role},
};
use std::sync::Arc;

pub struct ApplicationRepository {
    api: Arc<ApiClient>,
}

impl ApplicationRepository {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> ClientResult<Vec<Application>> {
        self.api.list(ApiRequest::get("/applications/")).await
    }

    pub async fn get(&self, id: i64) -> ClientResult<Application> {
        self.api.get_json(&format!("/applications/{}/", id)).await
    }

    /// 创建申请；角色无权创建时不发请求
    pub async fn create(
        &self,
        role: Option<Role>,
        req: &CreateApplicationRequest,
    ) -> ClientResult<Application> {
        if !policy::can_create_applications(role) {
            tracing::debug!(role = ?role, "Application creation not permitted for role");
            return Err(ClientError::Forbidden);
        }

        let request = ApiRequest::post("/applications/").json(req)?;
        self.api.send_json(request).await
    }

    /// 提交草稿
    pub async fn submit(&self, id: i64) -> ClientResult<()> {
        self.api
            .send_empty(ApiRequest::post(format!("/applications/{}/submit/", id)))
            .await
    }

    pub async fn cancel(&self, id: i64, req: &CancelApplicationRequest) -> ClientResult<()> {
        let request = ApiRequest::post(format!("/applications/{}/cancel/", id)).json(req)?;
        self.api.send_empty(request).await
    }

    pub async fn update_status(
        &self,
        id: i64,
        req: &UpdateApplicationStatusRequest,
    ) -> ClientResult<()> {
        let request =
            ApiRequest::post(format!("/applications/{}/update_status/", id)).json(req)?;
        self.api.send_empty(request).await
    }

    pub async fn drafts(&self) -> ClientResult<Vec<Application>> {
        self.api.list(ApiRequest::get("/applications/drafts/")).await
    }

    pub async fn in_progress(&self) -> ClientResult<Vec<Application>> {
        self.api.list(ApiRequest::get("/applications/in_progress/")).await
    }

    pub async fn completed(&self) -> ClientResult<Vec<Application>> {
        self.api.list(ApiRequest::get("/applications/completed/")).await
    }

    /// 通知申请人补交材料
    pub async fn request_missing_documents(
        &self,
        id: i64,
        req: &MissingDocumentsRequest,
    ) -> ClientResult<()> {
        let request =
            ApiRequest::post(format!("/applications/{}/request_missing_documents/", id)).json(req)?;
        self.api.send_empty(request).await
    }
}
