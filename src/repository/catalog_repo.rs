//! 参考数据接口（`/core/...`）

use crate::{
    api::{ApiClient, ApiRequest},
    auth::policy,
    error::{ClientError, ClientResult},
    models::{catalog::*, user::Role},
};
use std::sync::Arc;

pub struct CatalogRepository {
    api: Arc<ApiClient>,
}

impl CatalogRepository {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn service_types(&self) -> ClientResult<Vec<ServiceType>> {
        self.api.list(ApiRequest::get("/core/service-types/")).await
    }

    pub async fn service_type(&self, id: i64) -> ClientResult<ServiceType> {
        self.api
            .get_json(&format!("/core/service-types/{}/", id))
            .await
    }

    pub async fn consular_offices(&self) -> ClientResult<Vec<ConsularOffice>> {
        self.api.list(ApiRequest::get("/core/consular-offices/")).await
    }

    pub async fn announcements(&self) -> ClientResult<Vec<Announcement>> {
        self.api.list(ApiRequest::get("/core/announcements/")).await
    }

    pub async fn announcement(&self, id: i64) -> ClientResult<Announcement> {
        self.api
            .get_json(&format!("/core/announcements/{}/", id))
            .await
    }

    /// 发布公告（管理员）
    pub async fn create_announcement(
        &self,
        role: Option<Role>,
        req: &AnnouncementRequest,
    ) -> ClientResult<Announcement> {
        ensure_admin(role)?;
        let request = ApiRequest::post("/core/announcements/").json(req)?;
        self.api.send_json(request).await
    }

    /// 部分更新公告（管理员）
    pub async fn update_announcement(
        &self,
        role: Option<Role>,
        id: i64,
        req: &AnnouncementRequest,
    ) -> ClientResult<Announcement> {
        ensure_admin(role)?;
        let request = ApiRequest::patch(format!("/core/announcements/{}/", id)).json(req)?;
        self.api.send_json(request).await
    }

    pub async fn delete_announcement(&self, role: Option<Role>, id: i64) -> ClientResult<()> {
        ensure_admin(role)?;
        self.api
            .send_empty(ApiRequest::delete(format!("/core/announcements/{}/", id)))
            .await
    }

    /// FAQ，可按分类过滤
    pub async fn faq(&self, category: Option<&str>) -> ClientResult<Vec<FaqEntry>> {
        let mut request = ApiRequest::get("/core/faq/");
        if let Some(category) = category.filter(|c| !c.is_empty()) {
            request = request.query("category", category);
        }
        self.api.list(request).await
    }
}

fn ensure_admin(role: Option<Role>) -> ClientResult<()> {
    if !policy::can_access_admin(role) {
        tracing::debug!(role = ?role, "Announcement management not permitted for role");
        return Err(ClientError::Forbidden);
    }
    Ok(())
}
