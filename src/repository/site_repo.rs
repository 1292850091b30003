//! 站点接口：设置、反馈与后台统计（`/core/...`）

use crate::{
    api::{ApiClient, ApiRequest},
    auth::policy,
    error::{ClientError, ClientResult},
    models::{site::*, user::Role},
};
use std::sync::Arc;
use validator::Validate;

/// 站点设置是单例，更新总是针对 id 1
const SETTINGS_PATH: &str = "/core/site-settings/1/";

pub struct SiteRepository {
    api: Arc<ApiClient>,
}

impl SiteRepository {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// 公开的功能开关，未登录也可读取
    pub async fn public_settings(&self) -> ClientResult<SiteSettings> {
        self.api.get_json("/core/site-settings/public/").await
    }

    pub async fn settings(&self, role: Option<Role>) -> ClientResult<SiteSettings> {
        ensure_admin(role)?;
        self.api.get_json("/core/site-settings/").await
    }

    pub async fn update_settings(
        &self,
        role: Option<Role>,
        update: &SiteSettingsUpdate,
    ) -> ClientResult<SiteSettings> {
        ensure_admin(role)?;
        let request = ApiRequest::patch(SETTINGS_PATH).json(update)?;
        self.api.send_json(request).await
    }

    /// 提交页面反馈；本地校验失败时不发请求
    pub async fn submit_feedback(&self, req: &FeedbackRequest) -> ClientResult<()> {
        req.validate()?;
        let request = ApiRequest::post("/core/feedback/").json(req)?;
        self.api.send_empty(request).await
    }

    /// 全站统计（管理员）
    pub async fn statistics(&self, role: Option<Role>) -> ClientResult<ServerStatistics> {
        ensure_admin(role)?;
        self.api
            .get_json("/core/admin/exports/statistics/")
            .await
    }
}

fn ensure_admin(role: Option<Role>) -> ClientResult<()> {
    if !policy::can_access_admin(role) {
        tracing::debug!(role = ?role, "Site administration not permitted for role");
        return Err(ClientError::Forbidden);
    }
    Ok(())
}
