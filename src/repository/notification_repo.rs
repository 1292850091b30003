//! 站内通知接口（`/notifications/notifications/...`）

use crate::{
    api::{ApiClient, ApiRequest},
    error::ClientResult,
    models::notification::*,
};
use std::sync::Arc;

const BASE: &str = "/notifications/notifications";

pub struct NotificationRepository {
    api: Arc<ApiClient>,
}

impl NotificationRepository {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> ClientResult<Vec<Notification>> {
        self.api.list(ApiRequest::get(format!("{}/", BASE))).await
    }

    pub async fn mark_as_read(&self, id: i64) -> ClientResult<()> {
        self.api
            .send_empty(ApiRequest::post(format!("{}/{}/mark_as_read/", BASE, id)))
            .await
    }

    pub async fn mark_all_as_read(&self) -> ClientResult<()> {
        self.api
            .send_empty(ApiRequest::post(format!("{}/mark_all_as_read/", BASE)))
            .await
    }

    /// 未读数量（轮询使用，失败不提示）
    pub async fn unread_count(&self) -> ClientResult<u64> {
        let request = ApiRequest::get(format!("{}/unread_count/", BASE)).silent();
        let count: UnreadCount = self.api.send_json(request).await?;
        Ok(count.count)
    }
}
