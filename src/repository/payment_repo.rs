//! 支付接口（`/payments/...`）
//!
//! 只覆盖支付记录的查询与创建；第三方支付意图与收据下载不在客户端范围内。

use crate::{
    api::{ApiClient, ApiRequest},
    auth::policy,
    error::{ClientError, ClientResult},
    models::{payment::*, user::Role},
};
use std::sync::Arc;

pub struct PaymentRepository {
    api: Arc<ApiClient>,
}

impl PaymentRepository {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// 支付记录（服务端按用户过滤）
    pub async fn list(&self, role: Option<Role>) -> ClientResult<Vec<Payment>> {
        ensure_payments(role)?;
        self.api.list(ApiRequest::get("/payments/")).await
    }

    pub async fn create(
        &self,
        role: Option<Role>,
        req: &CreatePaymentRequest,
    ) -> ClientResult<Payment> {
        ensure_payments(role)?;
        let request = ApiRequest::post("/payments/").json(req)?;
        self.api.send_json(request).await
    }
}

fn ensure_payments(role: Option<Role>) -> ClientResult<()> {
    if !policy::can_view_payments(role) {
        tracing::debug!(role = ?role, "Payments not permitted for role");
        return Err(ClientError::Forbidden);
    }
    Ok(())
}
