//! 预约接口（`/appointments/...`）

use crate::{
    api::{ApiClient, ApiRequest},
    auth::policy,
    error::{ClientError, ClientResult},
    models::{appointment::*, user::Role},
};
use std::sync::Arc;

pub struct AppointmentRepository {
    api: Arc<ApiClient>,
}

impl AppointmentRepository {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// 列出预约（服务端按角色过滤）
    pub async fn list(&self) -> ClientResult<Vec<Appointment>> {
        self.api.list(ApiRequest::get("/appointments/")).await
    }

    pub async fn get(&self, id: i64) -> ClientResult<Appointment> {
        self.api.get_json(&format!("/appointments/{}/", id)).await
    }

    /// 创建预约；角色无权创建时不发请求
    pub async fn create(
        &self,
        role: Option<Role>,
        req: &CreateAppointmentRequest,
    ) -> ClientResult<Appointment> {
        if !policy::can_create_appointments(role) {
            tracing::debug!(role = ?role, "Appointment creation not permitted for role");
            return Err(ClientError::Forbidden);
        }

        let request = ApiRequest::post("/appointments/").json(req)?;
        self.api.send_json(request).await
    }

    pub async fn cancel(&self, id: i64) -> ClientResult<()> {
        self.api
            .send_empty(ApiRequest::post(format!("/appointments/{}/cancel/", id)))
            .await
    }

    /// 更新预约状态（工作人员）
    pub async fn update_status(&self, id: i64, status: AppointmentStatus) -> ClientResult<()> {
        let request = ApiRequest::post(format!("/appointments/{}/update_status/", id))
            .json(&UpdateAppointmentStatusRequest { status })?;
        self.api.send_empty(request).await
    }

    /// 向预约人发送提醒（工作人员）
    pub async fn send_reminder(&self, id: i64) -> ClientResult<()> {
        self.api
            .send_empty(ApiRequest::post(format!("/appointments/{}/send_reminder/", id)))
            .await
    }

    pub async fn upcoming(&self) -> ClientResult<Vec<Appointment>> {
        self.api.list(ApiRequest::get("/appointments/upcoming/")).await
    }

    pub async fn history(&self) -> ClientResult<Vec<Appointment>> {
        self.api.list(ApiRequest::get("/appointments/history/")).await
    }
}
