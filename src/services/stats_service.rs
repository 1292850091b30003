//! 仪表盘统计：对已获取的列表做客户端聚合

use crate::{
    api::ApiClient,
    auth::policy,
    error::{ClientError, ClientResult},
    models::{
        application::{Application, ApplicationStatus},
        appointment::{Appointment, AppointmentStatus},
        user::Role,
    },
    repository::{ApplicationRepository, AppointmentRepository},
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// 最近记录列表的长度
pub const RECENT_LIMIT: usize = 10;
/// 安保周统计的回溯天数
const WEEK_WINDOW_DAYS: i64 = 7;

/// 带创建时间的记录
pub trait Timestamped {
    fn created_at(&self) -> DateTime<Utc>;
}

impl Timestamped for Appointment {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Timestamped for Application {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppointmentStats {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    /// 预约日期为今天
    pub today: usize,
    /// 本月创建
    pub this_month: usize,
}

impl AppointmentStats {
    pub fn compute(appointments: &[Appointment], today: NaiveDate) -> Self {
        Self {
            total: appointments.len(),
            pending: count_status(appointments, AppointmentStatus::Pending),
            confirmed: count_status(appointments, AppointmentStatus::Confirmed),
            today: appointments
                .iter()
                .filter(|a| a.appointment_date == today)
                .count(),
            this_month: appointments
                .iter()
                .filter(|a| same_month(a.created_at, today))
                .count(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplicationStats {
    pub total: usize,
    pub submitted: usize,
    pub under_review: usize,
    pub processing: usize,
    pub ready: usize,
    pub this_month: usize,
}

impl ApplicationStats {
    pub fn compute(applications: &[Application], today: NaiveDate) -> Self {
        let count = |status: ApplicationStatus| {
            applications.iter().filter(|a| a.status == status).count()
        };
        Self {
            total: applications.len(),
            submitted: count(ApplicationStatus::Submitted),
            under_review: count(ApplicationStatus::UnderReview),
            processing: count(ApplicationStatus::Processing),
            ready: count(ApplicationStatus::Ready),
            this_month: applications
                .iter()
                .filter(|a| same_month(a.created_at, today))
                .count(),
        }
    }
}

/// 安保人员（vigile）仪表盘
#[derive(Debug, Clone, Default)]
pub struct SecurityStats {
    pub today_appointments: usize,
    /// 今天的不同访客数
    pub today_visitors: usize,
    pub today_pending: usize,
    /// 近 7 天（含之后已排期的预约）
    pub week_appointments: usize,
    pub week_visitors: usize,
    /// 今天的预约，按时间倒序，最多 10 条
    pub recent: Vec<Appointment>,
}

impl SecurityStats {
    pub fn compute(appointments: &[Appointment], today: NaiveDate) -> Self {
        let todays: Vec<&Appointment> = appointments
            .iter()
            .filter(|a| a.appointment_date == today)
            .collect();

        let week_start = today - Duration::days(WEEK_WINDOW_DAYS);
        let this_week: Vec<&Appointment> = appointments
            .iter()
            .filter(|a| a.appointment_date >= week_start)
            .collect();

        let mut recent: Vec<Appointment> = todays.iter().map(|a| (*a).clone()).collect();
        // 没有时间的排在最后
        recent.sort_by(|a, b| b.appointment_time.cmp(&a.appointment_time));
        recent.truncate(RECENT_LIMIT);

        Self {
            today_appointments: todays.len(),
            today_visitors: distinct_visitors(&todays),
            today_pending: todays
                .iter()
                .filter(|a| a.status == AppointmentStatus::Pending)
                .count(),
            week_appointments: this_week.len(),
            week_visitors: distinct_visitors(&this_week),
            recent,
        }
    }
}

/// 管理员仪表盘
#[derive(Debug, Clone, Default)]
pub struct AdminDashboard {
    pub appointments: AppointmentStats,
    pub applications: ApplicationStats,
    pub recent_appointments: Vec<Appointment>,
    pub recent_applications: Vec<Application>,
}

impl AdminDashboard {
    pub fn build(appointments: &[Appointment], applications: &[Application], today: NaiveDate) -> Self {
        Self {
            appointments: AppointmentStats::compute(appointments, today),
            applications: ApplicationStats::compute(applications, today),
            recent_appointments: most_recent(appointments, RECENT_LIMIT),
            recent_applications: most_recent(applications, RECENT_LIMIT),
        }
    }
}

/// 按创建时间倒序取前 n 条
pub fn most_recent<T: Timestamped + Clone>(items: &[T], n: usize) -> Vec<T> {
    let mut sorted: Vec<T> = items.to_vec();
    sorted.sort_by_key(|item| std::cmp::Reverse(item.created_at()));
    sorted.truncate(n);
    sorted
}

fn count_status(appointments: &[Appointment], status: AppointmentStatus) -> usize {
    appointments.iter().filter(|a| a.status == status).count()
}

fn same_month(at: DateTime<Utc>, today: NaiveDate) -> bool {
    let date = at.date_naive();
    date.year() == today.year() && date.month() == today.month()
}

/// 预约人去重；没有预约人信息的记录不计入
fn distinct_visitors(appointments: &[&Appointment]) -> usize {
    appointments
        .iter()
        .filter_map(|a| a.user_id())
        .collect::<HashSet<_>>()
        .len()
}

/// 仪表盘数据服务
pub struct StatsService {
    appointments: AppointmentRepository,
    applications: ApplicationRepository,
}

impl StatsService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            appointments: AppointmentRepository::new(api.clone()),
            applications: ApplicationRepository::new(api),
        }
    }

    /// 管理员仪表盘：并发获取预约与申请
    pub async fn admin_dashboard(
        &self,
        role: Option<Role>,
        today: NaiveDate,
    ) -> ClientResult<AdminDashboard> {
        if !policy::can_access_admin(role) {
            return Err(ClientError::Forbidden);
        }

        let (appointments, applications) =
            futures::try_join!(self.appointments.list(), self.applications.list())?;

        tracing::debug!(
            appointments = appointments.len(),
            applications = applications.len(),
            "Admin dashboard data fetched"
        );

        Ok(AdminDashboard::build(&appointments, &applications, today))
    }

    /// 安保仪表盘
    pub async fn security_dashboard(
        &self,
        role: Option<Role>,
        today: NaiveDate,
    ) -> ClientResult<SecurityStats> {
        if !policy::can_access_vigile(role) {
            return Err(ClientError::Forbidden);
        }

        let appointments = self.appointments.list().await?;
        Ok(SecurityStats::compute(&appointments, today))
    }
}
