//! 仪表盘统计测试

mod common;

use chrono::{NaiveDate, NaiveTime};
use common::{application_json, appointment_json, Harness};
use consular_client::{
    error::ClientError,
    models::{application::Application, appointment::Appointment, Role},
    services::{stats_service::most_recent, AdminDashboard, SecurityStats, StatsService},
};
use reqwest::Method;
use serde_json::json;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

fn appointments() -> Vec<Appointment> {
    let raw = json!([
        appointment_json(1, "2025-03-14", Some("09:00:00"), "PENDING", Some(10), "2025-03-01T08:00:00Z"),
        appointment_json(2, "2025-03-14", Some("11:30:00"), "CONFIRMED", Some(11), "2025-03-02T08:00:00Z"),
        appointment_json(3, "2025-03-14", None, "PENDING", Some(10), "2025-03-03T08:00:00Z"),
        appointment_json(4, "2025-03-10", Some("10:00:00"), "COMPLETED", Some(12), "2025-02-20T08:00:00Z"),
        appointment_json(5, "2025-03-20", Some("14:00:00"), "CONFIRMED", None, "2025-03-05T08:00:00Z"),
        appointment_json(6, "2025-02-01", Some("08:00:00"), "NO_SHOW", Some(13), "2025-01-15T08:00:00Z"),
    ]);
    serde_json::from_value(raw).unwrap()
}

fn applications() -> Vec<Application> {
    let raw = json!([
        application_json(1, "SUBMITTED", "2025-03-01T08:00:00Z"),
        application_json(2, "UNDER_REVIEW", "2025-03-09T08:00:00Z"),
        application_json(3, "READY", "2025-02-11T08:00:00Z"),
        application_json(4, "PROCESSING", "2025-03-12T08:00:00Z"),
        application_json(5, "DRAFT", "2024-03-12T08:00:00Z"),
    ]);
    serde_json::from_value(raw).unwrap()
}

// ==================== 管理员统计 ====================

#[test]
fn test_admin_dashboard_counts() {
    let dashboard = AdminDashboard::build(&appointments(), &applications(), today());

    let a = dashboard.appointments;
    assert_eq!(a.total, 6);
    assert_eq!(a.pending, 2);
    assert_eq!(a.confirmed, 2);
    assert_eq!(a.today, 3);
    assert_eq!(a.this_month, 4);

    let p = dashboard.applications;
    assert_eq!(p.total, 5);
    assert_eq!(p.submitted, 1);
    assert_eq!(p.under_review, 1);
    assert_eq!(p.processing, 1);
    assert_eq!(p.ready, 1);
    // 去年同月不算本月
    assert_eq!(p.this_month, 3);
}

#[test]
fn test_most_recent_by_creation_time() {
    let recent = most_recent(&applications(), 2);
    let ids: Vec<i64> = recent.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![4, 2]);

    assert!(most_recent::<Application>(&[], 10).is_empty());
    assert_eq!(most_recent(&appointments(), 10).len(), 6);
}

#[test]
fn test_empty_lists() {
    let dashboard = AdminDashboard::build(&[], &[], today());
    assert_eq!(dashboard.appointments.total, 0);
    assert_eq!(dashboard.applications.this_month, 0);
    assert!(dashboard.recent_appointments.is_empty());
}

// ==================== 安保统计 ====================

#[test]
fn test_security_stats() {
    let stats = SecurityStats::compute(&appointments(), today());

    assert_eq!(stats.today_appointments, 3);
    // 用户 10 当天有两个预约
    assert_eq!(stats.today_visitors, 2);
    assert_eq!(stats.today_pending, 2);
    // 3 月 7 日以后（含已排期）：1-5
    assert_eq!(stats.week_appointments, 5);
    // 无预约人的记录不计入访客
    assert_eq!(stats.week_visitors, 3);
}

#[test]
fn test_security_recent_sorted_by_time() {
    let stats = SecurityStats::compute(&appointments(), today());

    let ids: Vec<i64> = stats.recent.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![2, 1, 3]);
    assert_eq!(
        stats.recent[0].appointment_time,
        NaiveTime::from_hms_opt(11, 30, 0)
    );
}

// ==================== 服务层 ====================

#[tokio::test]
async fn test_admin_dashboard_fetches_both_lists() {
    let h = Harness::authenticated("ADMIN", "access-1", None);
    h.transport.json(
        Method::GET,
        "/appointments/",
        200,
        json!({"count": 1, "next": null, "previous": null, "results": [
            appointment_json(1, "2025-03-14", None, "PENDING", Some(1), "2025-03-01T08:00:00Z")
        ]}),
    );
    h.transport.json(
        Method::GET,
        "/applications/",
        200,
        json!([application_json(1, "SUBMITTED", "2025-03-01T08:00:00Z")]),
    );

    let dashboard = StatsService::new(h.api.clone())
        .admin_dashboard(Some(Role::Admin), today())
        .await
        .unwrap();

    assert_eq!(dashboard.appointments.today, 1);
    assert_eq!(dashboard.applications.submitted, 1);
    assert_eq!(h.transport.calls().len(), 2);
}

#[tokio::test]
async fn test_dashboards_forbidden_for_other_roles() {
    let h = Harness::authenticated("CITIZEN", "access-1", None);
    let stats = StatsService::new(h.api.clone());

    let admin = stats.admin_dashboard(Some(Role::Citizen), today()).await;
    assert!(matches!(admin, Err(ClientError::Forbidden)));

    let security = stats.security_dashboard(Some(Role::AgentRdv), today()).await;
    assert!(matches!(security, Err(ClientError::Forbidden)));

    assert!(h.transport.calls().is_empty());
}

#[tokio::test]
async fn test_security_dashboard_for_vigile() {
    let h = Harness::authenticated("VIGILE", "access-1", None);
    h.transport.json(
        Method::GET,
        "/appointments/",
        200,
        json!([
            appointment_json(1, "2025-03-14", Some("09:00:00"), "CHECKED_IN", Some(1), "2025-03-01T08:00:00Z"),
            appointment_json(2, "2025-03-14", Some("10:00:00"), "PENDING", Some(2), "2025-03-01T08:00:00Z"),
        ]),
    );

    let stats = StatsService::new(h.api.clone())
        .security_dashboard(Some(Role::Vigile), today())
        .await
        .unwrap();

    assert_eq!(stats.today_appointments, 2);
    assert_eq!(stats.today_pending, 1);
}

#[tokio::test]
async fn test_dashboard_failure_propagates() {
    let h = Harness::authenticated("SUPERADMIN", "access-1", None);
    h.transport
        .json(Method::GET, "/appointments/", 200, json!([]));
    h.transport
        .json(Method::GET, "/applications/", 500, json!({}));

    let result = StatsService::new(h.api.clone())
        .admin_dashboard(Some(Role::SuperAdmin), today())
        .await;

    assert!(matches!(result, Err(ClientError::Server(500))));
    assert_eq!(h.notifier.titles(), vec!["Erreur serveur".to_string()]);
}
