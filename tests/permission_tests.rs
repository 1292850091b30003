//! 角色权限与路由守卫测试

mod common;

use consular_client::{
    auth::{policy, SessionStore},
    models::Role,
    services::{create_affordance, guard, Affordance, CreateAction, RouteDecision},
};
use std::collections::HashSet;

fn session_for(role: &str, is_active: bool) -> SessionStore {
    let store = SessionStore::in_memory();
    let mut user = common::user(1, role);
    user.is_active = is_active;
    store.set_auth(user, "access".to_string(), None);
    store
}

fn redirect(route: &str) -> RouteDecision {
    RouteDecision::Redirect(route.to_string())
}

// ==================== 能力表 ====================

#[test]
fn test_every_role_has_distinct_landing_route() {
    let routes: HashSet<&str> = Role::ALL
        .iter()
        .map(|r| policy::default_route(Some(*r)))
        .collect();
    assert_eq!(routes.len(), Role::ALL.len());

    assert_eq!(policy::default_route(Some(Role::Citizen)), "/dashboard");
    assert_eq!(policy::default_route(Some(Role::AgentRdv)), "/appointments");
    assert_eq!(policy::default_route(Some(Role::AgentConsulaire)), "/applications");
    assert_eq!(policy::default_route(Some(Role::Vigile)), "/vigile");
    assert_eq!(policy::default_route(Some(Role::Admin)), "/admin");
    assert_eq!(policy::default_route(Some(Role::SuperAdmin)), "/admin/users");
    assert_eq!(policy::default_route(None), "/");
}

#[test]
fn test_landing_route_is_always_accessible() {
    for role in Role::ALL {
        let landing = policy::default_route(Some(role));
        assert!(
            policy::can_access_route(Some(role), landing),
            "{} cannot reach {}",
            role,
            landing
        );
    }
}

#[test]
fn test_anonymous_has_no_capabilities() {
    assert!(!policy::can_create_applications(None));
    assert!(!policy::can_create_appointments(None));
    assert!(!policy::can_access_admin(None));
    assert!(!policy::can_access_vigile(None));
    assert!(!policy::can_view_payments(None));
    assert_eq!(policy::role_display_name(None), "Utilisateur");
    assert!(!policy::can_access_route(None, "/dashboard"));
}

#[test]
fn test_feature_flags() {
    assert!(policy::can_create_applications(Some(Role::Citizen)));
    assert!(!policy::can_create_applications(Some(Role::AgentRdv)));
    assert!(policy::can_create_applications(Some(Role::AgentConsulaire)));
    assert!(!policy::can_create_appointments(Some(Role::Vigile)));

    assert!(policy::can_access_admin(Some(Role::SuperAdmin)));
    assert!(!policy::can_access_admin(Some(Role::AgentConsulaire)));
    assert!(policy::can_access_vigile(Some(Role::Admin)));
    assert!(!policy::can_view_payments(Some(Role::AgentRdv)));
}

#[test]
fn test_public_routes() {
    for path in ["/", "/login", "/register", "/verify-email", "/faq", "/announcements"] {
        assert!(policy::is_public_route(path), "{} should be public", path);
    }
    assert!(policy::is_public_route("/faq/?category=visa"));
    assert!(!policy::is_public_route("/dashboard"));
    assert!(!policy::is_public_route("/admin"));
}

#[test]
fn test_parameterized_routes() {
    assert!(policy::can_access_route(Some(Role::Citizen), "/applications/42"));
    assert!(policy::can_access_route(Some(Role::Citizen), "/payments/create/42/"));
    assert!(!policy::can_access_route(Some(Role::Citizen), "/applications/42/edit"));
    assert!(policy::can_access_route(Some(Role::Admin), "/admin/applications/7"));
    assert!(!policy::can_access_route(Some(Role::Vigile), "/applications/7"));
}

#[test]
fn test_admin_scanner_is_not_allowed() {
    // 管理员可以查看今日安保，但不能扫码
    assert!(policy::can_access_route(Some(Role::Admin), "/security/today"));
    assert!(!policy::can_access_route(Some(Role::Admin), "/security/scanner"));
    assert!(policy::can_access_route(Some(Role::Vigile), "/security/scanner"));
}

// ==================== 路由守卫 ====================

#[test]
fn test_guard_anonymous() {
    let store = SessionStore::in_memory();
    let session = store.snapshot();

    assert_eq!(guard(&session, "/"), RouteDecision::Allow);
    assert_eq!(guard(&session, "/login"), RouteDecision::Allow);
    assert_eq!(guard(&session, "/dashboard"), redirect("/login"));
    assert_eq!(guard(&session, "/inactive-account"), redirect("/login"));
}

#[test]
fn test_guard_logged_in_user_leaves_login_page() {
    let session = session_for("AGENT_CONSULAIRE", true).snapshot();
    assert_eq!(guard(&session, "/login"), redirect("/applications"));
}

#[test]
fn test_guard_staff_skip_citizen_pages() {
    let vigile = session_for("VIGILE", true).snapshot();
    assert_eq!(guard(&vigile, "/"), redirect("/vigile"));
    assert_eq!(guard(&vigile, "/services"), redirect("/vigile"));
    assert_eq!(guard(&vigile, "/dashboard"), redirect("/vigile"));

    let citizen = session_for("CITIZEN", true).snapshot();
    assert_eq!(guard(&citizen, "/services"), RouteDecision::Allow);
    assert_eq!(guard(&citizen, "/"), RouteDecision::Allow);
}

#[test]
fn test_guard_disallowed_route_goes_to_landing() {
    let citizen = session_for("CITIZEN", true).snapshot();
    assert_eq!(guard(&citizen, "/admin/users"), redirect("/dashboard"));

    let admin = session_for("ADMIN", true).snapshot();
    assert_eq!(guard(&admin, "/admin/users"), RouteDecision::Allow);
    assert_eq!(guard(&admin, "/dashboard"), redirect("/admin"));
}

#[test]
fn test_guard_inactive_account() {
    let inactive = session_for("CITIZEN", false).snapshot();
    assert_eq!(guard(&inactive, "/dashboard"), redirect("/inactive-account"));
    assert_eq!(guard(&inactive, "/inactive-account"), RouteDecision::Allow);

    let inactive_admin = session_for("SUPERADMIN", false).snapshot();
    assert_eq!(guard(&inactive_admin, "/admin/users"), RouteDecision::Allow);
}

#[test]
fn test_guard_after_logout() {
    let store = session_for("CITIZEN", true);
    assert!(guard(&store.snapshot(), "/dashboard").is_allowed());

    store.logout();
    assert_eq!(guard(&store.snapshot(), "/dashboard"), redirect("/login"));
}

// ==================== 操作入口 ====================

#[test]
fn test_agent_rdv_sees_applications_without_create() {
    let agent = session_for("AGENT_RDV", true).snapshot();

    assert_eq!(guard(&agent, "/applications"), RouteDecision::Allow);
    assert_eq!(
        create_affordance(Some(Role::AgentRdv), CreateAction::Application),
        Affordance::Hidden
    );
    assert_eq!(
        create_affordance(Some(Role::AgentRdv), CreateAction::Appointment),
        Affordance::Enabled
    );
}

#[test]
fn test_affordance_for_anonymous() {
    assert_eq!(
        create_affordance(None, CreateAction::Appointment),
        Affordance::Hidden
    );
    assert_eq!(
        create_affordance(Some(Role::Citizen), CreateAction::Application),
        Affordance::Enabled
    );
}
