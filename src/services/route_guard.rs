//! 路由守卫：根据会话决定放行或重定向

use crate::{
    auth::{
        policy::{
            self, can_access_route, default_route, normalize_path, INACTIVE_ACCOUNT_ROUTE,
            LOGIN_ROUTE,
        },
        session::Session,
    },
    models::user::Role,
};

/// 非公民角色访问这些公共页面时回到各自的落地页
const CITIZEN_FACING_PAGES: &[&str] = &["/", "/services", "/contact", "/faq"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(String),
}

impl RouteDecision {
    fn redirect(route: &str) -> Self {
        RouteDecision::Redirect(route.to_string())
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, RouteDecision::Allow)
    }
}

/// 页面上的"新建"操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateAction {
    Application,
    Appointment,
}

/// 操作入口是否展示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    Enabled,
    Hidden,
}

/// 判断能否进入某个页面
pub fn guard(session: &Session, path: &str) -> RouteDecision {
    let path = normalize_path(path);
    let user = session.user.as_ref().filter(|_| session.is_authenticated);

    if policy::is_public_route(path) {
        if let Some(user) = user {
            let landing = default_route(Some(user.role));
            if path == LOGIN_ROUTE {
                return RouteDecision::redirect(landing);
            }
            if user.role != Role::Citizen && CITIZEN_FACING_PAGES.contains(&path) {
                return RouteDecision::redirect(landing);
            }
        }
        return RouteDecision::Allow;
    }

    let Some(user) = user else {
        return RouteDecision::redirect(LOGIN_ROUTE);
    };

    if path == INACTIVE_ACCOUNT_ROUTE {
        return RouteDecision::Allow;
    }

    // 管理员即使账户未激活也保留访问权限
    if !user.is_active && !user.role.is_admin() {
        return RouteDecision::redirect(INACTIVE_ACCOUNT_ROUTE);
    }

    if !can_access_route(Some(user.role), path) {
        tracing::debug!(path, role = %user.role, "Route not allowed, redirecting to landing route");
        return RouteDecision::redirect(default_route(Some(user.role)));
    }

    RouteDecision::Allow
}

/// 可以查看列表但不一定能新建
pub fn create_affordance(role: Option<Role>, action: CreateAction) -> Affordance {
    let allowed = match action {
        CreateAction::Application => policy::can_create_applications(role),
        CreateAction::Appointment => policy::can_create_appointments(role),
    };
    if allowed {
        Affordance::Enabled
    } else {
        Affordance::Hidden
    }
}
