//! 角色权限策略
//!
//! 每个角色对应一行静态能力表：登录后的落地路由、可访问的路由模式以及
//! 功能开关。所有函数都是纯函数，对任意输入（包括未登录）都有定义，
//! 没有权限时返回 `false`，从不报错。

use crate::models::user::Role;

/// 公共首页
pub const PUBLIC_HOME_ROUTE: &str = "/";
/// 登录页
pub const LOGIN_ROUTE: &str = "/login";
/// 账户未激活时的提示页，任何已登录用户都可访问
pub const INACTIVE_ACCOUNT_ROUTE: &str = "/inactive-account";

/// 无需登录即可访问的路由
pub const PUBLIC_ROUTES: &[&str] = &[
    "/",
    "/login",
    "/register",
    "/verify-email",
    "/services",
    "/contact",
    "/faq",
    "/announcements",
];

/// 角色能力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub default_route: &'static str,
    pub allowed_routes: &'static [&'static str],
    pub display_name: &'static str,
    pub can_access_admin: bool,
    pub can_access_vigile: bool,
    pub can_create_applications: bool,
    pub can_create_appointments: bool,
    pub can_view_payments: bool,
}

const ADMIN_ROUTES: &[&str] = &[
    "/admin",
    "/admin/users",
    "/admin/applications",
    "/admin/applications/:id",
    "/admin/access-logs",
    "/admin/site-settings",
    "/admin/announcements",
    "/vigile",
    // 仅监督，不含扫码
    "/security/today",
    "/profile",
    "/announcements",
    "/notifications",
];

static CITIZEN: Capabilities = Capabilities {
    default_route: "/dashboard",
    allowed_routes: &[
        "/dashboard",
        "/profile",
        "/identity",
        "/digital-identity",
        "/documents",
        "/my-qr-code",
        "/appointments",
        "/appointments/book",
        "/applications",
        "/applications/new",
        "/applications/:id",
        "/payments/create/:applicationId",
        "/reminders",
        "/notifications",
        "/services",
        "/contact",
        "/faq",
        "/announcements",
    ],
    display_name: "Citoyen",
    can_access_admin: false,
    can_access_vigile: false,
    can_create_applications: true,
    can_create_appointments: true,
    can_view_payments: true,
};

static AGENT_RDV: Capabilities = Capabilities {
    default_route: "/appointments",
    allowed_routes: &[
        "/dashboard",
        "/profile",
        "/appointments",
        "/appointments/book",
        "/applications",
        "/applications/:id",
        "/reminders",
        "/notifications",
    ],
    display_name: "Agent Rendez-vous",
    can_access_admin: false,
    can_access_vigile: false,
    // 只查看申请，不代为创建
    can_create_applications: false,
    can_create_appointments: true,
    can_view_payments: false,
};

static AGENT_CONSULAIRE: Capabilities = Capabilities {
    default_route: "/applications",
    allowed_routes: &[
        "/dashboard",
        "/profile",
        "/appointments",
        "/appointments/book",
        "/applications",
        "/applications/new",
        "/applications/:id",
        "/reminders",
        "/notifications",
    ],
    display_name: "Agent Consulaire",
    can_access_admin: false,
    can_access_vigile: false,
    can_create_applications: true,
    can_create_appointments: true,
    can_view_payments: true,
};

static VIGILE: Capabilities = Capabilities {
    default_route: "/vigile",
    allowed_routes: &[
        "/vigile",
        "/security/scanner",
        "/security/today",
        "/profile",
        "/notifications",
    ],
    display_name: "Vigile",
    can_access_admin: false,
    can_access_vigile: true,
    can_create_applications: false,
    can_create_appointments: false,
    can_view_payments: false,
};

static ADMIN: Capabilities = Capabilities {
    default_route: "/admin",
    allowed_routes: ADMIN_ROUTES,
    display_name: "Administrateur",
    can_access_admin: true,
    can_access_vigile: true,
    can_create_applications: false,
    can_create_appointments: false,
    can_view_payments: true,
};

static SUPERADMIN: Capabilities = Capabilities {
    default_route: "/admin/users",
    allowed_routes: ADMIN_ROUTES,
    display_name: "Super Administrateur",
    can_access_admin: true,
    can_access_vigile: true,
    can_create_applications: false,
    can_create_appointments: false,
    can_view_payments: true,
};

/// 角色对应的能力表
pub fn capabilities(role: Role) -> &'static Capabilities {
    match role {
        Role::Citizen => &CITIZEN,
        Role::AgentRdv => &AGENT_RDV,
        Role::AgentConsulaire => &AGENT_CONSULAIRE,
        Role::Vigile => &VIGILE,
        Role::Admin => &ADMIN,
        Role::SuperAdmin => &SUPERADMIN,
    }
}

/// 登录后的落地路由；未登录时为公共首页
pub fn default_route(role: Option<Role>) -> &'static str {
    role.map_or(PUBLIC_HOME_ROUTE, |r| capabilities(r).default_route)
}

/// 是否可以访问某个路由
pub fn can_access_route(role: Option<Role>, path: &str) -> bool {
    let path = normalize_path(path);
    let patterns: &[&str] = match role {
        Some(r) => capabilities(r).allowed_routes,
        None => PUBLIC_ROUTES,
    };
    patterns.iter().any(|pattern| route_matches(pattern, path))
}

pub fn is_public_route(path: &str) -> bool {
    can_access_route(None, path)
}

pub fn can_create_applications(role: Option<Role>) -> bool {
    role.is_some_and(|r| capabilities(r).can_create_applications)
}

pub fn can_create_appointments(role: Option<Role>) -> bool {
    role.is_some_and(|r| capabilities(r).can_create_appointments)
}

pub fn can_access_admin(role: Option<Role>) -> bool {
    role.is_some_and(|r| capabilities(r).can_access_admin)
}

pub fn can_access_vigile(role: Option<Role>) -> bool {
    role.is_some_and(|r| capabilities(r).can_access_vigile)
}

pub fn can_view_payments(role: Option<Role>) -> bool {
    role.is_some_and(|r| capabilities(r).can_view_payments)
}

pub fn role_display_name(role: Option<Role>) -> &'static str {
    role.map_or("Utilisateur", |r| capabilities(r).display_name)
}

/// 去掉查询串、锚点和末尾斜杠
pub fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// 按段匹配，`:name` 段匹配任意非空段
fn route_matches(pattern: &str, path: &str) -> bool {
    if pattern == path {
        return true;
    }
    if !pattern.contains(':') {
        return false;
    }

    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');
    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) => {
                if p.starts_with(':') {
                    if s.is_empty() {
                        return false;
                    }
                } else if p != s {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/applications/"), "/applications");
        assert_eq!(normalize_path("/applications?page=2"), "/applications");
        assert_eq!(normalize_path("/faq#visa"), "/faq");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn test_route_matches_params() {
        assert!(route_matches("/applications/:id", "/applications/42"));
        assert!(!route_matches("/applications/:id", "/applications"));
        assert!(!route_matches("/applications/:id", "/applications/42/edit"));
        assert!(route_matches(
            "/payments/create/:applicationId",
            "/payments/create/7"
        ));
        assert!(!route_matches("/admin", "/admin/users"));
    }

    #[test]
    fn test_param_pattern_matches_new_literal() {
        // "/applications/new" 也能被 ":id" 匹配，因此 AGENT_RDV 的限制只体现在 can_create_applications
        assert!(route_matches("/applications/:id", "/applications/new"));
        assert!(!can_create_applications(Some(Role::AgentRdv)));
    }

    #[test]
    fn test_superadmin_lands_on_user_management() {
        assert_eq!(default_route(Some(Role::SuperAdmin)), "/admin/users");
        assert!(can_access_route(Some(Role::SuperAdmin), "/admin/users"));
    }
}
