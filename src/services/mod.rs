//! 客户端业务逻辑层

pub mod auth_service;
pub mod route_guard;
pub mod stats_service;

pub use auth_service::{AuthService, LoginOutcome, SessionState};
pub use route_guard::{create_affordance, guard, Affordance, CreateAction, RouteDecision};
pub use stats_service::{
    AdminDashboard, AppointmentStats, ApplicationStats, SecurityStats, StatsService,
};
