//! 领事服务客户端库
//! 会话管理、角色权限策略与带认证的 API 网关

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod telemetry;
