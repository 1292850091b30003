//! 数据模型模块
//! 用户与认证模型由客户端持有；其余记录按服务端返回原样展示

pub mod application;
pub mod appointment;
pub mod auth;
pub mod catalog;
pub mod common;
pub mod notification;
pub mod payment;
pub mod site;
pub mod user;

pub use common::ListEnvelope;
pub use user::{Role, User};
