//! API 网关：传输层、认证请求封装与用户提示钩子

pub mod client;
pub mod notify;
pub mod transport;

pub use client::ApiClient;
pub use notify::{LoggingNavigator, Navigator, Notifier, Toast, ToastLevel, TracingNotifier};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport, TransportError};
