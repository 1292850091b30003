//! REST 接口分组（远程数据访问层）

pub mod application_repo;
pub mod appointment_repo;
pub mod auth_repo;
pub mod catalog_repo;
pub mod notification_repo;
pub mod payment_repo;
pub mod site_repo;

pub use application_repo::*;
pub use appointment_repo::*;
pub use auth_repo::*;
pub use catalog_repo::*;
pub use notification_repo::*;
pub use payment_repo::*;
pub use site_repo::*;
