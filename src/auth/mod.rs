//! 认证与授权模块

pub mod jwt;
pub mod password;
pub mod policy;
pub mod session;
pub mod storage;

pub use jwt::{peek_claims, TokenClaims};
pub use password::{strength_label, validate_password, PasswordValidation};
pub use session::{PersistedSession, RestoreOutcome, Session, SessionStore, SESSION_STORAGE_KEY};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
