//! 会话存储
//!
//! 进程内唯一的会话状态，通过 `SessionStore` 句柄显式传递。每次变更都整体替换
//! 会话对象并把完整快照写入持久化存储；读操作是同步的快照读取。
//! 持久化失败只记录日志，不影响调用方。
//!
//! 每次登录或登出都会递增会话代数；令牌刷新与用户资料更新不改变代数。
//! 网关据此判断一个在途请求是否仍属于发起它的那次会话。

use crate::auth::storage::{MemoryStorage, SessionStorage};
use crate::models::user::{Role, User};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// 会话快照的存储键
pub const SESSION_STORAGE_KEY: &str = "embassy-auth";
/// 快照格式版本
const SNAPSHOT_VERSION: u32 = 0;

/// 会话状态
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<Secret<String>>,
    pub refresh_token: Option<Secret<String>>,
    pub is_authenticated: bool,
}

impl Session {
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.expose_secret().as_str())
    }
}

/// 从存储中读出、尚未经服务端校验的会话
#[derive(Debug, Clone)]
pub struct PersistedSession {
    pub user: User,
    pub token: Secret<String>,
    pub refresh_token: Option<Secret<String>>,
}

/// 启动时读取持久化会话的结果
#[derive(Debug)]
pub enum RestoreOutcome {
    /// 没有快照，或快照处于已登出状态
    Empty,
    /// 快照无法解析或缺少必要字段
    Corrupted(String),
    Restored(PersistedSession),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState {
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    is_authenticated: bool,
}

#[derive(Serialize, Deserialize)]
struct PersistedEnvelope {
    state: PersistedState,
    #[serde(default)]
    version: u32,
}

impl PersistedEnvelope {
    fn from_session(session: &Session) -> Self {
        Self {
            state: PersistedState {
                user: session.user.clone(),
                token: session.token.as_ref().map(|t| t.expose_secret().clone()),
                refresh_token: session
                    .refresh_token
                    .as_ref()
                    .map(|t| t.expose_secret().clone()),
                is_authenticated: session.is_authenticated,
            },
            version: SNAPSHOT_VERSION,
        }
    }
}

/// 会话存储句柄（可廉价克隆，所有克隆共享同一状态）
#[derive(Clone)]
pub struct SessionStore {
    current: Arc<RwLock<Arc<Session>>>,
    /// 只在持有写锁时递增
    generation: Arc<AtomicU64>,
    storage: Arc<dyn SessionStorage>,
    key: Arc<str>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("key", &self.key)
            .field("generation", &self.generation())
            .field("session", &self.snapshot())
            .finish()
    }
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>, key: impl Into<String>) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(Session::default()))),
            generation: Arc::new(AtomicU64::new(0)),
            storage,
            key: Arc::from(key.into()),
        }
    }

    /// 仅驻留内存的会话
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), SESSION_STORAGE_KEY)
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// 当前会话快照
    pub fn snapshot(&self) -> Arc<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 当前会话代数
    pub fn generation(&self) -> u64 {
        self.snapshot_with_generation().1
    }

    /// 同一时刻的会话快照与代数
    pub fn snapshot_with_generation(&self) -> (Arc<Session>, u64) {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        (guard.clone(), self.generation.load(Ordering::Acquire))
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated
    }

    pub fn user(&self) -> Option<User> {
        self.snapshot().user.clone()
    }

    pub fn role(&self) -> Option<Role> {
        self.snapshot().role()
    }

    pub fn access_token(&self) -> Option<Secret<String>> {
        self.snapshot().token.clone()
    }

    pub fn refresh_token(&self) -> Option<Secret<String>> {
        self.snapshot().refresh_token.clone()
    }

    /// 登录成功：写入用户与令牌
    pub fn set_auth(&self, user: User, token: String, refresh_token: Option<String>) {
        tracing::info!(user_id = user.id, role = %user.role, "Session established");
        let session = Arc::new(Session {
            user: Some(user),
            token: Some(Secret::new(token)),
            refresh_token: refresh_token.map(Secret::new),
            is_authenticated: true,
        });
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = session.clone();
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.persist(&session);
    }

    /// 登出：清空会话并删除持久化快照，返回之前是否已登录
    pub fn logout(&self) -> bool {
        self.end_session(None)
    }

    /// 仅当会话仍处于给定代数时登出
    pub fn logout_generation(&self, generation: u64) -> bool {
        self.end_session(Some(generation))
    }

    fn end_session(&self, expected: Option<u64>) -> bool {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if expected.is_some_and(|g| g != self.generation.load(Ordering::Acquire)) {
            return false;
        }
        let was_authenticated = guard.is_authenticated;
        *guard = Arc::new(Session::default());
        self.generation.fetch_add(1, Ordering::AcqRel);

        if let Err(e) = self.storage.remove(&self.key) {
            tracing::warn!(key = %self.key, error = %e, "Failed to remove persisted session");
        }
        drop(guard);

        if was_authenticated {
            tracing::info!("Session cleared");
        }
        was_authenticated
    }

    /// 更新当前用户（仅在已登录时生效）
    pub fn update_user(&self, user: User) -> bool {
        self.replace(None, |current| {
            current.is_authenticated.then(|| Session {
                user: Some(user),
                ..current.clone()
            })
        })
    }

    /// 刷新后替换令牌；服务端未轮换 refresh token 时保留原值
    pub fn replace_tokens(&self, access: String, refresh_token: Option<String>) -> bool {
        self.replace_tokens_in(None, access, refresh_token)
    }

    /// 同 `replace_tokens`，但会话代数已变化时不写入
    pub fn replace_tokens_for(
        &self,
        generation: u64,
        access: String,
        refresh_token: Option<String>,
    ) -> bool {
        self.replace_tokens_in(Some(generation), access, refresh_token)
    }

    fn replace_tokens_in(
        &self,
        expected: Option<u64>,
        access: String,
        refresh_token: Option<String>,
    ) -> bool {
        self.replace(expected, |current| {
            current.is_authenticated.then(|| Session {
                token: Some(Secret::new(access)),
                refresh_token: refresh_token
                    .map(Secret::new)
                    .or_else(|| current.refresh_token.clone()),
                ..current.clone()
            })
        })
    }

    /// 读取持久化快照（不提交到当前会话）
    pub fn load_persisted(&self) -> RestoreOutcome {
        let raw = match self.storage.load(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return RestoreOutcome::Empty,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to read persisted session");
                return RestoreOutcome::Empty;
            }
        };

        let envelope: PersistedEnvelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => return RestoreOutcome::Corrupted(format!("unparseable snapshot: {}", e)),
        };

        if envelope.version != SNAPSHOT_VERSION {
            tracing::debug!(version = envelope.version, "Persisted session has a different version");
        }

        let state = envelope.state;
        match (state.user, state.token) {
            (None, None) => RestoreOutcome::Empty,
            (Some(_), None) => RestoreOutcome::Corrupted("missing token".to_string()),
            (None, Some(_)) => RestoreOutcome::Corrupted("missing user".to_string()),
            (Some(_), Some(token)) if token.trim().is_empty() => {
                RestoreOutcome::Corrupted("empty token".to_string())
            }
            (Some(user), Some(token)) => RestoreOutcome::Restored(PersistedSession {
                user,
                token: Secret::new(token),
                refresh_token: state
                    .refresh_token
                    .filter(|t| !t.trim().is_empty())
                    .map(Secret::new),
            }),
        }
    }

    /// 在写锁内计算新会话；返回 None 表示不变更。不改变会话代数
    fn replace<F>(&self, expected: Option<u64>, next: F) -> bool
    where
        F: FnOnce(&Session) -> Option<Session>,
    {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if expected.is_some_and(|g| g != self.generation.load(Ordering::Acquire)) {
            return false;
        }
        let Some(session) = next(&**guard) else {
            return false;
        };

        let session = Arc::new(session);
        *guard = session.clone();
        self.persist(&session);
        true
    }

    fn persist(&self, session: &Session) {
        let envelope = PersistedEnvelope::from_session(session);
        let result = serde_json::to_string(&envelope)
            .map_err(std::io::Error::from)
            .and_then(|json| self.storage.save(&self.key, &json));

        if let Err(e) = result {
            tracing::warn!(key = %self.key, error = %e, "Failed to persist session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citizen() -> User {
        serde_json::from_str(r#"{"id": 5, "email": "c@x.com", "role": "CITIZEN"}"#).unwrap()
    }

    #[test]
    fn test_snapshot_envelope_format() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone(), SESSION_STORAGE_KEY);
        store.set_auth(citizen(), "t1".to_string(), Some("r1".to_string()));

        let raw = storage.load(SESSION_STORAGE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 0);
        assert_eq!(value["state"]["token"], "t1");
        assert_eq!(value["state"]["refreshToken"], "r1");
        assert_eq!(value["state"]["isAuthenticated"], true);
        assert_eq!(value["state"]["user"]["id"], 5);
    }

    #[test]
    fn test_debug_output_redacts_tokens() {
        let store = SessionStore::in_memory();
        store.set_auth(citizen(), "very-secret-token".to_string(), None);
        let debug = format!("{:?}", store);
        assert!(!debug.contains("very-secret-token"));
    }

    #[test]
    fn test_replace_tokens_keeps_refresh_without_rotation() {
        let store = SessionStore::in_memory();
        store.set_auth(citizen(), "t1".to_string(), Some("r1".to_string()));
        assert!(store.replace_tokens("t2".to_string(), None));

        let session = store.snapshot();
        assert_eq!(session.access_token(), Some("t2"));
        assert_eq!(
            session.refresh_token.as_ref().map(|t| t.expose_secret().as_str()),
            Some("r1")
        );
    }

    #[test]
    fn test_mutations_ignored_when_logged_out() {
        let store = SessionStore::in_memory();
        assert!(!store.update_user(citizen()));
        assert!(!store.replace_tokens("t".to_string(), None));
        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
    }

    #[test]
    fn test_generation_tracks_login_and_logout_only() {
        let store = SessionStore::in_memory();
        let start = store.generation();

        store.set_auth(citizen(), "t1".to_string(), Some("r1".to_string()));
        let logged_in = store.generation();
        assert_eq!(logged_in, start + 1);

        assert!(store.replace_tokens("t2".to_string(), None));
        assert!(store.update_user(citizen()));
        assert_eq!(store.generation(), logged_in);

        store.logout();
        store.set_auth(citizen(), "t3".to_string(), None);
        assert_eq!(store.generation(), logged_in + 2);

        // 旧代数下的写入与登出都被忽略
        assert!(!store.replace_tokens_for(logged_in, "t4".to_string(), None));
        assert!(!store.logout_generation(logged_in));
        assert_eq!(store.snapshot().access_token(), Some("t3"));
        assert!(store.logout_generation(logged_in + 2));
    }

    #[test]
    fn test_logged_out_snapshot_is_empty() {
        let raw = r#"{"state":{"user":null,"token":null,"refreshToken":null,"isAuthenticated":false},"version":0}"#;
        let store = SessionStore::new(
            Arc::new(MemoryStorage::with_entry(SESSION_STORAGE_KEY, raw)),
            SESSION_STORAGE_KEY,
        );
        assert!(matches!(store.load_persisted(), RestoreOutcome::Empty));
    }
}
