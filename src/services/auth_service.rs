//! 认证服务：登录、会话恢复、注册、资料维护

use crate::{
    api::{ApiClient, Toast},
    auth::{
        jwt,
        password::validate_password,
        policy::{default_route, INACTIVE_ACCOUNT_ROUTE},
        session::{PersistedSession, RestoreOutcome, SessionStore},
    },
    error::{ClientError, ClientResult},
    models::{auth::*, user::*},
    repository::AuthRepository,
};
use chrono::Utc;
use secrecy::ExposeSecret;
use std::sync::Arc;
use validator::Validate;

/// 登录结果
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    /// 登录后应跳转的页面
    pub landing_route: &'static str,
}

/// 会话状态（恢复与查询的结果）
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(User),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            SessionState::Unauthenticated => None,
        }
    }
}

pub struct AuthService {
    api: Arc<ApiClient>,
    repo: AuthRepository,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            repo: AuthRepository::new(api.clone()),
            api,
        }
    }

    fn session(&self) -> &SessionStore {
        self.api.session()
    }

    /// 当前会话状态
    pub fn state(&self) -> SessionState {
        let snapshot = self.session().snapshot();
        match (&snapshot.user, snapshot.is_authenticated) {
            (Some(user), true) => SessionState::Authenticated(user.clone()),
            _ => SessionState::Unauthenticated,
        }
    }

    /// 用户登录
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<LoginOutcome> {
        let req = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        req.validate()?;

        let resp = self.repo.login(&req).await?;
        let user = resp.user;
        self.session()
            .set_auth(user.clone(), resp.access, Some(resp.refresh));

        let landing_route = landing_route(&user);
        if landing_route == INACTIVE_ACCOUNT_ROUTE {
            tracing::info!(user_id = user.id, "Logged in with an inactive account");
            self.api.notifier().notify(Toast::info(
                "Compte inactif",
                "Votre compte nécessite une activation",
            ));
        } else {
            self.api
                .notifier()
                .notify(Toast::success("Connexion", "Connexion réussie !"));
        }

        Ok(LoginOutcome {
            user,
            landing_route,
        })
    }

    /// 用户登出
    pub fn logout(&self) -> bool {
        self.session().logout()
    }

    /// 启动时恢复会话：持久化的令牌必须先经服务端确认
    pub async fn restore(&self) -> SessionState {
        match self.session().load_persisted() {
            RestoreOutcome::Empty => {
                tracing::debug!("No persisted session");
                SessionState::Unauthenticated
            }
            RestoreOutcome::Corrupted(reason) => {
                tracing::warn!(reason = %reason, "Discarding corrupted persisted session");
                self.session().logout();
                SessionState::Unauthenticated
            }
            RestoreOutcome::Restored(persisted) => self.validate_persisted(persisted).await,
        }
    }

    async fn validate_persisted(&self, persisted: PersistedSession) -> SessionState {
        let token = persisted.token.expose_secret().clone();
        let refresh = persisted
            .refresh_token
            .as_ref()
            .map(|t| t.expose_secret().clone());

        // 已过期且无法刷新，不必请求服务端
        if jwt::is_expired(&token, Utc::now()) == Some(true) && refresh.is_none() {
            return self.abandon_restore(ClientError::SessionExpired);
        }

        let (user, token, refresh) = match self.repo.user_info(&token).await {
            Ok(user) => (user, token, refresh),
            Err(ClientError::Unauthorized) => {
                let Some(refresh) = refresh else {
                    return self.abandon_restore(ClientError::Unauthorized);
                };
                let tokens = match self.api.exchange_refresh_token(&refresh).await {
                    Ok(tokens) => tokens,
                    Err(e) => return self.abandon_restore(e),
                };
                match self.repo.user_info(&tokens.access).await {
                    Ok(user) => (user, tokens.access, tokens.refresh.or(Some(refresh))),
                    Err(e) => return self.abandon_restore(e),
                }
            }
            Err(e) => return self.abandon_restore(e),
        };

        if user.id != persisted.user.id {
            tracing::warn!(
                stored = persisted.user.id,
                actual = user.id,
                "Persisted user does not match token owner"
            );
        }

        self.session().set_auth(user.clone(), token, refresh);
        tracing::info!(user_id = user.id, "Session restored");
        SessionState::Authenticated(user)
    }

    fn abandon_restore(&self, error: ClientError) -> SessionState {
        tracing::info!(error = %error, "Persisted session rejected");
        self.session().logout();
        SessionState::Unauthenticated
    }

    /// 注册：先在本地校验字段与密码强度
    pub async fn register(&self, req: RegisterRequest) -> ClientResult<RegisterResponse> {
        req.validate()?;
        check_new_password(&req.password)?;
        if req.password != req.password_confirm {
            return Err(ClientError::Validation(
                "Les mots de passe ne correspondent pas".to_string(),
            ));
        }

        let resp = self.repo.register(&req).await?;
        tracing::info!(email = %req.email, "Account registered, verification pending");
        Ok(resp)
    }

    /// 邮箱验证
    pub async fn verify_email(&self, email: &str, code: &str) -> ClientResult<MessageResponse> {
        let req = VerifyEmailRequest {
            email: email.trim().to_string(),
            code: code.trim().to_string(),
        };
        req.validate()?;
        self.repo.verify_email(&req).await
    }

    pub async fn resend_verification_code(&self, email: &str) -> ClientResult<MessageResponse> {
        let req = ResendCodeRequest {
            email: email.trim().to_string(),
        };
        req.validate()?;
        self.repo.resend_code(&req).await
    }

    /// 重新获取资料并更新会话中的用户
    pub async fn refresh_profile(&self) -> ClientResult<User> {
        let user = self.repo.get_profile().await?;
        if !self.session().update_user(user.clone()) {
            tracing::debug!("Profile fetched without an active session");
        }
        Ok(user)
    }

    /// 更新资料
    pub async fn update_profile(&self, req: UpdateProfileRequest) -> ClientResult<User> {
        self.repo.update_profile(&req).await?;
        self.refresh_profile().await
    }

    /// 修改密码
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> ClientResult<MessageResponse> {
        if old_password.is_empty() {
            return Err(ClientError::Validation(
                "L'ancien mot de passe est requis".to_string(),
            ));
        }
        check_new_password(new_password)?;

        let req = ChangePasswordRequest {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        self.repo.change_password(&req).await
    }
}

/// 登录后的落地页：未激活的非管理员账户先去激活提示页
pub fn landing_route(user: &User) -> &'static str {
    if !user.is_active && !user.role.is_admin() {
        INACTIVE_ACCOUNT_ROUTE
    } else {
        default_route(Some(user.role))
    }
}

fn check_new_password(password: &str) -> ClientResult<()> {
    let validation = validate_password(password);
    if validation.is_valid {
        Ok(())
    } else {
        Err(ClientError::Validation(validation.errors.join(". ")))
    }
}
