//! 登录页
//!
//! 凭据换令牌，成功后写入存储并跳转到考试首页；
//! 品牌信息独立拉取并缓存，失败直接忽略。

use crate::clients::ExamClient;
use crate::error::ApiError;
use crate::infrastructure::session_store::keys;
use crate::infrastructure::{Navigator, Route, SessionStore};
use crate::models::Branding;
use tracing::{debug, error, info};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials. Please try again.";
pub const NETWORK_UNREACHABLE: &str = "Unable to connect to server. Please check your network.";
pub const LOGIN_FAILED: &str = "Login failed. Please try again later.";

/// 登录失败时展示的文字
///
/// 401/402/403/404 直接展示服务端的 message。
pub fn login_error_message(err: &ApiError) -> String {
    match err.status() {
        Some(401..=404) => err
            .server_message()
            .unwrap_or(INVALID_CREDENTIALS)
            .to_string(),
        _ if err.is_unreachable() => NETWORK_UNREACHABLE.to_string(),
        _ => LOGIN_FAILED.to_string(),
    }
}

#[derive(Debug, Default)]
pub struct LoginView {
    error: Option<String>,
    branding: Branding,
}

impl LoginView {
    /// 先用缓存的品牌信息
    pub fn new(store: &SessionStore) -> Self {
        Self {
            error: None,
            branding: Branding {
                logo_url: store.logo_url(),
                app_name: store.app_name(),
            },
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn branding(&self) -> &Branding {
        &self.branding
    }

    /// 拉取并缓存品牌信息，任何失败都只记日志
    pub async fn load_branding(&mut self, client: &ExamClient, store: &SessionStore) {
        let branding = match client.fetch_branding().await {
            Ok(branding) => branding,
            Err(e) => {
                debug!("品牌信息拉取失败（忽略）: {}", e);
                return;
            }
        };

        if let Some(logo) = &branding.logo_url {
            if let Err(e) = store.set(keys::LOGO_URL, logo) {
                debug!("缓存 logo 失败: {}", e);
            }
            self.branding.logo_url = Some(logo.clone());
        }
        if let Some(name) = &branding.app_name {
            if let Err(e) = store.set(keys::APP_NAME, name) {
                debug!("缓存门户名称失败: {}", e);
            }
            self.branding.app_name = Some(name.clone());
        }
    }

    /// 提交登录
    ///
    /// # 返回
    /// 登录成功（令牌已保存并跳转）返回 true
    pub async fn submit(
        &mut self,
        client: &ExamClient,
        store: &SessionStore,
        navigator: &Navigator,
        email: &str,
        password: &str,
    ) -> bool {
        self.error = None;

        let token = match client.login(email, password).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.error = Some(INVALID_CREDENTIALS.to_string());
                return false;
            }
            Err(e) => {
                error!("登录失败: {}", e);
                self.error = Some(login_error_message(&e));
                return false;
            }
        };

        if let Err(e) = store.set_auth_token(&token) {
            error!("保存令牌失败: {}", e);
            self.error = Some(LOGIN_FAILED.to_string());
            return false;
        }

        info!("🔑 登录成功: {}", email);
        navigator.navigate(Route::Exam);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_for_auth_statuses() {
        for status in [401u16, 402, 403, 404] {
            let err = if status == 401 {
                ApiError::Unauthorized {
                    endpoint: "/login".to_string(),
                    message: Some("Invalid email or password".to_string()),
                }
            } else {
                ApiError::BadResponse {
                    endpoint: "/login".to_string(),
                    status,
                    message: Some("Invalid email or password".to_string()),
                }
            };
            assert_eq!(login_error_message(&err), "Invalid email or password");
        }
    }

    #[test]
    fn test_other_failures_use_generic_message() {
        let err = ApiError::BadResponse {
            endpoint: "/login".to_string(),
            status: 500,
            message: Some("Server Error".to_string()),
        };
        assert_eq!(login_error_message(&err), LOGIN_FAILED);

        let err = ApiError::EmptyResponse {
            endpoint: "/login".to_string(),
        };
        assert_eq!(login_error_message(&err), LOGIN_FAILED);
    }

    #[test]
    fn test_cached_branding_is_used_first() {
        let store = SessionStore::in_memory();
        store.set(keys::APP_NAME, "Acme Exams").unwrap();

        let view = LoginView::new(&store);
        assert_eq!(view.branding().display_name(), "Acme Exams");
        assert!(view.error().is_none());
    }
}
