//! API 网关 - 基础设施层
//!
//! 所有 HTTP 调用都经过同一条中间件管线：
//!
//! ```text
//! request → BearerAuth(附加令牌) → 发送 → ForcedLogout(401 强制登出) → 解析 JSON
//! ```
//!
//! 401 的处理是全局策略，调用方只能额外检查错误，不能阻止跳转。

use crate::config::Config;
use crate::error::ApiError;
use crate::infrastructure::navigator::Navigator;
use crate::infrastructure::session_store::SessionStore;
use regex::Regex;
use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, warn};

/// 网关中间件
///
/// 请求发出前可以改写请求，收到响应后可以观察状态码。
pub trait GatewayLayer: Send + Sync {
    fn on_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }

    fn on_response(&self, _endpoint: &str, _status: StatusCode) {}
}

/// 存在令牌时附加 `Authorization: Bearer <token>`
pub struct BearerAuth {
    store: Arc<SessionStore>,
}

impl BearerAuth {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }
}

impl GatewayLayer for BearerAuth {
    fn on_request(&self, request: RequestBuilder) -> RequestBuilder {
        match self.store.auth_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// 任何 401 响应：清除令牌与考试进度，跳转登录页
pub struct ForcedLogout {
    store: Arc<SessionStore>,
    navigator: Navigator,
}

impl ForcedLogout {
    pub fn new(store: Arc<SessionStore>, navigator: Navigator) -> Self {
        Self { store, navigator }
    }
}

impl GatewayLayer for ForcedLogout {
    fn on_response(&self, endpoint: &str, status: StatusCode) {
        if status != StatusCode::UNAUTHORIZED {
            return;
        }

        warn!("🔒 {} 返回 401，令牌失效，强制登出", endpoint);
        if let Err(e) = self.store.clear_session_state() {
            error!("清除会话状态失败: {}", e);
        }
        self.navigator.redirect_to_login();
    }
}

/// API 网关
pub struct ApiGateway {
    http: reqwest::Client,
    base_url: String,
    layers: Vec<Arc<dyn GatewayLayer>>,
}

impl ApiGateway {
    /// 创建带标准中间件（BearerAuth + ForcedLogout）的网关
    pub fn new(
        config: &Config,
        store: Arc<SessionStore>,
        navigator: Navigator,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|source| ApiError::RequestFailed {
                endpoint: config.api_base_url.clone(),
                source,
            })?;

        let layers: Vec<Arc<dyn GatewayLayer>> = vec![
            Arc::new(BearerAuth::new(store.clone())),
            Arc::new(ForcedLogout::new(store, navigator)),
        ];

        Ok(Self::with_layers(http, &config.api_base_url, layers))
    }

    /// 自定义中间件管线
    pub fn with_layers(
        http: reqwest::Client,
        base_url: &str,
        layers: Vec<Arc<dyn GatewayLayer>>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            layers,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 静态资源所在的站点根（去掉末尾的 `/api`）
    pub fn asset_origin(&self) -> String {
        static API_SUFFIX: OnceLock<Regex> = OnceLock::new();
        let re = API_SUFFIX.get_or_init(|| Regex::new(r"/api$").expect("valid regex"));
        re.replace(&self.base_url, "").into_owned()
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let request = self.http.get(self.url(endpoint));
        self.send(endpoint, request).await
    }

    pub async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.post(self.url(endpoint)).json(body);
        self.send(endpoint, request).await
    }

    /// 统一发送路径：中间件 → 发送 → 中间件 → 状态码分类 → JSON
    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let request = self
            .layers
            .iter()
            .fold(request, |req, layer| layer.on_request(req))
            .header(ACCEPT, "application/json");

        debug!("→ {}", endpoint);

        let response = request.send().await.map_err(|source| {
            if source.is_connect() || source.is_timeout() {
                ApiError::Unreachable {
                    endpoint: endpoint.to_string(),
                    source,
                }
            } else {
                ApiError::RequestFailed {
                    endpoint: endpoint.to_string(),
                    source,
                }
            }
        })?;

        let status = response.status();
        debug!("← {} {}", endpoint, status);

        for layer in &self.layers {
            layer.on_response(endpoint, status);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::RequestFailed {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized {
                endpoint: endpoint.to_string(),
                message: extract_message(&bytes),
            });
        }

        if !status.is_success() {
            return Err(ApiError::BadResponse {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message: extract_message(&bytes),
            });
        }

        if bytes.is_empty() {
            return Err(ApiError::EmptyResponse {
                endpoint: endpoint.to_string(),
            });
        }

        serde_json::from_slice(&bytes).map_err(|source| ApiError::JsonParseFailed {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

/// 从错误响应体里取出 `message` 字段
fn extract_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<Value>(body)
        .ok()?
        .get("message")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
