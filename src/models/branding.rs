use serde::{Deserialize, Serialize};

/// 默认门户名称
pub const DEFAULT_APP_NAME: &str = "Genesis Examination Portal";

/// `GET /settings/logo` 的 data 部分
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BrandingPayload {
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default, alias = "appName")]
    pub app_name: Option<String>,
}

/// 解析后的品牌信息（logo 已拼成完整 URL）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Branding {
    pub logo_url: Option<String>,
    pub app_name: Option<String>,
}

impl Branding {
    pub fn display_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or(DEFAULT_APP_NAME)
    }
}
