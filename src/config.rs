use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 默认配置文件名
pub const CONFIG_FILE_NAME: &str = "exam_portal.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 考试 API 地址（例如 `https://portal.example.com/api`）
    pub api_base_url: String,
    /// 本地会话存储文件（token、剩余时间等）
    pub store_path: String,
    /// 单个 HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    /// 计时器步长（毫秒），正常为 1000
    pub tick_interval_ms: u64,
    /// 默认日志过滤规则，RUST_LOG 优先
    pub log_filter: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            store_path: ".exam_portal/session.json".to_string(),
            request_timeout_secs: 15,
            tick_interval_ms: 1000,
            log_filter: "exam_portal=info".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：默认值 → `exam_portal.toml`（可选） → 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let base = if Path::new(CONFIG_FILE_NAME).exists() {
            Self::from_file(CONFIG_FILE_NAME)?
        } else {
            Self::default()
        };
        base.with_env()
    }

    /// 只读取环境变量，其余使用默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env()
    }

    /// 从 TOML 文件读取配置，缺失字段使用默认值
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 用环境变量覆盖当前配置
    pub fn with_env(self) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: std::env::var("EXAM_API_BASE_URL").unwrap_or(self.api_base_url),
            store_path: std::env::var("EXAM_STORE_PATH").unwrap_or(self.store_path),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.request_timeout_secs),
            tick_interval_ms: parse_env("TICK_INTERVAL_MS", "u64")?.unwrap_or(self.tick_interval_ms),
            log_filter: std::env::var("LOG_FILTER").unwrap_or(self.log_filter),
            verbose_logging: parse_env("VERBOSE_LOGGING", "bool")?.unwrap_or(self.verbose_logging),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

fn parse_env<T: std::str::FromStr>(
    var_name: &str,
    expected_type: &str,
) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
