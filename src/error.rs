use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 考试会话错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 本地存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401：令牌无效或已过期（全局强制登出已经执行）
    #[error("未授权 ({endpoint}): {message:?}")]
    Unauthorized {
        endpoint: String,
        message: Option<String>,
    },
    /// 无法连接服务器（连接失败或超时）
    #[error("无法连接服务器 ({endpoint}): {source}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 其他网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// API 返回错误响应
    #[error("API返回错误响应 ({endpoint}): status={status}, message={message:?}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    /// API 返回空结果
    #[error("API返回空结果: {endpoint}")]
    EmptyResponse { endpoint: String },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::Unreachable { .. })
    }

    /// 服务端返回的 HTTP 状态码（如果有）
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::BadResponse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 服务端返回的 message 字段（如果有）
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message, .. } | ApiError::BadResponse { message, .. } => {
                message.as_deref()
            }
            _ => None,
        }
    }
}

/// 考试会话（状态机）错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// 会话已经初始化过，不允许重复拉取题目
    #[error("会话已初始化，当前阶段: {phase}")]
    AlreadyInitialized { phase: String },
    /// 服务端没有返回任何题目
    #[error("没有找到题目")]
    NoQuestions,
    /// 当前阶段不允许该操作
    #[error("当前阶段 {phase} 不允许操作: {action}")]
    InvalidPhase { phase: String, action: String },
    /// 未选择选项就提交
    #[error("请先选择一个选项")]
    NoSelection,
    /// 反馈已显示，选项已锁定
    #[error("答案已提交，选项已锁定")]
    AnswerLocked,
    /// 选项标签不存在
    #[error("无效的选项: {label}")]
    UnknownOption { label: String },
    /// 上一次提交仍在进行中
    #[error("答案正在提交中")]
    SubmissionInFlight,
}

/// 本地存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 读取存储文件失败
    #[error("读取存储文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入存储文件失败
    #[error("写入存储文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 存储文件内容损坏
    #[error("存储文件解析失败 ({path}): {source}")]
    Corrupted {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 {path}: {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl SessionError {
    pub(crate) fn invalid_phase(phase: impl std::fmt::Display, action: &str) -> Self {
        SessionError::InvalidPhase {
            phase: phase.to_string(),
            action: action.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
