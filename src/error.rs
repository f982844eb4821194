use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 外部 API 调用错误（工作区 / 文献元数据）
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 外部 API 调用错误
///
/// 按调用方需要做出的决策分类，而不是按底层库分类
#[derive(Debug, Error)]
pub enum ApiError {
    /// 资源不存在（数据库 ID 错误或未授权访问该数据库）
    #[error("资源不存在 ({endpoint}): {message}")]
    NotFound { endpoint: String, message: String },
    /// 凭证无效或权限不足
    #[error("认证失败 ({endpoint}): {message}")]
    Unauthorized { endpoint: String, message: String },
    /// 请求频率限制
    #[error("API请求频率限制 ({endpoint}), 建议等待: {retry_after:?}秒")]
    RateLimited {
        endpoint: String,
        retry_after: Option<u64>,
    },
    /// 响应无法解析为预期结构
    #[error("响应格式错误 ({endpoint}): {message}")]
    Malformed { endpoint: String, message: String },
    /// 网络错误或其他未归类的错误响应
    #[error("API请求失败 ({endpoint}): status={status:?}, {message}")]
    Unknown {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {message}")]
    Request { model: String, message: String },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 请求构建失败
    #[error("LLM请求构建失败: {0}")]
    InvalidRequest(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必需的凭证未配置
    #[error("缺少必需的配置项: {name}")]
    MissingCredential { name: String },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {message}")]
    ParseFailed { path: String, message: String },
}

// ========== 便捷构造函数 ==========

impl ApiError {
    /// 根据 HTTP 状态码归类错误响应
    pub fn from_status(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let message = body.into();
        match status {
            404 => ApiError::NotFound { endpoint, message },
            401 | 403 => ApiError::Unauthorized { endpoint, message },
            429 => ApiError::RateLimited {
                endpoint,
                retry_after: None,
            },
            _ => ApiError::Unknown {
                endpoint,
                status: Some(status),
                message,
            },
        }
    }

    /// 补充限流响应中的等待秒数，其他错误原样返回
    pub fn with_retry_after(self, retry_after: Option<u64>) -> Self {
        match self {
            ApiError::RateLimited { endpoint, .. } => ApiError::RateLimited {
                endpoint,
                retry_after,
            },
            other => other,
        }
    }

    /// 包装传输层错误（连接失败、超时、响应体解码失败）
    pub fn from_reqwest(endpoint: impl Into<String>, err: reqwest::Error) -> Self {
        let endpoint = endpoint.into();
        if err.is_decode() {
            return ApiError::Malformed {
                endpoint,
                message: err.to_string(),
            };
        }
        ApiError::Unknown {
            endpoint,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    /// 创建响应解析失败错误
    pub fn malformed(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Malformed {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// 简短的错误类别名，用于写入状态字段
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "NotFound",
            ApiError::Unauthorized { .. } => "Unauthorized",
            ApiError::RateLimited { .. } => "RateLimited",
            ApiError::Malformed { .. } => "Malformed",
            ApiError::Unknown { .. } => "Unknown",
        }
    }
}

/// 读取 `Retry-After` 头（只支持秒数形式）
pub fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

impl ConfigError {
    pub fn missing(name: impl Into<String>) -> Self {
        ConfigError::MissingCredential { name: name.into() }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
