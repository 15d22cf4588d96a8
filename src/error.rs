use thiserror::Error;

/// 拉取排行数据过程中的错误；任一页失败即放弃整个分页序列
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    #[error("API 错误: {0}")]
    Vendor(String),

    #[error("API 返回数据格式错误: {0}")]
    Format(String),

    #[error("网络错误: {0}")]
    Network(#[from] reqwest::Error),
}

/// 代理边界错误，由 `services::proxy` 映射为 HTTP 状态码
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("缺少 startTime 或 endTime 参数")]
    MissingRange,

    #[error(transparent)]
    Upstream(#[from] FetchError),
}

impl ProxyError {
    /// HTTP 状态码与返回给调用方的错误文案
    pub fn status_and_message(&self) -> (u16, String) {
        match self {
            ProxyError::MissingRange => (400, self.to_string()),
            ProxyError::Upstream(FetchError::Http { status, .. }) => (*status, self.to_string()),
            ProxyError::Upstream(FetchError::Vendor(_)) => (400, self.to_string()),
            ProxyError::Upstream(_) => (500, "服务器内部错误".to_string()),
        }
    }
}
