//! Builder 错误类型

use thiserror::Error;

/// Builder 构造错误
#[derive(Debug, Error)]
pub enum BuildError {
    /// 配置值无法解析
    #[error("invalid value source for '{field}': {message}")]
    InvalidValueSource {
        /// 配置字段
        field: String,
        /// 错误消息
        message: String,
    },

    /// 缺少必填配置
    #[error("missing builder setting '{field}'")]
    MissingSetting {
        /// 配置字段
        field: String,
    },
}

/// Builder Result 类型别名
pub type Result<T> = std::result::Result<T, BuildError>;
