//! # Request Builder
//!
//! 记录到写请求的转换模块。
//!
//! 负责：
//! - 从 `FlowRecord` 的属性与内容中提取 `WriteRequest`
//! - 提取失败时记录日志并返回构造错误
//!
//! 请求是否合法不在此处判断，由 dispatcher 统一校验。

mod cell;
pub mod error;
mod json;
mod value;

pub use cell::CellRequestBuilder;
pub use error::{BuildError, Result};
pub use json::JsonRequestBuilder;
pub use value::ValueSource;

use contracts::{BuilderConfig, FlowRecord, RequestBuilder};
use tracing::debug;

/// Create a request builder from configuration
pub fn from_config(config: &BuilderConfig) -> Result<Box<dyn RequestBuilder<FlowRecord>>> {
    let builder: Box<dyn RequestBuilder<FlowRecord>> = match config {
        BuilderConfig::Cell(cfg) => Box::new(CellRequestBuilder::from_config(cfg)?),
        BuilderConfig::Json(cfg) => Box::new(JsonRequestBuilder::from_config(cfg)?),
    };

    debug!(builder = builder.name(), "Request builder created");
    Ok(builder)
}
