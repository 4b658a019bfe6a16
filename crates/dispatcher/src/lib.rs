//! # Dispatcher
//!
//! 批量写入分发模块。
//!
//! 负责：
//! - 将每条记录转换为写请求并校验
//! - 按 destination 分组，每组一次批量写入
//! - 按组的结果把每条记录路由到 success / failure，并生成 provenance
//!
//! 单条坏记录不会影响同批次中其他合法分组。

pub mod clients;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod observer;
pub mod report;

pub use clients::{create_client, AnyClient, FileClient, LogClient, MemoryClient, PutCall};
pub use contracts::{RequestBuilder, WriteClient, WriteRequest};
pub use dispatcher::BatchDispatcher;
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use observer::{DispatchObserver, NoopObserver};
pub use report::{BatchSummary, DispatchReport, FailureReason, ProvenanceEvent, Routed, Routing};
