//! # Telemetry
//!
//! 遥测分发模块。
//!
//! 负责：
//! - 消费控制循环每个 tick 产生的 `Telemetry`
//! - Fan-out 到多个 sinks
//! - 隔离慢 sink，不阻塞控制循环
//! - 手动导出当前遥测快照

pub mod dispatcher;
pub mod error;
pub mod export;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{Telemetry, TelemetrySink};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::TelemetryError;
pub use export::export_snapshot;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{JsonlFileSink, LogSink};
