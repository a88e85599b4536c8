//! Dispatcher - 把控制循环的遥测 fan-out 到各 sink

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use contracts::{Telemetry, TelemetrySinkConfig, TelemetrySinkType};

use crate::error::TelemetryError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{JsonlFileSink, LogSink};

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub sinks: Vec<TelemetrySinkConfig>,
    /// 文件类 sink 的根目录 (本次运行的输出目录)
    pub output_dir: PathBuf,
}

pub struct DispatcherBuilder {
    config: DispatcherConfig,
    input_rx: mpsc::Receiver<Telemetry>,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig, input_rx: mpsc::Receiver<Telemetry>) -> Self {
        Self { config, input_rx }
    }

    #[instrument(
        name = "telemetry_dispatcher_build",
        skip(self),
        fields(sink_count = self.config.sinks.len())
    )]
    pub fn build(self) -> Result<Dispatcher, TelemetryError> {
        let handles = self
            .config
            .sinks
            .iter()
            .map(|sink| create_sink_handle(sink, &self.config))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Dispatcher {
            handles,
            input_rx: self.input_rx,
        })
    }
}

fn create_sink_handle(
    sink: &TelemetrySinkConfig,
    config: &DispatcherConfig,
) -> Result<SinkHandle, TelemetryError> {
    match sink.sink_type {
        TelemetrySinkType::Log => {
            let interval = sink
                .params
                .get("every")
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);
            Ok(SinkHandle::spawn(
                LogSink::with_interval(&sink.name, interval),
                sink.queue_capacity,
            ))
        }
        TelemetrySinkType::File => {
            let file = JsonlFileSink::from_params(&sink.name, &config.output_dir, &sink.params)
                .map_err(|e| TelemetryError::sink_creation(&sink.name, e.to_string()))?;
            Ok(SinkHandle::spawn(file, sink.queue_capacity))
        }
    }
}

pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<Telemetry>,
}

impl Dispatcher {
    /// 直接使用给定 handles (测试用)
    pub fn with_handles(handles: Vec<SinkHandle>, input_rx: mpsc::Receiver<Telemetry>) -> Self {
        Self { handles, input_rx }
    }

    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// 主循环：输入通道关闭后关闭所有 sink 并返回各 sink 计数
    #[instrument(name = "telemetry_dispatcher_run", skip(self))]
    pub async fn run(mut self) -> Vec<(String, MetricsSnapshot)> {
        info!(sinks = self.handles.len(), "telemetry dispatcher started");

        let mut records: u64 = 0;
        while let Some(telemetry) = self.input_rx.recv().await {
            records += 1;
            for handle in &self.handles {
                handle.try_send(telemetry.clone());
            }
            if records % 600 == 0 {
                debug!(records, "telemetry dispatcher progress");
            }
        }

        info!(records, "telemetry input closed, shutting down sinks");
        let mut summary = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            let name = handle.name().to_string();
            let metrics = std::sync::Arc::clone(handle.metrics());
            handle.shutdown().await;
            summary.push((name, metrics.snapshot()));
        }
        summary
    }

    pub fn spawn(self) -> JoinHandle<Vec<(String, MetricsSnapshot)>> {
        tokio::spawn(self.run())
    }
}

/// 由 sink 配置创建 dispatcher
pub fn create_dispatcher(
    sinks: Vec<TelemetrySinkConfig>,
    output_dir: PathBuf,
    input_rx: mpsc::Receiver<Telemetry>,
) -> Result<Dispatcher, TelemetryError> {
    DispatcherBuilder::new(DispatcherConfig { sinks, output_dir }, input_rx).build()
}
