//! SinkHandle - 每个 sink 一个独立队列和 worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{Telemetry, TelemetrySink};

use crate::metrics::SinkMetrics;

pub struct SinkHandle {
    name: String,
    tx: mpsc::Sender<Telemetry>,
    metrics: Arc<SinkMetrics>,
    worker: JoinHandle<()>,
}

impl SinkHandle {
    /// 创建 handle 并启动 worker
    pub fn spawn<S: TelemetrySink + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker = tokio::spawn(sink_worker(
            sink,
            rx,
            Arc::clone(&metrics),
            name.clone(),
        ));

        Self {
            name,
            tx,
            metrics,
            worker,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// 非阻塞发送，队列满时丢弃并返回 false
    pub fn try_send(&self, telemetry: Telemetry) -> bool {
        match self.tx.try_send(telemetry) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(t)) => {
                self.metrics.inc_dropped();
                warn!(
                    sink = %self.name,
                    round = t.round_index,
                    "queue full, telemetry dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(sink = %self.name, "sink worker closed unexpectedly");
                false
            }
        }
    }

    /// 关闭发送端并等待 worker 排空队列
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            error!(sink = %self.name, error = ?e, "sink worker panicked");
        }
        debug!(sink = %self.name, "sink handle shut down");
    }
}

#[instrument(name = "telemetry_sink_worker", skip(sink, rx, metrics), fields(sink = %name))]
async fn sink_worker<S: TelemetrySink>(
    mut sink: S,
    mut rx: mpsc::Receiver<Telemetry>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!("sink worker started");

    while let Some(telemetry) = rx.recv().await {
        metrics.set_queue_len(rx.len());
        match sink.write(&telemetry).await {
            Ok(()) => metrics.inc_written(),
            Err(e) => {
                // 单条失败不终止 worker
                metrics.inc_failed();
                error!(round = telemetry.round_index, error = %e, "telemetry write failed");
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(error = %e, "flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(error = %e, "close failed on shutdown");
    }
    debug!("sink worker stopped");
}
