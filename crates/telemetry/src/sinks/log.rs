//! LogSink - 通过 tracing 输出遥测摘要

use contracts::{ContractError, Telemetry, TelemetrySink};
use tracing::{info, instrument};

/// 每 `every` 条记录输出一次摘要，避免 60 Hz 刷屏
pub struct LogSink {
    name: String,
    every: u64,
    seen: u64,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_interval(name, 60)
    }

    pub fn with_interval(name: impl Into<String>, every: u64) -> Self {
        Self {
            name: name.into(),
            every: every.max(1),
            seen: 0,
        }
    }

    fn log_summary(&self, t: &Telemetry) {
        info!(
            sink = %self.name,
            round = t.round_index,
            max_rounds = t.max_rounds,
            mode = %t.mode,
            remaining_s = t.time_remaining,
            speed_kmh = t.speed_kmh,
            steer = t.steer,
            throttle = t.throttle,
            brake = t.brake,
            x = t.location.x,
            y = t.location.y,
            ambient = t.ambient_count,
            reward = t.cumulative_reward,
            "telemetry"
        );
    }
}

impl TelemetrySink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, telemetry: &Telemetry) -> Result<(), ContractError> {
        if self.seen % self.every == 0 {
            self.log_summary(telemetry);
        }
        self.seen += 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, records = self.seen, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::with_interval("test_log", 2);
        for _ in 0..3 {
            sink.write(&Telemetry::default()).await.unwrap();
        }
        assert_eq!(sink.seen, 3);
        assert_eq!(sink.name(), "test_log");
    }
}
