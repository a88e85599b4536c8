//! JsonlFileSink - 每条遥测一行 JSON

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{ContractError, Telemetry, TelemetrySink};
use tracing::{debug, instrument};

const DEFAULT_FILE_NAME: &str = "telemetry.jsonl";

pub struct JsonlFileSink {
    name: String,
    path: PathBuf,
    writer: BufWriter<File>,
    lines: u64,
}

impl JsonlFileSink {
    /// 以追加方式打开 `path`，必要时创建父目录
    pub fn create(name: impl Into<String>, path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            name: name.into(),
            path,
            writer: BufWriter::new(file),
            lines: 0,
        })
    }

    /// 从 sink 参数构造：`file` 为相对 `base_dir` 的文件名
    pub fn from_params(
        name: impl Into<String>,
        base_dir: &Path,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let file = params
            .get("file")
            .map(String::as_str)
            .unwrap_or(DEFAULT_FILE_NAME);
        Self::create(name, base_dir.join(file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, telemetry: &Telemetry) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, telemetry).map_err(std::io::Error::other)?;
        self.writer.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }
}

impl TelemetrySink for JsonlFileSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, telemetry: &Telemetry) -> Result<(), ContractError> {
        self.append(telemetry)
            .map_err(|e| ContractError::telemetry_write(&self.name, e.to_string()))
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::telemetry_write(&self.name, e.to_string()))
    }

    #[instrument(name = "file_sink_close", skip(self), fields(sink = %self.name))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush().await?;
        debug!(path = %self.path.display(), lines = self.lines, "JsonlFileSink closed");
        Ok(())
    }
}
