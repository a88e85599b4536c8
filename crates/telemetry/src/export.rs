//! 手动导出当前遥测快照

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use contracts::Telemetry;
use tracing::info;

use crate::error::TelemetryError;

/// 把遥测写入 `dir/telemetry_YYYYmmdd_HHMMSS_fff.json`，返回文件路径
pub fn export_snapshot(dir: &Path, telemetry: &Telemetry) -> Result<PathBuf, TelemetryError> {
    fs::create_dir_all(dir)?;
    let stamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
    let path = dir.join(format!("telemetry_{stamp}.json"));

    let body = serde_json::to_vec_pretty(telemetry)
        .map_err(|e| TelemetryError::export(path.display().to_string(), e.to_string()))?;
    fs::write(&path, body)?;

    info!(path = %path.display(), round = telemetry.round_index, "telemetry exported");
    Ok(path)
}
