//! Checkpoint 持久化
//!
//! 每轮一个 `checkpoint_round_NNN.json`，训练历史单独写入 `training_history.json`。

use std::fs;
use std::path::{Path, PathBuf};

use contracts::{ContractError, TrainingHistory};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::value::LinearValue;

pub const HISTORY_FILE: &str = "training_history.json";

/// 可恢复的 agent 状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub round_index: u32,
    pub epsilon: f64,
    pub train_steps: u64,
    pub value: LinearValue,
}

pub fn checkpoint_path(dir: &Path, round_index: u32) -> PathBuf {
    dir.join(format!("checkpoint_round_{round_index:03}.json"))
}

fn io_err(operation: &str, path: &Path, e: impl std::fmt::Display) -> ContractError {
    ContractError::agent(operation, format!("{}: {e}", path.display()))
}

pub fn save(
    dir: &Path,
    checkpoint: &Checkpoint,
    history: &TrainingHistory,
) -> Result<PathBuf, ContractError> {
    fs::create_dir_all(dir).map_err(|e| io_err("save_model", dir, e))?;

    let path = checkpoint_path(dir, checkpoint.round_index);
    let body =
        serde_json::to_vec_pretty(checkpoint).map_err(|e| io_err("save_model", &path, e))?;
    fs::write(&path, body).map_err(|e| io_err("save_model", &path, e))?;

    let history_path = dir.join(HISTORY_FILE);
    let body =
        serde_json::to_vec_pretty(history).map_err(|e| io_err("save_model", &history_path, e))?;
    fs::write(&history_path, body).map_err(|e| io_err("save_model", &history_path, e))?;

    debug!(path = %path.display(), "checkpoint written");
    Ok(path)
}

pub fn load(path: &Path) -> Result<Checkpoint, ContractError> {
    let body = fs::read(path).map_err(|e| io_err("load_checkpoint", path, e))?;
    serde_json::from_slice(&body).map_err(|e| io_err("load_checkpoint", path, e))
}

/// 读取训练历史，文件不存在时返回空历史
pub fn load_history(dir: &Path) -> Result<TrainingHistory, ContractError> {
    let path = dir.join(HISTORY_FILE);
    if !path.exists() {
        return Ok(TrainingHistory::default());
    }
    let body = fs::read(&path).map_err(|e| io_err("load_history", &path, e))?;
    serde_json::from_slice(&body).map_err(|e| io_err("load_history", &path, e))
}
