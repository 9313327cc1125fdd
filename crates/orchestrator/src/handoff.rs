//! Hyper-parameter hand-off
//!
//! 训练阶段通过文件路径接收超参数文档：编排器在调用前将其写入临时目录，
//! 阶段返回后 (无论成功与否) 由 guard 的 `Drop` 删除。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Serialization used for materialized hyper-parameter documents
pub trait HandoffCodec: Send + Sync {
    /// File extension, without the dot
    fn extension(&self) -> &str;

    fn encode(&self, document: &Map<String, Value>) -> io::Result<Vec<u8>>;
}

/// JSON hand-off documents
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl HandoffCodec for JsonCodec {
    fn extension(&self) -> &str {
        "json"
    }

    fn encode(&self, document: &Map<String, Value>) -> io::Result<Vec<u8>> {
        serde_json::to_vec_pretty(document)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// A materialized hand-off file, removed when dropped
#[derive(Debug)]
pub struct HandoffFile {
    path: PathBuf,
}

impl HandoffFile {
    /// Write `document` as `<dir>/<stem>.<ext>`
    pub fn materialize(
        dir: &Path,
        stem: &str,
        document: &Map<String, Value>,
        codec: &dyn HandoffCodec,
    ) -> io::Result<Self> {
        let path = dir.join(format!("{stem}.{}", codec.extension()));
        let bytes = codec.encode(document)?;
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), keys = document.len(), "Hand-off file written");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for HandoffFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Hand-off file removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove hand-off file"),
        }
    }
}
