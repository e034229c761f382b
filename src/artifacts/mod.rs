//! 提交产物存储
//!
//! 上传内容先写入暂存文件（`StagedArtifact`），校验通过且业务检查都完成后再
//! `persist` 到正式位置。暂存文件在 guard 析构时自动删除，任何提前返回的路径
//! 都不会留下临时文件。

pub mod filesystem;

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::errors::{ContestError, Result};
use crate::models::submissions::ArtifactRef;
use crate::utils::file_magic::{MAGIC_PREFIX_LEN, validate_magic_bytes};

pub use filesystem::FilesystemArtifactStore;

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// 创建一个暂存产物，`mime` 决定魔术字节校验规则
    async fn stage(&self, mime: &str, file_name: &str) -> Result<StagedArtifact>;

    /// 将暂存产物移动到正式位置，返回相对路径等信息
    async fn persist(&self, staged: StagedArtifact) -> Result<ArtifactRef>;

    /// 删除产物，返回是否真的删除了文件
    async fn delete(&self, path: &str) -> Result<bool>;

    async fn exists(&self, path: &str) -> Result<bool>;

    async fn read(&self, path: &str) -> Result<Vec<u8>>;
}

/// 暂存中的上传产物
///
/// 未被 persist 的暂存产物在析构时删除临时文件。
pub struct StagedArtifact {
    temp_path: PathBuf,
    file: Option<tokio::fs::File>,
    mime: String,
    file_name: String,
    size: u64,
    max_size: u64,
    header: Vec<u8>,
    magic_checked: bool,
    persisted: bool,
}

impl StagedArtifact {
    pub(crate) fn new(
        temp_path: PathBuf,
        file: tokio::fs::File,
        mime: &str,
        file_name: &str,
        max_size: u64,
    ) -> Self {
        Self {
            temp_path,
            file: Some(file),
            mime: mime.to_string(),
            file_name: file_name.to_string(),
            size: 0,
            max_size,
            header: Vec::with_capacity(MAGIC_PREFIX_LEN),
            magic_checked: false,
            persisted: false,
        }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// 追加一段内容，超过大小上限或内容类型不符时返回错误
    pub async fn write_chunk(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        self.size += data.len() as u64;
        if self.size > self.max_size {
            return Err(ContestError::payload_too_large(format!(
                "File size exceeds the limit of {} bytes",
                self.max_size
            )));
        }

        if !self.magic_checked {
            let need = MAGIC_PREFIX_LEN - self.header.len();
            self.header
                .extend_from_slice(&data[..need.min(data.len())]);
            if self.header.len() >= MAGIC_PREFIX_LEN {
                self.check_magic()?;
            }
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| ContestError::file_operation("Staged artifact already closed"))?;
        file.write_all(data).await?;
        Ok(())
    }

    fn check_magic(&mut self) -> Result<()> {
        self.magic_checked = true;
        if !validate_magic_bytes(&self.header, &self.mime) {
            return Err(ContestError::unsupported_media_type(format!(
                "File content does not match {}",
                self.mime
            )));
        }
        Ok(())
    }

    /// 写入结束：空文件拒绝，短文件补做魔术字节校验，并刷新落盘
    pub(crate) async fn finish(&mut self) -> Result<()> {
        if self.size == 0 {
            return Err(ContestError::validation("Uploaded file is empty"));
        }
        if !self.magic_checked {
            self.check_magic()?;
        }
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(())
    }

    pub(crate) fn temp_path(&self) -> &PathBuf {
        &self.temp_path
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.persisted = true;
    }
}

impl Drop for StagedArtifact {
    fn drop(&mut self) {
        self.file.take();
        if !self.persisted
            && let Err(e) = std::fs::remove_file(&self.temp_path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(
                "Failed to remove staged artifact {}: {}",
                self.temp_path.display(),
                e
            );
        }
    }
}
