use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{ArtifactStore, StagedArtifact};
use crate::errors::{ContestError, Result};
use crate::models::submissions::ArtifactRef;
use crate::utils::file_magic::extension_for_mime;

const TEMP_DIR: &str = ".tmp";
const SUBMISSIONS_DIR: &str = "submissions";

/// 基于本地文件系统的产物存储
///
/// 目录结构：
/// - `{root}/.tmp/{uuid}`：暂存文件
/// - `{root}/submissions/submission-{unix_ts}-{uuid}.{ext}`：正式产物
pub struct FilesystemArtifactStore {
    root: PathBuf,
    max_size: u64,
}

impl FilesystemArtifactStore {
    pub async fn new(root: impl Into<PathBuf>, max_size: u64) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(TEMP_DIR)).await?;
        fs::create_dir_all(root.join(SUBMISSIONS_DIR)).await?;
        Ok(Self { root, max_size })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn temp_path(&self) -> PathBuf {
        self.root
            .join(TEMP_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// 将相对路径解析到根目录下，拒绝绝对路径和 `..`
    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let path = Path::new(relative);
        if relative.is_empty()
            || !path
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(ContestError::validation(format!(
                "Invalid artifact path: {relative}"
            )));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl ArtifactStore for FilesystemArtifactStore {
    async fn stage(&self, mime: &str, file_name: &str) -> Result<StagedArtifact> {
        if extension_for_mime(mime).is_none() {
            return Err(ContestError::unsupported_media_type(format!(
                "Unsupported file type: {mime}"
            )));
        }
        let temp_path = self.temp_path();
        let file = fs::File::create(&temp_path).await?;
        Ok(StagedArtifact::new(
            temp_path,
            file,
            mime,
            file_name,
            self.max_size,
        ))
    }

    async fn persist(&self, mut staged: StagedArtifact) -> Result<ArtifactRef> {
        staged.finish().await?;

        let extension = extension_for_mime(staged.mime()).unwrap_or("bin");
        let stored_name = format!(
            "submission-{}-{}.{}",
            chrono::Utc::now().timestamp(),
            uuid::Uuid::new_v4(),
            extension
        );
        let relative = format!("{SUBMISSIONS_DIR}/{stored_name}");
        let target = self.root.join(SUBMISSIONS_DIR).join(&stored_name);

        // rename 失败时 staged 仍未标记，析构会清理临时文件
        fs::rename(staged.temp_path(), &target).await?;
        staged.mark_persisted();

        Ok(ArtifactRef {
            path: relative,
            file_name: staged.file_name().to_string(),
            file_size: staged.size() as i64,
        })
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path)?;
        Ok(fs::try_exists(&full).await?)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        match fs::read(&full).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ContestError::not_found(format!("Artifact not found: {path}")))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF\n";

    pub(crate) async fn temp_store() -> (FilesystemArtifactStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemArtifactStore::new(dir.path().join("uploads"), 1024)
            .await
            .unwrap();
        (store, dir)
    }

    fn count_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|it| it.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn persist_moves_into_submissions() {
        let (store, _dir) = temp_store().await;
        let mut staged = store.stage("application/pdf", "report.pdf").await.unwrap();
        staged.write_chunk(PDF).await.unwrap();

        let artifact = store.persist(staged).await.unwrap();
        assert!(artifact.path.starts_with("submissions/submission-"));
        assert!(artifact.path.ends_with(".pdf"));
        assert_eq!(artifact.file_name, "report.pdf");
        assert_eq!(artifact.file_size, PDF.len() as i64);
        assert!(store.exists(&artifact.path).await.unwrap());
        assert_eq!(store.read(&artifact.path).await.unwrap(), PDF);
        assert_eq!(count_files(&store.root().join(TEMP_DIR)), 0);
    }

    #[tokio::test]
    async fn dropped_stage_leaves_no_temp_file() {
        let (store, _dir) = temp_store().await;
        {
            let mut staged = store.stage("application/pdf", "a.pdf").await.unwrap();
            staged.write_chunk(PDF).await.unwrap();
            assert_eq!(count_files(&store.root().join(TEMP_DIR)), 1);
        }
        assert_eq!(count_files(&store.root().join(TEMP_DIR)), 0);
        assert_eq!(count_files(&store.root().join(SUBMISSIONS_DIR)), 0);
    }

    #[tokio::test]
    async fn size_limit_enforced() {
        let (store, _dir) = temp_store().await;
        let mut staged = store.stage("application/pdf", "big.pdf").await.unwrap();
        staged.write_chunk(PDF).await.unwrap();
        let filler = vec![b'0'; 1024];
        let err = staged.write_chunk(&filler).await.unwrap_err();
        assert_eq!(err.code(), "E017");
    }

    #[tokio::test]
    async fn magic_mismatch_rejected() {
        let (store, _dir) = temp_store().await;
        let mut staged = store.stage("application/pdf", "fake.pdf").await.unwrap();
        let err = staged
            .write_chunk(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E016");
    }

    #[tokio::test]
    async fn magic_checked_across_small_chunks() {
        let (store, _dir) = temp_store().await;
        let mut staged = store.stage("application/pdf", "split.pdf").await.unwrap();
        for byte in PDF.chunks(3) {
            staged.write_chunk(byte).await.unwrap();
        }
        assert!(store.persist(staged).await.is_ok());
    }

    #[tokio::test]
    async fn empty_and_short_files_rejected_on_persist() {
        let (store, _dir) = temp_store().await;
        let staged = store.stage("application/pdf", "empty.pdf").await.unwrap();
        assert_eq!(store.persist(staged).await.unwrap_err().code(), "E007");

        let mut staged = store.stage("application/pdf", "short.pdf").await.unwrap();
        staged.write_chunk(b"%PD").await.unwrap();
        assert_eq!(store.persist(staged).await.unwrap_err().code(), "E016");
        assert_eq!(count_files(&store.root().join(TEMP_DIR)), 0);
    }

    #[tokio::test]
    async fn unsupported_mime_rejected() {
        let (store, _dir) = temp_store().await;
        let err = store.stage("text/plain", "notes.txt").await.err().unwrap();
        assert_eq!(err.code(), "E016");
    }

    #[tokio::test]
    async fn delete_reports_missing_and_rejects_traversal() {
        let (store, _dir) = temp_store().await;
        let mut staged = store.stage("application/pdf", "a.pdf").await.unwrap();
        staged.write_chunk(PDF).await.unwrap();
        let artifact = store.persist(staged).await.unwrap();

        assert!(store.delete(&artifact.path).await.unwrap());
        assert!(!store.delete(&artifact.path).await.unwrap());
        assert!(store.delete("../outside.pdf").await.is_err());
        assert!(store.delete("/etc/passwd").await.is_err());
    }
}
