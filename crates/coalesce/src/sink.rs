//! Physical write collaborator
//!
//! The coalescer never touches disk itself; it hands finalized content to
//! a [`WriteSink`]. Production uses [`DiskSink`]; tests substitute a
//! recording sink with the same asynchronous contract.

use crate::coalescer::WriteMode;
use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Performs the actual storage operation for one finalized write.
///
/// The contract mirrors the public API: one call per physical write cycle,
/// completion delivered by the returned future, an `Err` meaning the
/// content was not persisted. Implementations are not called concurrently
/// for the same `key`.
#[async_trait]
pub trait WriteSink: Send + Sync {
    async fn persist(&self, key: &str, content: &str, mode: WriteMode) -> std::io::Result<()>;
}

/// Write sink backed by `tokio::fs`.
///
/// `key` is used verbatim as a file path; no normalization or path
/// resolution happens here. Append creates the file if missing. No
/// durability guarantee beyond what the OS write gives.
#[derive(Debug, Default)]
pub struct DiskSink;

#[async_trait]
impl WriteSink for DiskSink {
    async fn persist(&self, key: &str, content: &str, mode: WriteMode) -> std::io::Result<()> {
        match mode {
            WriteMode::Append => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(key)
                    .await?;
                file.write_all(content.as_bytes()).await?;
                file.flush().await?;
            }
            WriteMode::Replace => {
                tokio::fs::write(key, content.as_bytes()).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_append_creates_and_extends() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.txt");
        let key = path.to_str().unwrap();

        let sink = DiskSink;
        sink.persist(key, "foo\n", WriteMode::Append).await.unwrap();
        sink.persist(key, "bar\n", WriteMode::Append).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "foo\nbar\n");
    }

    #[tokio::test]
    async fn test_replace_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.txt");
        let key = path.to_str().unwrap();

        let sink = DiskSink;
        sink.persist(key, "a long first version\n", WriteMode::Replace)
            .await
            .unwrap();
        sink.persist(key, "short\n", WriteMode::Replace).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "short\n");
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("no/such/dir/log.txt");
        let key = path.to_str().unwrap();

        let sink = DiskSink;
        let err = sink.persist(key, "x", WriteMode::Append).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
