use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use crate::{BlobId, BlobRecord, BlobResult, ChunkStore};

const RECORD_FILE: &str = "meta.json";
const RECORD_TMP_FILE: &str = "meta.json.tmp";
const CHUNK_EXT: &str = "chunk";

/// Filesystem backend: one directory per blob.
///
/// ```text
/// <root>/<blob id>/meta.json
/// <root>/<blob id>/00000000.chunk
/// <root>/<blob id>/00000001.chunk
/// ```
#[derive(Debug, Clone)]
pub struct FsChunkStore {
    root: PathBuf,
}

impl FsChunkStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> BlobResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_dir(&self, id: &BlobId) -> PathBuf {
        self.root.join(id.to_string())
    }

    fn record_path(&self, id: &BlobId) -> PathBuf {
        self.blob_dir(id).join(RECORD_FILE)
    }

    fn chunk_path(&self, id: &BlobId, index: u64) -> PathBuf {
        self.blob_dir(id).join(format!("{index:08}.{CHUNK_EXT}"))
    }

    /// Drop the blob directory once nothing is left in it.
    async fn prune_dir(&self, id: &BlobId) {
        // fails while the directory still has entries, which is fine
        let _ = fs::remove_dir(self.blob_dir(id)).await;
    }
}

async fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(data) => Ok(Some(data)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

async fn remove_optional(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

#[async_trait]
impl ChunkStore for FsChunkStore {
    async fn put_record(&self, record: &BlobRecord) -> BlobResult<()> {
        let dir = self.blob_dir(&record.id);
        fs::create_dir_all(&dir).await?;

        // write-then-rename so readers never observe a half-written record
        let tmp = dir.join(RECORD_TMP_FILE);
        fs::write(&tmp, serde_json::to_vec(record)?).await?;
        fs::rename(&tmp, self.record_path(&record.id)).await?;
        Ok(())
    }

    async fn get_record(&self, id: &BlobId) -> BlobResult<Option<BlobRecord>> {
        match read_optional(&self.record_path(id)).await? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    async fn delete_record(&self, id: &BlobId) -> BlobResult<()> {
        remove_optional(&self.record_path(id)).await?;
        self.prune_dir(id).await;
        Ok(())
    }

    async fn put_chunk(&self, id: &BlobId, index: u64, data: Bytes) -> BlobResult<()> {
        fs::create_dir_all(self.blob_dir(id)).await?;
        fs::write(self.chunk_path(id, index), &data).await?;
        Ok(())
    }

    async fn get_chunk(&self, id: &BlobId, index: u64) -> BlobResult<Option<Bytes>> {
        Ok(read_optional(&self.chunk_path(id, index))
            .await?
            .map(Bytes::from))
    }

    async fn delete_chunks(&self, id: &BlobId) -> BlobResult<()> {
        let dir = self.blob_dir(id);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == CHUNK_EXT) {
                remove_optional(&path).await?;
            }
        }
        self.prune_dir(id).await;
        Ok(())
    }
}
