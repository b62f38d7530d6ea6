use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use reel_blob::{BlobConfig, BlobStore, FsChunkStore, DEFAULT_CHUNK_SIZE};

struct ServerDefaults;

impl ServerDefaults {
    const HOST: &'static str = "127.0.0.1";
    const PORT: u16 = 3000;
    const STORAGE_ROOT: &'static str = "./data/videos";
    const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024 * 1024;
    const UPLOAD_FIELD: &'static str = "video";
}

/// Where chunks live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    Fs,
}

impl FromStr for StorageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "fs" | "file" | "filesystem" => Ok(Self::Fs),
            other => Err(anyhow!("unknown STORAGE backend {other:?} (expected memory or fs)")),
        }
    }
}

/// Server settings, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageKind,
    pub storage_root: PathBuf,
    pub upload_field: String,
    pub blob: BlobConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: ServerDefaults::HOST.to_string(),
            port: ServerDefaults::PORT,
            storage: StorageKind::Memory,
            storage_root: PathBuf::from(ServerDefaults::STORAGE_ROOT),
            upload_field: ServerDefaults::UPLOAD_FIELD.to_string(),
            blob: BlobConfig::new().with_max_blob_bytes(ServerDefaults::MAX_UPLOAD_BYTES),
        }
    }
}

impl ServerConfig {
    /// Read the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HTTP_HOST").unwrap_or(defaults.host);
        let port = match lookup("HTTP_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => parse_value("HTTP_PORT", &raw)?,
            None => defaults.port,
        };
        let storage = match lookup("STORAGE") {
            Some(raw) => raw.parse()?,
            None => defaults.storage,
        };
        let storage_root = lookup("STORAGE_ROOT")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_root);
        let upload_field = lookup("UPLOAD_FIELD")
            .filter(|f| !f.trim().is_empty())
            .unwrap_or(defaults.upload_field);

        let chunk_size = env_value(&lookup, "CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        let max_upload = env_value(&lookup, "MAX_UPLOAD_BYTES", ServerDefaults::MAX_UPLOAD_BYTES)?;
        let cap_explicit_end = env_value(&lookup, "RANGE_CAP_EXPLICIT_END", false)?;

        let blob = BlobConfig::new()
            .with_chunk_size(chunk_size)
            .with_max_blob_bytes(max_upload)
            .cap_explicit_end(cap_explicit_end);
        blob.validate().context("invalid blob configuration")?;

        Ok(Self {
            host,
            port,
            storage,
            storage_root,
            upload_field,
            blob,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Open the configured backend
    pub async fn open_store(&self) -> anyhow::Result<BlobStore> {
        let store = match self.storage {
            StorageKind::Memory => BlobStore::memory(self.blob.clone())?,
            StorageKind::Fs => {
                let chunks = FsChunkStore::open(self.storage_root.clone())
                    .await
                    .with_context(|| format!("opening {}", self.storage_root.display()))?;
                BlobStore::new(chunks, self.blob.clone())?
            }
        };
        Ok(store)
    }
}

fn env_value<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("invalid value {raw:?} for {key}: {e}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.addr(), "127.0.0.1:3000");
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.upload_field, "video");
        assert_eq!(config.blob.chunk_size, 1024 * 1024);
        assert_eq!(config.blob.max_blob_bytes, 5 * 1024 * 1024 * 1024);
        assert!(!config.blob.cap_explicit_end);
    }

    #[test]
    fn reads_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("HTTP_HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("STORAGE", "FS"),
            ("STORAGE_ROOT", "/tmp/reel"),
            ("CHUNK_SIZE", "4096"),
            ("MAX_UPLOAD_BYTES", "10000"),
            ("UPLOAD_FIELD", "file"),
            ("RANGE_CAP_EXPLICIT_END", "true"),
        ]))
        .unwrap();

        assert_eq!(config.addr(), "0.0.0.0:8080");
        assert_eq!(config.storage, StorageKind::Fs);
        assert_eq!(config.storage_root, PathBuf::from("/tmp/reel"));
        assert_eq!(config.blob.chunk_size, 4096);
        assert_eq!(config.blob.max_blob_bytes, 10000);
        assert_eq!(config.upload_field, "file");
        assert!(config.blob.cap_explicit_end);
    }

    #[test]
    fn http_port_wins_over_port() {
        let config =
            ServerConfig::from_lookup(lookup_from(&[("HTTP_PORT", "4000"), ("PORT", "5000")]))
                .unwrap();
        assert_eq!(config.port, 4000);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(ServerConfig::from_lookup(lookup_from(&[("CHUNK_SIZE", "big")])).is_err());
        assert!(ServerConfig::from_lookup(lookup_from(&[("CHUNK_SIZE", "0")])).is_err());
        assert!(ServerConfig::from_lookup(lookup_from(&[("HTTP_PORT", "70000")])).is_err());
        assert!(ServerConfig::from_lookup(lookup_from(&[("STORAGE", "s3")])).is_err());
    }
}
