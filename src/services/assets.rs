use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::config::AppConfig;
use crate::services::pipeline::{media_type_to_ext, random_id};

pub const THUMBNAIL_MEDIA_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Thumbnails written to the local asset directory, served elsewhere
pub struct AssetService {
    root: PathBuf,
    port: u16,
}

impl AssetService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            root: config.assets_root.clone(),
            port: config.port,
        }
    }

    pub async fn ensure_assets_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    pub fn asset_url(&self, file_name: &str) -> String {
        format!("http://localhost:{}/assets/{}", self.port, file_name)
    }

    pub fn disk_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Writes a thumbnail under a fresh random name and returns its URL.
    /// The file only appears under its final name once fully written.
    pub async fn store_thumbnail<R>(
        &self,
        media_type: &str,
        mut reader: R,
    ) -> Result<String, AssetError>
    where
        R: AsyncRead + Unpin,
    {
        let parsed: mime::Mime = media_type
            .parse()
            .map_err(|_| AssetError::UnsupportedMediaType(media_type.to_string()))?;
        let essence = parsed.essence_str();
        if !THUMBNAIL_MEDIA_TYPES.contains(&essence) {
            return Err(AssetError::UnsupportedMediaType(essence.to_string()));
        }

        let file_name = format!("{}{}", random_id(), media_type_to_ext(essence));

        let temp = tempfile::NamedTempFile::new_in(&self.root)?;
        let mut file = tokio::fs::File::from_std(temp.reopen()?);
        tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        temp.persist(self.disk_path(&file_name))
            .map_err(|e| AssetError::Io(e.error))?;

        tracing::info!("Stored thumbnail {}", file_name);
        Ok(self.asset_url(&file_name))
    }

    /// Best-effort removal of the file behind a previously issued asset URL
    pub async fn remove_by_url(&self, url: &str) {
        let Some(name) = url.rsplit('/').next().and_then(|n| Path::new(n).file_name()) else {
            return;
        };
        let path = self.root.join(name);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to delete old thumbnail {}: {}", path.display(), e);
        }
    }
}
