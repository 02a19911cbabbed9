//! Video ingestion pipeline.
//!
//! An upload is staged to local scratch space, probed for its orientation,
//! remuxed so the MP4 metadata precedes the media data, and pushed to object
//! storage under `<orientation>/<random id>.<ext>`. Scratch files are owned by
//! the run that created them and are deleted when it ends, on every path.

pub mod error;
pub mod keys;
pub mod probe;
pub mod remux;
pub mod staging;

pub use error::PipelineError;
pub use keys::{StorageKey, derive_key, media_type_to_ext, random_id};
pub use probe::{AspectRatio, inspect_aspect_ratio};
pub use remux::{RemuxedFile, remux_for_fast_start};
pub use staging::{StagedFile, stage};

use chrono::Utc;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncRead;

use crate::config::AppConfig;
use crate::models::VideoRecord;
use crate::services::process::ProcessRunner;
use crate::services::storage::StorageService;

/// The only media type the pipeline accepts
pub const ACCEPTED_MEDIA_TYPE: &str = "video/mp4";

/// An inbound video body with its declared media type
pub struct UploadRequest<R> {
    pub reader: R,
    pub media_type: String,
    /// Byte count announced by the client, when known
    pub content_length: Option<u64>,
}

impl<R> UploadRequest<R> {
    pub fn new(reader: R, media_type: impl Into<String>) -> Self {
        Self {
            reader,
            media_type: media_type.into(),
            content_length: None,
        }
    }

    pub fn with_content_length(mut self, len: u64) -> Self {
        self.content_length = Some(len);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Staged,
    Inspected,
    Remuxed,
    Uploaded,
    Finalized,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Received => "received",
            PipelineStage::Staged => "staged",
            PipelineStage::Inspected => "inspected",
            PipelineStage::Remuxed => "remuxed",
            PipelineStage::Uploaded => "uploaded",
            PipelineStage::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

/// Normalized media type (parameters stripped) if it is the accepted one
pub fn accepted_media_type(declared: &str) -> Result<String, PipelineError> {
    let parsed: mime::Mime = declared
        .parse()
        .map_err(|_| PipelineError::UnsupportedMediaType(declared.to_string()))?;

    if parsed.essence_str() != ACCEPTED_MEDIA_TYPE {
        return Err(PipelineError::UnsupportedMediaType(
            parsed.essence_str().to_string(),
        ));
    }
    Ok(parsed.essence_str().to_string())
}

pub struct VideoPipeline {
    runner: Arc<dyn ProcessRunner>,
    storage: Arc<dyn StorageService>,
    temp_dir: PathBuf,
    ffprobe_path: String,
    ffmpeg_path: String,
}

impl VideoPipeline {
    pub fn new(
        config: &AppConfig,
        runner: Arc<dyn ProcessRunner>,
        storage: Arc<dyn StorageService>,
    ) -> Self {
        Self {
            runner,
            storage,
            temp_dir: config.temp_dir.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            ffmpeg_path: config.ffmpeg_path.clone(),
        }
    }

    /// Runs one upload through every stage and returns `video` with its
    /// `video_url` set. The caller is responsible for ownership checks
    /// beforehand and for persisting the result.
    #[tracing::instrument(skip_all, fields(video_id = %video.id))]
    pub async fn process<R>(
        &self,
        request: UploadRequest<R>,
        video: VideoRecord,
    ) -> Result<VideoRecord, PipelineError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut current = PipelineStage::Received;

        // Every temp file lives inside `run`, so all of them are gone by the
        // time an error is observed here.
        match self.run(request, video, &mut current).await {
            Ok(video) => Ok(video),
            Err(e) => {
                if e.is_client_error() {
                    tracing::warn!("Upload rejected in stage {}: {}", current, e);
                } else {
                    tracing::error!(
                        "Video pipeline failed after stage {} ({}): {:?}",
                        current,
                        e.kind(),
                        e
                    );
                }
                Err(e)
            }
        }
    }

    async fn run<R>(
        &self,
        request: UploadRequest<R>,
        mut video: VideoRecord,
        current: &mut PipelineStage,
    ) -> Result<VideoRecord, PipelineError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let media_type = accepted_media_type(&request.media_type)?;
        let ext = media_type_to_ext(&media_type);

        let staged = stage(
            &self.temp_dir,
            &ext,
            request.reader,
            request.content_length,
        )
        .await?;
        advance(current, PipelineStage::Staged);

        let aspect_ratio = self.inspect(staged.path()).await?;
        advance(current, PipelineStage::Inspected);

        let remuxed = self.remux(staged.path()).await?;
        advance(current, PipelineStage::Remuxed);

        let key = derive_key(&media_type, aspect_ratio).as_path();
        tracing::info!("Uploading {} ({} bytes staged)", key, staged.size());
        let url = self
            .storage
            .upload_file(remuxed.path(), &key, &media_type)
            .await
            .map_err(PipelineError::Storage)?;
        advance(current, PipelineStage::Uploaded);

        video.video_url = Some(url);
        video.updated_at = Utc::now();
        advance(current, PipelineStage::Finalized);

        Ok(video)
    }

    async fn inspect(&self, path: &Path) -> Result<AspectRatio, PipelineError> {
        let runner = self.runner.clone();
        let program = self.ffprobe_path.clone();
        let path = path.to_path_buf();

        tokio::task::spawn_blocking(move || inspect_aspect_ratio(runner.as_ref(), &program, &path))
            .await
            .map_err(|e| PipelineError::Probe(format!("probe task failed: {}", e)))?
    }

    async fn remux(&self, path: &Path) -> Result<RemuxedFile, PipelineError> {
        let runner = self.runner.clone();
        let program = self.ffmpeg_path.clone();
        let path = path.to_path_buf();

        tokio::task::spawn_blocking(move || remux_for_fast_start(runner.as_ref(), &program, &path))
            .await
            .map_err(|e| PipelineError::Remux(format!("remux task failed: {}", e)))?
    }
}

fn advance(current: &mut PipelineStage, next: PipelineStage) {
    tracing::debug!("Pipeline stage {} -> {}", current, next);
    *current = next;
}
