use crate::models::VideoRecord;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

/// Persistence boundary for video records. The pipeline never talks to it;
/// handlers load a record before a run and save the one it hands back.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>>;
    async fn update_video(&self, video: &VideoRecord) -> Result<()>;
    async fn create_video(&self, video: VideoRecord) -> Result<VideoRecord>;
}

/// In-process store for development and tests
#[derive(Default)]
pub struct InMemoryVideoRepository {
    videos: DashMap<Uuid, VideoRecord>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>> {
        Ok(self.videos.get(&id).map(|v| v.value().clone()))
    }

    async fn update_video(&self, video: &VideoRecord) -> Result<()> {
        match self.videos.get_mut(&video.id) {
            Some(mut existing) => {
                let mut updated = video.clone();
                updated.updated_at = Utc::now();
                *existing = updated;
                Ok(())
            }
            None => Err(anyhow::anyhow!("Video {} not found", video.id)),
        }
    }

    async fn create_video(&self, video: VideoRecord) -> Result<VideoRecord> {
        self.videos.insert(video.id, video.clone());
        Ok(video)
    }
}
