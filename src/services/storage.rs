use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use std::path::Path;

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Streams the file at `path` to `key`, returning its retrieval URL.
    /// An existing object under the same key is overwritten.
    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> Result<String>;

    /// Retrieval URL of `key`, without checking that the object exists
    fn object_url(&self, key: &str) -> String;

    async fn health_check(&self) -> bool;
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
    region: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String, region: String) -> Self {
        Self {
            client,
            bucket,
            region,
        }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> Result<String> {
        let body = ByteStream::from_path(path).await?;

        let res = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await;

        if let Err(e) = res {
            tracing::error!(
                "S3 put_object failed: bucket={}, key={}, error={:?}",
                self.bucket,
                key,
                e
            );
            return Err(e.into());
        }

        Ok(self.object_url(key))
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket, self.region, key
        )
    }

    async fn health_check(&self) -> bool {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
    }
}
