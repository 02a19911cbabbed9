use std::env;
use std::path::PathBuf;

/// Process-wide configuration, resolved once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP port, also used for thumbnail asset URLs (default: 8091)
    pub port: u16,

    /// Directory thumbnails are written to (default: "./assets")
    pub assets_root: PathBuf,

    /// Object storage bucket for processed videos
    pub s3_bucket: String,

    /// Object storage region (default: "us-east-1")
    pub s3_region: String,

    /// Custom S3-compatible endpoint, e.g. MinIO (default: AWS)
    pub s3_endpoint: Option<String>,

    /// Static access key; the AWS provider chain is used when unset
    pub s3_access_key: Option<String>,

    pub s3_secret_key: Option<String>,

    /// HS256 secret used to validate bearer tokens
    pub jwt_secret: String,

    /// Maximum video upload size in bytes (default: 1 GB)
    pub max_upload_size: usize,

    /// Maximum thumbnail upload size in bytes (default: 10 MB)
    pub max_thumbnail_size: usize,

    /// Scratch directory for staged uploads (default: system temp dir)
    pub temp_dir: PathBuf,

    /// ffprobe executable (default: "ffprobe")
    pub ffprobe_path: String,

    /// ffmpeg executable (default: "ffmpeg")
    pub ffmpeg_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8091,
            assets_root: PathBuf::from("./assets"),
            s3_bucket: "tubely-dev".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_endpoint: None,
            s3_access_key: None,
            s3_secret_key: None,
            jwt_secret: "secret".to_string(),
            max_upload_size: 1 << 30,     // 1 GB
            max_thumbnail_size: 10 << 20, // 10 MB
            temp_dir: env::temp_dir(),
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            assets_root: env::var("ASSETS_ROOT")
                .map(PathBuf::from)
                .unwrap_or(default.assets_root),

            s3_bucket: env::var("S3_BUCKET").unwrap_or(default.s3_bucket),

            s3_region: env::var("S3_REGION").unwrap_or(default.s3_region),

            s3_endpoint: env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),

            s3_access_key: env::var("S3_ACCESS_KEY").ok().filter(|v| !v.is_empty()),

            s3_secret_key: env::var("S3_SECRET_KEY").ok().filter(|v| !v.is_empty()),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            max_thumbnail_size: env::var("MAX_THUMBNAIL_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_thumbnail_size),

            temp_dir: env::var("UPLOAD_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.temp_dir),

            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or(default.ffprobe_path),

            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or(default.ffmpeg_path),
        }
    }

    /// Create config for development (local bucket name, dev secret)
    pub fn development() -> Self {
        Self::default()
    }

    /// Create config for production: bucket and secret must come from the environment
    pub fn production() -> anyhow::Result<Self> {
        let bucket = env::var("S3_BUCKET")
            .map_err(|_| anyhow::anyhow!("CRITICAL: S3_BUCKET must be set"))?;
        let secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("CRITICAL: JWT_SECRET must be set"))?;

        Ok(Self {
            s3_bucket: bucket,
            jwt_secret: secret,
            ..Self::from_env()
        })
    }
}
