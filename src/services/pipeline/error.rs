use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("No streams found in upload")]
    NoStreams,

    #[error("Remux failed: {0}")]
    Remux(String),

    #[error("Storage upload failed: {0}")]
    Storage(#[source] anyhow::Error),
}

impl PipelineError {
    /// Stable machine-readable tag for logs
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedMediaType(_) => "unsupported_media_type",
            PipelineError::Io(_) => "io_error",
            PipelineError::Probe(_) => "probe_error",
            PipelineError::NoStreams => "no_streams",
            PipelineError::Remux(_) => "remux_error",
            PipelineError::Storage(_) => "storage_error",
        }
    }

    /// Whether the caller sent something we refuse, as opposed to a server-side failure
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::UnsupportedMediaType(_))
    }
}
