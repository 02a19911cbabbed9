use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use utoipa::ToSchema;

use super::error::PipelineError;
use crate::services::process::ProcessRunner;

/// Absolute tolerance around 16:9 and 9:16
const RATIO_TOLERANCE: f64 = 0.01;
const LANDSCAPE_RATIO: f64 = 16.0 / 9.0;
const PORTRAIT_RATIO: f64 = 9.0 / 16.0;

/// Orientation of the primary video stream. Doubles as the top-level
/// directory of the storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    Landscape,
    Portrait,
    Other,
}

impl AspectRatio {
    /// Classifies `width / height`. Degenerate dimensions land in `Other`.
    pub fn classify(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return AspectRatio::Other;
        }
        Self::from_ratio(width as f64 / height as f64)
    }

    pub fn from_ratio(ratio: f64) -> Self {
        if (ratio - LANDSCAPE_RATIO).abs() < RATIO_TOLERANCE {
            AspectRatio::Landscape
        } else if (ratio - PORTRAIT_RATIO).abs() < RATIO_TOLERANCE {
            AspectRatio::Portrait
        } else {
            AspectRatio::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "landscape",
            AspectRatio::Portrait => "portrait",
            AspectRatio::Other => "other",
        }
    }

    /// Canonical ratio notation ("16:9", "9:16", "other")
    pub fn ratio_label(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Other => "other",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub struct StreamProbeResult {
    #[serde(default)]
    pub streams: Vec<StreamInfo>,
}

#[derive(Debug, Deserialize)]
pub struct StreamInfo {
    #[serde(default)]
    pub index: u32,
    pub codec_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl StreamProbeResult {
    pub fn parse(stdout: &[u8]) -> Result<Self, PipelineError> {
        serde_json::from_slice(stdout)
            .map_err(|e| PipelineError::Probe(format!("unreadable ffprobe output: {}", e)))
    }

    /// Classifies the first reported stream; later streams are ignored.
    pub fn aspect_ratio(&self) -> Result<AspectRatio, PipelineError> {
        let stream = self.streams.first().ok_or(PipelineError::NoStreams)?;
        match (stream.width, stream.height) {
            (Some(w), Some(h)) => Ok(AspectRatio::classify(w, h)),
            _ => {
                tracing::warn!(
                    "Stream {} ({}) has no dimensions, classifying as other",
                    stream.index,
                    stream.codec_type.as_deref().unwrap_or("unknown")
                );
                Ok(AspectRatio::Other)
            }
        }
    }
}

pub fn probe_args(path: &Path) -> Vec<OsString> {
    vec![
        "-v".into(),
        "error".into(),
        "-print_format".into(),
        "json".into(),
        "-show_streams".into(),
        path.as_os_str().to_owned(),
    ]
}

/// Runs ffprobe against `path` and classifies its primary stream.
pub fn inspect_aspect_ratio(
    runner: &dyn ProcessRunner,
    ffprobe: &str,
    path: &Path,
) -> Result<AspectRatio, PipelineError> {
    let output = runner
        .run(ffprobe, &probe_args(path))
        .map_err(|e| PipelineError::Probe(format!("failed to execute {}: {}", ffprobe, e)))?;

    if !output.success() {
        return Err(PipelineError::Probe(format!(
            "{} exited with {:?}: {}",
            ffprobe,
            output.code,
            output.stderr_lossy()
        )));
    }

    let probe = StreamProbeResult::parse(&output.stdout)?;
    let ratio = probe.aspect_ratio()?;

    tracing::info!(
        "Probed {}: {} stream(s), aspect ratio {} ({})",
        path.display(),
        probe.streams.len(),
        ratio.ratio_label(),
        ratio
    );
    Ok(ratio)
}
