use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

use super::error::PipelineError;
use crate::services::process::ProcessRunner;

pub const PROCESSING_SUFFIX: &str = ".processing";

/// Output of a fast-start remux, deleted from disk when dropped.
pub struct RemuxedFile {
    path: TempPath,
}

impl RemuxedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn processing_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(PROCESSING_SUFFIX);
    PathBuf::from(name)
}

pub fn remux_args(input: &Path, output: &Path) -> Vec<OsString> {
    vec![
        "-i".into(),
        input.as_os_str().to_owned(),
        "-c".into(),
        "copy".into(),
        "-movflags".into(),
        "faststart".into(),
        "-f".into(),
        "mp4".into(),
        output.as_os_str().to_owned(),
    ]
}

/// Copies every stream of `input` into a new MP4 with the moov atom up front.
/// The input file is left alone.
pub fn remux_for_fast_start(
    runner: &dyn ProcessRunner,
    ffmpeg: &str,
    input: &Path,
) -> Result<RemuxedFile, PipelineError> {
    let output_path = processing_path(input);

    // Owned before ffmpeg starts so a half-written output is removed on failure too.
    let output = RemuxedFile {
        path: TempPath::try_from_path(&output_path)?,
    };

    let result = runner
        .run(ffmpeg, &remux_args(input, &output_path))
        .map_err(|e| PipelineError::Remux(format!("failed to execute {}: {}", ffmpeg, e)))?;

    // Logged once by the orchestrator, stderr included
    if !result.success() {
        return Err(PipelineError::Remux(format!(
            "{} exited with {:?}: {}",
            ffmpeg,
            result.code,
            result.stderr_lossy()
        )));
    }

    if !output_path.exists() {
        return Err(PipelineError::Remux(format!(
            "{} reported success but wrote no output",
            ffmpeg
        )));
    }

    tracing::info!("Remuxed {} for fast start", input.display());
    Ok(output)
}
