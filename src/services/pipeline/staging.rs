use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncWriteExt};

use super::error::PipelineError;

/// An upload copied to local scratch space. The file is removed when this
/// value is dropped, whichever way the run ends.
pub struct StagedFile {
    temp: NamedTempFile,
    size: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Copies `reader` into a fresh, randomly named file under `dir`. The write
/// handle is closed once the bytes are synced; readers open the path and
/// start at offset zero.
///
/// When `expected_len` is given, a stream that ends early (or runs long) is
/// rejected as truncated.
pub async fn stage<R>(
    dir: &Path,
    suffix: &str,
    mut reader: R,
    expected_len: Option<u64>,
) -> Result<StagedFile, PipelineError>
where
    R: AsyncRead + Unpin,
{
    let temp = tempfile::Builder::new()
        .prefix("video-upload-")
        .suffix(suffix)
        .tempfile_in(dir)?;
    let mut file = tokio::fs::File::from_std(temp.reopen()?);

    let size = tokio::io::copy(&mut reader, &mut file).await?;

    if let Some(expected) = expected_len {
        if size != expected {
            return Err(PipelineError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("upload truncated: received {} of {} bytes", size, expected),
            )));
        }
    }

    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    tracing::debug!("Staged {} bytes at {}", size, temp.path().display());

    Ok(StagedFile { temp, size })
}
