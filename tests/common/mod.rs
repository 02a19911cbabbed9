#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use video_ingest::services::process::{ProcessOutput, ProcessRunner};
use video_ingest::services::storage::StorageService;

pub const FASTSTART_MARKER: &[u8] = b"faststart:";

/// Stands in for ffprobe/ffmpeg. The probe reports a single video stream of
/// the configured size; the remux copies the input with a marker prefix.
pub struct FakeMediaTools {
    pub probe_stdout: Mutex<String>,
    pub probe_exit: Mutex<i32>,
    pub remux_exit: Mutex<i32>,
    pub calls: Mutex<Vec<(String, Vec<OsString>)>>,
    /// Every path the tools were pointed at, inputs and outputs
    pub touched: Mutex<Vec<PathBuf>>,
}

impl FakeMediaTools {
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self::with_probe_output(&format!(
            r#"{{"streams":[{{"index":0,"codec_type":"video","width":{},"height":{}}},{{"index":1,"codec_type":"audio"}}]}}"#,
            width, height
        ))
    }

    pub fn with_probe_output(stdout: &str) -> Self {
        Self {
            probe_stdout: Mutex::new(stdout.to_string()),
            probe_exit: Mutex::new(0),
            remux_exit: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
            touched: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_probe(&self, code: i32) {
        *self.probe_exit.lock().unwrap() = code;
    }

    pub fn fail_remux(&self, code: i32) {
        *self.remux_exit.lock().unwrap() = code;
    }

    pub fn programs_called(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }

    pub fn touched_paths(&self) -> Vec<PathBuf> {
        self.touched.lock().unwrap().clone()
    }
}

impl ProcessRunner for FakeMediaTools {
    fn run(&self, program: &str, args: &[OsString]) -> io::Result<ProcessOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));

        match program {
            "ffprobe" => {
                let input = PathBuf::from(args.last().expect("probe input"));
                assert!(input.exists(), "probe input must exist while probing");
                self.touched.lock().unwrap().push(input);

                let code = *self.probe_exit.lock().unwrap();
                Ok(ProcessOutput {
                    code: Some(code),
                    stdout: if code == 0 {
                        self.probe_stdout.lock().unwrap().clone().into_bytes()
                    } else {
                        Vec::new()
                    },
                    stderr: if code == 0 {
                        Vec::new()
                    } else {
                        b"/tmp/secret-path: Invalid data found when processing input".to_vec()
                    },
                })
            }
            "ffmpeg" => {
                let input = PathBuf::from(&args[1]);
                let output = PathBuf::from(args.last().expect("remux output"));
                self.touched.lock().unwrap().push(input.clone());
                self.touched.lock().unwrap().push(output.clone());

                // A failing ffmpeg still leaves a partial file behind
                let mut data = FASTSTART_MARKER.to_vec();
                data.extend(std::fs::read(&input)?);
                std::fs::write(&output, data)?;

                let code = *self.remux_exit.lock().unwrap();
                Ok(ProcessOutput {
                    code: Some(code),
                    stdout: Vec::new(),
                    stderr: if code == 0 {
                        Vec::new()
                    } else {
                        b"moov atom not found".to_vec()
                    },
                })
            }
            other => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("unexpected program {}", other),
            )),
        }
    }
}

pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

pub struct MemoryStorage {
    pub objects: Mutex<HashMap<String, StoredObject>>,
    pub fail: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl StorageService for MemoryStorage {
    async fn upload_file(
        &self,
        path: &Path,
        key: &str,
        content_type: &str,
    ) -> anyhow::Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("ServiceUnavailable: slow down"));
        }
        let data = tokio::fs::read(path).await?;
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(self.object_url(key))
    }

    fn object_url(&self, key: &str) -> String {
        format!("https://test-bucket.s3.us-east-1.amazonaws.com/{}", key)
    }

    async fn health_check(&self) -> bool {
        !self.fail.load(Ordering::SeqCst)
    }
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

/// Splits `<orientation>/<id><ext>` and checks the id is 32 bytes of url-safe base64
pub fn assert_key_shape(key: &str, orientation: &str, ext: &str) {
    let (dir, file) = key.split_once('/').expect("key has a directory");
    assert_eq!(dir, orientation);
    let id = file.strip_suffix(ext).expect("key has extension");
    assert_eq!(id.len(), 43, "unexpected id {}", id);
    assert!(
        id.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    );
}
