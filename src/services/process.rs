use std::ffi::OsString;
use std::io;
use std::process::{Command, Stdio};

/// Captured result of a finished child process
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Runs an external program to completion, blocking the calling thread.
///
/// Probing and remuxing go through this trait so tests can answer for
/// ffprobe/ffmpeg without spawning anything.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, program: &str, args: &[OsString]) -> io::Result<ProcessOutput>;
}

/// Spawns real child processes via `std::process::Command`
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &str, args: &[OsString]) -> io::Result<ProcessOutput> {
        tracing::debug!("Running {} {:?}", program, args);

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
