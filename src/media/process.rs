//! Subprocess invocation with a deadline and a bounded retry.

use crate::error::{Result, StepreelError};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Captured output of a successful tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs external command-line tools.
///
/// Every invocation is bounded by `timeout` and killed when the deadline
/// passes. Non-zero exits and timeouts are retried `retries` times; a missing
/// executable is reported immediately. Programs found in `tool_dir` take
/// precedence over `PATH`.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    timeout: Duration,
    retries: u32,
    tool_dir: Option<PathBuf>,
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(600), 1)
    }
}

impl ToolRunner {
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self {
            timeout,
            retries,
            tool_dir: None,
        }
    }

    /// Build a runner from media settings.
    pub fn from_settings(settings: &crate::config::MediaSettings) -> Self {
        let runner = Self::new(settings.timeout(), settings.retries);
        match settings.tool_dir() {
            Some(dir) => runner.with_tool_dir(dir),
            None => runner,
        }
    }

    /// Look for executables in `dir` before falling back to `PATH`.
    pub fn with_tool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tool_dir = Some(dir.into());
        self
    }

    fn resolve(&self, program: &str) -> PathBuf {
        match &self.tool_dir {
            Some(dir) if dir.join(program).is_file() => dir.join(program),
            _ => Path::new(program).to_path_buf(),
        }
    }

    /// Run `program` with `args`, returning captured stdout/stderr on success.
    #[instrument(skip(self, args), fields(tool = %program))]
    pub async fn run<I, S>(&self, program: &str, args: I) -> Result<ToolOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<std::ffi::OsString> =
            args.into_iter().map(|a| a.as_ref().to_os_string()).collect();

        let mut attempt = 0;
        loop {
            match self.run_once(program, &args).await {
                Ok(output) => return Ok(output),
                Err(e @ (StepreelError::ToolFailed { .. } | StepreelError::Timeout { .. }))
                    if attempt < self.retries =>
                {
                    attempt += 1;
                    warn!("{} failed ({}), retrying ({}/{})", program, e, attempt, self.retries);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn run_once(&self, program: &str, args: &[std::ffi::OsString]) -> Result<ToolOutput> {
        debug!("Running {} {:?}", program, args);

        let child = Command::new(self.resolve(program))
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let result = match tokio::time::timeout(self.timeout, child).await {
            Ok(r) => r,
            Err(_) => {
                return Err(StepreelError::Timeout {
                    tool: program.to_string(),
                    seconds: self.timeout.as_secs(),
                })
            }
        };

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StepreelError::ToolNotFound(program.to_string()));
            }
            Err(e) => return Err(StepreelError::Io(e)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(StepreelError::ToolFailed {
                tool: program.to_string(),
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }
}

/// Write an executable `sh` script named `name` into `dir`.
#[cfg(all(test, unix))]
pub(crate) fn write_tool_shim(dir: &Path, name: &str, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}
