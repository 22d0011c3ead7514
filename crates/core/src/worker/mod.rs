//! Local worker processes
//!
//! A worker is the built `bootstrap` executable started as a child process and
//! pointed at the orchestrator's local invocation endpoint. The [`Worker`]
//! handle owns the process for its whole life:
//! - [`Worker::logs`] hands out stdout and stderr as one merged stream
//! - [`Worker::stop`] kills the process (and its process group on unix)
//! - dropping the handle kills the process as well

mod logs;

pub use logs::LogStream;

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncRead;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::{oneshot, watch};

use crate::build::BuildOutput;
use crate::command::group::kill_process_group;
use crate::config::RustRuntimeConfig;
use crate::error::{Error, Result};

/// What to run and how to reach the orchestrator
#[derive(Debug, Clone, Default)]
pub struct RunInput {
    pub build: BuildOutput,
    /// Complete environment of the worker; nothing is inherited
    pub env: Vec<(String, String)>,
    /// Local invocation API endpoint, e.g. `127.0.0.1:9001`
    pub server: String,
}

impl RunInput {
    pub fn new(build: BuildOutput, server: impl Into<String>) -> Self {
        Self {
            build,
            env: Vec::new(),
            server: server.into(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessState {
    Running,
    /// Reaped; the status is missing if waiting on the child failed
    Exited(Option<ExitStatus>),
}

impl ProcessState {
    pub(crate) fn is_exited(&self) -> bool {
        matches!(self, ProcessState::Exited(_))
    }
}

/// Handle to a running worker process
#[derive(Debug)]
pub struct Worker {
    pid: Option<u32>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    kill: Option<oneshot::Sender<()>>,
    state: watch::Receiver<ProcessState>,
}

impl Worker {
    /// Start the built artifact described by `input`.
    ///
    /// Must be called from within a Tokio runtime. Returns as soon as the
    /// process is spawned.
    pub fn spawn(config: &RustRuntimeConfig, input: &RunInput) -> Result<Self> {
        let program = std::path::absolute(input.build.artifact_path())?;
        let working_dir: PathBuf = std::path::absolute(&input.build.out)?;

        tracing::info!(
            program = %program.display(),
            server = %input.server,
            "running worker"
        );

        let mut cmd = Command::new(&program);
        cmd.current_dir(&working_dir)
            .env_clear()
            .envs(input.env.iter().map(|(k, v)| (k, v)))
            .env(&config.runtime_api_env, &input.server)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so stopping also reaches anything it forks.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| Error::Spawn {
            program: program.display().to_string(),
            source,
        })?;

        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (kill_tx, kill_rx) = oneshot::channel();
        let (state_tx, state_rx) = watch::channel(ProcessState::Running);
        tokio::spawn(supervise(child, pid, kill_rx, state_tx));

        Ok(Self {
            pid,
            stdout,
            stderr,
            kill: Some(kill_tx),
            state: state_rx,
        })
    }

    /// OS process id, if the process was still running when spawned
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Whether the process has exited and been reaped
    pub fn has_exited(&self) -> bool {
        self.state.borrow().is_exited()
    }

    /// Merged stdout and stderr.
    ///
    /// The pipes are handed over on the first call; every later call returns
    /// a stream that is already at EOF.
    pub fn logs(&mut self) -> LogStream {
        let mut sources: Vec<Box<dyn AsyncRead + Unpin + Send>> = Vec::with_capacity(2);
        if let Some(stdout) = self.stdout.take() {
            sources.push(Box::new(stdout));
        }
        if let Some(stderr) = self.stderr.take() {
            sources.push(Box::new(stderr));
        }

        if sources.is_empty() {
            return LogStream::finished();
        }

        LogStream::merge(sources, self.state.clone())
    }

    /// Kill the process and wait until it has been reaped.
    ///
    /// Calling this again, or after the process exited on its own, does
    /// nothing.
    pub async fn stop(&mut self) {
        if let Some(kill) = self.kill.take() {
            tracing::info!(pid = ?self.pid, "stopping worker");
            // The supervisor is gone only if the process was already reaped.
            let _ = kill.send(());
        }

        let _ = self.state.wait_for(ProcessState::is_exited).await;
    }

    /// Wait for the process to exit on its own.
    ///
    /// Returns `None` if the exit status could not be collected.
    pub async fn wait(&mut self) -> Option<ExitStatus> {
        match self.state.wait_for(ProcessState::is_exited).await {
            Ok(state) => match *state {
                ProcessState::Exited(status) => status,
                ProcessState::Running => None,
            },
            Err(_) => None,
        }
    }
}

/// Owns the child until it exits or a kill is requested.
///
/// A dropped kill sender counts as a request, which is how dropping the
/// [`Worker`] terminates the process.
async fn supervise(
    mut child: Child,
    pid: Option<u32>,
    kill: oneshot::Receiver<()>,
    state: watch::Sender<ProcessState>,
) {
    let status = tokio::select! {
        biased;
        status = child.wait() => status,
        _ = kill => {
            terminate(&mut child, pid);
            child.wait().await
        }
    };

    let status = match status {
        Ok(status) => {
            tracing::debug!(pid = ?pid, %status, "worker exited");
            Some(status)
        }
        Err(e) => {
            tracing::warn!(pid = ?pid, error = %e, "failed to wait for worker");
            None
        }
    };

    state.send_replace(ProcessState::Exited(status));
}

fn terminate(child: &mut Child, pid: Option<u32>) {
    if let Some(pid) = pid {
        kill_process_group(pid);
    }

    // Fails only when the child is already gone.
    let _ = child.start_kill();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    const TEST_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

    fn script_build(dir: &TempDir, body: &str) -> BuildOutput {
        let path = dir.path().join("bootstrap");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        BuildOutput {
            handler: "bootstrap".to_string(),
            out: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_env_is_exactly_input_plus_endpoint() {
        let temp = TempDir::new().unwrap();
        let build = script_build(&temp, "/usr/bin/env; pwd");
        let input = RunInput::new(build, "127.0.0.1:9001").with_env("FUNCTION", "orders");

        let mut worker = Worker::spawn(&RustRuntimeConfig::default(), &input).unwrap();
        let mut output = String::new();
        worker.logs().read_to_string(&mut output).await.unwrap();

        let mut lines: Vec<&str> = output.lines().collect();
        let pwd = PathBuf::from(lines.pop().unwrap());
        assert_eq!(pwd.canonicalize().unwrap(), temp.path().canonicalize().unwrap());

        assert!(lines.contains(&"FUNCTION=orders"));
        assert!(lines.contains(&"AWS_LAMBDA_RUNTIME_API=127.0.0.1:9001"));
        assert!(!lines.iter().any(|l| l.starts_with("HOME=")));
        assert!(worker.has_exited());
    }

    #[tokio::test]
    async fn test_logs_counts_all_bytes() {
        let temp = TempDir::new().unwrap();
        // 4000 bytes on stdout, 3000 on stderr
        let build = script_build(
            &temp,
            "i=0; while [ $i -lt 300 ]; do printf '0123456789'; printf 'abcdefghij' >&2; i=$((i+1)); done; \
             i=0; while [ $i -lt 100 ]; do printf 'xxxxxxxxxx'; i=$((i+1)); done",
        );
        let input = RunInput::new(build, "127.0.0.1:9001");

        let mut worker = Worker::spawn(&RustRuntimeConfig::default(), &input).unwrap();
        let mut bytes = Vec::new();
        worker.logs().read_to_end(&mut bytes).await.unwrap();

        assert_eq!(bytes.len(), 7000);
        assert_eq!(bytes.iter().filter(|b| b.is_ascii_digit()).count(), 3000);
        assert_eq!(bytes.iter().filter(|&&b| b == b'x').count(), 1000);
        assert_eq!(bytes.iter().filter(|b| (b'a'..=b'j').contains(b)).count(), 3000);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let build = script_build(&temp, "sleep 30");
        let input = RunInput::new(build, "127.0.0.1:9001").with_env("PATH", TEST_PATH);

        let mut worker = Worker::spawn(&RustRuntimeConfig::default(), &input).unwrap();
        assert!(worker.id().is_some());
        assert!(!worker.has_exited());

        tokio::time::timeout(Duration::from_secs(5), worker.stop())
            .await
            .expect("stop should not hang");
        assert!(worker.has_exited());

        worker.stop().await;
        worker.stop().await;
    }

    #[tokio::test]
    async fn test_stop_ends_log_stream() {
        let temp = TempDir::new().unwrap();
        // The child keeps the pipes open; only the group kill closes them.
        let build = script_build(&temp, "echo ready; sleep 30 & wait");
        let input = RunInput::new(build, "127.0.0.1:9001").with_env("PATH", TEST_PATH);

        let mut worker = Worker::spawn(&RustRuntimeConfig::default(), &input).unwrap();
        let mut logs = worker.logs();

        let mut ready = [0u8; 6];
        logs.read_exact(&mut ready).await.unwrap();
        assert_eq!(&ready, b"ready\n");

        worker.stop().await;

        let mut rest = Vec::new();
        tokio::time::timeout(Duration::from_secs(5), logs.read_to_end(&mut rest))
            .await
            .expect("log stream should close after stop")
            .unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_stop_after_natural_exit() {
        let temp = TempDir::new().unwrap();
        let build = script_build(&temp, "exit 4");
        let input = RunInput::new(build, "127.0.0.1:9001");

        let mut worker = Worker::spawn(&RustRuntimeConfig::default(), &input).unwrap();
        let status = worker.wait().await.unwrap();
        assert_eq!(status.code(), Some(4));

        worker.stop().await;
        assert_eq!(worker.wait().await.and_then(|s| s.code()), Some(4));
    }

    #[tokio::test]
    async fn test_second_logs_call_is_empty() {
        let temp = TempDir::new().unwrap();
        let build = script_build(&temp, "echo once");
        let input = RunInput::new(build, "127.0.0.1:9001");

        let mut worker = Worker::spawn(&RustRuntimeConfig::default(), &input).unwrap();
        let mut first = String::new();
        worker.logs().read_to_string(&mut first).await.unwrap();
        let mut second = String::new();
        worker.logs().read_to_string(&mut second).await.unwrap();

        assert_eq!(first, "once\n");
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_spawn_missing_artifact() {
        let temp = TempDir::new().unwrap();
        let build = BuildOutput {
            handler: "bootstrap".to_string(),
            out: temp.path().to_path_buf(),
            ..Default::default()
        };

        let err = Worker::spawn(&RustRuntimeConfig::default(), &RunInput::new(build, "x")).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }
}
