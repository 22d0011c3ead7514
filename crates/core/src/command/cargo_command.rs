use std::io::Read;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use super::group::GroupGuard;
use crate::error::{Error, Result};

/// An external toolchain invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Added on top of the inherited environment
    pub env: Vec<(String, String)>,
}

/// Exit status plus everything the process wrote to stdout and stderr
#[derive(Debug)]
pub struct CombinedOutput {
    pub status: ExitStatus,
    pub output: Vec<u8>,
}

impl CombinedOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl CargoCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
            env: Vec::new(),
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn to_shell_command(&self) -> String {
        let mut cmd = self.program.clone();
        for arg in &self.args {
            cmd.push(' ');
            if arg.contains(' ') {
                cmd.push_str(&format!("'{arg}'"));
            } else {
                cmd.push_str(arg);
            }
        }
        cmd
    }

    /// Run to completion, capturing stdout and stderr into one buffer.
    ///
    /// Both streams share a single pipe so the output keeps the order the
    /// process wrote it in. The command runs in its own process group, and
    /// that whole group is killed if the returned future is dropped before it
    /// resolves.
    pub async fn output_combined(&self) -> Result<CombinedOutput> {
        let (mut reader, writer) = std::io::pipe()?;

        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer)
            .kill_on_drop(true);

        // Descendants (cargo, rustc) hold the pipe open too; they must go down
        // with the child on cancellation.
        #[cfg(unix)]
        cmd.process_group(0);

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|source| Error::Spawn {
            program: self.program.clone(),
            source,
        })?;
        // The command still holds our copies of the write end; the reader only
        // sees EOF once those are closed.
        drop(cmd);
        let guard = GroupGuard::new(child.id());

        let collect = tokio::task::spawn_blocking(move || {
            let mut output = Vec::new();
            reader.read_to_end(&mut output).map(|_| output)
        });

        let status = child.wait().await?;
        let output = collect.await.map_err(std::io::Error::other)??;
        guard.disarm();

        Ok(CombinedOutput { status, output })
    }
}
