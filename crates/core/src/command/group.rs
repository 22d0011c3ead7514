//! Process-group cleanup for spawned toolchains and workers

/// SIGKILL every process in the group led by `pid`.
///
/// Children started with `process_group(0)` lead a group whose id is their
/// pid, so this also reaches anything they forked.
pub(crate) fn kill_process_group(pid: u32) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            tracing::debug!(pid, error = %e, "failed to kill process group");
        }
    }
    #[cfg(not(unix))]
    let _ = pid;
}

/// Kills a process group when dropped, unless disarmed first.
///
/// Held across the await points of a running command so that dropping the
/// future tears down the whole tree, not just the direct child.
#[derive(Debug)]
pub(crate) struct GroupGuard {
    pid: Option<u32>,
}

impl GroupGuard {
    pub(crate) fn new(pid: Option<u32>) -> Self {
        Self { pid }
    }

    /// The command finished on its own; leave the group alone.
    pub(crate) fn disarm(mut self) {
        self.pid = None;
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if let Some(pid) = self.pid.take() {
            tracing::debug!(pid, "command cancelled, killing process group");
            kill_process_group(pid);
        }
    }
}
