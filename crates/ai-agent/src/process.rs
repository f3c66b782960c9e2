//! Agent subprocess control: spawn, hard timeout, process-group kill.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::warn;

/// Captured result of one subprocess run.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub stdout: String,
    pub stderr: String,
    /// Exit code; 1 when signal-killed, 137 on timeout kill.
    pub exit_code: i32,
    pub timed_out: bool,
}

/// Run a command to completion under a hard wall-clock limit.
///
/// - stdout/stderr are captured (piped), stdin is closed
/// - the child gets its own process group (setsid), so a timeout kill
///   takes the whole tree down, not just the direct child
/// - `kill_on_drop` is set as a safety net for cancelled callers
///
/// On expiry the process group is SIGKILLed and whatever output was
/// produced so far is returned with `timed_out = true`.
pub async fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<ProcessResult> {
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.stdin(Stdio::null());
    cmd.kill_on_drop(true);

    // SAFETY: setsid() is async-signal-safe and runs before exec.
    #[cfg(unix)]
    unsafe {
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }

    let mut child = cmd.spawn().context("Failed to spawn agent command")?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_reader = tokio::spawn(slurp(stdout));
    let stderr_reader = tokio::spawn(slurp(stderr));

    let (status, timed_out) = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => (Some(status.context("Failed to wait for agent command")?), false),
        Err(_) => {
            warn!(timeout_secs = timeout.as_secs(), "agent hit hard timeout, killing its process group");
            kill_agent_tree(&mut child);
            let _ = child.wait().await;
            (None, true)
        }
    };

    // Readers finish once the pipes hit EOF (the kill closes them).
    let stdout = stdout_reader.await.unwrap_or_default();
    let stderr = stderr_reader.await.unwrap_or_default();

    let exit_code = if timed_out {
        137
    } else {
        status
            .and_then(|s| s.code())
            .unwrap_or_else(|| {
                warn!("agent terminated by signal, using exit code 1");
                1
            })
    };

    Ok(ProcessResult {
        stdout,
        stderr,
        exit_code,
        timed_out,
    })
}

async fn slurp<R>(reader: Option<R>) -> String
where
    R: tokio::io::AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return String::new();
    };
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).into_owned()
}

/// Take down the agent and anything it spawned. The child became a session
/// leader in `pre_exec`, so its pid doubles as the process-group id.
fn kill_agent_tree(child: &mut tokio::process::Child) {
    let Some(pid) = child.id() else {
        // Already reaped; nothing left to signal.
        return;
    };

    #[cfg(unix)]
    {
        // SAFETY: thin syscall wrapper. A stale pgid at worst hits an
        // empty group and returns ESRCH.
        let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
        if rc == 0 {
            return;
        }
        warn!(pid, "killpg failed; falling back to killing the child alone");
    }

    let _ = child.start_kill();
}

/// Fail early when a required binary is missing from PATH.
pub async fn check_tool_installed(executable: &str) -> Result<()> {
    let found = Command::new("which")
        .arg(executable)
        .output()
        .await
        .map(|out| out.status.success())
        .unwrap_or(false);

    if !found {
        anyhow::bail!("'{executable}' not found in PATH; install it before running autoissue");
    }
    Ok(())
}

/// The last line of `text` that carries any content, or `""`.
pub(crate) fn tail_line(text: &str) -> &str {
    text.lines()
        .rfind(|line| !line.trim().is_empty())
        .unwrap_or_default()
}

/// Clamp a log line to `limit` characters, marking elision with `…`.
pub(crate) fn clip_line(line: &str, limit: usize) -> String {
    if line.chars().count() <= limit {
        return line.to_string();
    }
    let head: String = line.chars().take(limit.saturating_sub(1)).collect();
    format!("{head}…")
}
