// Standard library
use std::ffi::OsStr;
use std::thread;
use std::time::{Duration, Instant};

// External crates
use crate::error::{EsbError, Result};
use duct::cmd;
use tracing::debug;
use which::which;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn render<A: AsRef<OsStr>>(command: &str, args: &[A]) -> String {
    let mut full = command.to_string();
    for arg in args {
        full.push(' ');
        full.push_str(&arg.as_ref().to_string_lossy());
    }
    full
}

/// Run a command, capturing stdout, and give up once `timeout` has elapsed.
///
/// A failure to spawn is reported as `Unreachable` so callers can distinguish a missing
/// binary from a command that ran and failed.
pub fn capture_with_deadline<A: AsRef<OsStr>>(
    command: &str,
    args: &[A],
    timeout: Duration,
) -> Result<String> {
    let full_command = render(command, args);
    debug!("Running with {}s deadline: {}", timeout.as_secs(), full_command);

    let handle = cmd(command, args)
        .stdout_capture()
        .stderr_capture()
        .unchecked()
        .start()
        .map_err(|e| EsbError::unreachable(command, e.to_string()))?;

    let start = Instant::now();
    loop {
        if start.elapsed() >= timeout {
            let _ = handle.kill();
            return Err(EsbError::Timeout(format!(
                "command did not finish within {}s: {}",
                timeout.as_secs(),
                full_command
            )));
        }

        match handle.try_wait() {
            Ok(Some(output)) => {
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(EsbError::Command(format!(
                        "{} (exit code {:?}): {}",
                        full_command,
                        output.status.code(),
                        stderr.trim()
                    )));
                }
                return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                return Err(EsbError::Command(format!(
                    "error waiting for '{}': {}",
                    full_command, e
                )))
            }
        }
    }
}

/// Run a command with inherited stdio and extra environment variables layered on top of
/// the process environment.
pub fn stream_command_with_env<A, K, V>(command: &str, args: &[A], env: &[(K, V)]) -> Result<()>
where
    A: AsRef<OsStr>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let full_command = render(command, args);
    debug!("Streaming: {} ({} env overrides)", full_command, env.len());

    let mut expression = cmd(command, args);
    for (key, value) in env {
        expression = expression.env(key, value);
    }

    let output = expression
        .unchecked()
        .run()
        .map_err(|e| EsbError::unreachable(command, e.to_string()))?;

    if !output.status.success() {
        return Err(EsbError::Command(format!(
            "{} exited with code {:?}",
            full_command,
            output.status.code()
        )));
    }
    Ok(())
}

/// Checks if a command-line tool is available in the system's PATH.
pub fn is_tool_installed(tool_name: &str) -> bool {
    which(tool_name).is_ok()
}
