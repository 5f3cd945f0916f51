use log::debug;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use polyver_platform::HideWindow;

/// Run a query command and return its stdout.
///
/// A missing binary, a non-zero exit or running past `timeout` all yield
/// `None`; the child is killed when the timeout drops its future.
pub(crate) async fn run_query(program: &Path, args: &[&str], timeout: Duration) -> Option<String> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .env("NO_COLOR", "1")
        .kill_on_drop(true)
        .hide_window();

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(error)) => {
            debug!("Failed to run {} {args:?}: {error}", program.display());
            return None;
        }
        Err(_) => {
            debug!(
                "{} {args:?} timed out after {}ms",
                program.display(),
                timeout.as_millis()
            );
            return None;
        }
    };

    if !output.status.success() {
        debug!(
            "{} {args:?} exited with {}: {}",
            program.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(all(test, unix))]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use super::run_query;

    #[tokio::test]
    async fn returns_stdout_on_success() {
        let output = run_query(Path::new("sh"), &["-c", "echo go1.21.0"], Duration::from_secs(5))
            .await
            .expect("sh should succeed");

        assert_eq!(output.trim(), "go1.21.0");
    }

    #[tokio::test]
    async fn non_zero_exit_is_none() {
        let output = run_query(Path::new("sh"), &["-c", "exit 3"], Duration::from_secs(5)).await;
        assert!(output.is_none());
    }

    #[tokio::test]
    async fn missing_binary_is_none() {
        let output = run_query(
            Path::new("/nonexistent-polyver/bin/go"),
            &["version"],
            Duration::from_secs(5),
        )
        .await;
        assert!(output.is_none());
    }

    #[tokio::test]
    async fn hung_command_times_out() {
        let output =
            run_query(Path::new("sh"), &["-c", "sleep 5"], Duration::from_millis(50)).await;
        assert!(output.is_none());
    }
}
