use color_eyre::eyre::{WrapErr, eyre};
use std::ffi::OsStr;
use std::process::{Output, Stdio};
use tokio::process::Command;

/// Runs `args[0]` with the remaining arguments, capturing stdout and stderr.
///
/// No shell is involved: every element of `args` reaches the child as one argument.
/// A non-zero exit is not an error here, callers inspect `Output::status`.
pub async fn run_captured<S: AsRef<OsStr>>(args: &[S]) -> color_eyre::Result<Output> {
    let (program, rest) = args.split_first().ok_or_else(|| eyre!("empty command line"))?;
    let program = program.as_ref();

    Command::new(program)
        .args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .wrap_err_with(|| format!("failed to run {}", program.to_string_lossy()))
}

/// Runs a command and returns its trimmed stdout, or `None` when it could not be
/// spawned or exited unsuccessfully.
pub async fn stdout_of<S: AsRef<OsStr>>(args: &[S]) -> Option<String> {
    match run_captured(args).await {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
        }
        Ok(output) => {
            tracing::debug!(
                "{} exited with {}: {}",
                args.first().map(|p| p.as_ref().to_string_lossy()).unwrap_or_default(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            None
        }
        Err(e) => {
            tracing::debug!("{e:#}");
            None
        }
    }
}
