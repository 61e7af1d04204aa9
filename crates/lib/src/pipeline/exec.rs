//! Pre-build command runner.
//!
//! Commands from a module's `exec` list run concurrently through the
//! platform shell in the module directory, with the caller's environment.
//! Output is captured and logged as a block once a command exits.

use std::sync::Arc;

use tokio::process::Command;
use tracing::{debug, error, info};

use crate::stack::{Panic, Stack};

use super::{BuildContext, CommandOutcome};

/// Run every command and wait for all of them.
///
/// Outcomes are returned in the order the commands were given. A failing
/// command does not affect the others.
pub async fn run_commands(commands: &[String], ctx: &Arc<BuildContext>) -> Vec<CommandOutcome> {
  let mut stack = Stack::new();

  for cmd in commands {
    let cmd = cmd.clone();
    let ctx = ctx.clone();
    stack.add(async move { run_command(&cmd, &ctx).await });
  }

  outcomes(commands, stack.done().await.into_ordered())
}

/// Pair each command with its outcome; a panicked run becomes a failed
/// outcome for the command that caused it.
fn outcomes(commands: &[String], ordered: Vec<Result<CommandOutcome, Panic>>) -> Vec<CommandOutcome> {
  commands
    .iter()
    .zip(ordered)
    .map(|(cmd, result)| {
      result.unwrap_or_else(|panic| CommandOutcome {
        cmd: cmd.clone(),
        code: None,
        stdout: String::new(),
        stderr: String::new(),
        error: Some(panic.message),
      })
    })
    .collect()
}

/// Run one command in the module directory and log its output.
pub async fn run_command(cmd: &str, ctx: &BuildContext) -> CommandOutcome {
  info!(cmd = %cmd, "executing {}", cmd);

  let (shell, shell_args) = get_shell(ctx.shell.as_deref());
  debug!(shell = %shell, cwd = ?ctx.cwd, "spawning process");

  let output = Command::new(&shell)
    .args(&shell_args)
    .arg(cmd)
    .current_dir(&ctx.cwd)
    .output()
    .await;

  let output = match output {
    Ok(output) => output,
    Err(e) => {
      error!(cmd = %cmd, error = %e, "failed to start {}", cmd);
      return CommandOutcome {
        cmd: cmd.to_string(),
        code: None,
        stdout: String::new(),
        stderr: String::new(),
        error: Some(e.to_string()),
      };
    }
  };

  let outcome = CommandOutcome {
    cmd: cmd.to_string(),
    code: output.status.code(),
    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    error: None,
  };

  if !outcome.stderr.is_empty() {
    error!(cmd = %cmd, "start output from {}\n", cmd);
    error!(cmd = %cmd, "{}", outcome.stderr.trim_end());
    error!(cmd = %cmd, "end output from {}", cmd);
  } else {
    info!(cmd = %cmd, "start output from {}\n", cmd);
    info!(cmd = %cmd, "{}", outcome.stdout.trim_end());
    info!(cmd = %cmd, "end output from {}", cmd);
  }

  if !outcome.is_success() {
    error!(cmd = %cmd, code = ?outcome.code, "command failed");
  }

  outcome
}

/// Shell program and arguments for the current platform.
///
/// An override picks its argument style from its name: PowerShell takes
/// `-NoProfile -Command`, `cmd` takes `/C`, anything else `-c`.
fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec!["-NoProfile".to_string(), "-Command".to_string()]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    (
      "powershell.exe".to_string(),
      vec![
        "-NoProfile".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
        "-Command".to_string(),
      ],
    )
  }
}
