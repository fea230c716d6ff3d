//! Cancellable external commands for speech and audio playback

use super::SynthesisError;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::Notify;

/// An external program that can be stopped while it runs
#[derive(Debug)]
pub struct CancellableCommand {
    program: String,
    base_args: Vec<String>,
    stop: Notify,
}

impl CancellableCommand {
    /// Build from a command line such as `"espeak-ng -s 150"`
    pub fn from_command_line(command_line: &str) -> Self {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        Self {
            program: parts.next().unwrap_or_default(),
            base_args: parts.collect(),
            stop: Notify::new(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the program can be found on `PATH`
    pub fn is_available(&self) -> bool {
        command_exists(&self.program)
    }

    /// Run with `extra` appended to the configured arguments
    ///
    /// Resolves when the program exits, or with
    /// [`SynthesisError::Cancelled`] as soon as [`stop`](Self::stop) is
    /// called.
    pub async fn run(&self, extra: &str) -> Result<(), SynthesisError> {
        if self.program.is_empty() {
            return Err(SynthesisError::Unavailable);
        }

        // Register before spawning so a stop during spawn is not lost
        let stopped = self.stop.notified();

        let mut child = Command::new(&self.program)
            .args(&self.base_args)
            .arg(extra)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SynthesisError::Playback(format!("{}: {}", self.program, e)))?;

        tokio::select! {
            status = child.wait() => {
                let status = status
                    .map_err(|e| SynthesisError::Playback(format!("{}: {}", self.program, e)))?;
                if status.success() {
                    Ok(())
                } else {
                    Err(SynthesisError::Playback(format!(
                        "{} exited with {}",
                        self.program, status
                    )))
                }
            }
            _ = stopped => {
                if let Err(e) = child.kill().await {
                    tracing::debug!("Failed to kill {}: {}", self.program, e);
                }
                Err(SynthesisError::Cancelled)
            }
        }
    }

    /// Stop the running invocation, if any
    pub fn stop(&self) {
        self.stop.notify_waiters();
    }
}

/// Look a program up on `PATH` (or accept an existing explicit path)
pub fn command_exists(program: &str) -> bool {
    if program.is_empty() {
        return false;
    }
    if program.contains(std::path::MAIN_SEPARATOR) {
        return PathBuf::from(program).is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_split() {
        let cmd = CancellableCommand::from_command_line("espeak-ng -s 150");
        assert_eq!(cmd.program(), "espeak-ng");
        assert_eq!(cmd.base_args, vec!["-s", "150"]);
    }

    #[test]
    fn test_empty_command_is_unavailable() {
        let cmd = CancellableCommand::from_command_line("   ");
        assert!(!cmd.is_available());
        assert!(!command_exists(""));
    }

    #[test]
    fn test_missing_program_not_found() {
        assert!(!command_exists("sous-definitely-not-a-real-program"));
    }

    #[tokio::test]
    async fn test_empty_command_run_fails() {
        let cmd = CancellableCommand::from_command_line("");
        assert!(matches!(cmd.run("hi").await, Err(SynthesisError::Unavailable)));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_playback_error() {
        let cmd = CancellableCommand::from_command_line("sous-definitely-not-a-real-program");
        assert!(matches!(cmd.run("hi").await, Err(SynthesisError::Playback(_))));
    }
}
