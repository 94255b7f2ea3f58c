//! Remote command execution over the system `ssh` client.
//!
//! The command operation proxies the invoking process's stdio to a single
//! remote shell session, byte for byte. Execution goes through the
//! [`CommandRunner`] seam so tests can script outcomes without spawning
//! processes.

use std::ffi::OsString;
use std::process::Command;

use camino::Utf8PathBuf;
use thiserror::Error;

/// TCP port used for SSH sessions.
const SSH_PORT: u16 = 22;
/// Name of the ssh client binary resolved from `PATH`.
const SSH_BIN: &str = "ssh";

/// Errors raised while executing a remote command.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RemoteError {
    /// Raised when the ssh client cannot be spawned.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying error message.
        message: String,
    },
    /// Raised when the session ends without reporting an exit status.
    #[error("remote command terminated without an exit status")]
    MissingExitStatus,
}

/// Abstraction over process execution to support fakes in tests.
pub trait CommandRunner {
    /// Runs `program` with the given arguments, wiring the current process's
    /// stdio straight through, and returns the exit code when one exists.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Spawn`] if the command cannot be started.
    fn run(&self, program: &str, args: &[OsString]) -> Result<Option<i32>, RemoteError>;
}

/// Runner that executes the command with inherited stdio.
#[derive(Clone, Debug, Default)]
pub struct StreamingCommandRunner;

impl CommandRunner for StreamingCommandRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<Option<i32>, RemoteError> {
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|err| RemoteError::Spawn {
                program: program.to_owned(),
                message: err.to_string(),
            })?;
        Ok(status.code())
    }
}

/// Single-shot SSH session against a workspace instance.
///
/// Host-key checking is disabled because every session targets a freshly
/// provisioned host whose key cannot be known in advance.
#[derive(Clone, Debug)]
pub struct RemoteSession<R: CommandRunner> {
    host: String,
    user: String,
    identity_file: Utf8PathBuf,
    runner: R,
}

impl RemoteSession<StreamingCommandRunner> {
    /// Creates a session backed by the streaming process runner.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        identity_file: Utf8PathBuf,
    ) -> Self {
        Self::with_runner(host, user, identity_file, StreamingCommandRunner)
    }
}

impl<R: CommandRunner> RemoteSession<R> {
    /// Creates a session with an explicit runner.
    #[must_use]
    pub fn with_runner(
        host: impl Into<String>,
        user: impl Into<String>,
        identity_file: Utf8PathBuf,
        runner: R,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            identity_file,
            runner,
        }
    }

    /// Streams `command` on the remote host and returns its exit status.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Spawn`] when the ssh client cannot be started
    /// and [`RemoteError::MissingExitStatus`] when the session dies without
    /// an exit code (for example on a signal).
    pub fn stream(&self, command: &str) -> Result<i32, RemoteError> {
        let args = self.build_args(command);
        let code = self.runner.run(SSH_BIN, &args)?;
        code.ok_or(RemoteError::MissingExitStatus)
    }

    fn build_args(&self, command: &str) -> Vec<OsString> {
        vec![
            OsString::from("-p"),
            OsString::from(SSH_PORT.to_string()),
            OsString::from("-i"),
            OsString::from(self.identity_file.as_str()),
            OsString::from("-o"),
            OsString::from("StrictHostKeyChecking=no"),
            OsString::from("-o"),
            OsString::from("UserKnownHostsFile=/dev/null"),
            OsString::from("-o"),
            OsString::from("LogLevel=ERROR"),
            OsString::from(format!("{}@{}", self.user, self.host)),
            OsString::from(command),
        ]
    }
}
