//! # Target Command Executor
//!
//! Runs one command against one target directory and classifies the outcome.
//!
//! ## Design
//!
//! Launching processes sits behind the [`CommandRunner`] trait so the
//! orchestration loop can be driven by a mock in tests. [`ProcessRunner`] is
//! the real implementation: the child inherits stdin/stdout (so progress
//! output streams to the terminal) while stderr is captured for the final
//! error summary.
//!
//! Every outcome, including "the executable does not exist", is expressed as
//! an [`ExecutionResult`] whose [`ResultOrigin`] records where the code came
//! from. Downstream code never has to tell a process result from an OS error.
//!
//! [`Executor`] layers the run-wide policy on top: dry-run short-circuiting,
//! command echo, immediate diagnostics and recording failures in the
//! [`ErrorLedger`].

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use log::debug;
use serde::Serialize;
use wait_timeout::ChildExt;

use crate::defaults::GIT_PROGRAM;
use crate::ledger::ErrorLedger;
use crate::output::Console;

/// Exit code reported for a command killed because it exceeded the timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// How long a timed-out run waits for the rest of its stderr.
const READER_GRACE: Duration = Duration::from_millis(200);

/// A program plus its arguments, run inside a target directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl TargetCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// A command for the system `git`.
    pub fn git<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(GIT_PROGRAM, args)
    }

    /// Build a command from an argument vector; `None` when it is empty.
    pub fn from_argv(argv: Vec<String>) -> Option<Self> {
        let mut argv = argv.into_iter();
        let program = argv.next()?;
        Some(Self {
            program,
            args: argv.collect(),
        })
    }
}

impl fmt::Display for TargetCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Where an [`ExecutionResult`]'s code came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResultOrigin {
    /// The process ran and exited (or was killed by a signal).
    ProcessExit,
    /// The process could not be started; the code is the OS error number.
    LaunchFailure,
    /// The process exceeded the configured timeout and was killed.
    TimedOut,
}

/// Outcome of running one command against one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub code: i32,
    pub stderr: String,
    pub origin: ResultOrigin,
}

impl ExecutionResult {
    /// A successful result with no diagnostics, as reported for dry runs.
    pub fn succeeded() -> Self {
        Self {
            code: 0,
            stderr: String::new(),
            origin: ResultOrigin::ProcessExit,
        }
    }

    /// Synthesize a result for a process that could not be launched.
    pub fn launch_failure(err: &std::io::Error) -> Self {
        Self {
            code: err.raw_os_error().unwrap_or(1),
            stderr: err.to_string(),
            origin: ResultOrigin::LaunchFailure,
        }
    }

    /// Build a result from a finished process.
    pub fn from_status(status: ExitStatus, stderr: String) -> Self {
        Self {
            code: exit_code(status),
            stderr,
            origin: ResultOrigin::ProcessExit,
        }
    }

    pub fn is_success(&self) -> bool {
        self.origin == ResultOrigin::ProcessExit && self.code == 0
    }

    /// Captured diagnostic text without trailing newlines.
    pub fn diagnostic(&self) -> &str {
        self.stderr.trim_end_matches(['\n', '\r'])
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Launches commands in target directories.
pub trait CommandRunner {
    /// Run `command` with `target` as working directory and `env` merged over
    /// the inherited environment.
    fn run(&self, target: &Path, command: &TargetCommand, env: &[(String, String)])
        -> ExecutionResult;
}

/// [`CommandRunner`] backed by real child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

/// Kill a timed-out child together with its process group.
#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let pgid = i32::try_from(child.id()).map(Pid::from_raw);
    if pgid.map_or(true, |pgid| killpg(pgid, Signal::SIGKILL).is_err()) {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

enum Waited {
    Exited(ExitStatus),
    TimedOut,
}

impl CommandRunner for ProcessRunner {
    fn run(
        &self,
        target: &Path,
        command: &TargetCommand,
        env: &[(String, String)],
    ) -> ExecutionResult {
        debug!("running `{}` in {}", command, target.display());

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(target)
            .envs(env.iter().map(|(k, v)| (k, v)))
            .stderr(Stdio::piped());
        // A timed run gets its own process group so a timeout can take down
        // everything it spawned, not just the direct child.
        #[cfg(unix)]
        if self.timeout.is_some() {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => return ExecutionResult::launch_failure(&err),
        };

        // Drain stderr on its own thread so a chatty child cannot fill the pipe
        // and deadlock against our wait.
        let reader = child.stderr.take().map(|mut pipe| {
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                let _ = tx.send(buf);
            });
            rx
        });

        let waited = match self.timeout {
            Some(limit) => match child.wait_timeout(limit) {
                Ok(Some(status)) => Ok(Waited::Exited(status)),
                Ok(None) => {
                    kill_tree(&mut child);
                    let _ = child.wait();
                    Ok(Waited::TimedOut)
                }
                Err(err) => Err(err),
            },
            None => child.wait().map(Waited::Exited),
        };

        // After a timeout, a descendant that escaped the group may still hold
        // the pipe open; stop waiting for it.
        let timed_out = matches!(waited, Ok(Waited::TimedOut));
        let stderr = reader
            .and_then(|rx| {
                if timed_out {
                    rx.recv_timeout(READER_GRACE).ok()
                } else {
                    rx.recv().ok()
                }
            })
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default();

        match waited {
            Ok(Waited::Exited(status)) => ExecutionResult::from_status(status, stderr),
            Ok(Waited::TimedOut) => ExecutionResult {
                code: TIMEOUT_EXIT_CODE,
                stderr: format!(
                    "{}timed out after {:?}",
                    stderr,
                    self.timeout.unwrap_or_default()
                ),
                origin: ResultOrigin::TimedOut,
            },
            Err(err) => ExecutionResult::launch_failure(&err),
        }
    }
}

/// Run a read-only query and capture its stdout.
///
/// Returns the decoded stdout on success and the failing result otherwise.
pub fn capture(target: &Path, command: &TargetCommand) -> Result<String, ExecutionResult> {
    debug!("querying `{}` in {}", command, target.display());
    let output = Command::new(&command.program)
        .args(&command.args)
        .current_dir(target)
        .stdin(Stdio::null())
        .output()
        .map_err(|err| ExecutionResult::launch_failure(&err))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(ExecutionResult::from_status(
            output.status,
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ))
    }
}

/// Applies run-wide execution policy on top of a [`CommandRunner`].
pub struct Executor<'a> {
    runner: &'a dyn CommandRunner,
    echo: bool,
}

impl<'a> Executor<'a> {
    /// `echo` prints each real command before it runs.
    pub fn new(runner: &'a dyn CommandRunner, echo: bool) -> Self {
        Self { runner, echo }
    }

    /// Execute `command` in `target`.
    ///
    /// With `dry_run` nothing is launched and success is reported. Failures
    /// are streamed to the console right away and, when a ledger is given,
    /// appended under the target for the end-of-run summary.
    pub fn execute(
        &self,
        console: &mut Console,
        target: &Path,
        command: &TargetCommand,
        env: &[(String, String)],
        dry_run: bool,
        ledger: Option<&mut ErrorLedger>,
    ) -> ExecutionResult {
        if dry_run {
            console.dry_command(command);
            return ExecutionResult::succeeded();
        }
        if self.echo {
            console.command(command);
        }
        console.flush();

        let result = self.runner.run(target, command, env);
        if !result.is_success() {
            if let Some(ledger) = ledger {
                ledger.record(target, command.clone(), result.clone());
            }
            if !result.diagnostic().is_empty() {
                console.diagnostic(result.diagnostic());
            }
        }
        result
    }
}
