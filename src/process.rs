//! Running the compiler and its version probe
//!
//! Every child spawned here is owned by a [`ReapGuard`], so it is killed and
//! waited on however the caller leaves the scope.

use crate::image::BuildCommand;
use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use tracing::debug;

pub trait ProcessRunner {
    /// Runs `command` in `workdir` with inherited stdio and blocks until it exits
    ///
    /// Returns the exit code, `None` when the child was terminated by a signal.
    fn run_inherited(&self, command: &BuildCommand, workdir: &Path) -> io::Result<Option<i32>>;

    /// Runs `command`, feeding every stdout line to `on_line`
    ///
    /// Stdout is read to the end before the child is reaped.
    fn run_scanned(
        &self,
        command: &BuildCommand,
        on_line: &mut dyn FnMut(&str),
    ) -> io::Result<Option<i32>>;
}

struct ReapGuard {
    child: Child,
}

impl Drop for ReapGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(command: &BuildCommand) -> Command {
        let mut cmd = Command::new(command.program());
        cmd.args(command.args());
        cmd
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run_inherited(&self, command: &BuildCommand, workdir: &Path) -> io::Result<Option<i32>> {
        debug!("Spawning {} in {}", command.program(), workdir.display());
        let child = Self::command(command)
            .current_dir(workdir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;

        let mut guard = ReapGuard { child };
        let status = guard.child.wait()?;
        Ok(status.code())
    }

    fn run_scanned(
        &self,
        command: &BuildCommand,
        on_line: &mut dyn FnMut(&str),
    ) -> io::Result<Option<i32>> {
        debug!("Spawning {}", command);
        let child = Self::command(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let mut guard = ReapGuard { child };
        if let Some(stdout) = guard.child.stdout.take() {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                if reader.read_until(b'\n', &mut buf)? == 0 {
                    break;
                }
                let line = String::from_utf8_lossy(&buf);
                on_line(line.trim_end_matches(['\r', '\n']));
            }
        }

        let status = guard.child.wait()?;
        Ok(status.code())
    }
}

/// One scripted response of a [`FakeRunner`]
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    Exit { stdout: Vec<String>, code: Option<i32> },
    SpawnError(io::ErrorKind),
}

impl FakeOutcome {
    pub fn success(stdout: &[&str]) -> Self {
        FakeOutcome::Exit {
            stdout: stdout.iter().map(|s| s.to_string()).collect(),
            code: Some(0),
        }
    }

    pub fn exit(code: i32) -> Self {
        FakeOutcome::Exit {
            stdout: Vec::new(),
            code: Some(code),
        }
    }
}

/// A recorded invocation of a [`FakeRunner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRun {
    pub command: Vec<String>,
    pub workdir: Option<PathBuf>,
    pub inherited: bool,
}

/// Scripted runner for tests
///
/// Outcomes are consumed in order; once exhausted every run succeeds with no
/// output.
#[derive(Debug, Default)]
pub struct FakeRunner {
    outcomes: Mutex<VecDeque<FakeOutcome>>,
    runs: Mutex<Vec<RecordedRun>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, outcome: FakeOutcome) -> Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().unwrap().clone()
    }

    fn next(&self, run: RecordedRun) -> io::Result<(Vec<String>, Option<i32>)> {
        self.runs.lock().unwrap().push(run);
        match self.outcomes.lock().unwrap().pop_front() {
            Some(FakeOutcome::Exit { stdout, code }) => Ok((stdout, code)),
            Some(FakeOutcome::SpawnError(kind)) => Err(io::Error::new(kind, "scripted failure")),
            None => Ok((Vec::new(), Some(0))),
        }
    }
}

impl ProcessRunner for FakeRunner {
    fn run_inherited(&self, command: &BuildCommand, workdir: &Path) -> io::Result<Option<i32>> {
        let (_, code) = self.next(RecordedRun {
            command: command.to_vec(),
            workdir: Some(workdir.to_path_buf()),
            inherited: true,
        })?;
        Ok(code)
    }

    fn run_scanned(
        &self,
        command: &BuildCommand,
        on_line: &mut dyn FnMut(&str),
    ) -> io::Result<Option<i32>> {
        let (stdout, code) = self.next(RecordedRun {
            command: command.to_vec(),
            workdir: None,
            inherited: false,
        })?;
        for line in &stdout {
            on_line(line);
        }
        Ok(code)
    }
}
