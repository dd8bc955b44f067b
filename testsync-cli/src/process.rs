//! Launching worker and test commands
//!
//! Workers receive the sync property through their environment, so every
//! process started here shares the coordinator's sync files.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::Duration;

/// Environment variable holding the zero-based worker index
pub const WORKER_INDEX_VAR: &str = "TESTSYNC_WORKER_INDEX";

/// Environment variable holding the build seed
pub const SEED_VAR: &str = "TESTSYNC_SEED";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Program, arguments and extra environment of a command to launch
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Build from `argv`, whose first element is the program
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let Some((program, args)) = argv.split_first() else {
            bail!("empty command line");
        };
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            env: Vec::new(),
        })
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }

    fn spawn_worker(&self, index: usize) -> Result<Child> {
        self.command()
            .env(WORKER_INDEX_VAR, index.to_string())
            .spawn()
            .with_context(|| format!("failed to spawn worker {} ({})", index, self.program))
    }
}

/// Final state of one worker
#[derive(Debug, Clone, Serialize)]
pub struct WorkerReport {
    pub index: usize,
    pub code: Option<i32>,
    pub success: bool,
    pub killed: bool,
}

impl WorkerReport {
    fn finished(index: usize, status: ExitStatus) -> Self {
        Self {
            index,
            code: status.code(),
            success: status.success(),
            killed: false,
        }
    }

    fn killed(index: usize) -> Self {
        Self {
            index,
            code: None,
            success: false,
            killed: true,
        }
    }
}

/// Run `count` copies of a command in parallel and wait for all of them
///
/// With `fail_fast`, the first failure kills every worker still running.
pub fn run_workers(spec: &CommandSpec, count: usize, fail_fast: bool) -> Result<Vec<WorkerReport>> {
    let mut running: Vec<(usize, Child)> = Vec::with_capacity(count);
    for index in 0..count {
        match spec.spawn_worker(index) {
            Ok(child) => running.push((index, child)),
            Err(e) => {
                kill_all(&mut running);
                return Err(e);
            }
        }
    }
    log::debug!("Spawned {} worker(s) of {}", count, spec.program());

    let mut reports = Vec::with_capacity(count);
    let mut abort = false;
    while !running.is_empty() {
        let mut still_running = Vec::with_capacity(running.len());
        for (index, mut child) in running {
            if abort {
                let _ = child.kill();
                let _ = child.wait();
                reports.push(WorkerReport::killed(index));
                continue;
            }
            match child
                .try_wait()
                .with_context(|| format!("failed to poll worker {}", index))?
            {
                Some(status) => {
                    log::debug!("Worker {} exited with {}", index, status);
                    let report = WorkerReport::finished(index, status);
                    if !report.success && fail_fast {
                        abort = true;
                    }
                    reports.push(report);
                }
                None => still_running.push((index, child)),
            }
        }
        running = still_running;
        if !running.is_empty() && !abort {
            thread::sleep(POLL_INTERVAL);
        }
    }

    reports.sort_by_key(|r| r.index);
    Ok(reports)
}

/// Run a command to completion with inherited stdio
pub fn run_once(spec: &CommandSpec) -> Result<ExitStatus> {
    spec.command()
        .status()
        .with_context(|| format!("failed to run {}", spec.program()))
}

fn kill_all(running: &mut Vec<(usize, Child)>) {
    for (_, child) in running.iter_mut() {
        let _ = child.kill();
        let _ = child.wait();
    }
    running.clear();
}
