// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::readiness::ReadinessCheck;
use crate::tail::tail_lines;
use log::{info, warn};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;

/// Number of log lines reported back on timeout.
pub const TAIL_LINES: usize = 60;

/// One background process to start and the condition that makes it "ready".
///
/// Constructed immediately before use and consumed by [`launch`]. The OS
/// process it describes is not owned by anyone here: on timeout or
/// cancellation it is left running for the operator to deal with.
pub struct LaunchRequest {
    pub command: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Truncated at launch; receives merged stdout/stderr of the child.
    pub log_path: PathBuf,
    /// Merged over the inherited environment; overrides win.
    pub env: HashMap<String, String>,
    pub readiness: Box<dyn ReadinessCheck>,
    /// Must be non-zero.
    pub poll_interval: Duration,
    /// Must be at least `poll_interval`.
    pub timeout: Duration,
}

#[derive(Debug)]
pub enum LaunchOutcome {
    /// The readiness condition held before the deadline.
    Ready { pid: u32 },
    /// Deadline passed; the process keeps running, the tail is for diagnosis.
    TimedOut {
        elapsed: Duration,
        log_tail: Vec<String>,
    },
    /// The caller raised the cancel flag; the process keeps running.
    Cancelled { elapsed: Duration },
    /// Nothing was spawned, or the spawn itself failed.
    StartFailed(StartError),
}

#[derive(Debug, Error)]
pub enum StartError {
    #[error("executable not found: {}", .0.display())]
    ExecutableNotFound(PathBuf),
    #[error("working directory invalid: {}", .0.display())]
    WorkingDirectoryInvalid(PathBuf),
    #[error("cannot open log file {}: {source}", .path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to spawn {}: {source}", .command.display())]
    Spawn {
        command: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Caller-held cancellation signal, checked once per poll iteration.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Start the requested process and poll until it is ready, cancelled, or the
/// deadline passes. All failures come back as a [`LaunchOutcome`]; this never
/// panics and never kills the spawned process.
pub async fn launch(request: LaunchRequest, cancel: &CancelFlag) -> LaunchOutcome {
    if request.poll_interval.is_zero() {
        return LaunchOutcome::StartFailed(StartError::InvalidRequest(
            "poll_interval must be greater than zero".into(),
        ));
    }
    if request.timeout < request.poll_interval {
        return LaunchOutcome::StartFailed(StartError::InvalidRequest(
            "timeout must be at least one poll_interval".into(),
        ));
    }
    if !request.working_dir.is_dir() {
        return LaunchOutcome::StartFailed(StartError::WorkingDirectoryInvalid(
            request.working_dir.clone(),
        ));
    }
    let Some(executable) = resolve_executable(&request.command, &request.working_dir, &request.env)
    else {
        return LaunchOutcome::StartFailed(StartError::ExecutableNotFound(request.command.clone()));
    };

    let (stdout, stderr) = match open_log(&request.log_path) {
        Ok(pair) => pair,
        Err(source) => {
            return LaunchOutcome::StartFailed(StartError::LogFile {
                path: request.log_path.clone(),
                source,
            });
        }
    };

    let mut cmd = Command::new(&executable);
    cmd.args(&request.args)
        .current_dir(&request.working_dir)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr);
    for (k, v) in &request.env {
        cmd.env(k, v);
    }

    // The child must outlive this call: no kill_on_drop, and the handle is
    // dropped right after the pid is taken.
    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(source) => {
            return LaunchOutcome::StartFailed(StartError::Spawn {
                command: executable,
                source,
            });
        }
    };
    let pid = child.id().unwrap_or(0);
    drop(child);
    info!("spawned (pid={pid}, cmd={})", executable.display());

    let started = Instant::now();
    loop {
        tokio::time::sleep(request.poll_interval).await;

        if cancel.is_cancelled() {
            let elapsed = started.elapsed();
            info!("launch cancelled after {elapsed:?}, pid {pid} left running");
            return LaunchOutcome::Cancelled { elapsed };
        }
        if request.readiness.is_ready() {
            info!("ready (pid={pid}) after {:?}", started.elapsed());
            return LaunchOutcome::Ready { pid };
        }
        if started.elapsed() >= request.timeout {
            let elapsed = started.elapsed();
            warn!("not ready after {elapsed:?}, pid {pid} left running");
            return LaunchOutcome::TimedOut {
                elapsed,
                log_tail: tail_lines(&request.log_path, TAIL_LINES),
            };
        }
    }
}

/// Resolve the executable without spawning: absolute paths and paths with a
/// directory component are checked as-is (relative to `working_dir`), bare
/// names are searched on `PATH`. An overridden `PATH` wins over the
/// inherited one.
fn resolve_executable(
    command: &Path,
    working_dir: &Path,
    env: &HashMap<String, String>,
) -> Option<PathBuf> {
    if command.is_absolute() || command.parent() != Some(Path::new("")) {
        let candidate = if command.is_absolute() {
            command.to_path_buf()
        } else {
            working_dir.join(command)
        };
        return candidate.is_file().then_some(candidate);
    }

    let path_var = env
        .get("PATH")
        .cloned()
        .or_else(|| std::env::var("PATH").ok())?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(command))
        .find(|candidate| candidate.is_file())
}

/// Truncate (or create) the log file, then reopen it in append mode twice so
/// stdout and stderr interleave at the end instead of clobbering each other.
fn open_log(path: &Path) -> std::io::Result<(Stdio, Stdio)> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    let out = OpenOptions::new().append(true).open(path)?;
    let err = out.try_clone()?;
    Ok((Stdio::from(out), Stdio::from(err)))
}
