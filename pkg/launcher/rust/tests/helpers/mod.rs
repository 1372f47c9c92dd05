// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use sitl_launcher::{LaunchRequest, ReadinessCheck};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Unique per-test marker so process-presence checks cannot collide across
/// tests or stale runs.
pub fn unique_marker(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{n}", std::process::id())
}

/// A request with 100ms polling and a 10s deadline; tests override what they
/// need.
pub fn request_with(
    command: &str,
    args: Vec<String>,
    dir: &Path,
    log: &Path,
    readiness: Box<dyn ReadinessCheck>,
) -> LaunchRequest {
    LaunchRequest {
        command: command.into(),
        args,
        working_dir: dir.to_path_buf(),
        log_path: log.to_path_buf(),
        env: HashMap::new(),
        readiness,
        poll_interval: Duration::from_millis(100),
        timeout: Duration::from_secs(10),
    }
}

/// Check if a PID is still alive.
pub fn pid_is_alive(pid: u32) -> bool {
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}

/// Wait until the file contains `needle`, or timeout.
pub fn wait_for_file_contains(path: &Path, needle: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if std::fs::read_to_string(path)
            .map(|c| c.contains(needle))
            .unwrap_or(false)
        {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}
