// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static PROC_ROOT: OnceLock<PathBuf> = OnceLock::new();

/// Root of the proc filesystem, overridable with `HOST_PROC` for
/// containerized use.
pub fn root_path() -> &'static Path {
    PROC_ROOT.get_or_init(|| {
        if let Ok(v) = env::var("HOST_PROC") {
            return v.into();
        }
        "/proc".into()
    })
}

/// A process command line as read from `/proc/<pid>/cmdline`.
#[derive(Debug)]
pub struct Cmdline {
    cmdline: String,
    separator: char,
}

impl Cmdline {
    pub fn new(mut cmdline: String) -> Self {
        // Processes that rewrite their argv can leave trailing null bytes.
        let trim_len = cmdline.trim_end_matches('\0').len();
        cmdline.truncate(trim_len);

        // A rewritten command line may also be packed into a single
        // space-separated string. Detect that case so args() still splits
        // into individual arguments.
        let mut args = cmdline.split_terminator('\0');
        let separator = if let (Some(first), None) = (args.next(), args.next())
            && first.contains(' ')
        {
            ' '
        } else {
            '\0'
        };

        Cmdline { cmdline, separator }
    }

    pub fn get(pid: i32) -> Result<Self, std::io::Error> {
        let path = root_path().join(pid.to_string()).join("cmdline");
        Ok(Self::new(fs::read_to_string(path)?))
    }

    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.cmdline.split_terminator(self.separator)
    }

    pub fn is_empty(&self) -> bool {
        self.cmdline.is_empty()
    }

    /// Substring match against the space-joined command line.
    pub fn matches(&self, pattern: &str) -> bool {
        let joined = self.args().collect::<Vec<_>>().join(" ");
        joined.contains(pattern)
    }
}

/// Numeric entries of the proc root, i.e. the PIDs currently present.
pub fn pids() -> Vec<i32> {
    let Ok(entries) = fs::read_dir(root_path()) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().and_then(|n| n.parse().ok()))
        .collect()
}

/// True iff at least one running process's command line contains `pattern`.
/// Entries that vanish or cannot be read mid-scan are skipped.
pub fn any_process_matches(pattern: &str) -> bool {
    pids()
        .into_iter()
        .any(|pid| Cmdline::get(pid).map(|c| c.matches(pattern)).unwrap_or(false))
}
