// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::{Context, Result, bail};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of one patch attempt. Failures propagate as errors.
#[derive(Debug, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The marker was already present; the file was not touched.
    AlreadyApplied,
    /// The payload was appended. `backup` is the pristine copy of the file.
    Applied { backup: PathBuf },
}

/// Append `payload` to `target` unless `marker` is already present.
///
/// The marker must occur in the payload, otherwise a second run would append
/// again. Before the first modification the original file is copied to
/// `<target>.orig`; that backup is never overwritten by later patches, so it
/// always holds the unpatched content.
pub fn apply_patch(target: &Path, marker: &str, payload: &str) -> Result<PatchOutcome> {
    if !payload.contains(marker) {
        bail!("payload does not contain marker {marker:?}, patch would not be idempotent");
    }

    let contents =
        fs::read_to_string(target).with_context(|| format!("reading {}", target.display()))?;
    if contents.contains(marker) {
        info!("{} already patched (marker {marker:?})", target.display());
        return Ok(PatchOutcome::AlreadyApplied);
    }

    let backup = backup_path(target);
    if !backup.exists() {
        fs::copy(target, &backup).with_context(|| {
            format!("backing up {} to {}", target.display(), backup.display())
        })?;
    }

    let mut patched = contents;
    if !patched.is_empty() && !patched.ends_with('\n') {
        patched.push('\n');
    }
    patched.push_str(payload);
    if !patched.ends_with('\n') {
        patched.push('\n');
    }
    fs::write(target, patched).with_context(|| format!("writing {}", target.display()))?;

    info!("patched {} (backup at {})", target.display(), backup.display());
    Ok(PatchOutcome::Applied { backup })
}

fn backup_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".orig");
    PathBuf::from(name)
}
