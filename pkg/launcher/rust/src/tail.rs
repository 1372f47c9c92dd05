// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::io::Read;
use std::path::Path;

const READ_LIMIT: u64 = 16 * 1024 * 1024;

/// Last `n` lines of a file. Diagnostics only: a missing or unreadable file
/// yields an empty tail rather than an error.
pub fn tail_lines(path: &Path, n: usize) -> Vec<String> {
    let Ok(file) = std::fs::File::open(path) else {
        return Vec::new();
    };
    let mut contents = String::new();
    if file.take(READ_LIMIT).read_to_string(&mut contents).is_err() {
        return Vec::new();
    }
    let lines: Vec<&str> = contents.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_last_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        std::fs::write(&path, "one\ntwo\nthree\nfour\n").unwrap();

        assert_eq!(tail_lines(&path, 2), vec!["three", "four"]);
    }

    #[test]
    fn test_tail_shorter_than_requested() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        std::fs::write(&path, "only\n").unwrap();

        assert_eq!(tail_lines(&path, 60), vec!["only"]);
    }

    #[test]
    fn test_tail_missing_file_is_empty() {
        assert!(tail_lines(Path::new("/nonexistent/out.log"), 60).is_empty());
    }

    #[test]
    fn test_tail_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.log");
        std::fs::write(&path, "").unwrap();

        assert!(tail_lines(&path, 60).is_empty());
    }
}
