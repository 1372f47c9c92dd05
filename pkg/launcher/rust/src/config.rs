// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env::parse_environment_file;
use crate::launch::LaunchRequest;
use crate::readiness::{PortBound, ProcessPresent, ReadinessCheck};

const DEFAULT_CONFIG_DIR: &str = "/etc/sitl-stack/services.d";

fn default_poll_interval() -> f64 {
    1.0
}

fn default_timeout() -> f64 {
    30.0
}

fn default_working_dir() -> String {
    ".".to_string()
}

/// One service of the ground stack, as written by the operator in YAML.
#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    #[allow(dead_code)]
    pub description: Option<String>,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    pub environment_file: Option<String>,
    #[serde(default = "default_working_dir")]
    pub working_dir: String,
    pub log_path: String,
    pub readiness: ReadinessSpec,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: f64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: f64,
}

/// How to judge the service ready, as declared in its config file.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReadinessSpec {
    /// A running process's command line contains this pattern.
    Process { pattern: String },
    /// The UDP port is bound (e.g. a telemetry endpoint).
    UdpPort { port: u16 },
    /// The TCP port is listening.
    TcpPort { port: u16 },
}

impl ReadinessSpec {
    pub fn into_check(self) -> Box<dyn ReadinessCheck> {
        match self {
            ReadinessSpec::Process { pattern } => Box::new(ProcessPresent::new(pattern)),
            ReadinessSpec::UdpPort { port } => Box::new(PortBound::udp(port)),
            ReadinessSpec::TcpPort { port } => Box::new(PortBound::tcp(port)),
        }
    }
}

impl ServiceConfig {
    /// Resolve the config into a ready-to-consume [`LaunchRequest`].
    /// Environment-file entries are merged beneath the per-service `env`
    /// overrides, so overrides win.
    pub fn into_request(self) -> Result<LaunchRequest> {
        let mut env = match &self.environment_file {
            Some(path) => parse_environment_file(path)?,
            None => HashMap::new(),
        };
        env.extend(self.env);

        let poll_interval = Duration::try_from_secs_f64(self.poll_interval_secs)
            .with_context(|| format!("invalid poll_interval_secs: {}", self.poll_interval_secs))?;
        let timeout = Duration::try_from_secs_f64(self.timeout_secs)
            .with_context(|| format!("invalid timeout_secs: {}", self.timeout_secs))?;

        Ok(LaunchRequest {
            command: PathBuf::from(self.command),
            args: self.args,
            working_dir: PathBuf::from(self.working_dir),
            log_path: PathBuf::from(self.log_path),
            env,
            readiness: self.readiness.into_check(),
            poll_interval,
            timeout,
        })
    }
}

pub fn config_dir() -> PathBuf {
    std::env::var("SITL_LAUNCHER_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR))
}

/// Scan a directory for `*.yaml` files and parse each into a ServiceConfig.
/// The service name is derived from the filename (without extension).
/// Files that fail to parse are logged and skipped.
pub fn load_configs(dir: &Path) -> Result<Vec<(String, ServiceConfig)>> {
    let mut configs = Vec::new();

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read config directory: {}", dir.display()))?;

    let mut yaml_files: Vec<_> = entries
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable entry in {}: {e}", dir.display());
                None
            }
        })
        .filter(|e| {
            let is_yaml = e
                .path()
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if !is_yaml {
                debug!("skipping non-YAML file: {}", e.path().display());
            }
            is_yaml
        })
        .collect();

    yaml_files.sort_by_key(|e| e.file_name());

    for entry in yaml_files {
        let path = entry.path();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        match parse_config(&path) {
            Ok(config) => configs.push((name, config)),
            Err(e) => warn!("skipping {}: {e:#}", path.display()),
        }
    }

    Ok(configs)
}

fn parse_config(path: &Path) -> Result<ServiceConfig> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: ServiceConfig =
        serde_yaml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = r#"
description: Autopilot SITL
command: /opt/sim/bin/autopilot
args:
  - "--home"
  - "47.39,8.54,488,0"
env:
  SIM_SPEEDUP: "1"
working_dir: /opt/sim
log_path: /var/log/sitl-stack/autopilot.log
readiness:
  type: udp_port
  port: 14550
poll_interval_secs: 0.5
timeout_secs: 60
"#;
        fs::write(dir.path().join("autopilot.yaml"), yaml).unwrap();

        let configs = load_configs(dir.path()).unwrap();
        assert_eq!(configs.len(), 1);

        let (name, cfg) = &configs[0];
        assert_eq!(name, "autopilot");
        assert_eq!(cfg.command, "/opt/sim/bin/autopilot");
        assert_eq!(cfg.args, vec!["--home", "47.39,8.54,488,0"]);
        assert_eq!(cfg.env.get("SIM_SPEEDUP").unwrap(), "1");
        assert_eq!(cfg.working_dir, "/opt/sim");
        assert_eq!(cfg.readiness, ReadinessSpec::UdpPort { port: 14550 });
        assert_eq!(cfg.poll_interval_secs, 0.5);
        assert_eq!(cfg.timeout_secs, 60.0);
    }

    #[test]
    fn test_parse_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = concat!(
            "command: /usr/bin/ground-control\n",
            "log_path: /tmp/gcs.log\n",
            "readiness:\n",
            "  type: process\n",
            "  pattern: ground-control\n",
        );
        fs::write(dir.path().join("gcs.yaml"), yaml).unwrap();

        let configs = load_configs(dir.path()).unwrap();
        assert_eq!(configs.len(), 1);

        let (name, cfg) = &configs[0];
        assert_eq!(name, "gcs");
        assert!(cfg.args.is_empty());
        assert!(cfg.env.is_empty());
        assert_eq!(cfg.working_dir, ".");
        assert_eq!(cfg.poll_interval_secs, 1.0);
        assert_eq!(cfg.timeout_secs, 30.0);
        assert_eq!(
            cfg.readiness,
            ReadinessSpec::Process {
                pattern: "ground-control".to_string()
            }
        );
    }

    #[test]
    fn test_skips_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("good.yaml"),
            "command: /usr/bin/true\nlog_path: /tmp/a.log\nreadiness:\n  type: tcp_port\n  port: 80\n",
        )
        .unwrap();
        fs::write(dir.path().join("bad.yaml"), "not: valid: yaml: [").unwrap();
        fs::write(dir.path().join("incomplete.yaml"), "command: /usr/bin/true\n").unwrap();

        let configs = load_configs(dir.path()).unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].0, "good");
    }

    #[test]
    fn test_sorted_alphabetically() {
        let dir = tempfile::tempdir().unwrap();
        let body = "\nlog_path: /tmp/l\nreadiness:\n  type: udp_port\n  port: 1\n";
        fs::write(dir.path().join("charlie.yaml"), format!("command: /c{body}")).unwrap();
        fs::write(dir.path().join("alpha.yaml"), format!("command: /a{body}")).unwrap();
        fs::write(dir.path().join("bravo.yaml"), format!("command: /b{body}")).unwrap();

        let configs = load_configs(dir.path()).unwrap();
        let names: Vec<&str> = configs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["alpha", "bravo", "charlie"]);
    }

    #[test]
    fn test_ignores_non_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("svc.yaml"),
            "command: /a\nlog_path: /tmp/l\nreadiness:\n  type: udp_port\n  port: 1\n",
        )
        .unwrap();
        fs::write(dir.path().join("readme.txt"), "not a config").unwrap();
        fs::write(dir.path().join("notes.md"), "also not").unwrap();

        let configs = load_configs(dir.path()).unwrap();
        assert_eq!(configs.len(), 1);
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let configs = load_configs(dir.path()).unwrap();
        assert!(configs.is_empty());
    }

    #[test]
    fn test_load_configs_nonexistent_directory() {
        let result = load_configs(Path::new("/nonexistent/services.d"));
        assert!(result.is_err());
    }

    #[test]
    fn test_into_request_merges_environment_file_under_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join("stack.env");
        fs::write(&env_file, "FROM_FILE=yes\nSHARED=file\n").unwrap();

        let yaml = format!(
            concat!(
                "command: /bin/true\n",
                "log_path: /tmp/l\n",
                "environment_file: {}\n",
                "env:\n",
                "  SHARED: override\n",
                "readiness:\n",
                "  type: udp_port\n",
                "  port: 14550\n",
            ),
            env_file.display()
        );
        let cfg: ServiceConfig = serde_yaml::from_str(&yaml).unwrap();
        let request = cfg.into_request().unwrap();

        assert_eq!(request.env.get("FROM_FILE").unwrap(), "yes");
        assert_eq!(request.env.get("SHARED").unwrap(), "override");
        assert_eq!(request.poll_interval, Duration::from_secs(1));
        assert_eq!(request.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_into_request_rejects_negative_interval() {
        let yaml = concat!(
            "command: /bin/true\n",
            "log_path: /tmp/l\n",
            "poll_interval_secs: -1\n",
            "readiness:\n",
            "  type: udp_port\n",
            "  port: 1\n",
        );
        let cfg: ServiceConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(cfg.into_request().is_err());
    }

    #[test]
    fn test_into_request_missing_environment_file() {
        let yaml = concat!(
            "command: /bin/true\n",
            "log_path: /tmp/l\n",
            "environment_file: /nonexistent/stack.env\n",
            "readiness:\n",
            "  type: udp_port\n",
            "  port: 1\n",
        );
        let cfg: ServiceConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(cfg.into_request().is_err());
    }
}
