// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Readiness-polling launcher for the simulation ground stack.
//!
//! Starts a long-running background process (ground control station,
//! autopilot SITL, telemetry bridge), then observes it until a caller-defined
//! readiness condition holds or a deadline passes. The launcher never owns
//! the process it starts: it reports outcomes, it does not kill.

pub mod config;
pub mod env;
pub mod launch;
pub mod patch;
pub mod procfs;
pub mod readiness;
pub mod sockets;
pub mod tail;

pub use config::{ServiceConfig, config_dir, load_configs};
pub use launch::{CancelFlag, LaunchOutcome, LaunchRequest, StartError, launch};
pub use patch::{PatchOutcome, apply_patch};
pub use readiness::{PortBound, ProcessPresent, ReadinessCheck};
