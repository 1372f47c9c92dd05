// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::procfs;
use crate::sockets;

/// A side-effect-free observation of whether a launched service has reached
/// a usable state. Evaluated once per poll interval by the launcher.
pub trait ReadinessCheck: Send + Sync {
    fn is_ready(&self) -> bool;
}

impl<F> ReadinessCheck for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_ready(&self) -> bool {
        self()
    }
}

/// Ready when some running process's command line contains the pattern.
pub struct ProcessPresent {
    pattern: String,
}

impl ProcessPresent {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl ReadinessCheck for ProcessPresent {
    fn is_ready(&self) -> bool {
        procfs::any_process_matches(&self.pattern)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Proto {
    Tcp,
    Udp,
}

/// Ready when the port shows up in the OS socket table: bound for UDP,
/// listening for TCP. The usual check for telemetry endpoints.
pub struct PortBound {
    port: u16,
    proto: Proto,
}

impl PortBound {
    pub fn udp(port: u16) -> Self {
        Self {
            port,
            proto: Proto::Udp,
        }
    }

    pub fn tcp(port: u16) -> Self {
        Self {
            port,
            proto: Proto::Tcp,
        }
    }
}

impl ReadinessCheck for PortBound {
    fn is_ready(&self) -> bool {
        match self.proto {
            Proto::Udp => sockets::udp_port_bound(self.port),
            Proto::Tcp => sockets::tcp_port_listening(self.port),
        }
    }
}
