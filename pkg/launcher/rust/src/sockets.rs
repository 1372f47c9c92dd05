// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fs;
use std::io::{BufRead, BufReader, Read};

use crate::procfs;

// Socket states as they appear in the /proc/net tables. A bound UDP socket
// reports TCP_CLOSE (0x07); a listening TCP socket reports TCP_LISTEN (0x0A).
const UDP_BOUND: u8 = 0x07;
const TCP_LISTEN: u8 = 0x0A;

const READ_LIMIT: u64 = 16 * 1024 * 1024;

/// True iff `port` currently has a bound UDP socket (v4 or v6).
pub fn udp_port_bound(port: u16) -> bool {
    table_has_port("udp", UDP_BOUND, port) || table_has_port("udp6", UDP_BOUND, port)
}

/// True iff `port` currently has a listening TCP socket (v4 or v6).
pub fn tcp_port_listening(port: u16) -> bool {
    table_has_port("tcp", TCP_LISTEN, port) || table_has_port("tcp6", TCP_LISTEN, port)
}

/// Scan one socket table from /proc/net for a local port in the expected
/// state. Malformed lines are skipped; a missing table reads as "not bound".
fn table_has_port(table: &str, expected_state: u8, port: u16) -> bool {
    let path = procfs::root_path().join("net").join(table);
    let Ok(file) = fs::File::open(path) else {
        return false;
    };
    let mut reader = BufReader::new(file.take(READ_LIMIT));

    let mut line = String::with_capacity(256);
    // Skip the header line.
    if reader.read_line(&mut line).is_err() {
        return false;
    }

    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => return false,
            Ok(_) => {
                if parse_socket_line(&line, expected_state) == Some(port) {
                    return true;
                }
            }
            Err(_) => return false,
        }
    }
}

/// Extract the local port from one socket-table line, provided the socket is
/// in the expected state. Format: `sl local_address rem_address st ...` with
/// local_address as `HEXIP:HEXPORT`.
fn parse_socket_line(line: &str, expected_state: u8) -> Option<u16> {
    let mut fields = line.split_whitespace();
    let local_address = fields.nth(1)?;
    let state = fields.nth(1)?;

    let state = u8::from_str_radix(state, 16).ok()?;
    if state != expected_state {
        return None;
    }

    let colon = local_address.rfind(':')?;
    let port = local_address.get(colon + 1..)?;
    u16::from_str_radix(port, 16).ok()
}
