//! Pattern-based parser for the VPN client log
//!
//! Extracts the forwarded port from `Port pair A->B` lines using a regex.

use crate::types::ListenPort;
use regex::Regex;

/// Parser for VPN client log lines
#[derive(Debug, Clone)]
pub struct PortPairParser {
    /// Pattern for "Port pair 51413->51413"
    port_pair_pattern: Regex,
}

impl PortPairParser {
    /// Create a new PortPairParser with its compiled regex pattern
    pub fn new() -> Self {
        Self {
            port_pair_pattern: Regex::new(r"Port pair\s+(\d+)->(\d+)")
                .expect("Failed to compile port_pair pattern"),
        }
    }

    /// Parse a single log line
    ///
    /// Returns the first port of the pair (the externally forwarded one), or
    /// `None` when the line has no pair or the number is not a valid port.
    pub fn parse_line(&self, line: &str) -> Option<ListenPort> {
        let captures = self.port_pair_pattern.captures(line)?;
        captures
            .get(1)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .and_then(ListenPort::from_i64)
    }

    /// Find the most recent forwarded port in a whole log
    ///
    /// Lines are walked from last to first; the first line carrying a valid
    /// pair wins. Blank lines are skipped.
    pub fn find_latest(&self, contents: &str) -> Option<ListenPort> {
        contents
            .lines()
            .rev()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .find_map(|line| self.parse_line(line))
    }
}

impl Default for PortPairParser {
    fn default() -> Self {
        Self::new()
    }
}
