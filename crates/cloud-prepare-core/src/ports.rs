//! Port specifications for the traffic Submariner needs opened

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Transport protocol of a port to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP
    Tcp,
    /// UDP
    Udp,
}

impl Protocol {
    /// Lowercase protocol name, as used in resource names
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => Err(Error::invalid_input(format!(
                "unsupported protocol '{}' (expected tcp or udp)",
                other
            ))),
        }
    }
}

/// A single port/protocol pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortSpec {
    /// Port number (1-65535)
    pub port: u16,
    /// Transport protocol
    pub protocol: Protocol,
}

impl PortSpec {
    /// Create a new port specification
    pub fn new(port: u16, protocol: Protocol) -> Self {
        Self { port, protocol }
    }

    /// Shorthand for a TCP port
    pub fn tcp(port: u16) -> Self {
        Self::new(port, Protocol::Tcp)
    }

    /// Shorthand for a UDP port
    pub fn udp(port: u16) -> Self {
        Self::new(port, Protocol::Udp)
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}

/// Parses `"<port>/<protocol>"`, e.g. `4500/udp`
impl FromStr for PortSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (port, protocol) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| Error::invalid_input(format!("port '{}' must look like 4500/udp", s)))?;

        let port: u16 = port
            .parse()
            .map_err(|e| Error::invalid_input(format!("invalid port number in '{}': {}", s, e)))?;

        if port == 0 {
            return Err(Error::invalid_input(format!("port 0 is not allowed ('{}')", s)));
        }

        Ok(Self::new(port, protocol.parse()?))
    }
}

/// Input for preparing a cloud for Submariner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareForSubmarinerInput {
    /// Ports that must be reachable for intra-cluster communications
    pub internal_ports: Vec<PortSpec>,
}

impl PrepareForSubmarinerInput {
    /// Create an input for the given ports
    pub fn new(internal_ports: Vec<PortSpec>) -> Self {
        Self { internal_ports }
    }
}

/// Render ports as `"4500/udp, 4490/udp"` for progress messages
pub fn format_ports(ports: &[PortSpec]) -> String {
    ports
        .iter()
        .map(PortSpec::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
