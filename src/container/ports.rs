//! Port forwarding spec parsing
//!
//! A spec is a comma-separated list of `container:host` pairs. Either side may
//! be a single port or an inclusive range `A-B`; ranges are paired up
//! positionally and must have the same length.

use crate::error::{PwnboxError, Result};

/// A single TCP port forwarded from the host into the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub container: u16,
    pub host: u16,
}

impl PortMapping {
    /// Engine key for the container side, always TCP
    pub fn key(&self) -> String {
        format!("{}/tcp", self.container)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortSide {
    Single(u16),
    Range(u16, u16),
}

fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse().ok()
}

fn parse_side(raw: &str) -> Option<PortSide> {
    match raw.split_once('-') {
        None => parse_port(raw).map(PortSide::Single),
        Some((start, end)) => {
            let (start, end) = (parse_port(start)?, parse_port(end)?);
            (start <= end).then_some(PortSide::Range(start, end))
        }
    }
}

fn parse_pair(pair: &str) -> Result<Vec<PortMapping>> {
    let invalid = || PwnboxError::InvalidPortMapping(pair.to_string());

    let (container, host) = pair.split_once(':').ok_or_else(invalid)?;
    let container = parse_side(container).ok_or_else(invalid)?;
    let host = parse_side(host).ok_or_else(invalid)?;

    match (container, host) {
        (PortSide::Single(container), PortSide::Single(host)) => {
            Ok(vec![PortMapping { container, host }])
        }
        (PortSide::Range(c_start, c_end), PortSide::Range(h_start, h_end)) => {
            if c_end - c_start != h_end - h_start {
                return Err(invalid());
            }
            Ok((c_start..=c_end)
                .zip(h_start..=h_end)
                .map(|(container, host)| PortMapping { container, host })
                .collect())
        }
        _ => Err(invalid()),
    }
}

/// Expand a forwarding spec into individual mappings.
///
/// Fails on the first malformed pair without returning partial results.
pub fn parse_port_mappings(spec: &str) -> Result<Vec<PortMapping>> {
    let mut mappings = Vec::new();
    for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        mappings.extend(parse_pair(pair)?);
    }
    Ok(mappings)
}
