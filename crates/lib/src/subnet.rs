//! IPv4 CIDR arithmetic over dotted-quad address/mask pairs.
//!
//! Manifest fields hold addresses as free text, so every helper here parses
//! its inputs first and reports [`SubnetError::InvalidCidr`] when either side
//! of the pair is not a usable IPv4 address or contiguous netmask.

use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;
use thiserror::Error;

/// Errors produced by subnet arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubnetError {
  /// The address or mask does not describe an IPv4 block.
  #[error("invalid CIDR block '{ip}/{mask}'")]
  InvalidCidr { ip: String, mask: String },
}

fn parse_block(ip: &str, mask: &str) -> Result<Ipv4Network, SubnetError> {
  let invalid = || SubnetError::InvalidCidr {
    ip: ip.to_string(),
    mask: mask.to_string(),
  };

  let addr: Ipv4Addr = ip.trim().parse().map_err(|_| invalid())?;
  let netmask: Ipv4Addr = mask.trim().parse().map_err(|_| invalid())?;

  Ipv4Network::with_netmask(addr, netmask).map_err(|_| invalid())
}

/// Returns the network base address of the block `ip`/`mask`.
///
/// ```
/// use anvil_manifest_lib::subnet::base_address;
///
/// let base = base_address("10.200.11.5", "255.255.255.0").unwrap();
/// assert_eq!(base.to_string(), "10.200.11.0");
/// ```
pub fn base_address(ip: &str, mask: &str) -> Result<Ipv4Addr, SubnetError> {
  Ok(parse_block(ip, mask)?.network())
}

/// Returns true if `candidate` lies inside the block `ip`/`mask`.
///
/// A `candidate` that is not an IPv4 address is never contained.
pub fn contains(ip: &str, mask: &str, candidate: &str) -> Result<bool, SubnetError> {
  let block = parse_block(ip, mask)?;

  Ok(
    candidate
      .trim()
      .parse::<Ipv4Addr>()
      .map(|addr| block.contains(addr))
      .unwrap_or(false),
  )
}

/// Returns true if `value` parses as a dotted-quad IPv4 address.
pub fn is_ipv4(value: &str) -> bool {
  value.parse::<Ipv4Addr>().is_ok()
}
