// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32 for IPv4, 0-128 for IPv6)")]
    InvalidPrefixLength(u8),

    #[error("Invalid netmask: {0}")]
    InvalidNetmask(String),

    #[error("Invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(u32),
}

/// IP network in CIDR notation
///
/// Holds the address as written plus a prefix length. Two values denote the
/// same network when their truncated networks match, so `192.168.10.5/24`
/// and `192.168.10.0/24` compare equal.
///
/// # Examples
///
/// ```rust
/// use cim_virt_topology::domain::IpCidr;
///
/// let cidr = IpCidr::new("192.168.10.0/24").unwrap();
/// assert_eq!(cidr.prefix_length(), 24);
/// assert_eq!(cidr.first_host().unwrap().to_string(), "192.168.10.1");
/// assert_eq!(cidr.last_host().unwrap().to_string(), "192.168.10.254");
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IpCidr(IpNet);

impl IpCidr {
    /// Parse `address/prefix` notation
    ///
    /// # Invariants
    /// - Valid IP address format
    /// - Prefix length 0-32 for IPv4, 0-128 for IPv6
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();

        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let address = parse_ip(addr_str)?;

        let prefix_length = prefix_str
            .trim()
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_length)
    }

    /// Create from separate address and prefix
    pub fn from_parts(address: IpAddr, prefix_length: u8) -> Result<Self, NetworkError> {
        IpNet::new(address, prefix_length)
            .map(Self)
            .map_err(|_| NetworkError::InvalidPrefixLength(prefix_length))
    }

    /// Create from a subnet address and a dotted netmask (`255.255.255.0`)
    ///
    /// # Invariants
    /// - Netmask of the same address family as the subnet
    /// - Netmask bits contiguous from the top
    pub fn from_subnet_and_netmask(
        subnet: impl AsRef<str>,
        netmask: impl AsRef<str>,
    ) -> Result<Self, NetworkError> {
        let netmask = netmask.as_ref();
        let invalid_netmask = || NetworkError::InvalidNetmask(netmask.to_string());

        let address = parse_ip(subnet)?;
        let mask = IpAddr::from_str(netmask.trim()).map_err(|_| invalid_netmask())?;

        let prefix_length = match (address, mask) {
            (IpAddr::V4(_), IpAddr::V4(mask)) => ipnet::ipv4_mask_to_prefix(mask),
            (IpAddr::V6(_), IpAddr::V6(mask)) => ipnet::ipv6_mask_to_prefix(mask),
            _ => return Err(invalid_netmask()),
        }
        .map_err(|_| invalid_netmask())?;

        Self::from_parts(address, prefix_length)
    }

    /// Get the address as written
    pub fn address(&self) -> IpAddr {
        self.0.addr()
    }

    /// Get the prefix length
    pub fn prefix_length(&self) -> u8 {
        self.0.prefix_len()
    }

    /// Check if this is an IPv4 network
    pub fn is_ipv4(&self) -> bool {
        matches!(self.0, IpNet::V4(_))
    }

    /// Underlying network
    pub fn as_net(&self) -> &IpNet {
        &self.0
    }

    /// Network address (host bits cleared)
    pub fn network(&self) -> IpAddr {
        self.0.network()
    }

    /// Last address of the network (broadcast for IPv4)
    pub fn broadcast(&self) -> IpAddr {
        self.0.broadcast()
    }

    /// First usable host address (`network + 1`)
    ///
    /// `None` when the network is too small to have distinct host addresses.
    pub fn first_host(&self) -> Option<IpAddr> {
        self.host_range().map(|(first, _)| first)
    }

    /// Last usable host address (`broadcast - 1`)
    pub fn last_host(&self) -> Option<IpAddr> {
        self.host_range().map(|(_, last)| last)
    }

    /// Addresses between the network and broadcast addresses, both excluded
    pub fn host_range(&self) -> Option<(IpAddr, IpAddr)> {
        match self.0 {
            IpNet::V4(net) => {
                let (network, broadcast) = (u32::from(net.network()), u32::from(net.broadcast()));
                (broadcast - network >= 2).then(|| {
                    (
                        IpAddr::V4(Ipv4Addr::from(network + 1)),
                        IpAddr::V4(Ipv4Addr::from(broadcast - 1)),
                    )
                })
            }
            IpNet::V6(net) => {
                let (network, broadcast) = (u128::from(net.network()), u128::from(net.broadcast()));
                (broadcast - network >= 2).then(|| {
                    (
                        IpAddr::V6(Ipv6Addr::from(network + 1)),
                        IpAddr::V6(Ipv6Addr::from(broadcast - 1)),
                    )
                })
            }
        }
    }

    /// Check whether an address belongs to this network
    pub fn contains(&self, address: &IpAddr) -> bool {
        self.0.contains(address)
    }

    /// Get as CIDR notation string
    pub fn as_cidr(&self) -> String {
        self.0.to_string()
    }
}

impl PartialEq for IpCidr {
    fn eq(&self, other: &Self) -> bool {
        self.0.trunc() == other.0.trunc()
    }
}

impl Eq for IpCidr {}

impl fmt::Display for IpCidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IpCidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for IpCidr {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IpCidr> for String {
    fn from(value: IpCidr) -> Self {
        value.as_cidr()
    }
}

impl From<IpNet> for IpCidr {
    fn from(net: IpNet) -> Self {
        Self(net)
    }
}

/// Parse a bare IP address literal
pub fn parse_ip(value: impl AsRef<str>) -> Result<IpAddr, NetworkError> {
    let value = value.as_ref();
    IpAddr::from_str(value.trim()).map_err(|_| NetworkError::InvalidIpAddress(value.to_string()))
}

/// VLAN ID value object
///
/// Represents a VLAN ID (IEEE 802.1Q) with validation.
/// Invariants:
/// - Valid VLAN ID range (1-4094)
/// - VLAN 0 and 4095 are reserved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct VlanId(u16);

impl VlanId {
    /// Minimum valid VLAN ID
    pub const MIN: u16 = 1;

    /// Maximum valid VLAN ID
    pub const MAX: u16 = 4094;

    /// Create a new VLAN ID with validation
    pub fn new(id: u32) -> Result<Self, NetworkError> {
        if id < u32::from(Self::MIN) || id > u32::from(Self::MAX) {
            return Err(NetworkError::InvalidVlanId(id));
        }

        Ok(Self(id as u16))
    }

    /// Get the VLAN ID value
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for VlanId {
    type Error = NetworkError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VlanId> for u32 {
    fn from(value: VlanId) -> Self {
        u32::from(value.0)
    }
}
