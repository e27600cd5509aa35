//! Strongly-typed match parameters, one type per filter kind.

use smoltcp::wire::{EthernetAddress, EthernetProtocol, IpProtocol, Ipv4Address, Ipv6Address};

/// An IPv4 flow: protocol plus local and (optionally wildcarded) remote endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Tuple {
    pub protocol: IpProtocol,
    pub local_host: Ipv4Address,
    pub local_port: u16,
    pub remote_host: Ipv4Address,
    pub remote_port: u16,
}

impl Ipv4Tuple {
    /// Returns the remote endpoint, or `None` if the remote is wildcarded.
    ///
    /// An unspecified remote host (`0.0.0.0`) always means "any remote",
    /// so a filter can never match a literal all-zero remote address.
    /// The remote port is ignored whenever the remote host is a wildcard.
    pub fn remote(&self) -> Option<(Ipv4Address, u16)> {
        if self.remote_host.is_unspecified() {
            None
        } else {
            Some((self.remote_host, self.remote_port))
        }
    }
}

/// An IPv6 flow, mirroring [`Ipv4Tuple`] with 128-bit addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Tuple {
    pub protocol: IpProtocol,
    pub local_host: Ipv6Address,
    pub local_port: u16,
    pub remote_host: Ipv6Address,
    pub remote_port: u16,
}

impl Ipv6Tuple {
    /// Returns the remote endpoint, or `None` if the remote is wildcarded.
    ///
    /// Same convention as [`Ipv4Tuple::remote()`]: the unspecified address `::` means "any remote".
    pub fn remote(&self) -> Option<(Ipv6Address, u16)> {
        if self.remote_host.is_unspecified() {
            None
        } else {
            Some((self.remote_host, self.remote_port))
        }
    }
}

/// The payload of the `IP4` or `IP6` kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFilter {
    V4(Ipv4Tuple),
    V6(Ipv6Tuple),
}

impl IpFilter {
    pub fn protocol(&self) -> IpProtocol {
        match self {
            IpFilter::V4(t) => t.protocol,
            IpFilter::V6(t) => t.protocol,
        }
    }
}

/// The VLAN part of a MAC filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VlanMatch {
    /// Match frames regardless of their VLAN tag.
    Any,
    Id(u16),
}

/// The payload of the `MAC` kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacFilter {
    pub vlan: VlanMatch,
    pub addr: EthernetAddress,
}

/// The payload of the `IP_PROTO` or `ETHER_TYPE` kind. The two share a slot
/// because they are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolFilter {
    IpProto(IpProtocol),
    EtherType(EthernetProtocol),
}
