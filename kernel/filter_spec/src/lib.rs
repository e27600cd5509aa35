//! Filter specifications for steering received packets to an application-owned receive queue.
//!
//! A [`FilterSpec`] starts out empty and is built up by calling its `set_*` methods.
//! Each setter either adds one filter kind (with its typed parameters) or fails with
//! [`FilterSpecError`] and leaves the spec untouched, so a spec can only ever hold
//! one of the kind combinations listed by [`FilterKinds::is_legal()`].
//!
//! The finished spec is handed to the `nic_filters` crate for installation.

#![cfg_attr(not(test), no_std)]

mod error;
mod kinds;
mod payload;

pub use error::FilterSpecError;
pub use kinds::FilterKinds;
pub use payload::*;
pub use smoltcp::wire::{EthernetAddress, EthernetProtocol, IpProtocol, Ipv4Address, Ipv6Address};

use bitflags::bitflags;
use log::trace;

/// The largest receive queue index a filter can steer to.
pub const MAX_DEST_QUEUE: i32 = 0xFFFF;

bitflags! {
    /// Behavior flags chosen when a spec is created; they never change afterwards.
    pub struct FilterSpecFlags: u32 {
        /// Also deliver multicast packets that this host itself transmits.
        const MCAST_LOOP_RECEIVE    = 0x2;
        /// The destination queue must not be shared with any other filter.
        const EXCLUSIVE_RXQ         = 0x4;
    }
}

/// Describes which packets a filter matches and where they should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    kinds: FilterKinds,
    flags: FilterSpecFlags,
    ip: Option<IpFilter>,
    mac: Option<MacFilter>,
    vlan: Option<u16>,
    protocol: Option<ProtocolFilter>,
    promiscuous: bool,
    dest: Option<u16>,
}

impl FilterSpec {
    /// Creates an empty spec that matches nothing yet.
    pub fn new(flags: FilterSpecFlags) -> FilterSpec {
        FilterSpec {
            kinds: FilterKinds::empty(),
            flags,
            ip: None,
            mac: None,
            vlan: None,
            protocol: None,
            promiscuous: false,
            dest: None,
        }
    }

    pub fn kinds(&self) -> FilterKinds { self.kinds }
    pub fn flags(&self) -> FilterSpecFlags { self.flags }
    pub fn ip(&self) -> Option<&IpFilter> { self.ip.as_ref() }
    pub fn mac(&self) -> Option<&MacFilter> { self.mac.as_ref() }
    /// The VLAN id set by [`set_vlan()`](Self::set_vlan).
    pub fn vlan(&self) -> Option<u16> { self.vlan }
    pub fn protocol(&self) -> Option<ProtocolFilter> { self.protocol }
    /// Whether a port sniff should also capture traffic not addressed to this port.
    pub fn promiscuous(&self) -> bool { self.promiscuous }
    /// The receive queue set by [`set_dest()`](Self::set_dest).
    pub fn dest(&self) -> Option<u16> { self.dest }

    /// Matches packets sent to a local IPv4 address and port from any remote endpoint.
    pub fn set_ip4_local(&mut self, protocol: IpProtocol, host: Ipv4Address, port: u16) -> Result<(), FilterSpecError> {
        self.set_ip4_full(protocol, host, port, Ipv4Address::UNSPECIFIED, 0)
    }

    /// Matches a full IPv4 5-tuple.
    ///
    /// A `remote_host` of `0.0.0.0` is not matched literally: it wildcards the whole
    /// remote endpoint, including `remote_port`. See [`Ipv4Tuple::remote()`].
    pub fn set_ip4_full(
        &mut self,
        protocol: IpProtocol,
        host: Ipv4Address,
        port: u16,
        remote_host: Ipv4Address,
        remote_port: u16,
    ) -> Result<(), FilterSpecError> {
        self.admit(FilterKinds::IP4, self.only(FilterKinds::VLAN | FilterKinds::HAS_DEST))?;
        self.ip = Some(IpFilter::V4(Ipv4Tuple {
            protocol,
            local_host: host,
            local_port: port,
            remote_host,
            remote_port,
        }));
        self.add(FilterKinds::IP4);
        Ok(())
    }

    /// Matches packets sent to a local IPv6 address and port from any remote endpoint.
    pub fn set_ip6_local(&mut self, protocol: IpProtocol, host: Ipv6Address, port: u16) -> Result<(), FilterSpecError> {
        self.set_ip6_full(protocol, host, port, Ipv6Address::UNSPECIFIED, 0)
    }

    /// Matches a full IPv6 5-tuple.
    ///
    /// A `remote_host` of `::` wildcards the remote endpoint, as in [`set_ip4_full()`](Self::set_ip4_full).
    pub fn set_ip6_full(
        &mut self,
        protocol: IpProtocol,
        host: Ipv6Address,
        port: u16,
        remote_host: Ipv6Address,
        remote_port: u16,
    ) -> Result<(), FilterSpecError> {
        self.admit(FilterKinds::IP6, self.only(FilterKinds::VLAN | FilterKinds::HAS_DEST))?;
        self.ip = Some(IpFilter::V6(Ipv6Tuple {
            protocol,
            local_host: host,
            local_port: port,
            remote_host,
            remote_port,
        }));
        self.add(FilterKinds::IP6);
        Ok(())
    }

    /// Restricts the filter to frames tagged with `vlan_id`.
    pub fn set_vlan(&mut self, vlan_id: u16) -> Result<(), FilterSpecError> {
        let admissible = self.shape_is(&[
            FilterKinds::empty(),
            FilterKinds::IP4,
            FilterKinds::IP6,
            FilterKinds::MISMATCH_UNICAST,
            FilterKinds::MISMATCH_MULTICAST,
            FilterKinds::IP_PROTO,
            FilterKinds::ETHER_TYPE,
        ]);
        self.admit(FilterKinds::VLAN, admissible)?;
        self.vlan = Some(vlan_id);
        self.add(FilterKinds::VLAN);
        Ok(())
    }

    /// Matches frames sent to a local MAC address, on one VLAN or on any.
    pub fn set_eth_local(&mut self, vlan: VlanMatch, mac: EthernetAddress) -> Result<(), FilterSpecError> {
        let admissible = self.shape_is(&[
            FilterKinds::empty(),
            FilterKinds::IP_PROTO,
            FilterKinds::ETHER_TYPE,
        ]);
        self.admit(FilterKinds::MAC, admissible)?;
        self.mac = Some(MacFilter { vlan, addr: mac });
        self.add(FilterKinds::MAC);
        Ok(())
    }

    /// Matches all unicast traffic.
    pub fn set_unicast_all(&mut self) -> Result<(), FilterSpecError> {
        self.admit(FilterKinds::ALL_UNICAST, self.only(FilterKinds::VLAN))?;
        self.add(FilterKinds::ALL_UNICAST);
        Ok(())
    }

    /// Matches all multicast traffic.
    pub fn set_multicast_all(&mut self) -> Result<(), FilterSpecError> {
        self.admit(FilterKinds::ALL_MULTICAST, self.only(FilterKinds::VLAN | FilterKinds::HAS_DEST))?;
        self.add(FilterKinds::ALL_MULTICAST);
        Ok(())
    }

    /// Matches unicast traffic that no more specific filter claimed.
    pub fn set_unicast_mismatch(&mut self) -> Result<(), FilterSpecError> {
        self.admit(FilterKinds::MISMATCH_UNICAST, self.only(FilterKinds::VLAN | FilterKinds::HAS_DEST))?;
        self.add(FilterKinds::MISMATCH_UNICAST);
        Ok(())
    }

    /// Matches multicast traffic that no more specific filter claimed.
    pub fn set_multicast_mismatch(&mut self) -> Result<(), FilterSpecError> {
        self.admit(FilterKinds::MISMATCH_MULTICAST, self.only(FilterKinds::VLAN | FilterKinds::HAS_DEST))?;
        self.add(FilterKinds::MISMATCH_MULTICAST);
        Ok(())
    }

    /// Receives a copy of all traffic arriving on the port.
    pub fn set_port_sniff(&mut self, promiscuous: bool) -> Result<(), FilterSpecError> {
        self.admit(FilterKinds::PORT_SNIFF, self.kinds.is_empty())?;
        self.promiscuous = promiscuous;
        self.add(FilterKinds::PORT_SNIFF);
        Ok(())
    }

    /// Receives a copy of all traffic transmitted on the port.
    pub fn set_tx_port_sniff(&mut self) -> Result<(), FilterSpecError> {
        self.set_sole(FilterKinds::TX_PORT_SNIFF)
    }

    /// Stops all traffic from reaching the kernel stack.
    pub fn set_block_kernel(&mut self) -> Result<(), FilterSpecError> {
        self.set_sole(FilterKinds::BLOCK_KERNEL)
    }

    /// Stops multicast traffic from reaching the kernel stack.
    pub fn set_block_kernel_multicast(&mut self) -> Result<(), FilterSpecError> {
        self.set_sole(FilterKinds::BLOCK_KERNEL_MULTICAST)
    }

    /// Stops unicast traffic from reaching the kernel stack.
    pub fn set_block_kernel_unicast(&mut self) -> Result<(), FilterSpecError> {
        self.set_sole(FilterKinds::BLOCK_KERNEL_UNICAST)
    }

    /// Matches IPv4 packets carrying `protocol`, wildcarding addresses and ports.
    pub fn set_ip_proto(&mut self, protocol: IpProtocol) -> Result<(), FilterSpecError> {
        self.set_protocol(FilterKinds::IP_PROTO, ProtocolFilter::IpProto(protocol))
    }

    /// Matches frames of the given ether type.
    pub fn set_eth_type(&mut self, ether_type: EthernetProtocol) -> Result<(), FilterSpecError> {
        self.set_protocol(FilterKinds::ETHER_TYPE, ProtocolFilter::EtherType(ether_type))
    }

    /// Steers matched packets to receive queue `dest`.
    ///
    /// Calling this again replaces the previous queue.
    pub fn set_dest(&mut self, dest: i32) -> Result<(), FilterSpecError> {
        self.admit(FilterKinds::HAS_DEST, !self.kinds.intersects(FilterKinds::EXCLUSIVE))?;
        if !(0..=MAX_DEST_QUEUE).contains(&dest) {
            trace!("filter_spec: destination queue {} is out of range", dest);
            return Err(FilterSpecError::InvalidArgument);
        }
        if dest == 0 && self.flags.contains(FilterSpecFlags::EXCLUSIVE_RXQ) {
            trace!("filter_spec: queue 0 cannot be used as an exclusive destination");
            return Err(FilterSpecError::InvalidArgument);
        }
        self.dest = Some(dest as u16);
        self.add(FilterKinds::HAS_DEST);
        Ok(())
    }

    fn set_sole(&mut self, kind: FilterKinds) -> Result<(), FilterSpecError> {
        self.admit(kind, self.kinds.is_empty())?;
        self.add(kind);
        Ok(())
    }

    fn set_protocol(&mut self, kind: FilterKinds, protocol: ProtocolFilter) -> Result<(), FilterSpecError> {
        let admissible = self.kinds.is_empty()
            || self.kinds == FilterKinds::VLAN
            || self.kinds == FilterKinds::MAC;
        self.admit(kind, admissible)?;
        self.protocol = Some(protocol);
        self.add(kind);
        Ok(())
    }

    /// Returns `true` if the spec holds no kinds outside of `allowed`.
    fn only(&self, allowed: FilterKinds) -> bool {
        (self.kinds - allowed).is_empty()
    }

    /// Returns `true` if the spec's kinds, ignoring `HAS_DEST`, are exactly one of `shapes`.
    fn shape_is(&self, shapes: &[FilterKinds]) -> bool {
        shapes.contains(&self.kinds.without_dest())
    }

    fn admit(&self, kind: FilterKinds, admissible: bool) -> Result<(), FilterSpecError> {
        if admissible {
            Ok(())
        } else {
            trace!("filter_spec: cannot add {:?} to a spec holding {:?}", kind, self.kinds);
            Err(FilterSpecError::IncompatibleCombination)
        }
    }

    fn add(&mut self, kind: FilterKinds) {
        self.kinds |= kind;
        debug_assert!(self.kinds.is_legal(), "illegal filter kinds {:?}", self.kinds);
    }
}
