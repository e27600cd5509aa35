//! The requests and results exchanged with a [`ResourceOpChannel`](crate::ResourceOpChannel).

use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use smoltcp::wire::{EthernetAddress, EthernetProtocol, IpAddress, IpProtocol};

/// Identifies the backend resource (a virtual interface or a VI set) that owns a filter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ResourceId(pub u32);

/// An identifier the hardware assigns to an installed filter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FilterId(pub u32);

bitflags! {
    /// Options that accompany a filter install request.
    pub struct FilterAddFlags: u32 {
        /// Spread matched traffic over the VI set's queues.
        const RSS               = 0x1;
        /// Let the backend pick any receive queue.
        const ANY_RXQ           = 0x2;
        /// Steer to the preferred queue if the backend can.
        const PREF_RXQ          = 0x4;
        /// The destination queue must not be shared.
        const EXCLUSIVE_RXQ     = 0x8;
        /// Also deliver locally transmitted multicast.
        const MCAST_LOOP        = 0x10;
    }
}

bitflags! {
    /// Presence mask of the fields in a [`FilterMatchSpec`].
    pub struct FilterFields: u32 {
        const LOC_HOST      = 0x1;
        const LOC_PORT      = 0x2;
        const REM_HOST      = 0x4;
        const REM_PORT      = 0x8;
        const LOC_MAC       = 0x10;
        const OUTER_VID     = 0x20;
        const ETHER_TYPE    = 0x40;
        const IP_PROTO      = 0x80;
        const RXQ           = 0x100;
    }
}

/// Operations that switch a special filter on or off.
/// These filters carry no match fields and have no durable identifier.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum SpecialFilterOp {
    PortSniff                   = 0x10,
    TxPortSniff                 = 0x11,
    AddBlockKernel              = 0x20,
    AddBlockKernelUnicast       = 0x21,
    AddBlockKernelMulticast     = 0x22,
    AddAllUnicast               = 0x30,
    AddAllMulticast             = 0x31,
    AddMismatchUnicast          = 0x40,
    AddMismatchUnicastVlan      = 0x41,
    AddMismatchMulticast        = 0x42,
    AddMismatchMulticastVlan    = 0x43,
}

/// A request to enable or disable a special filter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SpecialFilterRequest {
    pub op: SpecialFilterOp,
    pub enable: bool,
    /// Only meaningful for [`SpecialFilterOp::PortSniff`].
    pub promiscuous: bool,
    /// Only set for the mismatch-with-VLAN operations.
    pub vlan_id: Option<u16>,
    pub flags: FilterAddFlags,
}

/// The generic match descriptor of a normal filter.
///
/// Every `None` field is a wildcard.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FilterMatchSpec {
    pub ether_type: Option<EthernetProtocol>,
    pub ip_protocol: Option<IpProtocol>,
    pub local_host: Option<IpAddress>,
    pub local_port: Option<u16>,
    pub remote_host: Option<IpAddress>,
    pub remote_port: Option<u16>,
    pub vlan_id: Option<u16>,
    pub mac_address: Option<EthernetAddress>,
    pub dest_queue: Option<u16>,
}

impl FilterMatchSpec {
    /// Returns the mask of fields that are populated.
    pub fn fields(&self) -> FilterFields {
        let mut fields = FilterFields::empty();
        fields.set(FilterFields::ETHER_TYPE, self.ether_type.is_some());
        fields.set(FilterFields::IP_PROTO, self.ip_protocol.is_some());
        fields.set(FilterFields::LOC_HOST, self.local_host.is_some());
        fields.set(FilterFields::LOC_PORT, self.local_port.is_some());
        fields.set(FilterFields::REM_HOST, self.remote_host.is_some());
        fields.set(FilterFields::REM_PORT, self.remote_port.is_some());
        fields.set(FilterFields::OUTER_VID, self.vlan_id.is_some());
        fields.set(FilterFields::LOC_MAC, self.mac_address.is_some());
        fields.set(FilterFields::RXQ, self.dest_queue.is_some());
        fields
    }
}

/// A request to install a normal filter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FilterAddRequest {
    pub spec: FilterMatchSpec,
    pub flags: FilterAddFlags,
}

/// What the backend reports after installing a normal filter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FilterAddOutput {
    pub filter_id: FilterId,
    /// The receive queue the filter was steered to, if the backend reports it.
    pub rxq: Option<u16>,
}

/// What the backend reports about an installed filter.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FilterQueryOutput {
    /// The hardware's own identifier for the filter.
    pub hw_id: Option<u32>,
    pub rxq: Option<u16>,
    pub flags: u32,
}
