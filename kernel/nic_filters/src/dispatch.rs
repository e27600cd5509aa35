//! Translates a finished [`FilterSpec`] into a backend request and issues it.
//!
//! Filters come in two families:
//! * special filters (sniffing, kernel blocking, all/mismatch unicast and multicast)
//!   are switched on and off with a fixed opcode and carry no match fields;
//! * normal filters (IP, MAC, protocol and ether type matches) are installed
//!   from a generic [`FilterMatchSpec`] and removed by id.

use crate::{FilterCookie, FilterError, Result};
use filter_spec::{FilterKinds, FilterSpec, FilterSpecFlags, IpFilter, ProtocolFilter, VlanMatch};
use log::{debug, warn};
use nic_resource_op::{
    FilterAddFlags, FilterAddRequest, FilterMatchSpec, ResourceId, ResourceOpChannel,
    SpecialFilterOp, SpecialFilterRequest,
};
use smoltcp::wire::{EthernetProtocol, IpAddress};

const fn union(a: FilterKinds, b: FilterKinds) -> FilterKinds {
    FilterKinds::from_bits_truncate(a.bits() | b.bits())
}

/// The opcode used for each special filter shape, ignoring `HAS_DEST`.
const SPECIAL_OPS: [(FilterKinds, SpecialFilterOp); 11] = [
    (FilterKinds::PORT_SNIFF, SpecialFilterOp::PortSniff),
    (FilterKinds::TX_PORT_SNIFF, SpecialFilterOp::TxPortSniff),
    (FilterKinds::BLOCK_KERNEL, SpecialFilterOp::AddBlockKernel),
    (FilterKinds::BLOCK_KERNEL_UNICAST, SpecialFilterOp::AddBlockKernelUnicast),
    (FilterKinds::BLOCK_KERNEL_MULTICAST, SpecialFilterOp::AddBlockKernelMulticast),
    (FilterKinds::ALL_UNICAST, SpecialFilterOp::AddAllUnicast),
    (FilterKinds::ALL_MULTICAST, SpecialFilterOp::AddAllMulticast),
    (FilterKinds::MISMATCH_UNICAST, SpecialFilterOp::AddMismatchUnicast),
    (union(FilterKinds::MISMATCH_UNICAST, FilterKinds::VLAN), SpecialFilterOp::AddMismatchUnicastVlan),
    (FilterKinds::MISMATCH_MULTICAST, SpecialFilterOp::AddMismatchMulticast),
    (union(FilterKinds::MISMATCH_MULTICAST, FilterKinds::VLAN), SpecialFilterOp::AddMismatchMulticastVlan),
];

/// Normal filter shapes, ignoring `HAS_DEST`, that a backend can install.
const NORMAL_SHAPES: [FilterKinds; 11] = [
    FilterKinds::IP4,
    union(FilterKinds::IP4, FilterKinds::VLAN),
    FilterKinds::IP6,
    union(FilterKinds::IP6, FilterKinds::VLAN),
    FilterKinds::MAC,
    union(FilterKinds::MAC, FilterKinds::IP_PROTO),
    union(FilterKinds::MAC, FilterKinds::ETHER_TYPE),
    FilterKinds::IP_PROTO,
    union(FilterKinds::IP_PROTO, FilterKinds::VLAN),
    FilterKinds::ETHER_TYPE,
    union(FilterKinds::ETHER_TYPE, FilterKinds::VLAN),
];

/// The backend request a spec translates into.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterRequest {
    Special(SpecialFilterRequest),
    Normal(FilterAddRequest),
}

/// Translates `spec` into the request that installs it.
///
/// `preferred_rxq` is only used when `flags` contains [`FilterAddFlags::PREF_RXQ`]
/// and the spec has no destination of its own.
pub fn translate(spec: &FilterSpec, flags: FilterAddFlags, preferred_rxq: Option<u16>) -> Result<FilterRequest> {
    let kinds = spec.kinds();
    let shape = kinds.without_dest();

    if let Some(&(_, op)) = SPECIAL_OPS.iter().find(|(k, _)| *k == shape) {
        // special requests have no field to steer by, so a destination can't be honored
        if let Some(dest) = spec.dest() {
            warn!("nic_filters::translate(): special filter {:?} cannot steer to queue {}", op, dest);
            return Err(FilterError::UnsupportedCombination);
        }
        let vlan_id = match op {
            SpecialFilterOp::AddMismatchUnicastVlan | SpecialFilterOp::AddMismatchMulticastVlan => spec.vlan(),
            _ => None,
        };
        return Ok(FilterRequest::Special(SpecialFilterRequest {
            op,
            enable: true,
            promiscuous: op == SpecialFilterOp::PortSniff && spec.promiscuous(),
            vlan_id,
            flags,
        }));
    }

    if !NORMAL_SHAPES.contains(&shape) {
        warn!("nic_filters::translate(): no install mapping for filter kinds {:?}", kinds);
        return Err(FilterError::UnsupportedCombination);
    }

    let mut m = FilterMatchSpec::default();
    if let Some(mac) = spec.mac() {
        m.mac_address = Some(mac.addr);
        if let VlanMatch::Id(vid) = mac.vlan {
            m.vlan_id = Some(vid);
        }
    } else if let Some(ip) = spec.ip() {
        match ip {
            IpFilter::V4(t) => {
                m.ether_type = Some(EthernetProtocol::Ipv4);
                m.ip_protocol = Some(t.protocol);
                m.local_host = Some(IpAddress::Ipv4(t.local_host));
                m.local_port = Some(t.local_port);
                if let Some((host, port)) = t.remote() {
                    m.remote_host = Some(IpAddress::Ipv4(host));
                    m.remote_port = Some(port);
                }
            }
            IpFilter::V6(t) => {
                m.ether_type = Some(EthernetProtocol::Ipv6);
                m.ip_protocol = Some(t.protocol);
                m.local_host = Some(IpAddress::Ipv6(t.local_host));
                m.local_port = Some(t.local_port);
                if let Some((host, port)) = t.remote() {
                    m.remote_host = Some(IpAddress::Ipv6(host));
                    m.remote_port = Some(port);
                }
            }
        }
    }

    // IP_PROTO and ETHER_TYPE never coexist with IP4 or IP6
    match spec.protocol() {
        Some(ProtocolFilter::IpProto(proto)) => {
            m.ether_type = Some(EthernetProtocol::Ipv4);
            m.ip_protocol = Some(proto);
        }
        Some(ProtocolFilter::EtherType(ether_type)) => {
            m.ether_type = Some(ether_type);
        }
        None => {}
    }
    if spec.mac().is_none() {
        if let Some(vid) = spec.vlan() {
            m.vlan_id = Some(vid);
        }
    }

    if let Some(dest) = spec.dest() {
        m.dest_queue = Some(dest);
    } else if flags.contains(FilterAddFlags::PREF_RXQ) {
        m.dest_queue = preferred_rxq;
    }

    let mut flags = flags;
    if spec.flags().contains(FilterSpecFlags::MCAST_LOOP_RECEIVE) {
        flags |= FilterAddFlags::MCAST_LOOP;
    }
    Ok(FilterRequest::Normal(FilterAddRequest { spec: m, flags }))
}

/// Installs `spec` on `resource` with a single backend call.
///
/// Returns the cookie for the new filter and the receive queue the backend assigned, if any.
pub fn filter_add<C: ResourceOpChannel + ?Sized>(
    channel: &mut C,
    resource: ResourceId,
    spec: &FilterSpec,
    flags: FilterAddFlags,
    preferred_rxq: Option<u16>,
) -> Result<(FilterCookie, Option<u16>)> {
    match translate(spec, flags, preferred_rxq)? {
        FilterRequest::Special(request) => {
            debug!("nic_filters::filter_add(): {:?} on {:?}", request, resource);
            let rxq = channel.special_filter_op(resource, &request)?;
            Ok((FilterCookie::new(None, spec.kinds()), rxq))
        }
        FilterRequest::Normal(request) => {
            debug!("nic_filters::filter_add(): {:?} on {:?}", request, resource);
            let out = channel.filter_add(resource, &request)?;
            Ok((FilterCookie::new(Some(out.filter_id), spec.kinds()), out.rxq))
        }
    }
}

/// Removes the filter behind `cookie` from `resource` with a single backend call.
///
/// Sniff filters are switched off with the opcode that enabled them;
/// every other filter is removed by id.
pub fn filter_del<C: ResourceOpChannel + ?Sized>(
    channel: &mut C,
    resource: ResourceId,
    cookie: &FilterCookie,
) -> Result<()> {
    let sniff_op = if cookie.kinds() == FilterKinds::PORT_SNIFF {
        Some(SpecialFilterOp::PortSniff)
    } else if cookie.kinds() == FilterKinds::TX_PORT_SNIFF {
        Some(SpecialFilterOp::TxPortSniff)
    } else {
        None
    };
    match sniff_op {
        Some(op) => {
            let request = SpecialFilterRequest {
                op,
                enable: false,
                promiscuous: false,
                vlan_id: None,
                flags: FilterAddFlags::empty(),
            };
            debug!("nic_filters::filter_del(): {:?} on {:?}", request, resource);
            channel.special_filter_op(resource, &request)?;
        }
        None => {
            debug!("nic_filters::filter_del(): filter {:?} on {:?}", cookie.filter_id(), resource);
            channel.filter_del(resource, cookie.filter_id())?;
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_channel::{Call, RecordingChannel};
    use filter_spec::{EthernetAddress, IpProtocol, Ipv4Address, Ipv6Address};
    use nic_resource_op::{FilterFields, FilterId, ResourceOpError};

    const RES: ResourceId = ResourceId(1);
    const HOST: Ipv4Address = Ipv4Address([192, 168, 0, 2]);
    const MAC: EthernetAddress = EthernetAddress([0x02, 0, 0, 0, 0, 0x42]);

    fn spec() -> FilterSpec {
        FilterSpec::new(FilterSpecFlags::empty())
    }

    fn normal(spec: &FilterSpec) -> FilterAddRequest {
        match translate(spec, FilterAddFlags::empty(), None) {
            Ok(FilterRequest::Normal(request)) => request,
            other => panic!("expected a normal request, got {:?}", other),
        }
    }

    fn special(spec: &FilterSpec) -> SpecialFilterRequest {
        match translate(spec, FilterAddFlags::empty(), None) {
            Ok(FilterRequest::Special(request)) => request,
            other => panic!("expected a special request, got {:?}", other),
        }
    }

    #[test]
    fn ip4_local_has_no_remote() {
        let mut fs = spec();
        fs.set_ip4_local(IpProtocol::Udp, HOST, 5000).unwrap();
        let m = normal(&fs).spec;
        assert_eq!(m.local_host, Some(IpAddress::Ipv4(HOST)));
        assert_eq!(m.local_port, Some(5000));
        assert_eq!(m.ip_protocol, Some(IpProtocol::Udp));
        assert_eq!(m.ether_type, Some(EthernetProtocol::Ipv4));
        assert_eq!(m.remote_host, None);
        assert_eq!(m.remote_port, None);
        assert_eq!(m.dest_queue, None);
    }

    #[test]
    fn ip4_full_has_remote() {
        let remote = Ipv4Address([172, 16, 0, 9]);
        let mut fs = spec();
        fs.set_ip4_full(IpProtocol::Tcp, HOST, 80, remote, 33000).unwrap();
        let m = normal(&fs).spec;
        assert_eq!(m.ip_protocol, Some(IpProtocol::Tcp));
        assert_eq!(m.local_host, Some(IpAddress::Ipv4(HOST)));
        assert_eq!(m.local_port, Some(80));
        assert_eq!(m.remote_host, Some(IpAddress::Ipv4(remote)));
        assert_eq!(m.remote_port, Some(33000));
    }

    #[test]
    fn ip6_local_has_no_remote() {
        let host = Ipv6Address([0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x10]);
        let mut fs = spec();
        fs.set_ip6_local(IpProtocol::Tcp, host, 8080).unwrap();
        let m = normal(&fs).spec;
        assert_eq!(m.ether_type, Some(EthernetProtocol::Ipv6));
        assert_eq!(m.ip_protocol, Some(IpProtocol::Tcp));
        assert_eq!(m.local_host, Some(IpAddress::Ipv6(host)));
        assert_eq!(m.local_port, Some(8080));
        assert_eq!(m.remote_host, None);
        assert_eq!(m.remote_port, None);
    }

    #[test]
    fn ip6_with_vlan() {
        let host = Ipv6Address([0xfd, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
        let mut fs = spec();
        fs.set_vlan(100).unwrap();
        fs.set_ip6_full(IpProtocol::Udp, host, 53, Ipv6Address::LOOPBACK, 1053).unwrap();
        let m = normal(&fs).spec;
        assert_eq!(m.ether_type, Some(EthernetProtocol::Ipv6));
        assert_eq!(m.local_host, Some(IpAddress::Ipv6(host)));
        assert_eq!(m.remote_host, Some(IpAddress::Ipv6(Ipv6Address::LOOPBACK)));
        assert_eq!(m.remote_port, Some(1053));
        assert_eq!(m.vlan_id, Some(100));
    }

    #[test]
    fn mac_vlan_wildcard() {
        let mut any = spec();
        any.set_eth_local(VlanMatch::Any, MAC).unwrap();
        let m = normal(&any).spec;
        assert_eq!(m.mac_address, Some(MAC));
        assert_eq!(m.vlan_id, None);
        assert_eq!(m.fields(), FilterFields::LOC_MAC);

        let mut tagged = spec();
        tagged.set_eth_local(VlanMatch::Id(12), MAC).unwrap();
        assert_eq!(normal(&tagged).spec.vlan_id, Some(12));
    }

    #[test]
    fn mac_with_ip_proto() {
        let mut fs = spec();
        fs.set_ip_proto(IpProtocol::Icmp).unwrap();
        fs.set_eth_local(VlanMatch::Any, MAC).unwrap();
        let m = normal(&fs).spec;
        assert_eq!(m.mac_address, Some(MAC));
        assert_eq!(m.ether_type, Some(EthernetProtocol::Ipv4));
        assert_eq!(m.ip_protocol, Some(IpProtocol::Icmp));
        assert_eq!(m.local_host, None);
    }

    #[test]
    fn ether_type_with_vlan() {
        let mut fs = spec();
        fs.set_eth_type(EthernetProtocol::Arp).unwrap();
        fs.set_vlan(3).unwrap();
        let m = normal(&fs).spec;
        assert_eq!(m.ether_type, Some(EthernetProtocol::Arp));
        assert_eq!(m.ip_protocol, None);
        assert_eq!(m.vlan_id, Some(3));
    }

    #[test]
    fn dest_beats_preferred_queue() {
        let mut fs = spec();
        fs.set_ip_proto(IpProtocol::Udp).unwrap();
        match translate(&fs, FilterAddFlags::PREF_RXQ, Some(6)) {
            Ok(FilterRequest::Normal(r)) => assert_eq!(r.spec.dest_queue, Some(6)),
            other => panic!("unexpected {:?}", other),
        }
        match translate(&fs, FilterAddFlags::empty(), Some(6)) {
            Ok(FilterRequest::Normal(r)) => assert_eq!(r.spec.dest_queue, None),
            other => panic!("unexpected {:?}", other),
        }
        fs.set_dest(11).unwrap();
        match translate(&fs, FilterAddFlags::PREF_RXQ, Some(6)) {
            Ok(FilterRequest::Normal(r)) => assert_eq!(r.spec.dest_queue, Some(11)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn mcast_loop_only_on_normal_filters() {
        let mut fs = FilterSpec::new(FilterSpecFlags::MCAST_LOOP_RECEIVE);
        fs.set_ip4_local(IpProtocol::Udp, Ipv4Address([239, 1, 1, 1]), 9000).unwrap();
        assert!(normal(&fs).flags.contains(FilterAddFlags::MCAST_LOOP));

        let mut all = FilterSpec::new(FilterSpecFlags::MCAST_LOOP_RECEIVE);
        all.set_multicast_all().unwrap();
        assert_eq!(special(&all).flags, FilterAddFlags::empty());
    }

    #[test]
    fn special_opcodes() {
        let cases: [(fn(&mut FilterSpec), SpecialFilterOp); 8] = [
            (|fs| fs.set_tx_port_sniff().unwrap(), SpecialFilterOp::TxPortSniff),
            (|fs| fs.set_block_kernel().unwrap(), SpecialFilterOp::AddBlockKernel),
            (|fs| fs.set_block_kernel_unicast().unwrap(), SpecialFilterOp::AddBlockKernelUnicast),
            (|fs| fs.set_block_kernel_multicast().unwrap(), SpecialFilterOp::AddBlockKernelMulticast),
            (|fs| fs.set_unicast_all().unwrap(), SpecialFilterOp::AddAllUnicast),
            (|fs| fs.set_multicast_all().unwrap(), SpecialFilterOp::AddAllMulticast),
            (|fs| fs.set_unicast_mismatch().unwrap(), SpecialFilterOp::AddMismatchUnicast),
            (|fs| fs.set_multicast_mismatch().unwrap(), SpecialFilterOp::AddMismatchMulticast),
        ];
        for (build, op) in cases {
            let mut fs = spec();
            build(&mut fs);
            let request = special(&fs);
            assert_eq!(request.op, op);
            assert!(request.enable);
            assert!(!request.promiscuous);
            assert_eq!(request.vlan_id, None);
        }
    }

    #[test]
    fn sniff_carries_promiscuous() {
        let mut fs = spec();
        fs.set_port_sniff(true).unwrap();
        let request = special(&fs);
        assert_eq!(request.op, SpecialFilterOp::PortSniff);
        assert!(request.promiscuous);
    }

    #[test]
    fn mismatch_vlan_carries_vlan() {
        let mut fs = spec();
        fs.set_vlan(42).unwrap();
        fs.set_multicast_mismatch().unwrap();
        let request = special(&fs);
        assert_eq!(request.op, SpecialFilterOp::AddMismatchMulticastVlan);
        assert_eq!(request.vlan_id, Some(42));
    }

    #[test]
    fn special_with_dest_is_rejected() {
        let mut mismatch = spec();
        mismatch.set_dest(5).unwrap();
        mismatch.set_unicast_mismatch().unwrap();
        let mut mismatch_vlan = spec();
        mismatch_vlan.set_vlan(8).unwrap();
        mismatch_vlan.set_multicast_mismatch().unwrap();
        mismatch_vlan.set_dest(5).unwrap();
        let mut multicast = spec();
        multicast.set_multicast_all().unwrap();
        multicast.set_dest(5).unwrap();
        let mut unicast = spec();
        unicast.set_unicast_all().unwrap();
        unicast.set_dest(5).unwrap();

        for fs in [mismatch, mismatch_vlan, multicast, unicast] {
            let mut channel = RecordingChannel::new();
            assert_eq!(
                filter_add(&mut channel, RES, &fs, FilterAddFlags::empty(), None),
                Err(FilterError::UnsupportedCombination)
            );
            assert!(channel.calls.is_empty());
        }
    }

    #[test]
    fn unsupported_shapes_never_reach_backend() {
        let mut vlan_only = spec();
        vlan_only.set_vlan(1).unwrap();
        let mut unicast_vlan = spec();
        unicast_vlan.set_vlan(1).unwrap();
        unicast_vlan.set_unicast_all().unwrap();
        let mut dest_only = spec();
        dest_only.set_dest(2).unwrap();

        for fs in [spec(), vlan_only, unicast_vlan, dest_only] {
            let mut channel = RecordingChannel::new();
            assert_eq!(
                filter_add(&mut channel, RES, &fs, FilterAddFlags::empty(), None),
                Err(FilterError::UnsupportedCombination)
            );
            assert!(channel.calls.is_empty());
        }
    }

    #[test]
    fn add_returns_backend_id_and_queue() {
        let mut channel = RecordingChannel::new();
        let mut fs = spec();
        fs.set_ip4_local(IpProtocol::Udp, HOST, 5000).unwrap();
        let (cookie, rxq) = filter_add(&mut channel, RES, &fs, FilterAddFlags::empty(), None).unwrap();
        assert_eq!(cookie.filter_id(), Some(RecordingChannel::FILTER_ID));
        assert_eq!(cookie.kinds(), FilterKinds::IP4);
        assert_eq!(rxq, Some(RecordingChannel::RXQ));
        assert_eq!(channel.calls, [Call::Add(RES, normal(&fs))]);
    }

    #[test]
    fn backend_error_passes_through() {
        let mut channel = RecordingChannel::new();
        channel.add_result = Err(ResourceOpError::NoResources);
        let mut fs = spec();
        fs.set_eth_type(EthernetProtocol::Ipv6).unwrap();
        assert_eq!(
            filter_add(&mut channel, RES, &fs, FilterAddFlags::empty(), None),
            Err(FilterError::Backend(ResourceOpError::NoResources))
        );
        assert_eq!(channel.calls.len(), 1);
    }

    #[test]
    fn sniff_install_and_remove_by_toggle() {
        let mut channel = RecordingChannel::new();
        let mut fs = spec();
        fs.set_port_sniff(true).unwrap();
        let (cookie, _) = filter_add(&mut channel, RES, &fs, FilterAddFlags::empty(), None).unwrap();
        assert_eq!(cookie.filter_id(), None);
        filter_del(&mut channel, RES, &cookie).unwrap();

        assert_eq!(channel.calls.len(), 2);
        match (&channel.calls[0], &channel.calls[1]) {
            (Call::Special(_, on), Call::Special(_, off)) => {
                assert_eq!(on.op, SpecialFilterOp::PortSniff);
                assert!(on.enable && on.promiscuous);
                assert_eq!(off.op, SpecialFilterOp::PortSniff);
                assert!(!off.enable);
            }
            other => panic!("unexpected calls {:?}", other),
        }
    }

    #[test]
    fn delete_protocols() {
        let mut channel = RecordingChannel::new();

        filter_del(&mut channel, RES, &FilterCookie::new(None, FilterKinds::TX_PORT_SNIFF)).unwrap();
        filter_del(&mut channel, RES, &FilterCookie::new(None, FilterKinds::BLOCK_KERNEL)).unwrap();
        filter_del(&mut channel, RES, &FilterCookie::new(Some(FilterId(77)), FilterKinds::MAC)).unwrap();

        assert_eq!(channel.calls, [
            Call::Special(RES, SpecialFilterRequest {
                op: SpecialFilterOp::TxPortSniff,
                enable: false,
                promiscuous: false,
                vlan_id: None,
                flags: FilterAddFlags::empty(),
            }),
            Call::Del(RES, None),
            Call::Del(RES, Some(FilterId(77))),
        ]);
    }
}
