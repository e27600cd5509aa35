//! The set of filter kinds a [`FilterSpec`](crate::FilterSpec) is built from,
//! and the table of kind combinations that may legally coexist.

use bitflags::bitflags;

bitflags! {
    /// One bit per filter kind. VLAN and HAS_DEST are modifiers on top of another kind.
    ///
    /// The bit values match the ones the hardware ABI uses.
    pub struct FilterKinds: u32 {
        const MAC                       = 0x1;
        const IP4                       = 0x2;
        const ALL_UNICAST               = 0x4;
        const ALL_MULTICAST             = 0x8;
        const VLAN                      = 0x10;
        const MISMATCH_UNICAST          = 0x20;
        const MISMATCH_MULTICAST        = 0x40;
        const PORT_SNIFF                = 0x80;
        const BLOCK_KERNEL              = 0x100;
        const BLOCK_KERNEL_UNICAST      = 0x200;
        const BLOCK_KERNEL_MULTICAST    = 0x400;
        const TX_PORT_SNIFF             = 0x800;
        const IP_PROTO                  = 0x1000;
        const ETHER_TYPE                = 0x2000;
        const IP6                       = 0x4000;
        const HAS_DEST                  = 0x8000;

        /// Kinds that divert traffic away from the kernel stack.
        const BLOCK_KERNEL_ANY = Self::BLOCK_KERNEL.bits
            | Self::BLOCK_KERNEL_UNICAST.bits
            | Self::BLOCK_KERNEL_MULTICAST.bits;
        /// Kinds that must be the only kind in a spec and never carry a destination queue.
        const EXCLUSIVE = Self::PORT_SNIFF.bits
            | Self::TX_PORT_SNIFF.bits
            | Self::BLOCK_KERNEL_ANY.bits;
    }
}

/// Every kind combination (ignoring `HAS_DEST`) that the builder can produce.
///
/// Any of these except the [`FilterKinds::EXCLUSIVE`] ones may additionally carry `HAS_DEST`.
const LEGAL_SHAPES: [FilterKinds; 26] = [
    FilterKinds::empty(),
    FilterKinds::MAC,
    FilterKinds::IP4,
    FilterKinds::ALL_UNICAST,
    FilterKinds::ALL_MULTICAST,
    FilterKinds::VLAN,
    FilterKinds::from_bits_truncate(FilterKinds::IP4.bits() | FilterKinds::VLAN.bits()),
    FilterKinds::from_bits_truncate(FilterKinds::ALL_UNICAST.bits() | FilterKinds::VLAN.bits()),
    FilterKinds::from_bits_truncate(FilterKinds::ALL_MULTICAST.bits() | FilterKinds::VLAN.bits()),
    FilterKinds::MISMATCH_UNICAST,
    FilterKinds::from_bits_truncate(FilterKinds::MISMATCH_UNICAST.bits() | FilterKinds::VLAN.bits()),
    FilterKinds::MISMATCH_MULTICAST,
    FilterKinds::from_bits_truncate(FilterKinds::MISMATCH_MULTICAST.bits() | FilterKinds::VLAN.bits()),
    FilterKinds::PORT_SNIFF,
    FilterKinds::BLOCK_KERNEL,
    FilterKinds::BLOCK_KERNEL_UNICAST,
    FilterKinds::BLOCK_KERNEL_MULTICAST,
    FilterKinds::TX_PORT_SNIFF,
    FilterKinds::IP_PROTO,
    FilterKinds::from_bits_truncate(FilterKinds::MAC.bits() | FilterKinds::IP_PROTO.bits()),
    FilterKinds::from_bits_truncate(FilterKinds::VLAN.bits() | FilterKinds::IP_PROTO.bits()),
    FilterKinds::ETHER_TYPE,
    FilterKinds::from_bits_truncate(FilterKinds::MAC.bits() | FilterKinds::ETHER_TYPE.bits()),
    FilterKinds::from_bits_truncate(FilterKinds::VLAN.bits() | FilterKinds::ETHER_TYPE.bits()),
    FilterKinds::IP6,
    FilterKinds::from_bits_truncate(FilterKinds::IP6.bits() | FilterKinds::VLAN.bits()),
];

impl FilterKinds {
    /// Returns these kinds with the `HAS_DEST` modifier removed.
    pub fn without_dest(self) -> FilterKinds {
        self - FilterKinds::HAS_DEST
    }

    /// Returns `true` if this combination is one the builder can produce.
    pub fn is_legal(self) -> bool {
        let shape = self.without_dest();
        if !LEGAL_SHAPES.contains(&shape) {
            return false;
        }
        !(self.contains(FilterKinds::HAS_DEST) && shape.intersects(FilterKinds::EXCLUSIVE))
    }

    /// Returns `true` if these kinds are installed through the enable/disable style
    /// operation that never yields a filter identifier.
    pub fn is_sniff(self) -> bool {
        self == FilterKinds::PORT_SNIFF || self == FilterKinds::TX_PORT_SNIFF
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusive_kinds_never_carry_dest() {
        for kind in [
            FilterKinds::PORT_SNIFF,
            FilterKinds::TX_PORT_SNIFF,
            FilterKinds::BLOCK_KERNEL,
            FilterKinds::BLOCK_KERNEL_UNICAST,
            FilterKinds::BLOCK_KERNEL_MULTICAST,
        ] {
            assert!(kind.is_legal());
            assert!(!(kind | FilterKinds::HAS_DEST).is_legal());
        }
    }

    #[test]
    fn arbitrary_unions_are_illegal() {
        assert!(!(FilterKinds::IP4 | FilterKinds::IP6).is_legal());
        assert!(!(FilterKinds::MAC | FilterKinds::VLAN).is_legal());
        assert!(!(FilterKinds::IP4 | FilterKinds::IP_PROTO).is_legal());
        assert!(!(FilterKinds::PORT_SNIFF | FilterKinds::VLAN).is_legal());
        assert!((FilterKinds::IP6 | FilterKinds::VLAN | FilterKinds::HAS_DEST).is_legal());
        assert!(FilterKinds::HAS_DEST.is_legal());
    }

    #[test]
    fn legal_count() {
        let legal = (0..=0xFFFFu32)
            .map(FilterKinds::from_bits_truncate)
            .filter(|k| k.is_legal())
            .count();
        assert_eq!(legal, 47);
    }
}
