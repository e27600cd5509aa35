//! Handles to installed filters and the information a query returns about them.

use bitflags::bitflags;
use filter_spec::FilterKinds;
use nic_resource_op::FilterId;

/// An opaque handle to an installed filter, needed to query or remove it.
///
/// The cookie remembers the kinds the filter was installed with, because
/// the removal protocol depends on them and the backend does not keep track.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FilterCookie {
    filter_id: Option<FilterId>,
    kinds: FilterKinds,
}

impl FilterCookie {
    pub(crate) fn new(filter_id: Option<FilterId>, kinds: FilterKinds) -> FilterCookie {
        FilterCookie { filter_id, kinds }
    }

    /// The backend's id for this filter. Special filters never get one.
    pub fn filter_id(&self) -> Option<FilterId> {
        self.filter_id
    }

    /// The kinds of the spec this filter was installed from.
    pub fn kinds(&self) -> FilterKinds {
        self.kinds
    }

    /// Returns `true` if this filter only blocks traffic from the kernel
    /// and does not deliver anything to a queue.
    pub fn is_block_only(&self) -> bool {
        (self.kinds - FilterKinds::BLOCK_KERNEL_ANY).is_empty()
    }
}

bitflags! {
    /// Which fields of a [`FilterInfo`] hold a value.
    pub struct FilterInfoFields: u32 {
        const ID        = 0x1;
        const QUEUE     = 0x2;
    }
}

impl Default for FilterInfoFields {
    fn default() -> Self {
        FilterInfoFields::empty()
    }
}

/// The hardware state of an installed filter.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FilterInfo {
    pub valid_fields: FilterInfoFields,
    /// The hardware id. Only valid if `valid_fields` contains `ID`.
    pub filter_id: u32,
    /// The receive queue. Only valid if `valid_fields` contains `QUEUE`.
    pub q_id: u16,
    pub flags: u32,
}

impl FilterInfo {
    pub fn id(&self) -> Option<u32> {
        self.valid_fields.contains(FilterInfoFields::ID).then(|| self.filter_id)
    }

    pub fn queue(&self) -> Option<u16> {
        self.valid_fields.contains(FilterInfoFields::QUEUE).then(|| self.q_id)
    }
}
