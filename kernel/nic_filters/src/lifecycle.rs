//! Filter installation and removal on behalf of a virtual interface (VI) or a VI set.
//!
//! A VI decides which receive queue policy applies to its filters,
//! may run a hook after every successful install, and may be clustered,
//! in which case it takes no filters of its own.

use crate::{dispatch, FilterCookie, FilterError, Result};
use filter_spec::{FilterKinds, FilterSpec, FilterSpecFlags};
use log::{debug, error, warn};
use nic_resource_op::{FilterAddFlags, ResourceId, ResourceOpChannel};

/// How a VI's filters pick their receive queue.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RxqPolicy {
    /// The VI owns its receive queue. Filters go wherever their spec says.
    Dedicated,
    /// The VI shares receive queues with other consumers.
    ///
    /// Once a queue is attached, later filters prefer it.
    /// Until then, filters without a destination let the backend choose.
    Shared { attached: Option<u16> },
}

/// Runs after a filter has been installed on a VI.
///
/// If the hook fails, the new filter is removed again and the install fails.
pub trait PostFilterAdd {
    fn post_filter_add(
        &mut self,
        spec: &FilterSpec,
        cookie: &FilterCookie,
        rxq: Option<u16>,
    ) -> core::result::Result<(), &'static str>;
}

impl<F> PostFilterAdd for F
where
    F: FnMut(&FilterSpec, &FilterCookie, Option<u16>) -> core::result::Result<(), &'static str>,
{
    fn post_filter_add(
        &mut self,
        spec: &FilterSpec,
        cookie: &FilterCookie,
        rxq: Option<u16>,
    ) -> core::result::Result<(), &'static str> {
        self(spec, cookie, rxq)
    }
}

/// The parts of a VI that filter installation depends on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ViFilterContext {
    pub resource_id: ResourceId,
    pub clustered: bool,
    pub rxq_policy: RxqPolicy,
}

impl ViFilterContext {
    pub fn new(resource_id: ResourceId) -> ViFilterContext {
        ViFilterContext {
            resource_id,
            clustered: false,
            rxq_policy: RxqPolicy::Dedicated,
        }
    }

    /// Returns the install flags and preferred queue for `spec` on this VI.
    fn install_flags(&self, spec: &FilterSpec) -> (FilterAddFlags, Option<u16>) {
        let mut flags = FilterAddFlags::empty();
        let mut preferred = None;
        if let RxqPolicy::Shared { attached } = self.rxq_policy {
            match attached {
                Some(rxq) => {
                    flags |= FilterAddFlags::PREF_RXQ;
                    preferred = Some(rxq);
                }
                None if !spec.kinds().contains(FilterKinds::HAS_DEST) => {
                    flags |= FilterAddFlags::ANY_RXQ;
                }
                None => {}
            }
        }
        if spec.flags().contains(FilterSpecFlags::EXCLUSIVE_RXQ) {
            flags |= FilterAddFlags::EXCLUSIVE_RXQ;
        }
        (flags, preferred)
    }
}

/// Handles a filter request on a clustered VI, which has no filters of its own.
fn clustered(op: &str) -> Result<()> {
    if cfg!(feature = "reject_clustered") {
        warn!("nic_filters::{}(): rejected filter request on a clustered VI", op);
        Err(FilterError::ClusteredInterface)
    } else {
        warn!("nic_filters::{}(): ignored filter request on a clustered VI", op);
        Ok(())
    }
}

/// Installs `spec` on `vi`, then runs `post_add` if one is given.
///
/// The spec is consumed; it cannot be reused once installed.
/// On a clustered VI nothing is installed and `Ok(None)` is returned.
pub fn vi_filter_add<C: ResourceOpChannel + ?Sized>(
    vi: &ViFilterContext,
    channel: &mut C,
    spec: FilterSpec,
    post_add: Option<&mut dyn PostFilterAdd>,
) -> Result<Option<FilterCookie>> {
    if vi.clustered {
        return clustered("vi_filter_add").map(|_| None);
    }

    let (flags, preferred) = vi.install_flags(&spec);
    let (cookie, rxq) = dispatch::filter_add(channel, vi.resource_id, &spec, flags, preferred)?;
    debug!("nic_filters::vi_filter_add(): installed {:?}, rxq {:?}", cookie, rxq);

    if let Some(hook) = post_add {
        if let Err(e) = hook.post_filter_add(&spec, &cookie, rxq) {
            warn!("nic_filters::vi_filter_add(): post-add hook failed: {}, removing {:?}", e, cookie);
            if let Err(del_err) = dispatch::filter_del(channel, vi.resource_id, &cookie) {
                error!("nic_filters::vi_filter_add(): failed to remove {:?} after hook failure: {}", cookie, del_err);
            }
            return Err(FilterError::PostAdd(e));
        }
    }
    Ok(Some(cookie))
}

/// Removes the filter behind `cookie` from `vi`. Does nothing on a clustered VI.
pub fn vi_filter_del<C: ResourceOpChannel + ?Sized>(
    vi: &ViFilterContext,
    channel: &mut C,
    cookie: &FilterCookie,
) -> Result<()> {
    if vi.clustered {
        return clustered("vi_filter_del");
    }
    dispatch::filter_del(channel, vi.resource_id, cookie)
}

/// The parts of a VI set that filter installation depends on.
///
/// Filters on a set spread their traffic across the set's queues,
/// so no queue is ever preferred.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ViSetFilterContext {
    pub resource_id: ResourceId,
}

/// Installs `spec` on a VI set with receive-side scaling across its queues.
pub fn vi_set_filter_add<C: ResourceOpChannel + ?Sized>(
    vi_set: &ViSetFilterContext,
    channel: &mut C,
    spec: FilterSpec,
) -> Result<FilterCookie> {
    let (cookie, _rxq) = dispatch::filter_add(channel, vi_set.resource_id, &spec, FilterAddFlags::RSS, None)?;
    Ok(cookie)
}

pub fn vi_set_filter_del<C: ResourceOpChannel + ?Sized>(
    vi_set: &ViSetFilterContext,
    channel: &mut C,
    cookie: &FilterCookie,
) -> Result<()> {
    dispatch::filter_del(channel, vi_set.resource_id, cookie)
}
