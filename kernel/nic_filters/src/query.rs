//! Best-effort introspection of installed filters.

use crate::{FilterCookie, FilterError, FilterInfo, FilterInfoFields, Result, ViFilterContext};
use log::debug;
use nic_resource_op::{ResourceId, ResourceOpChannel, ResourceOpError};

/// Asks the backend for the hardware state of the filter behind `cookie`.
///
/// An empty [`FilterInfo`] is not an error: sniff filters have nothing to report,
/// and neither do backends that answer with [`ResourceOpError::NotSupported`].
pub fn filter_query<C: ResourceOpChannel + ?Sized>(
    channel: &mut C,
    resource: ResourceId,
    cookie: &FilterCookie,
) -> Result<FilterInfo> {
    let mut info = FilterInfo::default();
    if cookie.kinds().is_sniff() {
        return Ok(info);
    }

    let out = match channel.filter_query(resource, cookie.filter_id()) {
        Ok(out) => out,
        Err(ResourceOpError::NotSupported) => {
            debug!("nic_filters::filter_query(): backend reports nothing for {:?}", cookie);
            return Ok(info);
        }
        Err(e) => return Err(FilterError::Backend(e)),
    };
    if let Some(hw_id) = out.hw_id {
        info.valid_fields |= FilterInfoFields::ID;
        info.filter_id = hw_id;
    }
    if let Some(rxq) = out.rxq {
        info.valid_fields |= FilterInfoFields::QUEUE;
        info.q_id = rxq;
    }
    info.flags = out.flags;
    Ok(info)
}

/// Queries a filter installed on `vi`.
///
/// Unlike installs, queries are forwarded even on a clustered VI.
pub fn vi_filter_query<C: ResourceOpChannel + ?Sized>(
    vi: &ViFilterContext,
    channel: &mut C,
    cookie: &FilterCookie,
) -> Result<FilterInfo> {
    filter_query(channel, vi.resource_id, cookie)
}
