//! Installs, queries, and removes NIC receive filters.
//!
//! A caller builds a [`FilterSpec`] and hands it to [`vi_filter_add()`] (or
//! [`vi_set_filter_add()`] for a set of VIs), which translates it into a single
//! request on the backend's [`ResourceOpChannel`] and returns a [`FilterCookie`].
//! The cookie is all that is needed to later query or remove the filter.
//!
//! Nothing here holds state between calls. Callers that share a VI across threads
//! must serialize access to the channel themselves.
//!
//! [`FilterSpec`]: filter_spec::FilterSpec
//! [`ResourceOpChannel`]: nic_resource_op::ResourceOpChannel

#![cfg_attr(not(test), no_std)]

mod cookie;
mod dispatch;
mod error;
mod lifecycle;
mod query;
#[cfg(test)]
mod test_channel;

pub use cookie::{FilterCookie, FilterInfo, FilterInfoFields};
pub use dispatch::{filter_add, filter_del, translate, FilterRequest};
pub use error::{FilterError, Result};
pub use lifecycle::{
    vi_filter_add, vi_filter_del, vi_set_filter_add, vi_set_filter_del, PostFilterAdd, RxqPolicy,
    ViFilterContext, ViSetFilterContext,
};
pub use query::{filter_query, vi_filter_query};
