//! The boundary between the filter engine and a NIC backend.
//!
//! The engine never touches hardware itself. Every install, delete, and query
//! becomes exactly one call on a [`ResourceOpChannel`], which a driver implements
//! on top of its firmware command transport. Each call blocks until the backend answers.

#![cfg_attr(not(test), no_std)]

mod error;
mod request;

pub use error::ResourceOpError;
pub use request::*;

/// The four resource operations a NIC backend offers for filters.
pub trait ResourceOpChannel {
    /// Enables or disables a special filter on `resource`.
    ///
    /// Returns the receive queue the backend assigned, if it reports one.
    fn special_filter_op(
        &mut self,
        resource: ResourceId,
        request: &SpecialFilterRequest,
    ) -> Result<Option<u16>, ResourceOpError>;

    /// Installs a normal filter on `resource`.
    fn filter_add(
        &mut self,
        resource: ResourceId,
        request: &FilterAddRequest,
    ) -> Result<FilterAddOutput, ResourceOpError>;

    /// Removes the filter with the given id from `resource`.
    ///
    /// `filter_id` is `None` for filters that were never given an id.
    fn filter_del(
        &mut self,
        resource: ResourceId,
        filter_id: Option<FilterId>,
    ) -> Result<(), ResourceOpError>;

    /// Reports the current hardware state of an installed filter.
    ///
    /// Backends that cannot report anything return [`ResourceOpError::NotSupported`].
    fn filter_query(
        &mut self,
        resource: ResourceId,
        filter_id: Option<FilterId>,
    ) -> Result<FilterQueryOutput, ResourceOpError>;
}
