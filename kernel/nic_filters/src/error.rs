use filter_spec::FilterSpecError;
use nic_resource_op::ResourceOpError;

pub type Result<T> = core::result::Result<T, FilterError>;

/// Reasons a filter operation can fail.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterError {
    /// The caller built an invalid spec.
    Spec(FilterSpecError),
    /// The spec's kinds have no install mapping. Specs built through the
    /// `FilterSpec` setters only reach this for the few shapes that can be
    /// built but not installed, such as `ALL_UNICAST | VLAN`.
    UnsupportedCombination,
    /// The backend failed; its error is passed through unchanged.
    Backend(ResourceOpError),
    /// The post-add hook failed. The filter it was given has already been removed.
    PostAdd(&'static str),
    /// The interface is clustered and does not take individual filters.
    ClusteredInterface,
}

impl From<FilterSpecError> for FilterError {
    fn from(e: FilterSpecError) -> Self {
        FilterError::Spec(e)
    }
}

impl From<ResourceOpError> for FilterError {
    fn from(e: ResourceOpError) -> Self {
        FilterError::Backend(e)
    }
}

impl core::fmt::Display for FilterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FilterError::Spec(e) => write!(f, "{}", e),
            FilterError::UnsupportedCombination => f.write_str("filter kind combination cannot be installed"),
            FilterError::Backend(e) => write!(f, "{}", e),
            FilterError::PostAdd(e) => write!(f, "post-add hook failed: {}", e),
            FilterError::ClusteredInterface => f.write_str("filters cannot be set on a clustered interface"),
        }
    }
}

impl From<FilterError> for &'static str {
    fn from(error: FilterError) -> Self {
        match error {
            FilterError::Spec(e) => e.into(),
            FilterError::UnsupportedCombination => "filter kind combination cannot be installed",
            FilterError::Backend(e) => e.into(),
            FilterError::PostAdd(e) => e,
            FilterError::ClusteredInterface => "filters cannot be set on a clustered interface",
        }
    }
}
