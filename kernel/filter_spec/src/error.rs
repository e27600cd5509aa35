/// Reasons a filter spec setter can be rejected.
///
/// A rejected setter never modifies the spec.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FilterSpecError {
    /// The new kind cannot be combined with the kinds already in the spec.
    IncompatibleCombination,
    /// A destination queue was out of range, or was queue 0 on an exclusive-queue spec.
    InvalidArgument,
}

impl core::fmt::Display for FilterSpecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            FilterSpecError::IncompatibleCombination => "incompatible filter kind combination",
            FilterSpecError::InvalidArgument => "invalid filter argument",
        })
    }
}

impl From<FilterSpecError> for &'static str {
    fn from(error: FilterSpecError) -> Self {
        match error {
            FilterSpecError::IncompatibleCombination => "filter kind cannot be combined with the existing filter spec",
            FilterSpecError::InvalidArgument => "filter destination queue is out of range or not allowed",
        }
    }
}
