/// Errors a backend reports for a resource operation.
///
/// The filter engine passes these through to its callers untouched.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResourceOpError {
    /// The hardware or firmware cannot perform this operation.
    NotSupported,
    /// The backend rejected the request's contents.
    InvalidArgument,
    /// No filter table entries or queues are left.
    NoResources,
    /// The resource is in use and the operation can be retried later.
    Busy,
    /// The resource or filter id does not exist.
    NotFound,
    PermissionDenied,
    /// Any other failure, carrying the backend's raw (negative) error code.
    Failed(i32),
}

// errno values used by char-device backends
const EPERM: i32 = 1;
const ENOENT: i32 = 2;
const ENOMEM: i32 = 12;
const EACCES: i32 = 13;
const EBUSY: i32 = 16;
const EINVAL: i32 = 22;
const ENOSPC: i32 = 28;
const EOPNOTSUPP: i32 = 95;

impl ResourceOpError {
    /// Converts a negative errno-style return code into an error.
    pub fn from_errno(rc: i32) -> ResourceOpError {
        match rc.wrapping_neg() {
            EOPNOTSUPP => ResourceOpError::NotSupported,
            EINVAL => ResourceOpError::InvalidArgument,
            ENOSPC | ENOMEM => ResourceOpError::NoResources,
            EBUSY => ResourceOpError::Busy,
            ENOENT => ResourceOpError::NotFound,
            EPERM | EACCES => ResourceOpError::PermissionDenied,
            _ => ResourceOpError::Failed(rc),
        }
    }

    /// The negative errno-style code for this error.
    pub fn errno(&self) -> i32 {
        match *self {
            ResourceOpError::NotSupported => -EOPNOTSUPP,
            ResourceOpError::InvalidArgument => -EINVAL,
            ResourceOpError::NoResources => -ENOSPC,
            ResourceOpError::Busy => -EBUSY,
            ResourceOpError::NotFound => -ENOENT,
            ResourceOpError::PermissionDenied => -EPERM,
            ResourceOpError::Failed(rc) => rc,
        }
    }
}

impl core::fmt::Display for ResourceOpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ResourceOpError::NotSupported => f.write_str("operation not supported by the NIC"),
            ResourceOpError::InvalidArgument => f.write_str("invalid resource operation argument"),
            ResourceOpError::NoResources => f.write_str("no NIC resources left"),
            ResourceOpError::Busy => f.write_str("NIC resource busy"),
            ResourceOpError::NotFound => f.write_str("NIC resource not found"),
            ResourceOpError::PermissionDenied => f.write_str("permission denied"),
            ResourceOpError::Failed(rc) => write!(f, "resource operation failed ({})", rc),
        }
    }
}

impl From<ResourceOpError> for &'static str {
    fn from(error: ResourceOpError) -> Self {
        match error {
            ResourceOpError::NotSupported => "operation not supported by the NIC",
            ResourceOpError::InvalidArgument => "invalid resource operation argument",
            ResourceOpError::NoResources => "no NIC resources left",
            ResourceOpError::Busy => "NIC resource busy",
            ResourceOpError::NotFound => "NIC resource not found",
            ResourceOpError::PermissionDenied => "permission denied",
            ResourceOpError::Failed(_) => "resource operation failed",
        }
    }
}
