/// Platform permission to show system notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// The user has not been asked yet.
    Undetermined,
}

/// Read-only view of the platform notification permission.
///
/// The bridge never requests permission. Asking is left to the settings screen.
pub trait PermissionCapability: Send + Sync {
    fn state(&self) -> PermissionState;
}

impl PermissionCapability for PermissionState {
    fn state(&self) -> PermissionState {
        *self
    }
}
