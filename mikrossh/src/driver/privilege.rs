//! Privilege-mode strategies.

/// How a device escalates to a privileged (enable) mode.
pub trait PrivilegeMode: Send + Sync {
    /// Whether the session is currently privileged.
    fn check_enable_mode(&self) -> bool;

    /// Command output from escalating, if any is sent.
    fn enable(&self) -> String;

    /// Command output from de-escalating, if any is sent.
    fn exit_enable_mode(&self) -> String;
}

/// Devices without an enable mode: every session is already fully privileged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnable;

impl PrivilegeMode for NoEnable {
    fn check_enable_mode(&self) -> bool {
        true
    }

    fn enable(&self) -> String {
        String::new()
    }

    fn exit_enable_mode(&self) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_enable_is_always_privileged() {
        let mode = NoEnable;
        assert!(mode.check_enable_mode());
        assert_eq!(mode.enable(), "");
        assert_eq!(mode.exit_enable_mode(), "");
        assert!(mode.check_enable_mode());
    }
}
