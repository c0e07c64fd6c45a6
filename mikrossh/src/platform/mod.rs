//! MikroTik platform definitions.
//!
//! RouterOS and SwitchOS share one console: no pager, no enable mode, no
//! config mode, and heavy line repainting. They differ only in name.

mod login;

pub use login::LoginOptions;

use std::fmt;
use std::str::FromStr;

use crate::error::PlatformError;

/// Prompt terminator for both primary and alternate prompts.
///
/// There is no privileged mode, so there is only one terminator class.
pub const PROMPT_TERMINATOR: char = '>';

/// Characters that may end the first output after login.
pub const INITIAL_READ_TERMINATORS: &[u8] = b"]>";

/// Line terminator used when sending commands.
pub const DEFAULT_ENTER: &str = "\r\n";

/// Substrings in command output that mark the command as failed.
const FAILED_WHEN_CONTAINS: &[&str] = &[
    "bad command name",
    "syntax error",
    "expected end of command",
    "no such item",
    "invalid value",
    "failure:",
];

/// Supported MikroTik operating systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    /// MikroTik RouterOS.
    #[default]
    RouterOs,

    /// MikroTik SwitchOS.
    SwitchOs,
}

impl Platform {
    /// Registry name of this platform.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::RouterOs => "mikrotik_routeros",
            Platform::SwitchOs => "mikrotik_switchos",
        }
    }

    /// All known platforms.
    pub fn all() -> &'static [Platform] {
        &[Platform::RouterOs, Platform::SwitchOs]
    }

    /// Substrings that mark command output as a failure.
    pub fn failed_when_contains(&self) -> &'static [&'static str] {
        FAILED_WHEN_CONTAINS
    }

    /// First failure pattern found in `output`, if any.
    pub fn detect_failure(&self, output: &str) -> Option<&'static str> {
        self.failed_when_contains()
            .iter()
            .copied()
            .find(|pattern| output.contains(pattern))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::all()
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| PlatformError::UnknownPlatform {
                name: s.to_string(),
            })
    }
}
