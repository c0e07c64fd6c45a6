//! RouterOS login options.
//!
//! RouterOS reads console options from a `+` suffix on the SSH username:
//!
//! - `c`: disable console colors
//! - `e`: dumb terminal mode
//! - `t`: disable terminal capability auto-detection
//! - `w<N>`: terminal width
//! - `h<N>`: terminal height

use serde::Deserialize;

/// Console options appended to the login name before authentication.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoginOptions {
    pub disable_colors: bool,
    pub dumb_terminal: bool,
    pub disable_autodetect: bool,
    /// Wide enough that RouterOS never wraps output lines.
    pub width: u32,
    /// Tall enough that RouterOS never pauses long output.
    pub height: u32,
}

impl Default for LoginOptions {
    fn default() -> Self {
        Self {
            disable_colors: true,
            dumb_terminal: true,
            disable_autodetect: true,
            width: 511,
            height: 4098,
        }
    }
}

impl LoginOptions {
    /// The `+...` suffix, `+cetw511h4098` for the defaults.
    pub fn suffix(&self) -> String {
        let mut suffix = String::from("+");
        if self.disable_colors {
            suffix.push('c');
        }
        if self.dumb_terminal {
            suffix.push('e');
        }
        if self.disable_autodetect {
            suffix.push('t');
        }
        suffix.push_str(&format!("w{}h{}", self.width, self.height));
        suffix
    }

    /// Append the option suffix to `username`.
    pub fn shape_username(&self, username: &str) -> String {
        format!("{}{}", username, self.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_suffix_is_byte_exact() {
        assert_eq!(LoginOptions::default().suffix(), "+cetw511h4098");
        assert_eq!(
            LoginOptions::default().shape_username("admin"),
            "admin+cetw511h4098"
        );
    }

    #[test]
    fn test_custom_options() {
        let options = LoginOptions {
            disable_colors: false,
            width: 200,
            height: 100,
            ..Default::default()
        };
        assert_eq!(options.shape_username("ops"), "ops+etw200h100");
    }

    #[test]
    fn test_deserialize_partial() {
        let options: LoginOptions = serde_json::from_str(r#"{"width": 1024}"#).unwrap();
        assert_eq!(options.suffix(), "+cetw1024h4098");
    }
}
