//! Prompt detection and trailing-prompt stripping.

use log::debug;

use super::generic::{GenericHandler, RESPONSE_RETURN};
use crate::error::{DriverError, Result};
use crate::platform::PROMPT_TERMINATOR;

/// Pull the prompt out of output that ends with one.
///
/// Takes the last non-empty line and trims it. The result must end with the
/// prompt terminator.
pub fn extract_prompt(generic: &GenericHandler, output: &str) -> Result<String> {
    let normalized = generic.normalize_linefeeds(&generic.strip_backspaces(output));
    let prompt = normalized
        .rsplit(RESPONSE_RETURN)
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();

    if !prompt.ends_with(PROMPT_TERMINATOR) {
        return Err(DriverError::PromptNotFound {
            output: output.to_string(),
        }
        .into());
    }

    Ok(prompt.to_string())
}

/// Strip trailing prompt lines left by a repainting console.
///
/// Repaints can leave the prompt on the last line twice. When the last line
/// contains `base_prompt` it is removed, the rest goes through the generic
/// prompt strip, and the result is trimmed. Any other shape is returned
/// untouched.
pub fn strip_prompt(generic: &GenericHandler, text: &str, base_prompt: &str) -> String {
    let (body, last_line) = text.rsplit_once(RESPONSE_RETURN).unwrap_or(("", text));

    if base_prompt.is_empty() || !last_line.contains(base_prompt) {
        debug!("prompt {:?} not on last line; output left as is", base_prompt);
        return text.to_string();
    }

    generic.strip_prompt(body.trim_end(), base_prompt).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT: &str = "[admin@hostname] >";

    fn strip(text: &str) -> String {
        strip_prompt(&GenericHandler, text, PROMPT)
    }

    #[test]
    fn test_extract_prompt_trims() {
        let generic = GenericHandler;
        assert_eq!(
            extract_prompt(&generic, "\r\n\r\n[admin@hostname] > ").unwrap(),
            PROMPT
        );
        assert_eq!(
            extract_prompt(&generic, "  MikroTik RouterOS 7.14\r\n\r\n[admin@r1] >   \r\n\r\n").unwrap(),
            "[admin@r1] >"
        );
    }

    #[test]
    fn test_extract_prompt_is_idempotent() {
        let generic = GenericHandler;
        let once = extract_prompt(&generic, "[admin@hostname] >  \t").unwrap();
        let twice = extract_prompt(&generic, &once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_extract_prompt_rejects_non_prompt() {
        let err = extract_prompt(&GenericHandler, "Password: ").unwrap_err();
        assert!(err.to_string().contains("Router prompt not found"));
        assert!(extract_prompt(&GenericHandler, "\r\n").is_err());
    }

    #[test]
    fn test_strip_single_trailing_prompt() {
        assert_eq!(strip("  name: r1\n[admin@hostname] > "), "name: r1");
        assert_eq!(
            strip("Flags: X - disabled\n 0   ether1\n\n[admin@hostname] >"),
            "Flags: X - disabled\n 0   ether1"
        );
    }

    #[test]
    fn test_strip_double_trailing_prompt() {
        let text = "  SEQ HOST\n    0 1.0.0.1\n\n[admin@hostname] > \n[admin@hostname] >";
        let stripped = strip(text);
        assert_eq!(stripped, "SEQ HOST\n    0 1.0.0.1");
        assert!(!stripped.contains(PROMPT));
    }

    #[test]
    fn test_strip_only_prompts() {
        assert_eq!(strip("[admin@hostname] >\n[admin@hostname] >"), "");
        assert_eq!(strip(PROMPT), "");
    }

    #[test]
    fn test_unexpected_shape_is_identity() {
        for text in [
            "output ends mid-line",
            "[admin@hostname] > \nstill printing",
            "  name: r1\n",
            "",
        ] {
            assert_eq!(strip(text), text);
        }
    }

    #[test]
    fn test_crlf_input() {
        assert_eq!(strip("  name: r1\r\n[admin@hostname] > "), "name: r1");
    }
}
