//! Pattern construction helpers for prompt and echo detection.

use regex::bytes::Regex;

/// Compile `text` as a literal pattern.
///
/// Commands routinely contain regex metacharacters (`[find]`, `.`, `?`), so
/// echoes are always matched literally.
pub fn literal(text: &str) -> Result<Regex, regex::Error> {
    Regex::new(&regex::escape(text))
}

/// Compile a prompt pattern anchored to the end of the buffer.
///
/// Trailing whitespace after the prompt is allowed.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = if pattern.ends_with('$') || pattern.ends_with("\\s*$") {
        pattern.to_string()
    } else {
        format!("{}\\s*$", pattern)
    };

    Regex::new(&pattern)
}

/// Pattern matching a stored base prompt at the end of the buffer.
pub fn base_prompt_pattern(base_prompt: &str) -> Result<Regex, regex::Error> {
    compile_prompt_pattern(&regex::escape(base_prompt))
}

/// Pattern matching any of the given terminator characters at the end of the buffer.
pub fn terminator_pattern(terminators: &[char]) -> Result<Regex, regex::Error> {
    let class: String = terminators
        .iter()
        .map(|c| regex::escape(&c.to_string()))
        .collect();
    compile_prompt_pattern(&format!("[{}]", class))
}
