//! Masked handling of service tokens.
//!
//! Tokens must never reach logs or error messages in full; everything that
//! formats a token goes through the first-6/last-4 mask.

use std::fmt;

const KEEP_START: usize = 6;
const KEEP_END: usize = 4;

/// Mask a token for logging: first 6 and last 4 characters visible.
///
/// Tokens at or below the visible length are fully starred so short values
/// leak nothing.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    if chars.len() <= KEEP_START + KEEP_END {
        return "*".repeat(chars.len());
    }
    let start: String = chars[..KEEP_START].iter().collect();
    let end: String = chars[chars.len() - KEEP_END..].iter().collect();
    format!("{start}***{end}")
}

/// A service token that only formats in masked form.
///
/// `Debug` and `Display` both render the mask; the raw value is available
/// only through [`expose`](Self::expose) at the point it is put on the wire.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw token value. Callers must not log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// The masked rendering used everywhere the token is referenced.
    pub fn masked(&self) -> String {
        mask_token(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretToken({})", self.masked())
    }
}

impl fmt::Display for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_long_token() {
        assert_eq!(
            mask_token("svc_thisismyprivateservicetoken"),
            "svc_th***oken"
        );
    }

    #[test]
    fn fully_stars_short_token() {
        assert_eq!(mask_token("short"), "*****");
        assert_eq!(mask_token("exactly10!"), "**********");
    }

    #[test]
    fn empty_token_masks_to_empty() {
        assert_eq!(mask_token(""), "");
    }

    #[test]
    fn debug_and_display_never_show_raw_value() {
        let token = SecretToken::new("svc_thisismyprivateservicetoken");
        let debug = format!("{token:?}");
        let display = format!("{token}");
        assert!(!debug.contains("private"));
        assert!(!display.contains("private"));
        assert!(display.contains("***"));
        assert_eq!(token.expose(), "svc_thisismyprivateservicetoken");
    }
}
