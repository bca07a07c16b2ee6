//! Network module.
//!
//! IRC client side of the warden: line parsing and rendering, the
//! reconnecting connection loop, and RFC 1459 case mapping.

mod client;
pub mod line;

pub use client::Client;
pub use line::{Line, render};

/// Convert a single character to IRC lowercase using RFC 1459 case mapping.
///
/// In addition to ASCII lowercase conversion, this maps:
/// - `[` → `{`
/// - `]` → `}`
/// - `\` → `|`
/// - `~` → `^`
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        'A'..='Z' => c.to_ascii_lowercase(),
        _ => c,
    }
}

/// Convert a string to IRC lowercase using RFC 1459 case mapping.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(irc_lower_char).collect()
}

/// Compare two nicknames or channels under RFC 1459 case mapping.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.chars()
            .zip(b.chars())
            .all(|(ca, cb)| irc_lower_char(ca) == irc_lower_char(cb))
}

/// Whether `name` looks like a channel the warden can join.
///
/// Valid names start with `#` or `&`, are 2 to 50 characters long and
/// contain no spaces, commas or control characters.
pub fn is_channel_name(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some('#' | '&') => {}
        _ => return false,
    }

    let len = name.chars().count();
    if !(2..=50).contains(&len) {
        return false;
    }

    chars.all(|c| c != ' ' && c != ',' && !c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_irc_to_lower() {
        assert_eq!(irc_to_lower("HELLO"), "hello");
        assert_eq!(irc_to_lower("#Channel[1]"), "#channel{1}");
        assert_eq!(irc_to_lower("Nick\\Away"), "nick|away");
        assert_eq!(irc_to_lower("Test~Name"), "test^name");
        // Non-ASCII is left alone
        assert_eq!(irc_to_lower("#ÄÖ"), "#ÄÖ");
    }

    #[test]
    fn test_irc_eq() {
        assert!(irc_eq("Warden[1]", "warden{1}"));
        assert!(!irc_eq("warden", "warden_"));
    }

    #[test]
    fn test_is_channel_name() {
        assert!(is_channel_name("#rust"));
        assert!(is_channel_name("&local"));
        assert!(!is_channel_name("rust"));
        assert!(!is_channel_name("#"));
        assert!(!is_channel_name("#with space"));
        assert!(!is_channel_name("#a,b"));
        assert!(!is_channel_name("#bell\x07"));
        assert!(!is_channel_name(&format!("#{}", "x".repeat(50))));
    }
}
