//! Trigger-prefixed chat commands.
//!
//! A command line is the trigger character immediately followed by the
//! command name, then whitespace-separated arguments. Routing metadata
//! (required role, which argument names the channel) lives in the
//! [`Registry`] next to each handler, and the permission check runs there
//! before any handler is invoked.

mod account;
mod admin;
mod channel;
mod context;
mod help;
mod registry;

pub use context::{Context, Handler, HandlerResult};
pub use registry::{CommandSpec, Registry};

use crate::error::{ModerationError, ModerationResult};

/// Positional command arguments.
///
/// A command given no arguments at all receives a single `None`
/// placeholder, so "no arguments" and "one argument" differ only in
/// content, never in arity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args(Vec<Option<String>>);

impl Args {
    pub fn new(words: Vec<String>) -> Self {
        if words.is_empty() {
            Self(vec![None])
        } else {
            Self(words.into_iter().map(Some).collect())
        }
    }

    /// Number of slots, including the empty placeholder.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// Argument at `index`, if supplied.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|a| a.as_deref())
    }

    /// Arguments from `index` on, joined with single spaces.
    pub fn rest(&self, index: usize) -> Option<String> {
        let words: Vec<&str> = self
            .0
            .iter()
            .skip(index)
            .filter_map(|a| a.as_deref())
            .collect();
        if words.is_empty() {
            None
        } else {
            Some(words.join(" "))
        }
    }

    /// Like [`get`](Self::get), failing with the command's usage line.
    pub fn require(&self, index: usize, usage: &str) -> ModerationResult<&str> {
        self.get(index)
            .ok_or_else(|| ModerationError::InvalidArguments(usage.to_string()))
    }

    /// Like [`rest`](Self::rest), failing with the command's usage line.
    pub fn require_rest(&self, index: usize, usage: &str) -> ModerationResult<String> {
        self.rest(index)
            .ok_or_else(|| ModerationError::InvalidArguments(usage.to_string()))
    }
}

/// Split a command line into its lowercased name and arguments.
///
/// Returns `None` unless `text` starts with `trigger` directly followed by a
/// name.
pub fn parse(text: &str, trigger: char) -> Option<(String, Args)> {
    let body = text.strip_prefix(trigger)?;
    if body.starts_with(char::is_whitespace) {
        return None;
    }

    let mut words = body.split_whitespace();
    let name = words.next()?.to_lowercase();
    let args = Args::new(words.map(str::to_string).collect());
    Some((name, args))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_whitespace() {
        let (name, args) = parse("@Join  #rust\tsecret", '@').unwrap();
        assert_eq!(name, "join");
        assert_eq!(args.get(0), Some("#rust"));
        assert_eq!(args.get(1), Some("secret"));
        assert_eq!(args.get(2), None);
    }

    #[test]
    fn test_zero_arguments_get_placeholder() {
        let (name, args) = parse("@quit", '@').unwrap();
        assert_eq!(name, "quit");
        assert_eq!(args.len(), 1);
        assert!(args.is_empty());
        assert_eq!(args.get(0), None);

        let (_, one) = parse("@help words", '@').unwrap();
        assert_eq!(one.len(), 1);
        assert!(!one.is_empty());
    }

    #[test]
    fn test_rest_joins_with_single_spaces() {
        let (_, args) = parse("@msg #rust hello    big   world", '@').unwrap();
        assert_eq!(args.rest(1).as_deref(), Some("hello big world"));
        assert_eq!(args.rest(9), None);
    }

    #[test]
    fn test_not_a_command() {
        assert!(parse("hello @join", '@').is_none());
        assert!(parse("@", '@').is_none());
        assert!(parse("@ join", '@').is_none());
        assert!(parse("!join #rust", '@').is_none());
        assert!(parse("!join #rust", '!').is_some());
    }

    #[test]
    fn test_require_reports_usage() {
        let (_, args) = parse("@auth alice", '@').unwrap();
        assert_eq!(args.require(0, "auth <u> <p>").unwrap(), "alice");
        assert!(matches!(
            args.require(1, "auth <u> <p>"),
            Err(ModerationError::InvalidArguments(u)) if u == "auth <u> <p>"
        ));
    }
}
