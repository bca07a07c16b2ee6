//! IRC line parsing and directive rendering.
//!
//! Only the subset of RFC 1459 framing the warden needs: optional IRCv3 tags
//! (skipped), optional prefix, command, middle params and one trailing param.

use crate::moderation::Directive;
use std::str::FromStr;
use thiserror::Error;

/// Parse failures for inbound lines.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineError {
    #[error("empty line")]
    Empty,
    #[error("line has a prefix but no command")]
    MissingCommand,
}

/// One parsed protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub prefix: Option<String>,
    /// Command or numeric, uppercased.
    pub command: String,
    pub params: Vec<String>,
}

impl Line {
    /// Nick part of the prefix, or the whole prefix for server sources.
    pub fn source_nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split_once('!').map_or(prefix, |(nick, _)| nick))
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }
}

impl FromStr for Line {
    type Err = LineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s.trim_end_matches(['\r', '\n']);

        if let Some(tagged) = rest.strip_prefix('@') {
            rest = tagged.split_once(' ').map_or("", |(_, r)| r);
        }
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return Err(LineError::Empty);
        }

        let prefix = match rest.strip_prefix(':') {
            Some(prefixed) => {
                let (prefix, r) = prefixed.split_once(' ').unwrap_or((prefixed, ""));
                rest = r.trim_start_matches(' ');
                Some(prefix.to_string())
            }
            None => None,
        };

        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return Err(LineError::MissingCommand);
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            let (param, r) = rest.split_once(' ').unwrap_or((rest, ""));
            params.push(param.to_string());
            rest = r;
        }

        Ok(Self {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }
}

/// Render a directive to a raw outbound line, without the CRLF.
pub fn render(directive: &Directive) -> String {
    match directive {
        Directive::Notice { target, text } => format!("NOTICE {} :{}", target, single_line(text)),
        Directive::Message { target, text } => format!("PRIVMSG {} :{}", target, single_line(text)),
        Directive::Join {
            channel,
            key: Some(key),
        } => format!("JOIN {} {}", channel, key),
        Directive::Join { channel, key: None } => format!("JOIN {}", channel),
        Directive::Part { channel } => format!("PART {}", channel),
        Directive::Nick { nick } => format!("NICK {}", nick),
        Directive::Enforce {
            enforcer, command, ..
        } => format!("PRIVMSG {} :{}", enforcer, single_line(command)),
        Directive::Quit { message } => format!("QUIT :{}", single_line(message)),
    }
}

/// Line breaks would let a value inject extra protocol lines.
fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
