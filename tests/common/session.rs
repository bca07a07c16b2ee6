//! Session harness.

use slirc_warden::config::Config;
use slirc_warden::db::Database;
use slirc_warden::moderation::{Directive, Identity};
use slirc_warden::session::Session;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Base configuration: `root` becomes owner on registration, bans enabled,
/// warn-to-kick 3 and kick-to-ban 2.
pub const CONFIG: &str = r##"
[identity]
nickname = "warden"

[network]
host = "127.0.0.1"
channels = ["#rust"]

[general]
linerate = 0.0
owners = ["root"]

[policy]
warn_to_kick = 3
kick_to_ban = 2
ban_enabled = true
"##;

/// Identity with a host derived from the nick.
pub fn user(nick: &str) -> Identity {
    Identity::new(nick, format!("{}@{}.example", nick.to_lowercase(), nick.to_lowercase()))
}

/// Text of every notice addressed to `nick`.
pub fn notices_to(directives: &[Directive], nick: &str) -> Vec<String> {
    directives
        .iter()
        .filter_map(|d| match d {
            Directive::Notice { target, text } if target == nick => Some(text.clone()),
            _ => None,
        })
        .collect()
}

pub struct TestSession {
    pub session: Arc<Session>,
    pub outbound: mpsc::Receiver<Directive>,
}

impl TestSession {
    pub async fn new() -> Self {
        Self::with_config(CONFIG).await
    }

    pub async fn with_config(text: &str) -> Self {
        let config: Config = text.parse().expect("test config parses");
        let db = Database::new(":memory:").await.expect("in-memory database");
        let (tx, outbound) = mpsc::channel(64);
        Self {
            session: Arc::new(Session::new(config, db, tx)),
            outbound,
        }
    }

    /// Deliver a PRIVMSG and collect the directives it produces.
    pub async fn say(&self, who: &Identity, target: &str, text: &str) -> Vec<Directive> {
        self.session.handle_privmsg(who, target, text).await
    }

    /// Register `nick` (username = lowercased nick, password `pw`).
    pub async fn register(&self, who: &Identity) {
        let username = who.nick.to_lowercase();
        let replies = self
            .say(who, "warden", &format!("@register {} pw", username))
            .await;
        assert_eq!(
            notices_to(&replies, &who.nick),
            vec!["Your username is now registered."],
            "registering {}",
            username
        );
    }

    /// The owner `root`, registered and logged in.
    pub async fn owner(&self) -> Identity {
        let root = user("root");
        self.register(&root).await;
        root
    }

    /// Register `nick` and have the owner raise it to `level` with the
    /// all-channels scope.
    pub async fn staff(&self, owner: &Identity, nick: &str, level: &str) -> Identity {
        let who = user(nick);
        self.register(&who).await;
        let username = nick.to_lowercase();
        self.say(owner, "warden", &format!("@{} {}", level, username)).await;
        self.say(owner, "warden", &format!("@allow {} *", username)).await;
        who
    }

    /// What happens when the warden's own JOIN for `channel` is seen.
    pub async fn joined(&self, channel: &str) {
        self.session.on_joined(channel).await;
    }
}
