//! Command registry and permission-gated dispatch.

use super::account::{AuthHandler, RegisterHandler, RemoveHandler};
use super::admin::{
    AllowHandler, MsgHandler, NickHandler, QuitHandler, RoleHandler, RoleUpdate,
};
use super::channel::{
    AddWordHandler, DelWordHandler, JoinHandler, PardonHandler, PartHandler, PolicyHandler,
    SetHandler, WordsHandler,
};
use super::context::{Context, Handler, HandlerResult};
use super::help::HelpHandler;
use super::Args;
use crate::error::ModerationError;
use crate::moderation::{Directive, Identity, Role, ScopeCheck};
use crate::session::Session;
use std::collections::HashMap;
use tracing::{Instrument, Level, debug, error, span, warn};

/// Routing metadata plus the handler for one command.
pub struct CommandSpec {
    /// Role the caller must hold; `None` for commands open to anyone.
    pub role: Option<Role>,
    /// Index of the argument naming the channel the command acts on.
    pub channel_arg: Option<usize>,
    pub usage: &'static str,
    pub summary: &'static str,
    handler: Box<dyn Handler>,
}

impl CommandSpec {
    fn gated(
        role: Role,
        usage: &'static str,
        summary: &'static str,
        handler: impl Handler + 'static,
    ) -> Self {
        Self {
            role: Some(role),
            channel_arg: None,
            usage,
            summary,
            handler: Box::new(handler),
        }
    }

    fn open(usage: &'static str, summary: &'static str, handler: impl Handler + 'static) -> Self {
        Self {
            role: None,
            channel_arg: None,
            usage,
            summary,
            handler: Box::new(handler),
        }
    }

    fn channel_arg(mut self, index: usize) -> Self {
        self.channel_arg = Some(index);
        self
    }

    /// Channel part of the permission check for these arguments.
    pub fn scope<'a>(&self, args: &'a Args) -> ScopeCheck<'a> {
        match self.channel_arg {
            None => ScopeCheck::Unscoped,
            Some(index) => args
                .get(index)
                .map_or(ScopeCheck::Missing, ScopeCheck::Channel),
        }
    }
}

/// Registry of command handlers.
pub struct Registry {
    commands: HashMap<&'static str, CommandSpec>,
}

impl Registry {
    /// Create a new registry with all commands registered.
    pub fn new() -> Self {
        let mut commands: HashMap<&'static str, CommandSpec> = HashMap::new();

        // Accounts
        commands.insert(
            "register",
            CommandSpec::open(
                "register <username> <password>",
                "Register an account bound to your current connection.",
                RegisterHandler,
            ),
        );
        commands.insert(
            "auth",
            CommandSpec::open(
                "auth <username> <password>",
                "Log in to an existing account.",
                AuthHandler,
            ),
        );
        commands.insert(
            "remove",
            CommandSpec::gated(
                Role::User,
                "remove <username> <password>",
                "Delete an account.",
                RemoveHandler,
            ),
        );
        commands.insert(
            "help",
            CommandSpec::gated(
                Role::User,
                "help [command]",
                "List commands, or show how to use one.",
                HelpHandler,
            ),
        );

        // Channel presence
        commands.insert(
            "join",
            CommandSpec::gated(
                Role::Op,
                "join <channel> [key]",
                "Join a channel.",
                JoinHandler,
            )
            .channel_arg(0),
        );
        commands.insert(
            "part",
            CommandSpec::gated(Role::Op, "part <channel>", "Leave a channel.", PartHandler)
                .channel_arg(0),
        );

        // Blocklist and enforcement policy
        commands.insert(
            "addword",
            CommandSpec::gated(
                Role::Op,
                "addword <channel> <pattern>",
                "Block a pattern (case-insensitive regex) in a channel.",
                AddWordHandler,
            )
            .channel_arg(0),
        );
        commands.insert(
            "delword",
            CommandSpec::gated(
                Role::Op,
                "delword <channel> <pattern>",
                "Unblock a pattern in a channel.",
                DelWordHandler,
            )
            .channel_arg(0),
        );
        commands.insert(
            "words",
            CommandSpec::gated(
                Role::Op,
                "words <channel>",
                "List the blocked patterns of a channel.",
                WordsHandler,
            )
            .channel_arg(0),
        );
        commands.insert(
            "policy",
            CommandSpec::gated(
                Role::Op,
                "policy <channel>",
                "Show the enforcement policy of a channel.",
                PolicyHandler,
            )
            .channel_arg(0),
        );
        commands.insert(
            "set",
            CommandSpec::gated(
                Role::Admin,
                "set <channel> <key> <value>",
                "Change one enforcement setting of a channel.",
                SetHandler,
            )
            .channel_arg(0),
        );
        commands.insert(
            "pardon",
            CommandSpec::gated(
                Role::Op,
                "pardon <channel> <user@host>",
                "Reset the warnings and kicks of an identity.",
                PardonHandler,
            )
            .channel_arg(0),
        );

        // Warden control
        commands.insert(
            "msg",
            CommandSpec::gated(
                Role::Admin,
                "msg <target> <message>",
                "Send a message as the warden.",
                MsgHandler,
            ),
        );
        commands.insert(
            "nick",
            CommandSpec::gated(
                Role::Admin,
                "nick <nickname>",
                "Change the warden's nickname.",
                NickHandler,
            ),
        );
        commands.insert(
            "quit",
            CommandSpec::gated(Role::Admin, "quit", "Shut the warden down.", QuitHandler),
        );

        // Privileges
        commands.insert(
            "op",
            CommandSpec::gated(
                Role::Admin,
                "op <username>",
                "Grant operator level.",
                RoleHandler(RoleUpdate::Grant(Role::Op)),
            ),
        );
        commands.insert(
            "deop",
            CommandSpec::gated(
                Role::Admin,
                "deop <username>",
                "Revoke operator level and everything above it.",
                RoleHandler(RoleUpdate::Revoke(Role::Op)),
            ),
        );
        commands.insert(
            "admin",
            CommandSpec::gated(
                Role::Owner,
                "admin <username>",
                "Grant admin level.",
                RoleHandler(RoleUpdate::Grant(Role::Admin)),
            ),
        );
        commands.insert(
            "deadmin",
            CommandSpec::gated(
                Role::Owner,
                "deadmin <username>",
                "Revoke admin level and everything above it.",
                RoleHandler(RoleUpdate::Revoke(Role::Admin)),
            ),
        );
        commands.insert(
            "allow",
            CommandSpec::gated(
                Role::Admin,
                "allow <username> <channel|*>",
                "Let an account act on a channel, or on every channel with *.",
                AllowHandler { allow: true },
            ),
        );
        commands.insert(
            "disallow",
            CommandSpec::gated(
                Role::Admin,
                "disallow <username> <channel|*>",
                "Withdraw a channel scope, or the all-channels scope with *.",
                AllowHandler { allow: false },
            ),
        );

        Self { commands }
    }

    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name.to_lowercase().as_str())
    }

    /// All command names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Run a parsed command for `caller`.
    ///
    /// Never fails: every error is turned into a private notice to the
    /// caller (or only logged, for internal invariant violations).
    pub async fn dispatch(
        &self,
        session: &Session,
        caller: &Identity,
        name: &str,
        args: &Args,
    ) -> Vec<Directive> {
        let result = match self.get(name) {
            Some(spec) => {
                let scope = spec.scope(args);
                let channel = match scope {
                    ScopeCheck::Channel(c) => Some(c),
                    _ => None,
                };
                let command_span = span!(
                    Level::DEBUG,
                    "warden.command",
                    command = %name,
                    nick = %caller.nick,
                    identity = %caller.key,
                    channel = channel,
                );

                self.run(session, caller, spec, args)
                    .instrument(command_span)
                    .await
            }
            None => Err(ModerationError::UnknownCommand(name.to_string())),
        };

        match result {
            Ok(directives) => directives,
            Err(e) => {
                log_failure(name, caller, &e);
                e.user_notice()
                    .map(|text| vec![Directive::notice(caller.nick.clone(), text)])
                    .unwrap_or_default()
            }
        }
    }

    async fn run(
        &self,
        session: &Session,
        caller: &Identity,
        spec: &CommandSpec,
        args: &Args,
    ) -> HandlerResult {
        let account = match spec.role {
            Some(role) => Some(
                session
                    .gate()
                    .authorize(caller, role, spec.scope(args))
                    .await?,
            ),
            None => None,
        };

        let ctx = Context {
            session,
            caller,
            account,
            args,
            usage: spec.usage,
        };
        spec.handler.handle(&ctx).await
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn log_failure(command: &str, caller: &Identity, e: &ModerationError) {
    match e {
        ModerationError::PolicyMissing(channel) => {
            error!(command = %command, channel = %channel, "channel has no policy")
        }
        e if e.is_internal() => warn!(
            command = %command,
            nick = %caller.nick,
            error = %e,
            "command failed"
        ),
        e => debug!(
            command = %command,
            nick = %caller.nick,
            reason = e.error_code(),
            "command rejected"
        ),
    }
}
