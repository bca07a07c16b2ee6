//! Command dispatch: permission gating, account lifecycle and privilege
//! management.

mod common;
use common::{TestSession, notices_to, user};
use slirc_warden::moderation::{Directive, Identity, Role};

async fn reply(t: &TestSession, who: &Identity, line: &str) -> Vec<String> {
    notices_to(&t.say(who, "#rust", line).await, &who.nick)
}

async fn level(t: &TestSession, username: &str) -> Role {
    t.session
        .db()
        .accounts()
        .find_by_name(username)
        .await
        .unwrap()
        .unwrap()
        .level
}

#[tokio::test]
async fn test_unknown_command() {
    let t = TestSession::new().await;
    let bob = user("bob");
    assert_eq!(reply(&t, &bob, "@frobnicate now").await, vec!["Unknown command!"]);
}

#[tokio::test]
async fn test_unauthenticated_is_denied() {
    let t = TestSession::new().await;
    let bob = user("bob");

    for line in ["@help", "@join #rust", "@msg bob hi", "@admin bob", "@words #rust"] {
        assert_eq!(reply(&t, &bob, line).await, vec!["Permission denied!"], "{line}");
    }
}

#[tokio::test]
async fn test_missing_channel_argument() {
    let t = TestSession::new().await;
    let root = t.owner().await;

    assert_eq!(reply(&t, &root, "@join").await, vec!["No channel given!"]);
    assert_eq!(reply(&t, &root, "@addword").await, vec!["No channel given!"]);
    // Reported before the account is even looked at
    assert_eq!(reply(&t, &user("bob"), "@part").await, vec!["No channel given!"]);
}

#[tokio::test]
async fn test_plain_user_denied_admin_channel_command() {
    let t = TestSession::new().await;
    t.joined("#rust").await;
    let bob = user("bob");
    t.register(&bob).await;

    assert_eq!(
        reply(&t, &bob, "@set #rust ban off").await,
        vec!["Permission denied!"]
    );
}

#[tokio::test]
async fn test_duplicate_registration() {
    let t = TestSession::new().await;
    let bob = user("bob");
    t.register(&bob).await;

    let other = user("mallory");
    assert_eq!(
        reply(&t, &other, "@register BOB secret").await,
        vec!["Username already in use."]
    );
    assert_eq!(
        reply(&t, &other, "@register onlyname").await,
        vec!["Usage: register <username> <password>"]
    );
}

#[tokio::test]
async fn test_auth_rebinds_identity() {
    let t = TestSession::new().await;
    let bob = user("bob");
    t.register(&bob).await;

    // Same person, new connection
    let reconnected = Identity::new("bob", "bob@elsewhere.example");
    assert_eq!(reply(&t, &reconnected, "@help").await, vec!["Permission denied!"]);

    assert_eq!(
        reply(&t, &reconnected, "@auth bob wrong").await,
        vec!["I don't know you."]
    );
    assert_eq!(
        reply(&t, &reconnected, "@auth nobody pw").await,
        vec!["I don't know you."]
    );
    assert_eq!(reply(&t, &reconnected, "@auth bob pw").await, vec!["I recognize you."]);

    assert_eq!(reply(&t, &reconnected, "@help").await[0], "Commands:");
    assert_eq!(reply(&t, &bob, "@help").await, vec!["Permission denied!"]);
}

#[tokio::test]
async fn test_quit_logs_out_and_nick_follows() {
    let t = TestSession::new().await;
    let bob = user("bob");
    t.register(&bob).await;

    t.session.on_nick("bob", "bobby").await;
    let account = t.session.db().accounts().find_by_name("bob").await.unwrap().unwrap();
    assert_eq!(account.nick.as_deref(), Some("bobby"));

    t.session.on_quit("bobby").await;
    let account = t.session.db().accounts().find_by_name("bob").await.unwrap().unwrap();
    assert_eq!(account.identity, None);
    assert_eq!(account.nick, None);
    assert_eq!(reply(&t, &bob, "@help").await, vec!["Permission denied!"]);
}

#[tokio::test]
async fn test_remove_account() {
    let t = TestSession::new().await;
    let bob = user("bob");
    t.register(&bob).await;

    assert_eq!(
        reply(&t, &bob, "@remove bob nope").await,
        vec!["Your account could not be removed!"]
    );
    assert_eq!(
        reply(&t, &bob, "@remove bob pw").await,
        vec!["Your account has been removed."]
    );
    assert!(t.session.db().accounts().find_by_name("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn test_role_changes_follow_hierarchy() {
    let t = TestSession::new().await;
    let root = t.owner().await;
    let alice = t.staff(&root, "alice", "admin").await;
    let carol = t.staff(&root, "carol", "admin").await;
    let bob = user("bob");
    t.register(&bob).await;

    assert_eq!(reply(&t, &alice, "@op bob").await, vec!["bob is now op."]);
    assert_eq!(level(&t, "bob").await, Role::Op);

    // Admins cannot touch their peers, or hand out admin
    assert_eq!(reply(&t, &alice, "@deop carol").await, vec!["Permission denied!"]);
    assert_eq!(reply(&t, &alice, "@admin bob").await, vec!["Permission denied!"]);
    assert_eq!(level(&t, "carol").await, Role::Admin);

    // Revoking op clears admin as well
    assert_eq!(reply(&t, &root, "@deop carol").await, vec!["carol is now user."]);
    assert_eq!(level(&t, "carol").await, Role::User);

    assert_eq!(reply(&t, &carol, "@op bob").await, vec!["Permission denied!"]);
    assert_eq!(reply(&t, &alice, "@op ghost").await, vec!["ghost is not registered!"]);
}

#[tokio::test]
async fn test_channel_scopes() {
    let t = TestSession::new().await;
    t.joined("#rust").await;
    t.joined("#go").await;
    let root = t.owner().await;
    let bob = user("bob");
    t.register(&bob).await;
    reply(&t, &root, "@op bob").await;

    assert_eq!(
        reply(&t, &root, "@allow bob #Rust").await,
        vec!["bob may now act on #rust."]
    );

    assert_eq!(reply(&t, &bob, "@addword #rust spam").await, vec!["Blocked spam in #rust."]);
    assert_eq!(reply(&t, &bob, "@addword #go spam").await, vec!["Permission denied!"]);

    assert_eq!(
        reply(&t, &root, "@disallow bob #rust").await,
        vec!["bob may no longer act on #rust."]
    );
    assert_eq!(reply(&t, &bob, "@words #rust").await, vec!["Permission denied!"]);

    assert_eq!(
        reply(&t, &root, "@allow bob nonsense").await,
        vec!["Usage: allow <username> <channel|*>"]
    );
}

#[tokio::test]
async fn test_scoped_admin_cannot_grant_other_channels() {
    let t = TestSession::new().await;
    let root = t.owner().await;
    let alice = user("alice");
    t.register(&alice).await;
    reply(&t, &root, "@admin alice").await;
    reply(&t, &root, "@allow alice #rust").await;
    let bob = user("bob");
    t.register(&bob).await;

    assert_eq!(
        reply(&t, &alice, "@allow bob #rust").await,
        vec!["bob may now act on #rust."]
    );
    assert_eq!(reply(&t, &alice, "@allow bob #go").await, vec!["Permission denied!"]);
    assert_eq!(reply(&t, &alice, "@allow bob *").await, vec!["Permission denied!"]);
}

#[tokio::test]
async fn test_help_lists_only_usable_commands() {
    let t = TestSession::new().await;
    let bob = user("bob");
    t.register(&bob).await;

    assert_eq!(
        reply(&t, &bob, "@help").await,
        vec![
            "Commands:",
            "@auth <username> <password> - Log in to an existing account.",
            "@help [command] - List commands, or show how to use one.",
            "@register <username> <password> - Register an account bound to your current connection.",
            "@remove <username> <password> - Delete an account.",
        ]
    );
    assert_eq!(
        reply(&t, &bob, "@help JOIN").await,
        vec!["@join <channel> [key] - Join a channel."]
    );
    assert_eq!(reply(&t, &bob, "@help nothing").await, vec!["Unknown command!"]);
}

#[tokio::test]
async fn test_warden_control_directives() {
    let t = TestSession::new().await;
    let root = t.owner().await;

    assert_eq!(
        t.say(&root, "warden", "@msg #rust hello   everyone").await,
        vec![Directive::message("#rust", "hello everyone")]
    );
    assert_eq!(
        t.say(&root, "warden", "@join #secret hunter2").await,
        vec![Directive::Join {
            channel: "#secret".to_string(),
            key: Some("hunter2".to_string()),
        }]
    );
    assert_eq!(
        t.say(&root, "warden", "@part #Secret").await,
        vec![Directive::Part {
            channel: "#secret".to_string(),
        }]
    );
    assert_eq!(
        t.say(&root, "warden", "@nick sentinel").await,
        vec![Directive::Nick {
            nick: "sentinel".to_string(),
        }]
    );
    assert!(matches!(
        &t.say(&root, "warden", "@quit").await[..],
        [Directive::Quit { .. }]
    ));
    assert_eq!(
        reply(&t, &root, "@join notachannel").await,
        vec!["Usage: join <channel> [key]"]
    );
}

#[tokio::test]
async fn test_invalid_setting_reports_usage() {
    let t = TestSession::new().await;
    t.joined("#rust").await;
    let root = t.owner().await;

    assert_eq!(
        reply(&t, &root, "@set #rust warn_to_kick zero").await,
        vec!["Usage: set <channel> warn_to_kick <a number greater than zero>"]
    );
    assert_eq!(
        reply(&t, &root, "@set #rust").await,
        vec!["Usage: set <channel> <key> <value>"]
    );
}
