//! Reconnecting IRC client.
//!
//! ```text
//!   TcpStream ── Framed<LinesCodec> ──┬── reader (select! loop) ── Session
//!                                     │                              │
//!                                     └── writer task ◄── lines ◄────┘ directives
//!                                          (LinePacer)
//! ```
//!
//! The reader handles one line at a time. PRIVMSG work is spawned by the
//! session; membership and account events are awaited inline so their
//! effects are visible to any later message.

use super::line::{Line, render};
use super::irc_eq;
use crate::moderation::{Directive, Identity};
use crate::security::LinePacer;
use crate::session::Session;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

/// Longest inbound line accepted, tags included.
const MAX_LINE_LEN: usize = 8191;

const INITIAL_BACKOFF: Duration = Duration::from_secs(2);

type LineSink = SplitSink<Framed<TcpStream, LinesCodec>, String>;

/// How a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disconnect {
    /// A `Quit` directive was sent, or the session went away.
    Quit,
    /// The server closed the link; `registered` tells whether it ever
    /// welcomed us.
    Lost { registered: bool },
}

/// Connection driver that keeps the warden online.
pub struct Client {
    session: Arc<Session>,
    directives: mpsc::Receiver<Directive>,
    pacer: Arc<LinePacer>,
}

impl Client {
    pub fn new(session: Arc<Session>, directives: mpsc::Receiver<Directive>) -> Self {
        let pacer = Arc::new(LinePacer::new(session.config().general.linerate));
        Self {
            session,
            directives,
            pacer,
        }
    }

    /// Connect and serve until a `quit` command, reconnecting with jittered
    /// exponential backoff in between.
    pub async fn run(mut self) {
        let max_delay = Duration::from_secs(self.session.config().network.reconnect_max_secs.max(1));
        let mut delay = INITIAL_BACKOFF.min(max_delay);

        loop {
            match self.serve_once().await {
                Ok(Disconnect::Quit) => {
                    info!("Session ended");
                    return;
                }
                Ok(Disconnect::Lost { registered }) => {
                    if registered {
                        delay = INITIAL_BACKOFF.min(max_delay);
                    }
                    info!(delay_secs = delay.as_secs(), "Disconnected, will reconnect");
                }
                Err(e) => {
                    warn!(error = %e, delay_secs = delay.as_secs(), "Connection failed, retrying");
                }
            }

            tokio::time::sleep(delay).await;
            delay = next_backoff(delay, max_delay);
        }
    }

    async fn serve_once(&mut self) -> std::io::Result<Disconnect> {
        let config = self.session.config();
        let stream = TcpStream::connect((config.network.host.as_str(), config.network.port)).await?;
        info!(host = %config.network.host, port = config.network.port, "Connected");

        let (sink, mut inbound) =
            Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LEN)).split();
        let (lines, line_rx) = mpsc::channel::<String>(config.general.outbound_queue.max(1));
        let writer = tokio::spawn(write_loop(sink, line_rx, self.pacer.clone()));

        let mut state = ConnState {
            nick: config.nickname().to_string(),
            registered: false,
            lines,
        };

        if let Some(password) = &config.network.password {
            state.send(format!("PASS {}", password)).await;
        }
        state.send(format!("NICK {}", state.nick)).await;
        state
            .send(format!("USER {} 0 * :{}", config.username(), config.realname()))
            .await;

        let end = loop {
            tokio::select! {
                received = inbound.next() => match received {
                    Some(Ok(raw)) => {
                        if !self.on_line(&raw, &mut state).await {
                            break Disconnect::Lost { registered: state.registered };
                        }
                    }
                    Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                        debug!("Dropped overlong line");
                    }
                    Some(Err(LinesCodecError::Io(e))) => {
                        warn!(error = %e, "Read failed");
                        break Disconnect::Lost { registered: state.registered };
                    }
                    None => break Disconnect::Lost { registered: state.registered },
                },
                directive = self.directives.recv() => match directive {
                    Some(directive) => {
                        let quit = matches!(directive, Directive::Quit { .. });
                        state.send(render(&directive)).await;
                        if quit {
                            break Disconnect::Quit;
                        }
                    }
                    None => break Disconnect::Quit,
                },
            }
        };

        // Let the writer flush what is queued (the QUIT included)
        drop(state);
        if let Err(e) = writer.await {
            warn!(error = %e, "Writer task failed");
        }
        Ok(end)
    }

    /// Handle one inbound line. Returns `false` when the server is closing
    /// the link.
    async fn on_line(&self, raw: &str, state: &mut ConnState) -> bool {
        let line: Line = match raw.parse() {
            Ok(line) => line,
            Err(e) => {
                debug!(error = %e, "Unparseable line");
                return true;
            }
        };

        match line.command.as_str() {
            "PING" => {
                let token = line.param(0).unwrap_or_default();
                state.send(format!("PONG :{}", token)).await;
            }
            "001" => {
                state.registered = true;
                if let Some(nick) = line.param(0) {
                    state.nick = nick.to_string();
                }
                info!(nick = %state.nick, "Registered with server");

                for channel in &self.session.config().network.channels {
                    state.send(format!("JOIN {}", channel)).await;
                }
            }
            // ERR_NICKNAMEINUSE before registration: try another
            "433" if !state.registered => {
                state.nick.push('_');
                state.send(format!("NICK {}", state.nick)).await;
            }
            "JOIN" => {
                if let (Some(nick), Some(channel)) = (line.source_nick(), line.param(0))
                    && irc_eq(nick, &state.nick)
                {
                    self.session.on_joined(channel).await;
                }
            }
            "KICK" => {
                if let (Some(channel), Some(kicked)) = (line.param(0), line.param(1))
                    && irc_eq(kicked, &state.nick)
                {
                    let by = line.source_nick().unwrap_or("*");
                    let reason = line.param(2).unwrap_or_default();
                    for directive in self.session.on_kicked(channel, by, reason) {
                        state.send(render(&directive)).await;
                    }
                }
            }
            "NICK" => {
                if let (Some(old), Some(new)) = (line.source_nick(), line.param(0)) {
                    if irc_eq(old, &state.nick) {
                        info!(old = %old, new = %new, "Own nick changed");
                        state.nick = new.to_string();
                    } else {
                        self.session.on_nick(old, new).await;
                    }
                }
            }
            "QUIT" => {
                if let Some(nick) = line.source_nick() {
                    self.session.on_quit(nick).await;
                }
            }
            "PRIVMSG" => {
                let identity = line.prefix.as_deref().and_then(Identity::from_prefix);
                if let (Some(identity), Some(target), Some(text)) =
                    (identity, line.param(0), line.param(1))
                    && !irc_eq(&identity.nick, &state.nick)
                {
                    self.session
                        .spawn_privmsg(identity, target.to_string(), text.to_string());
                }
            }
            "ERROR" => {
                warn!(reason = line.param(0).unwrap_or_default(), "Server closed the link");
                return false;
            }
            _ => {}
        }
        true
    }
}

/// Per-connection state owned by the reader.
struct ConnState {
    nick: String,
    registered: bool,
    lines: mpsc::Sender<String>,
}

impl ConnState {
    async fn send(&self, line: String) {
        if self.lines.send(line).await.is_err() {
            debug!("Writer gone; line dropped");
        }
    }
}

async fn write_loop(mut sink: LineSink, mut lines: mpsc::Receiver<String>, pacer: Arc<LinePacer>) {
    while let Some(line) = lines.recv().await {
        pacer.ready().await;
        // LinesCodec terminates with LF only
        if let Err(e) = sink.send(format!("{}\r", line)).await {
            warn!(error = %e, "Write failed");
            return;
        }
    }
    if let Err(e) = sink.close().await {
        debug!(error = %e, "Close failed");
    }
}

/// Double the delay, add up to a quarter of it as jitter, cap at `max`.
fn next_backoff(delay: Duration, max: Duration) -> Duration {
    let base = delay.as_millis() as u64;
    let jitter = if base >= 4 {
        rand::thread_rng().gen_range(0..=base / 4)
    } else {
        0
    };
    Duration::from_millis(base.saturating_mul(2).saturating_add(jitter)).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let max = Duration::from_secs(300);
        let mut delay = INITIAL_BACKOFF;
        for _ in 0..20 {
            let next = next_backoff(delay, max);
            assert!(next >= delay.min(max));
            assert!(next <= max);
            delay = next;
        }
        assert_eq!(delay, max);
    }

    #[test]
    fn test_backoff_jitter_bounded() {
        let max = Duration::from_secs(300);
        for _ in 0..50 {
            let next = next_backoff(Duration::from_secs(4), max);
            assert!(next >= Duration::from_secs(8));
            assert!(next <= Duration::from_secs(9));
        }
    }
}
