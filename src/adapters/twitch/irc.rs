//! Twitch IRC line parsing.
//!
//! A line looks like
//!
//! ```text
//! @badges=moderator/1;display-name=Ada :ada!ada@ada.tmi.twitch.tv PRIVMSG #chan :hello
//! ```
//!
//! with the tag segment and the prefix both optional. Only the commands the
//! chat adapter acts on are classified; everything else is [`IrcLine::Other`].

use crate::domain::chat::{ChatTags, TwitchChatMessage};
use crate::domain::foundation::Timestamp;

/// Keepalive probe sent by the heartbeat.
pub const HEARTBEAT_PROBE: &str = "PING :tmi.twitch.tv";

/// One classified inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrcLine<'a> {
    /// `PING <arg>`; must be answered with `PONG <arg>`.
    Ping(&'a str),
    /// Numeric `001`: the credentials were accepted.
    Welcome,
    /// A NOTICE rejecting the credentials.
    AuthFailed(&'a str),
    /// The server is about to drop the connection.
    Reconnect,
    Chat(TwitchChatMessage),
    Other,
}

impl<'a> IrcLine<'a> {
    pub fn classify(line: &'a str) -> Self {
        if let Some(arg) = line.strip_prefix("PING") {
            return IrcLine::Ping(arg.trim_start());
        }

        let (_, rest) = split_tags(line);
        let (_, command, params) = split_command(rest);

        match command {
            "001" => IrcLine::Welcome,
            "RECONNECT" => IrcLine::Reconnect,
            "NOTICE" if is_auth_failure(params) => {
                IrcLine::AuthFailed(trailing(params).unwrap_or(params))
            }
            "PRIVMSG" => match parse_chat_line(line, Timestamp::now()) {
                Some(message) => IrcLine::Chat(message),
                None => IrcLine::Other,
            },
            _ => IrcLine::Other,
        }
    }
}

/// Reply for a `PING` argument.
pub fn pong_for(arg: &str) -> String {
    if arg.is_empty() {
        "PONG :tmi.twitch.tv".to_string()
    } else {
        format!("PONG {}", arg)
    }
}

/// Splits the optional `@tags` segment from the rest of the line.
pub fn split_tags(line: &str) -> (Option<&str>, &str) {
    match line.strip_prefix('@') {
        Some(tagged) => match tagged.split_once(' ') {
            Some((tags, rest)) => (Some(tags), rest.trim_start()),
            None => (Some(tagged), ""),
        },
        None => (None, line),
    }
}

/// Splits `[:prefix] COMMAND params` into its three parts.
fn split_command(rest: &str) -> (Option<&str>, &str, &str) {
    let (prefix, rest) = match rest.strip_prefix(':') {
        Some(prefixed) => match prefixed.split_once(' ') {
            Some((prefix, rest)) => (Some(prefix), rest),
            None => (Some(prefixed), ""),
        },
        None => (None, rest),
    };
    let (command, params) = rest.split_once(' ').unwrap_or((rest, ""));
    (prefix, command, params)
}

fn trailing(params: &str) -> Option<&str> {
    params.split_once(" :").map(|(_, text)| text)
}

fn is_auth_failure(params: &str) -> bool {
    let lowered = params.to_ascii_lowercase();
    lowered.contains("authentication failed") || lowered.contains("improperly formatted auth")
}

/// Parses a `PRIVMSG` line into a chat message.
///
/// Returns `None` for anything that is not a well-formed channel message.
pub fn parse_chat_line(line: &str, timestamp: Timestamp) -> Option<TwitchChatMessage> {
    let (raw_tags, rest) = split_tags(line);
    let (prefix, command, params) = split_command(rest);
    if command != "PRIVMSG" {
        return None;
    }

    let username = prefix?.split_once('!')?.0;
    if username.is_empty() {
        return None;
    }

    let target = params.strip_prefix('#')?;
    let (channel, text) = target.split_once(" :")?;
    if channel.is_empty() || channel.contains(' ') || text.is_empty() {
        return None;
    }

    let tags = raw_tags.map(ChatTags::parse).unwrap_or_default();

    Some(TwitchChatMessage {
        username: username.to_string(),
        display_name: tags.display_name().unwrap_or(username).to_string(),
        message: text.to_string(),
        color: tags.color().map(str::to_string),
        channel: channel.to_string(),
        timestamp,
        is_moderator: tags.is_moderator(),
        is_subscriber: tags.is_subscriber(),
        badges: tags.badges(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse(line: &str) -> TwitchChatMessage {
        parse_chat_line(line, Timestamp::now()).unwrap()
    }

    #[test]
    fn parses_tagged_chat_line() {
        let msg = parse(
            "@badges=moderator/1;display-name=Ada;mod=1;subscriber=0 \
             :ada!ada@ada.tmi.example PRIVMSG #chan :hello world",
        );
        assert_eq!(msg.username, "ada");
        assert_eq!(msg.display_name, "Ada");
        assert_eq!(msg.message, "hello world");
        assert_eq!(msg.channel, "chan");
        assert!(msg.is_moderator);
        assert!(!msg.is_subscriber);
        assert_eq!(msg.badges, vec!["moderator"]);
    }

    #[test]
    fn untagged_line_uses_username_as_display_name() {
        let msg = parse(":bob!bob@bob.tmi.example PRIVMSG #chan :gg");
        assert_eq!(msg.username, "bob");
        assert_eq!(msg.display_name, "bob");
        assert_eq!(msg.message, "gg");
        assert!(msg.badges.is_empty());
        assert!(msg.color.is_none());
    }

    #[test]
    fn message_text_keeps_inner_colons() {
        let msg = parse(":bob!bob@bob.tmi.example PRIVMSG #chan :see https://x.io :)");
        assert_eq!(msg.message, "see https://x.io :)");
    }

    #[test]
    fn empty_display_name_falls_back_to_username() {
        let msg = parse("@display-name=;color=#FF0000 :eve!eve@eve PRIVMSG #c :hi");
        assert_eq!(msg.display_name, "eve");
        assert_eq!(msg.color.as_deref(), Some("#FF0000"));
    }

    #[test]
    fn non_chat_lines_are_ignored() {
        let at = Timestamp::now();
        assert!(parse_chat_line(":tmi.twitch.tv 001 bot :Welcome, GLHF!", at).is_none());
        assert!(parse_chat_line(":bob!bob@bob JOIN #chan", at).is_none());
        assert!(parse_chat_line(":bob!bob@bob PRIVMSG #chan :", at).is_none());
        assert!(parse_chat_line("PRIVMSG #chan :no prefix", at).is_none());
    }

    #[test]
    fn classifies_ping_with_argument() {
        assert_eq!(
            IrcLine::classify("PING :tmi.twitch.tv"),
            IrcLine::Ping(":tmi.twitch.tv")
        );
        assert_eq!(pong_for(":tmi.twitch.tv"), "PONG :tmi.twitch.tv");
        assert_eq!(pong_for(""), "PONG :tmi.twitch.tv");
    }

    #[test]
    fn classifies_session_commands() {
        assert_eq!(
            IrcLine::classify(":tmi.twitch.tv 001 bot :Welcome, GLHF!"),
            IrcLine::Welcome
        );
        assert_eq!(
            IrcLine::classify(":tmi.twitch.tv RECONNECT"),
            IrcLine::Reconnect
        );
        assert_eq!(
            IrcLine::classify(":tmi.twitch.tv NOTICE * :Login authentication failed"),
            IrcLine::AuthFailed("Login authentication failed")
        );
        assert_eq!(
            IrcLine::classify("@msg-id=slow_on :tmi.twitch.tv NOTICE #chan :Slow mode on"),
            IrcLine::Other
        );
    }

    #[test]
    fn classifies_chat() {
        let line = "@mod=0 :bob!bob@bob PRIVMSG #chan :gg";
        assert!(matches!(IrcLine::classify(line), IrcLine::Chat(m) if m.message == "gg"));
    }

    proptest! {
        #[test]
        fn parser_never_panics(line in "\\PC*") {
            let _ = IrcLine::classify(&line);
            let _ = parse_chat_line(&line, Timestamp::now());
        }

        #[test]
        fn generated_lines_round_trip(
            user in "[a-z][a-z0-9_]{0,15}",
            display in "[A-Za-z0-9]{1,12}",
            channel in "[a-z0-9_]{1,20}",
            text in "[ -~]{1,60}",
            moderator in any::<bool>(),
            subscriber in any::<bool>(),
        ) {
            let line = format!(
                "@badges=subscriber/12,premium/1;display-name={};mod={};subscriber={} :{}!{}@{}.tmi.twitch.tv PRIVMSG #{} :{}",
                display,
                u8::from(moderator),
                u8::from(subscriber),
                user, user, user,
                channel,
                text,
            );
            let msg = parse_chat_line(&line, Timestamp::now()).unwrap();
            prop_assert_eq!(msg.username, user);
            prop_assert_eq!(msg.display_name, display);
            prop_assert_eq!(msg.channel, channel);
            prop_assert_eq!(msg.message, text);
            prop_assert_eq!(msg.is_moderator, moderator);
            prop_assert_eq!(msg.is_subscriber, subscriber);
            prop_assert_eq!(msg.badges, vec!["subscriber".to_string(), "premium".to_string()]);
        }
    }
}
