//! Command parsing and the builtin handlers.
//!
//! Handlers are stateless async fns: each one does at most one outbound
//! call and sends one reply.

pub mod debug;
pub mod search;

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ReplyParameters;

use crate::bot::BotState;

/// A parsed command invocation. Borrows from the message text.
#[derive(Debug, PartialEq)]
pub struct CommandCall<'a> {
    pub prefix: &'a str,
    pub name: &'a str,
    /// Everything after the command name, trimmed. Empty if absent.
    pub args: &'a str,
}

/// Match a message against the prefix list and split out the command.
///
/// The list must already be sorted longest-first (see
/// [`crate::bot::resolve_prefixes`]); the first match wins.
pub fn parse_command<'a>(text: &'a str, prefixes: &'a [String]) -> Option<CommandCall<'a>> {
    for prefix in prefixes {
        let Some(rest) = text.strip_prefix(prefix.as_str()) else {
            continue;
        };
        let rest = rest.trim_start();
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        if name.is_empty() {
            return None;
        }
        return Some(CommandCall { prefix, name, args });
    }
    None
}

/// Escape text for Telegram HTML-mode messages.
pub(crate) fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape text for HTML attribute values (also escapes quotes).
pub(crate) fn html_escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

/// Send a plain-text reply to the invoking message.
pub(crate) async fn reply(bot: &Bot, msg: &Message, text: &str) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

pub async fn uptime(bot: &Bot, msg: &Message, state: &BotState) -> ResponseResult<()> {
    let up = format_uptime(state.boot_time.elapsed());
    reply(bot, msg, &format!("Up for {up}.")).await
}

pub async fn help(bot: &Bot, msg: &Message, state: &BotState) -> ResponseResult<()> {
    // debug/eval is owner-only and deliberately not listed
    let p = state
        .config
        .prefixes
        .first()
        .map(String::as_str)
        .unwrap_or(":");
    let text = format!(
        "Commands:\n\
         {p}g <query> - search Google and reply with the top result (alias: {p}google)\n\
         {p}uptime - time since the bot started\n\
         {p}help - this message"
    );
    reply(bot, msg, &text).await
}

/// "1d 2h 3m 4s", dropping leading zero units but always showing seconds.
pub fn format_uptime(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (days, rest) = (total / 86_400, total % 86_400);
    let (hours, rest) = (rest / 3_600, rest % 3_600);
    let (minutes, seconds) = (rest / 60, rest % 60);

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 || !parts.is_empty() {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 || !parts.is_empty() {
        parts.push(format!("{minutes}m"));
    }
    parts.push(format!("{seconds}s"));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple_command() {
        let p = prefixes(&["!"]);
        let call = parse_command("!g rust language", &p).unwrap();
        assert_eq!(call.prefix, "!");
        assert_eq!(call.name, "g");
        assert_eq!(call.args, "rust language");
    }

    #[test]
    fn test_parse_no_args() {
        let p = prefixes(&["!"]);
        let call = parse_command("!uptime", &p).unwrap();
        assert_eq!(call.name, "uptime");
        assert_eq!(call.args, "");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let p = prefixes(&["!"]);
        let call = parse_command("!  g   spaced query  ", &p).unwrap();
        assert_eq!(call.name, "g");
        assert_eq!(call.args, "spaced query");
    }

    #[test]
    fn test_no_prefix_no_command() {
        let p = prefixes(&["!"]);
        assert_eq!(parse_command("just chatting", &p), None);
    }

    #[test]
    fn test_bare_prefix_is_not_a_command() {
        let p = prefixes(&["!"]);
        assert_eq!(parse_command("!", &p), None);
        assert_eq!(parse_command("!   ", &p), None);
    }

    #[test]
    fn test_first_matching_prefix_wins() {
        // Longest-first ordering is the caller's job; parse takes it as-is
        let p = prefixes(&["::", ":"]);
        let call = parse_command("::help", &p).unwrap();
        assert_eq!(call.prefix, "::");
        assert_eq!(call.name, "help");
    }

    #[test]
    fn test_mention_prefix() {
        let p = prefixes(&["@scout_bot ", "!"]);
        let call = parse_command("@scout_bot g ferris", &p).unwrap();
        assert_eq!(call.name, "g");
        assert_eq!(call.args, "ferris");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("hello"), "hello");
        assert_eq!(html_escape("<b>&"), "&lt;b&gt;&amp;");
        // Quotes are fine in text content
        assert_eq!(html_escape(r#"say "hi""#), r#"say "hi""#);
    }

    #[test]
    fn test_html_escape_attr() {
        assert_eq!(html_escape_attr(r#"say "hi""#), "say &quot;hi&quot;");
        assert_eq!(html_escape_attr("<b>&"), "&lt;b&gt;&amp;");
    }

    #[test]
    fn test_format_uptime_seconds_only() {
        assert_eq!(format_uptime(Duration::from_secs(42)), "42s");
    }

    #[test]
    fn test_format_uptime_full() {
        let elapsed = Duration::from_secs(86_400 + 2 * 3_600 + 3 * 60 + 4);
        assert_eq!(format_uptime(elapsed), "1d 2h 3m 4s");
    }

    #[test]
    fn test_format_uptime_inner_zero_units_shown() {
        // Once a larger unit is shown, smaller ones are kept even at zero
        let elapsed = Duration::from_secs(86_400 + 5);
        assert_eq!(format_uptime(elapsed), "1d 0h 0m 5s");
    }
}
