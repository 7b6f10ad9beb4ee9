//! The g/google command: run a search, reply with the card or top links.

use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{LinkPreviewOptions, ParseMode, ReplyParameters};
use tracing::{info, warn};

use super::{html_escape, html_escape_attr, reply};
use crate::bot::BotState;
use crate::search::card::Card;

pub async fn run(bot: &Bot, msg: &Message, state: &BotState, query: &str) -> ResponseResult<()> {
    let text = msg.text().unwrap_or("");

    // Refuse to relay chat invite links, and take the message down
    if state.invite_pattern.is_match(text) {
        let notice = match bot.delete_message(msg.chat.id, msg.id).await {
            Ok(_) => "Query contains invite link.",
            Err(RequestError::Api(e)) => {
                warn!("Could not delete invite-link message: {e}");
                "Query contains invite link but does not have permission to delete message."
            }
            Err(e) => {
                warn!("Could not delete invite-link message: {e}");
                "Query contains invite link but failed to delete message."
            }
        };
        // The message may be gone, so this is not a reply
        bot.send_message(msg.chat.id, notice).await?;
        return Ok(());
    }

    if query.is_empty() {
        return reply(bot, msg, "Search for what?").await;
    }

    let results = match state.search.search(query).await {
        Ok(results) => results,
        Err(e) => {
            warn!("Search for \"{query}\" failed: {e}");
            return reply(bot, msg, &e.to_string()).await;
        }
    };

    if let Some(card) = results.card {
        info!("Answering \"{query}\" with a \"{}\" card", card.title);
        bot.send_message(msg.chat.id, render_card(&card))
            .parse_mode(ParseMode::Html)
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
        return Ok(());
    }

    if results.entries.is_empty() {
        return reply(bot, msg, "No results found... sorry.").await;
    }

    info!(
        "Answering \"{query}\" with {} result link(s)",
        results.entries.len()
    );
    bot.send_message(msg.chat.id, render_entries(&results.entries))
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .link_preview_options(no_preview())
        .await?;
    Ok(())
}

/// Top result, then up to two "See also" links, as an HTML-mode message.
fn render_entries(entries: &[String]) -> String {
    let mut first = entries[0].clone();
    // A trailing ')' confuses chat auto-linking; percent-escape it
    if first.ends_with(')') {
        first.truncate(first.len() - 1);
        first.push_str("%29");
    }

    let see_also: Vec<String> = entries
        .iter()
        .skip(1)
        .take(2)
        .map(|url| html_escape(url))
        .collect();
    if see_also.is_empty() {
        html_escape(&first)
    } else {
        format!(
            "{}\n\n<b>See also:</b>\n{}",
            html_escape(&first),
            see_also.join("\n")
        )
    }
}

/// Render a card as a Telegram HTML-mode message. All scraped text goes
/// through entity escaping.
fn render_card(card: &Card) -> String {
    let mut out = String::new();
    if let Some(ref thumbnail) = card.thumbnail {
        // Zero-width-space link: the client previews the image without
        // showing any link text
        out.push_str(&format!(
            "<a href=\"{}\">\u{200b}</a>",
            html_escape_attr(thumbnail)
        ));
    }
    out.push_str(&format!("<b>{}</b>", html_escape(&card.title)));
    if !card.description.is_empty() {
        out.push('\n');
        if card.italic_description {
            out.push_str(&format!("<i>{}</i>", html_escape(&card.description)));
        } else {
            out.push_str(&html_escape(&card.description));
        }
    }
    for field in &card.fields {
        out.push_str(&format!(
            "\n\n<b>{}</b>\n{}",
            html_escape(&field.name),
            html_escape(&field.value)
        ));
    }
    out
}

fn no_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}
