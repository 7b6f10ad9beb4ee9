//! Session bootstrap: builds the bot from config, resolves command
//! prefixes, and runs the dispatcher.

use std::sync::Arc;
use std::time::Instant;

use regex::Regex;
use teloxide::prelude::*;
use tracing::{info, warn};

use crate::commands;
use crate::config::Config;
use crate::search::SearchClient;

/// Shared, immutable state handed to every command handler.
pub struct BotState {
    pub config: Config,
    /// All accepted prefixes (configured ones plus the bot mention),
    /// longest first.
    pub prefixes: Vec<String>,
    pub boot_time: Instant,
    pub search: SearchClient,
    /// Chat invite links are never a legitimate search query.
    pub invite_pattern: Regex,
}

/// Accepted prefixes: the configured ones plus "@botname ".
///
/// Sorted longest first. Matching shortest-first breaks same-character
/// prefixes of different lengths: with [":", "::"] the input "::help"
/// would strip ":" and look up a command named ":help".
pub fn resolve_prefixes(configured: &[String], bot_username: Option<&str>) -> Vec<String> {
    let mut prefixes: Vec<String> = configured.to_vec();
    if let Some(username) = bot_username {
        prefixes.push(format!("@{username} "));
    }
    prefixes.sort_by_key(|p| std::cmp::Reverse(p.len()));
    prefixes
}

pub async fn run(config: Config) {
    let mut bot = Bot::new(&config.token);

    // Merge session params from the config into the client
    if let Some(ref api_url) = config.params.api_url {
        match reqwest::Url::parse(api_url) {
            Ok(url) => bot = bot.set_api_url(url),
            // Already validated at load time, but don't die over it
            Err(e) => warn!("Ignoring bot.params.api_url: {e}"),
        }
    }

    let bot_username = match bot.get_me().await {
        Ok(me) => {
            info!("Bot user ID: {}, username: @{}", me.id, me.username());
            Some(me.username().to_string())
        }
        Err(e) => {
            warn!("Failed to get bot info: {e}");
            None
        }
    };

    let prefixes = resolve_prefixes(&config.prefixes, bot_username.as_deref());
    info!("Successfully initialized the bot with provided params!");

    let search = SearchClient::new(config.module("search"));
    let state = Arc::new(BotState {
        config,
        prefixes,
        boot_time: Instant::now(),
        search,
        invite_pattern: Regex::new(r"(?i)\b(?:t|telegram)\.me/\S+").unwrap(),
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    info!("The bot is now ready for commands!");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_message(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else { return Ok(()) };
    let Some(call) = commands::parse_command(text, &state.prefixes) else {
        return Ok(());
    };

    match call.name {
        "debug" | "eval" => commands::debug::run(&bot, &msg, &state, call.args).await,
        "g" | "google" => commands::search::run(&bot, &msg, &state, call.args).await,
        "uptime" => commands::uptime(&bot, &msg, &state).await,
        "help" => commands::help(&bot, &msg, &state).await,
        // Anything else is not ours to answer
        _ => Ok(()),
    }
}
