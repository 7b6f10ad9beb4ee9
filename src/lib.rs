//! scout - a small Telegram bot that answers a Google search command.

pub mod bot;
pub mod commands;
pub mod config;
pub mod logging;
pub mod search;
