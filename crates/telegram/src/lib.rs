//! Telegram operator surface for postdesk.
//!
//! A long-lived bot session per operator chat: collects pasted link lists,
//! formats and paginates them, and exports tab-delimited reports built by
//! the aggregation pipeline. Uses teloxide with a manual long-polling loop.

pub mod bot;
pub mod command;
pub mod error;
pub mod export;
pub mod handlers;
pub mod outbound;
pub mod session;
pub mod state;

pub use {
    bot::start_polling,
    error::{Error, Result},
    state::BotState,
};
