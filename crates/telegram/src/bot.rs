use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {
    postdesk_config::PostdeskConfig,
    postdesk_source::{ContentSource, PostCache},
};

use crate::{command::Command, handlers, state::BotState};

/// Start the long-polling loop.
///
/// Spawns a background task that processes updates until the returned
/// `CancellationToken` is cancelled.
pub async fn start_polling(
    config: PostdeskConfig,
    source: Arc<dyn ContentSource>,
    cache: Arc<dyn PostCache>,
) -> anyhow::Result<CancellationToken> {
    // Client timeout must exceed the long-polling timeout (30s) so the HTTP
    // client doesn't abort the request before Telegram responds.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(std::time::Duration::from_secs(45))
        .build()?;
    let bot = Bot::with_client(config.telegram.token.expose_secret(), client);

    // Verify credentials and get the bot username.
    let me = bot.get_me().await?;
    let bot_username = me.username.clone();

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    // Register slash commands for autocomplete in Telegram clients.
    let commands: Vec<BotCommand> = Command::ALL
        .iter()
        .map(|c| BotCommand::new(c.token(), c.description()))
        .collect();
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(username = ?bot_username, "telegram bot connected (webhook cleared)");

    let cancel = CancellationToken::new();
    let state = Arc::new(BotState::new(bot.clone(), config, source, cache));

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        info!("starting telegram manual polling loop");
        let mut offset: i32 = 0;

        loop {
            if cancel_clone.is_cancelled() {
                info!("telegram polling stopped");
                break;
            }

            let result = bot
                .get_updates()
                .offset(offset)
                .timeout(30)
                .allowed_updates(vec![AllowedUpdate::Message])
                .await;

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                debug!(chat_id = msg.chat.id.0, "received telegram message");
                                handlers::handle_message(Arc::clone(&state), msg).await;
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                },
                Err(e) => {
                    // Another instance is polling with the same token; back
                    // off for good instead of fighting over updates.
                    let is_conflict =
                        matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates));

                    if is_conflict {
                        error!(
                            "telegram bot disabled: another instance is already running with this token"
                        );
                        cancel_clone.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                },
            }
        }
    });

    Ok(cancel)
}
