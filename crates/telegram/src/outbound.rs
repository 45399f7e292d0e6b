use {
    std::{future::Future, path::Path, time::Duration},
    teloxide::{
        Bot, RequestError,
        prelude::Requester,
        types::{ChatId, InputFile},
    },
    tracing::warn,
};

use crate::error::Result;

const RETRY_AFTER_MAX_RETRIES: usize = 4;
/// Telegram rejects text messages longer than this.
const MAX_MESSAGE_LEN: usize = 4096;

/// Thin sending wrapper: chunks long texts and retries rate-limited
/// requests with the server-provided backoff.
#[derive(Clone)]
pub struct Outbound {
    bot: Bot,
}

impl Outbound {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        for chunk in chunk_text(text, MAX_MESSAGE_LEN) {
            self.with_retry(chat_id, "send_message", || {
                let req = self.bot.send_message(chat_id, chunk.clone());
                async move { req.await }
            })
            .await?;
        }
        Ok(())
    }

    pub async fn send_document(&self, chat_id: ChatId, path: &Path) -> Result<()> {
        self.with_retry(chat_id, "send_document", || {
            let req = self.bot.send_document(chat_id, InputFile::file(path));
            async move { req.await }
        })
        .await?;
        Ok(())
    }

    async fn with_retry<T, F, Fut>(
        &self,
        chat_id: ChatId,
        operation: &'static str,
        mut request: F,
    ) -> std::result::Result<T, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RequestError>>,
    {
        let mut retries = 0usize;

        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        return Err(err);
                    };

                    if retries >= RETRY_AFTER_MAX_RETRIES {
                        warn!(
                            chat_id = chat_id.0,
                            operation,
                            retries,
                            retry_after_secs = wait.as_secs(),
                            "telegram rate limit persisted after retries"
                        );
                        return Err(err);
                    }

                    retries += 1;
                    warn!(
                        chat_id = chat_id.0,
                        operation,
                        retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                },
            }
        }
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

/// Split on line boundaries into chunks at most `max_len` bytes. A single
/// oversized line is split at char boundaries.
fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in text.split('\n') {
        if !current.is_empty() && current.len() + 1 + line.len() > max_len {
            chunks.push(std::mem::take(&mut current));
        }
        if line.len() > max_len {
            for ch in line.chars() {
                if current.len() + ch.len_utf8() > max_len {
                    chunks.push(std::mem::take(&mut current));
                }
                current.push(ch);
            }
            continue;
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
