use std::{path::Path, sync::LazyLock};

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    scraper::{ElementRef, Html, Selector},
    tracing::debug,
};

use crate::{
    error::{Error, Result},
    message::{ContentSource, Forward, LinkPreview, PhotoRef, PostSet, SourceMessage},
};

macro_rules! selector {
    ($name:ident, $css:expr) => {
        static $name: LazyLock<Selector> = LazyLock::new(|| {
            #[allow(clippy::expect_used)]
            Selector::parse($css).expect("selector is valid")
        });
    };
}

selector!(MESSAGE, "div.tgme_widget_message");
selector!(TEXT, "div.tgme_widget_message_text");
selector!(OWNER, ".tgme_widget_message_owner_name");
selector!(TIME, "time[datetime]");
selector!(PHOTO, "a.tgme_widget_message_photo_wrap");
selector!(FORWARD, ".tgme_widget_message_forwarded_from_name");
selector!(PREVIEW_SITE, ".link_preview_site_name");
selector!(PREVIEW_TITLE, ".link_preview_title");
selector!(PREVIEW_DESC, ".link_preview_description");

/// Content source backed by the public t.me embed pages.
///
/// Resolves public channels without authentication; private channels and
/// `t.me/c/...` links are invisible to it. Request timeouts come from the
/// underlying HTTP client.
pub struct EmbedSource {
    client: reqwest::Client,
    base_url: String,
}

impl EmbedSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, "https://t.me")
    }

    /// Point the source at a different host. Used by tests.
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_one(&self, channel: &str, post_id: i64) -> Result<Option<ParsedEmbed>> {
        let url = format!("{}/{channel}/{post_id}?embed=1&mode=tme", self.base_url);
        let html = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_embed(&html)
    }
}

#[async_trait]
impl ContentSource for EmbedSource {
    async fn fetch_posts(&self, channel: &str, post_ids: &[i64]) -> Result<Option<PostSet>> {
        let Some((&primary_id, sibling_ids)) = post_ids.split_first() else {
            return Ok(None);
        };

        let Some(primary) = self.fetch_one(channel, primary_id).await? else {
            debug!(channel, post_id = primary_id, "post not found on embed page");
            return Ok(None);
        };

        let mut messages = vec![primary.message];
        for &id in sibling_ids {
            if let Some(sibling) = self.fetch_one(channel, id).await? {
                messages.push(sibling.message);
            } else {
                debug!(channel, post_id = id, "sibling post not found, skipping");
            }
        }

        Ok(Some(PostSet {
            channel_title: primary.channel_title,
            messages,
        }))
    }

    async fn fetch_photo(&self, photo: &PhotoRef, dest_dir: &Path) -> Result<String> {
        let bytes = self
            .client
            .get(&photo.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        tokio::fs::create_dir_all(dest_dir).await?;
        tokio::fs::write(dest_dir.join(&photo.file_name), &bytes).await?;
        Ok(photo.file_name.clone())
    }
}

struct ParsedEmbed {
    channel_title: String,
    message: SourceMessage,
}

/// Extract the message from an embed page. `Ok(None)` when the page carries
/// no message (deleted or never existed).
fn parse_embed(html: &str) -> Result<Option<ParsedEmbed>> {
    let document = Html::parse_document(html);

    let Some(widget) = document.select(&MESSAGE).next() else {
        return Ok(None);
    };
    let Some(datetime) = widget
        .select(&TIME)
        .next()
        .and_then(|t| t.value().attr("datetime"))
    else {
        return Ok(None);
    };
    let date = DateTime::parse_from_rfc3339(datetime)
        .map_err(|e| Error::message(format!("bad embed timestamp {datetime:?}: {e}")))?
        .with_timezone(&Utc);

    let channel_title = widget
        .select(&OWNER)
        .next()
        .map(|e| element_text(e).trim().to_string())
        .unwrap_or_default();

    let text = widget
        .select(&TEXT)
        .next()
        .map(|e| element_text(e))
        .unwrap_or_default();

    let photo = widget
        .select(&PHOTO)
        .next()
        .and_then(|e| e.value().attr("style"))
        .and_then(style_background_url)
        .map(photo_ref);

    let forward = widget
        .select(&FORWARD)
        .next()
        .map(|e| Forward::Name(element_text(e).trim().to_string()));

    let link_preview = parse_link_preview(widget);

    Ok(Some(ParsedEmbed {
        channel_title,
        message: SourceMessage {
            text,
            date,
            photo,
            link_preview,
            forward,
        },
    }))
}

fn parse_link_preview(widget: ElementRef<'_>) -> Option<LinkPreview> {
    let site_name = widget
        .select(&PREVIEW_SITE)
        .next()
        .map(|e| element_text(e).trim().to_string());
    let title = widget
        .select(&PREVIEW_TITLE)
        .next()
        .map(|e| element_text(e).trim().to_string());
    let description = widget
        .select(&PREVIEW_DESC)
        .next()
        .map(|e| element_text(e).trim().to_string());

    if site_name.is_none() && title.is_none() && description.is_none() {
        return None;
    }
    Some(LinkPreview {
        site_name: site_name.unwrap_or_default(),
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
    })
}

/// Text content with `<br>` rendered as a newline.
fn element_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        if let Some(text) = node.value().as_text() {
            out.push_str(text);
        } else if node.value().as_element().is_some_and(|e| e.name() == "br") {
            out.push('\n');
        }
    }
    out
}

/// Pull the URL out of an inline `background-image:url('...')` style.
fn style_background_url(style: &str) -> Option<&str> {
    let start = style.find("url('")? + "url('".len();
    let end = style[start..].find('\'')? + start;
    Some(&style[start..end])
}

fn photo_ref(url: &str) -> PhotoRef {
    let file_name = url
        .rsplit('/')
        .next()
        .and_then(|segment| segment.split('?').next())
        .map(|name| {
            name.chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
                .collect::<String>()
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "photo.jpg".to_string());
    PhotoRef {
        url: url.to_string(),
        file_name,
    }
}
