use std::path::Path;

use {async_trait::async_trait, chrono::{DateTime, Utc}};

use crate::error::Result;

/// Reference to a downloadable photo attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRef {
    /// Direct URL of the image file.
    pub url: String,
    /// File name to store the download under, derived from the URL.
    pub file_name: String,
}

/// Link-preview block attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPreview {
    pub site_name: String,
    pub title: String,
    pub description: String,
}

/// Who a message was forwarded from.
///
/// [`EmbedSource`](crate::EmbedSource) only sees the rendered name and so
/// only produces [`Forward::Name`]; the `User` and `Channel` variants are
/// for sources with structured forward metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Forward {
    User {
        first_name: String,
        last_name: String,
    },
    Channel {
        title: String,
    },
    /// Free-text name, e.g. a hidden account.
    Name(String),
}

impl Forward {
    /// Render for the report's Repost column.
    pub fn display(&self) -> String {
        match self {
            Self::User {
                first_name,
                last_name,
            } => format!("{first_name} {last_name}"),
            Self::Channel { title } => title.clone(),
            Self::Name(name) => name.clone(),
        }
    }
}

/// One message retrieved from the content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMessage {
    pub text: String,
    pub date: DateTime<Utc>,
    pub photo: Option<PhotoRef>,
    pub link_preview: Option<LinkPreview>,
    pub forward: Option<Forward>,
}

/// Result of fetching one post id set from a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSet {
    pub channel_title: String,
    /// Messages in request order. The first entry is the primary post;
    /// sibling ids that do not exist are simply absent.
    pub messages: Vec<SourceMessage>,
}

/// Remote content source. Timeouts and authentication are this
/// collaborator's concern, not the pipeline's.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch the messages for `post_ids` from `channel`. `Ok(None)` means
    /// the primary post does not exist.
    async fn fetch_posts(&self, channel: &str, post_ids: &[i64]) -> Result<Option<PostSet>>;

    /// Download a photo into `dest_dir` and return the path of the stored
    /// file relative to that directory.
    async fn fetch_photo(&self, photo: &PhotoRef, dest_dir: &Path) -> Result<String>;
}
