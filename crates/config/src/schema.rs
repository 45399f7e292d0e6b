use std::path::PathBuf;

use {
    postdesk_parser::ParserSettings,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Top-level postdesk configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostdeskConfig {
    pub telegram: TelegramConfig,
    /// Parser behavior: photo marker, default notes, translation table.
    pub notes: ParserSettings,
    pub report: ReportConfig,
}

/// Bot credentials and operator-facing knobs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Shared secret an operator must send to authorize their chat.
    #[serde(serialize_with = "serialize_secret")]
    pub password: Secret<String>,

    /// Entries shown per page when listing links.
    pub page_lines: usize,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .field("page_lines", &self.page_lines)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            password: Secret::new(String::new()),
            page_lines: 10,
        }
    }
}

/// Where exports and the post cache live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Root directory for export folders.
    pub dir: PathBuf,
    /// Directory of the resolved-post cache.
    pub cache_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("reports"),
            cache_dir: PathBuf::from("data/cache/posts"),
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
