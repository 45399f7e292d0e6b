/// Normalized reference to one post in a remote channel, extracted from a
/// single input line.
///
/// Records are created per parse pass and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// Canonical URL form, e.g. `https://t.me/news/42`.
    pub full_link: String,
    /// Channel name from the link path. Never empty.
    pub channel: String,
    /// Post id from the link path.
    pub post_id: i64,
    /// Every annotation token found on the source line, in original order,
    /// photo-position tokens included.
    pub raw_notes: Vec<String>,
    /// `raw_notes` passed through the translation table, photo marker
    /// excluded.
    pub notes: Vec<String>,
    /// True iff the configured photo marker token was present.
    pub fetch_photos: bool,
    /// 1-based positions of the photos to fetch from a multi-photo post.
    /// Empty means "all/first".
    pub photo_positions: Vec<String>,
}

impl LinkRecord {
    /// Identity used for duplicate detection within one parse pass.
    pub fn dedup_key(&self) -> String {
        format!("{}/{}", self.channel, self.post_id)
    }

    /// Canonical single-line form: the full link followed by the raw notes.
    pub fn formatted(&self) -> String {
        if self.raw_notes.is_empty() {
            self.full_link.clone()
        } else {
            format!("{} {}", self.full_link, self.raw_notes.join(" "))
        }
    }
}
