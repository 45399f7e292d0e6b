use std::{
    collections::{HashMap, HashSet},
    sync::LazyLock,
};

use regex::Regex;

use crate::{record::LinkRecord, settings::ParserSettings};

/// Link grammar: a known host marker followed by `channel[/postId]`.
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?:(?:t|telegram)\.me|tgstat\.ru/channel)/@?([/A-Za-z0-9_+-]+)")
        .expect("link regex is valid")
});

/// Annotation tokens: runs of letters in the operator's working script
/// (Cyrillic). Deliberately not generalized to all Unicode letters.
static NOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"[а-яА-ЯёЁ]+").expect("note regex is valid")
});

/// Photo positions: standalone single digits.
static POSITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\b[0-9]\b").expect("position regex is valid")
});

/// Heading lines are carried-forward notes; `key: value` lines are not.
static KEY_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[^\s:]+:\s").expect("key-value regex is valid")
});

/// Result of one parse pass over the full input text.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    /// Primary records in input order. Links whose `channel/post` pair
    /// occurs more than once are fully removed from this list.
    pub records: Vec<LinkRecord>,
    /// Formatted lines for every occurrence of a duplicated pair, sorted
    /// lexicographically.
    pub duplicates: Vec<String>,
}

impl ParseOutcome {
    /// Canonical text form: primary lines, then a blank line, then the
    /// sorted duplicates.
    pub fn formatted_text(&self) -> String {
        let primary: Vec<String> = self.records.iter().map(LinkRecord::formatted).collect();
        if self.duplicates.is_empty() {
            primary.join("\n")
        } else {
            format!("{}\n\n{}", primary.join("\n"), self.duplicates.join("\n"))
        }
    }
}

/// Parse a free-text block into link records plus quarantined duplicates.
///
/// Per line: `//` comments, blank lines, and exact repeats of an earlier
/// raw line are dropped before matching. A line without a link but with
/// annotation tokens becomes the carried-forward note heading for following
/// link lines that have no notes of their own; the configured default notes
/// are the last resort.
pub fn parse(text: &str, settings: &ParserSettings) -> ParseOutcome {
    let mut seen_lines: HashSet<&str> = HashSet::new();
    let mut heading_notes: Vec<String> = Vec::new();
    let mut ordered: Vec<LinkRecord> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        if !seen_lines.insert(trimmed) {
            continue;
        }

        let Some((channel, post_id, full_link)) = extract_link(line) else {
            if !KEY_VALUE_RE.is_match(trimmed) {
                let tokens = note_tokens(line);
                if !tokens.is_empty() {
                    heading_notes = tokens;
                }
            }
            continue;
        };

        let own_tokens = note_tokens(line);
        let tokens = if own_tokens.is_empty() {
            if heading_notes.is_empty() {
                settings.default_notes.clone()
            } else {
                heading_notes.clone()
            }
        } else {
            own_tokens
        };

        let mut fetch_photos = false;
        let mut photo_positions: Vec<String> = Vec::new();
        let mut note_list = tokens.clone();
        if !settings.photo_marker.is_empty()
            && let Some(at) = note_list.iter().position(|t| *t == settings.photo_marker)
        {
            note_list.remove(at);
            fetch_photos = true;
            photo_positions = POSITION_RE
                .find_iter(line)
                .map(|m| m.as_str().to_string())
                .collect();
        }

        let notes = note_list
            .iter()
            .map(|t| settings.translate(t).to_string())
            .collect();
        let mut raw_notes = tokens;
        raw_notes.extend(photo_positions.iter().cloned());

        ordered.push(LinkRecord {
            full_link,
            channel,
            post_id,
            raw_notes,
            notes,
            fetch_photos,
            photo_positions,
        });
    }

    quarantine_duplicates(ordered)
}

/// Split records into primary and duplicates. Every occurrence of a
/// duplicated `channel/post` pair — the first one included — moves to the
/// duplicate list, so duplicates are never silently kept in the primary.
fn quarantine_duplicates(ordered: Vec<LinkRecord>) -> ParseOutcome {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in &ordered {
        *counts.entry(record.dedup_key()).or_insert(0) += 1;
    }

    let mut records = Vec::new();
    let mut duplicates = Vec::new();
    for record in ordered {
        if counts.get(&record.dedup_key()).copied().unwrap_or(0) > 1 {
            duplicates.push(record.formatted());
        } else {
            records.push(record);
        }
    }
    duplicates.sort();

    ParseOutcome {
        records,
        duplicates,
    }
}

/// Extract `(channel, post_id, full_link)` from a line, or `None` when the
/// line does not match the link grammar. A link without a numeric post id
/// is not a record.
fn extract_link(line: &str) -> Option<(String, i64, String)> {
    let captures = LINK_RE.captures(line)?;
    let path = captures.get(1)?.as_str().trim_end_matches('/');
    let mut segments = path.split('/');
    let channel = segments.next()?;
    let post_id: i64 = segments.next()?.parse().ok()?;
    if channel.is_empty() {
        return None;
    }
    Some((
        channel.to_string(),
        post_id,
        format!("https://t.me/{channel}/{post_id}"),
    ))
}

fn note_tokens(line: &str) -> Vec<String> {
    NOTE_RE
        .find_iter(line)
        .map(|m| m.as_str().to_string())
        .collect()
}
