use serde::{Deserialize, Serialize};

/// One entry of the note translation table: an annotation token typed by the
/// operator and the replacement emitted into the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteTranslation {
    pub before: String,
    pub after: String,
}

/// Parser behavior configured by the operator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Annotation token that marks a line as "fetch photos" (e.g. "фото").
    /// An empty marker disables photo fetching entirely.
    pub photo_marker: String,

    /// Notes applied to a link line that has no notes of its own and no
    /// carried-forward heading notes.
    pub default_notes: Vec<String>,

    /// Token translation table, applied to `notes` only. Unmapped tokens
    /// pass through unchanged.
    pub translations: Vec<NoteTranslation>,
}

impl ParserSettings {
    /// Translate a single annotation token through the table.
    pub fn translate<'a>(&'a self, token: &'a str) -> &'a str {
        self.translations
            .iter()
            .find(|t| t.before == token)
            .map_or(token, |t| t.after.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn translate_maps_known_tokens_only() {
        let settings = ParserSettings {
            translations: vec![NoteTranslation {
                before: "реклама".into(),
                after: "ad".into(),
            }],
            ..Default::default()
        };
        assert_eq!(settings.translate("реклама"), "ad");
        assert_eq!(settings.translate("новости"), "новости");
    }

    #[test]
    fn deserialize_with_defaults() {
        let settings: ParserSettings = serde_json::from_str("{}").unwrap();
        assert!(settings.photo_marker.is_empty());
        assert!(settings.default_notes.is_empty());
        assert!(settings.translations.is_empty());
    }
}
