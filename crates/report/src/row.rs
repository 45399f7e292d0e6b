use {
    chrono::{DateTime, Datelike, Timelike, Utc},
    serde::{Deserialize, Serialize},
};

/// One row of the report: either a fully resolved post or a failed link
/// carrying just enough for the operator to re-submit the line.
///
/// Rows are serde-serializable because resolved rows double as cache
/// values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Channel title.
    pub title: Option<String>,
    /// Who the post was forwarded from, if anyone.
    pub forwarded_from: Option<String>,
    /// Post timestamp as `YYYYMMDDHHmm`.
    pub date: Option<String>,
    /// Assembled message body; may span multiple lines.
    pub message: Option<String>,
    pub full_link: String,
    pub notes: Vec<String>,
}

impl ReportRow {
    pub fn resolved(
        title: String,
        forwarded_from: Option<String>,
        date: DateTime<Utc>,
        message: String,
        full_link: String,
        notes: Vec<String>,
    ) -> Self {
        Self {
            title: Some(title),
            forwarded_from,
            date: Some(format_date(date)),
            message: Some(message),
            full_link,
            notes,
        }
    }

    /// A failed row keeps only the link and the raw notes.
    pub fn failed(full_link: String, raw_notes: Vec<String>) -> Self {
        Self {
            title: None,
            forwarded_from: None,
            date: None,
            message: None,
            full_link,
            notes: raw_notes,
        }
    }
}

/// `YYYYMMDDHHmm`, zero-padded, no separators.
fn format_date(date: DateTime<Utc>) -> String {
    format!(
        "{:04}{:02}{:02}{:02}{:02}",
        date.year(),
        date.month(),
        date.day(),
        date.hour(),
        date.minute()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn date_is_zero_padded() {
        let date = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 59).unwrap();
        let row = ReportRow::resolved(
            "Channel".into(),
            None,
            date,
            "body".into(),
            "https://t.me/c1/1".into(),
            vec![],
        );
        assert_eq!(row.date.as_deref(), Some("202403070905"));
    }

    #[test]
    fn cache_value_roundtrip() {
        let row = ReportRow::resolved(
            "Channel".into(),
            Some("Иван Иванов".into()),
            Utc::now(),
            "текст".into(),
            "https://t.me/c1/1".into(),
            vec!["реклама".into()],
        );
        let json = serde_json::to_string(&row).unwrap();
        let back: ReportRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}
