use {
    chrono::Local,
    std::{
        path::{Path, PathBuf},
        sync::Arc,
    },
    tracing::info,
};

use {
    postdesk_parser::{ParserSettings, parse},
    postdesk_source::{ContentSource, PostCache},
};

use crate::error::Result;

pub const REPORT_FILENAME: &str = "report.csv";
pub const FAILED_REPORT_FILENAME: &str = "failedReport.csv";

/// What an export run produced. Both files always exist; either table may
/// hold only its header.
#[derive(Debug)]
pub struct ExportOutcome {
    pub folder: PathBuf,
    pub report: PathBuf,
    pub failed_report: PathBuf,
    pub resolved: usize,
    pub failed: usize,
}

/// Run the full pipeline over the operator's accumulated text: parse,
/// resolve every primary record, and write both report tables into a fresh
/// dated folder. Quarantined duplicates are not exported.
pub async fn run(
    input_text: &str,
    settings: &ParserSettings,
    source: Arc<dyn ContentSource>,
    cache: Arc<dyn PostCache>,
    reports_dir: &Path,
) -> Result<ExportOutcome> {
    let outcome = parse(input_text, settings);
    let folder = fresh_export_folder(reports_dir)?;
    info!(
        folder = %folder.display(),
        records = outcome.records.len(),
        duplicates = outcome.duplicates.len(),
        "export started"
    );

    let aggregation =
        postdesk_aggregator::resolve(outcome.records, source, cache, &folder).await;

    let report = folder.join(REPORT_FILENAME);
    let failed_report = folder.join(FAILED_REPORT_FILENAME);
    std::fs::write(&report, postdesk_report::render(&aggregation.resolved))?;
    std::fs::write(&failed_report, postdesk_report::render(&aggregation.failed))?;

    info!(
        folder = %folder.display(),
        resolved = aggregation.resolved.len(),
        failed = aggregation.failed.len(),
        "export finished"
    );
    Ok(ExportOutcome {
        folder,
        report,
        failed_report,
        resolved: aggregation.resolved.len(),
        failed: aggregation.failed.len(),
    })
}

/// Create a new folder named after today's date; append " (N)" until an
/// unused name is found so reruns never overwrite earlier exports.
fn fresh_export_folder(reports_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(reports_dir)?;
    let date = Local::now().format("%Y-%m-%d").to_string();

    let mut candidate = reports_dir.join(&date);
    let mut suffix = 1u32;
    while candidate.exists() {
        candidate = reports_dir.join(format!("{date} ({suffix})"));
        suffix += 1;
    }
    std::fs::create_dir(&candidate)?;
    Ok(candidate)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        async_trait::async_trait,
        chrono::{TimeZone, Utc},
    };

    use postdesk_source::{MemoryPostCache, PhotoRef, PostSet, SourceMessage};

    use super::*;

    struct AlwaysResolves;

    #[async_trait]
    impl ContentSource for AlwaysResolves {
        async fn fetch_posts(
            &self,
            _channel: &str,
            _post_ids: &[i64],
        ) -> postdesk_source::Result<Option<PostSet>> {
            Ok(Some(PostSet {
                channel_title: "Новости".into(),
                messages: vec![SourceMessage {
                    text: "текст".into(),
                    date: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 0).unwrap(),
                    photo: None,
                    link_preview: None,
                    forward: None,
                }],
            }))
        }

        async fn fetch_photo(
            &self,
            photo: &PhotoRef,
            _dest_dir: &Path,
        ) -> postdesk_source::Result<String> {
            Ok(photo.file_name.clone())
        }
    }

    #[tokio::test]
    async fn both_report_files_exist_even_without_failures() {
        let dir = tempfile::tempdir().unwrap();

        let outcome = run(
            "t.me/news/42 спорт",
            &ParserSettings::default(),
            Arc::new(AlwaysResolves),
            Arc::new(MemoryPostCache::default()),
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.resolved, 1);
        assert_eq!(outcome.failed, 0);
        assert!(outcome.report.is_file());
        // the failed table is always written (and delivered), header-only here
        assert!(outcome.failed_report.is_file());
        let failed = std::fs::read_to_string(&outcome.failed_report).unwrap();
        assert_eq!(failed, "Автор\tRepost\tДата\tСообщение\tСсылка\n");
    }

    #[test]
    fn export_folders_never_collide() {
        let dir = tempfile::tempdir().unwrap();

        let first = fresh_export_folder(dir.path()).unwrap();
        let second = fresh_export_folder(dir.path()).unwrap();
        let third = fresh_export_folder(dir.path()).unwrap();

        assert!(first.is_dir());
        assert!(second.is_dir());
        assert_ne!(first, second);
        assert_ne!(second, third);
        assert!(second.file_name().unwrap().to_str().unwrap().ends_with("(1)"));
        assert!(third.file_name().unwrap().to_str().unwrap().ends_with("(2)"));
    }

    #[test]
    fn reports_dir_is_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let folder = fresh_export_folder(&nested).unwrap();
        assert!(folder.starts_with(&nested));
    }
}
