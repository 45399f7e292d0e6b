use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    futures::future::join_all,
    tracing::{info, warn},
};

use {
    postdesk_parser::LinkRecord,
    postdesk_report::ReportRow,
    postdesk_source::{ContentSource, PostCache, PostSet},
};

/// Channel name of `t.me/c/...` links: the numeric internal id cannot be
/// resolved by name, so such records always fail.
const AMBIGUOUS_CHANNEL: &str = "c";

/// Outcome of one aggregation run.
#[derive(Debug, Default)]
pub struct Aggregation {
    pub resolved: Vec<ReportRow>,
    pub failed: Vec<ReportRow>,
}

/// Resolve every record concurrently, one task per record, and gather all
/// outcomes before returning. Output order follows completion, not input —
/// callers must not rely on it. Downloaded photos land in `photos_dir`.
pub async fn resolve(
    records: Vec<LinkRecord>,
    source: Arc<dyn ContentSource>,
    cache: Arc<dyn PostCache>,
    photos_dir: &Path,
) -> Aggregation {
    let mut handles = Vec::with_capacity(records.len());
    for record in records {
        let source = Arc::clone(&source);
        let cache = Arc::clone(&cache);
        let photos_dir = photos_dir.to_path_buf();
        let fallback = (record.full_link.clone(), record.raw_notes.clone());
        let handle = tokio::spawn(resolve_record(record, source, cache, photos_dir));
        handles.push((handle, fallback));
    }

    let mut aggregation = Aggregation::default();
    for (outcome, (full_link, raw_notes)) in join_all(
        handles
            .into_iter()
            .map(|(handle, fallback)| async move { (handle.await, fallback) }),
    )
    .await
    {
        match outcome {
            Ok(Ok(row)) => aggregation.resolved.push(row),
            Ok(Err(row)) => aggregation.failed.push(row),
            Err(e) => {
                warn!(full_link, error = %e, "resolution task failed");
                aggregation
                    .failed
                    .push(ReportRow::failed(full_link, raw_notes));
            },
        }
    }

    info!(
        resolved = aggregation.resolved.len(),
        failed = aggregation.failed.len(),
        "aggregation finished"
    );
    aggregation
}

/// Resolve one record. `Err` carries the failed row for the report.
async fn resolve_record(
    record: LinkRecord,
    source: Arc<dyn ContentSource>,
    cache: Arc<dyn PostCache>,
    photos_dir: PathBuf,
) -> Result<ReportRow, ReportRow> {
    let failed = || ReportRow::failed(record.full_link.clone(), record.raw_notes.clone());

    if record.channel == AMBIGUOUS_CHANNEL {
        warn!(full_link = record.full_link, "ambiguous private-channel link");
        return Err(failed());
    }

    let cache_key = format!(
        "{}_{}_{}",
        record.channel,
        record.post_id,
        record.photo_positions.join(",")
    );
    match cache.get(&cache_key).await {
        Ok(Some(row)) => {
            info!(full_link = record.full_link, "resolved from cache");
            return Ok(row);
        },
        Ok(None) => {},
        Err(e) => warn!(full_link = record.full_link, error = %e, "cache read failed"),
    }

    let post_ids = target_post_ids(&record);
    let posts = match source.fetch_posts(&record.channel, &post_ids).await {
        Ok(Some(posts)) if !posts.messages.is_empty() => posts,
        Ok(_) => {
            warn!(full_link = record.full_link, "post not found");
            return Err(failed());
        },
        Err(e) => {
            warn!(full_link = record.full_link, error = %e, "fetch failed");
            return Err(failed());
        },
    };

    // Photo assembly is all-or-nothing: an absent album sibling fails the
    // record just like a failed download would.
    if record.fetch_photos && posts.messages.len() < post_ids.len() {
        warn!(
            full_link = record.full_link,
            requested = post_ids.len(),
            received = posts.messages.len(),
            "album sibling missing"
        );
        return Err(failed());
    }

    let row = assemble_row(&record, posts, source.as_ref(), &photos_dir)
        .await
        .map_err(|e| {
            warn!(full_link = record.full_link, error = %e, "photo fetch failed");
            failed()
        })?;

    if let Err(e) = cache.put(&cache_key, &row).await {
        warn!(full_link = record.full_link, error = %e, "cache write failed");
    }
    info!(full_link = record.full_link, "resolved");
    Ok(row)
}

/// The base post id plus `post_id + position − 1` for every photo position
/// (album siblings live at consecutive ids).
fn target_post_ids(record: &LinkRecord) -> Vec<i64> {
    let mut ids = vec![record.post_id];
    ids.extend(
        record
            .photo_positions
            .iter()
            .filter_map(|p| p.parse::<i64>().ok())
            .map(|position| record.post_id + position - 1),
    );
    ids
}

/// Build the resolved row. Photo downloads are all-or-nothing: any failure
/// fails the whole record.
async fn assemble_row(
    record: &LinkRecord,
    posts: PostSet,
    source: &dyn ContentSource,
    photos_dir: &Path,
) -> postdesk_source::Result<ReportRow> {
    let Some((first, siblings)) = posts.messages.split_first() else {
        return Err(postdesk_source::Error::message("empty post set"));
    };

    let mut lines: Vec<String> = vec![first.text.clone()];

    if record.fetch_photos && first.photo.is_some() {
        let include_primary =
            record.photo_positions.is_empty() || record.photo_positions.iter().any(|p| p == "1");
        if include_primary && let Some(photo) = &first.photo {
            lines.push(source.fetch_photo(photo, photos_dir).await?);
        }
        for sibling in siblings {
            let photo = sibling.photo.as_ref().ok_or_else(|| {
                postdesk_source::Error::message("sibling post carries no photo")
            })?;
            lines.push(source.fetch_photo(photo, photos_dir).await?);
        }
    }

    if let Some(preview) = &first.link_preview {
        lines.push(preview.site_name.clone());
        lines.push(preview.title.clone());
        lines.push(preview.description.clone());
    }

    let message = lines
        .join("\n")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(ReportRow::resolved(
        posts.channel_title,
        first.forward.as_ref().map(|f| f.display()),
        first.date,
        message,
        record.full_link.clone(),
        record.notes.clone(),
    ))
}
