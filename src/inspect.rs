//! Inspecting bucket objects concurrently.

use std::io::Write;
use std::sync::Arc;

use aws_sdk_s3::Client;
use futures::future;
use futures::stream::{Stream, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use crate::content::DEFAULT_MAX_BYTES;
use crate::detector::{InspectConfig, Inspector};
use crate::error::{InspectError, Result};
use crate::report::{write_report, ObjectReport, OutputFormat};
use crate::storage::{fetch_object, list_objects_stream, KeyMatcher};

/// How objects are fetched, independent of what is looked for in them.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Objects fetched and inspected at once.
    pub concurrency: usize,
    /// Per-object limit on decoded bytes.
    pub max_bytes: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            concurrency: 8,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Fetches one object and runs the inspector over it. Failures end up in the report.
pub async fn inspect_object(
    client: &Client,
    bucket: &str,
    key: &str,
    inspector: &Inspector,
    max_bytes: u64,
) -> ObjectReport {
    match fetch_object(client, bucket, key, max_bytes).await {
        Ok(content) => {
            let findings = inspector.inspect(&content.text);
            debug!(key, findings = findings.len(), "inspected object");
            ObjectReport {
                bucket: bucket.to_string(),
                key: key.to_string(),
                findings,
                truncated: content.truncated,
                bytes_read: content.bytes_read,
                error: None,
            }
        }
        Err(e) => {
            warn!(key, error = %e, "failed to inspect object");
            ObjectReport::failed(bucket, key, e.to_string())
        }
    }
}

/**
    Inspects every object in `bucket` whose key matches `matcher`.

    Directory markers (keys ending in `/`) are skipped. Reports arrive in
    completion order; a listing failure arrives as an `Err` item.
*/
pub fn inspect_objects(
    client: Client,
    bucket: String,
    matcher: KeyMatcher,
    inspector: Arc<Inspector>,
    options: &ScanOptions,
) -> impl Stream<Item = Result<ObjectReport>> {
    let prefix = matcher.list_prefix().to_string();
    let max_bytes = options.max_bytes;
    let concurrency = options.concurrency.max(1);

    list_objects_stream(client.clone(), bucket.clone(), prefix)
        .filter(move |item| {
            let keep = match item {
                Ok(key) if key.ends_with('/') => {
                    debug!(key = %key, "skipping directory marker");
                    false
                }
                Ok(key) => matcher.is_match(key),
                Err(_) => true,
            };
            future::ready(keep)
        })
        .map(move |item| {
            let client = client.clone();
            let bucket = bucket.clone();
            let inspector = Arc::clone(&inspector);
            async move {
                let key = item?;
                Ok::<_, InspectError>(
                    inspect_object(&client, &bucket, &key, &inspector, max_bytes).await,
                )
            }
        })
        .buffer_unordered(concurrency)
}

/**
    Inspects the objects matching `pattern` and prints their findings to `out`.

    # Arguments

    * `client` - AWS S3 client.
    * `bucket` - Bucket to inspect.
    * `pattern` - Object key or glob; `*` selects every object.
    * `config` - Info types and reporting thresholds.
    * `options` - Concurrency and size limits.
    * `out` - Where the text report is written.

    # Returns

    The reports, sorted by key.
*/
pub async fn inspect_bucket<W: Write>(
    client: &Client,
    bucket: &str,
    pattern: &str,
    config: InspectConfig,
    options: &ScanOptions,
    out: &mut W,
) -> Result<Vec<ObjectReport>> {
    let matcher = KeyMatcher::new(pattern)?;
    let inspector = Arc::new(Inspector::new(config));

    let mut reports: Vec<ObjectReport> = inspect_objects(
        client.clone(),
        bucket.to_string(),
        matcher,
        inspector,
        options,
    )
    .try_collect()
    .await?;
    reports.sort_by(|a, b| a.key.cmp(&b.key));

    if reports.is_empty() {
        writeln!(out, "No objects matched {}", pattern)?;
    }
    for report in &reports {
        write_report(out, report, OutputFormat::Text, false)?;
    }
    Ok(reports)
}
