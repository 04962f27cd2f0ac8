//! S3 access: client construction, object listing and fetching, and bucket lifecycle.

use std::path::Path;

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use futures::stream::{self, Stream, StreamExt};
use globset::{Glob, GlobMatcher};
use tracing::{debug, info};

use crate::content::{read_content, ObjectContent};
use crate::error::{InspectError, Result};
use crate::interceptors::RequestTimingInterceptor;

/// Where and how to reach the object store.
#[derive(Debug, Clone, Default)]
pub struct ClientSettings {
    /// Overrides the region from the environment or profile.
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores such as Localstack or MinIO.
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
}

/// Builds an S3 client from the default credential chain and `settings`.
pub async fn build_client(settings: &ClientSettings) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &settings.region {
        loader = loader.region(Region::new(region.clone()));
    }
    let config = loader.load().await;

    let mut builder =
        aws_sdk_s3::config::Builder::from(&config).interceptor(RequestTimingInterceptor);
    if let Some(endpoint) = &settings.endpoint_url {
        builder = builder.endpoint_url(endpoint);
    }
    if settings.force_path_style {
        builder = builder.force_path_style(true);
    }
    Client::from_conf(builder.build())
}

/// Selects object keys by glob. `*` also matches across `/`.
#[derive(Debug, Clone)]
pub struct KeyMatcher {
    pattern: String,
    matcher: GlobMatcher,
}

impl KeyMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let glob = Glob::new(pattern).map_err(|source| InspectError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(KeyMatcher {
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, key: &str) -> bool {
        self.matcher.is_match(key)
    }

    /// Literal text before the first glob metacharacter, usable as a listing prefix.
    pub fn list_prefix(&self) -> &str {
        let end = self
            .pattern
            .find(|c| matches!(c, '*' | '?' | '[' | '{' | '\\'))
            .unwrap_or(self.pattern.len());
        &self.pattern[..end]
    }
}

/**
    Streams S3 object keys from the specified bucket and prefix.

    # Arguments

    * `client` - AWS S3 client.
    * `bucket` - S3 bucket name.
    * `prefix` - Only keys starting with this are listed.

    # Returns

    A stream of object keys. A failed page yields one error and ends the stream.
*/
pub fn list_objects_stream(
    client: Client,
    bucket: String,
    prefix: String,
) -> impl Stream<Item = Result<String>> {
    stream::unfold(
        (client, bucket, prefix, Some(String::new())),
        |(client, bucket, prefix, continuation_token)| async move {
            // None means the previous page was the last one
            let token = continuation_token?;

            let mut req = client.list_objects_v2().bucket(&bucket).prefix(&prefix);
            if !token.is_empty() {
                req = req.continuation_token(token);
            }

            match req.send().await {
                Ok(resp) => {
                    let keys: Vec<Result<String>> = resp
                        .contents()
                        .iter()
                        .filter_map(|obj| obj.key.clone())
                        .map(Ok)
                        .collect();
                    let next_token = resp.next_continuation_token().map(|t| t.to_string());
                    debug!(bucket = %bucket, keys = keys.len(), more = next_token.is_some(), "listed page");

                    if keys.is_empty() && next_token.is_none() {
                        return None;
                    }
                    Some((stream::iter(keys), (client, bucket, prefix, next_token)))
                }
                Err(e) => {
                    let err = InspectError::s3("ListObjectsV2", e);
                    Some((stream::iter(vec![Err(err)]), (client, bucket, prefix, None)))
                }
            }
        },
    )
    .flatten()
}

/// Downloads an object and extracts its inspectable text. `.gz` keys are decompressed.
pub async fn fetch_object(
    client: &Client,
    bucket: &str,
    key: &str,
    max_bytes: u64,
) -> Result<ObjectContent> {
    let resp = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| InspectError::s3("GetObject", e))?;

    let gzip = key.ends_with(".gz");
    let content = read_content(resp.body.into_async_read(), gzip, max_bytes).await?;
    debug!(
        key,
        bytes = content.bytes_read,
        binary = content.binary,
        truncated = content.truncated,
        "fetched object"
    );
    Ok(content)
}

/// Creates the bucket unless it already exists. Returns true if it was created.
pub async fn ensure_bucket(client: &Client, bucket: &str) -> Result<bool> {
    let err = match client.head_bucket().bucket(bucket).send().await {
        Ok(_) => return Ok(false),
        Err(err) => err,
    };
    let not_found = err
        .as_service_error()
        .is_some_and(|e| e.is_not_found())
        || err.raw_response().map(|r| r.status().as_u16()) == Some(404);
    if !not_found {
        return Err(InspectError::s3("HeadBucket", err));
    }

    let mut req = client.create_bucket().bucket(bucket);
    if let Some(region) = client.config().region().map(|r| r.to_string()) {
        // us-east-1 rejects an explicit location constraint
        if region != "us-east-1" {
            req = req.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region.as_str()))
                    .build(),
            );
        }
    }

    match req.send().await {
        Ok(_) => {
            info!(bucket, "created bucket");
            Ok(true)
        }
        Err(e)
            if e.as_service_error()
                .is_some_and(|s| s.is_bucket_already_owned_by_you()) =>
        {
            Ok(false)
        }
        Err(e) => Err(InspectError::s3("CreateBucket", e)),
    }
}

/// Uploads a local file as `key`.
pub async fn upload_file(client: &Client, bucket: &str, key: &str, path: &Path) -> Result<()> {
    let body = ByteStream::from_path(path)
        .await
        .map_err(|source| InspectError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(body)
        .send()
        .await
        .map_err(|e| InspectError::s3("PutObject", e))?;
    debug!(bucket, key, path = %path.display(), "uploaded object");
    Ok(())
}

pub async fn delete_objects<S>(client: &Client, bucket: &str, keys: &[S]) -> Result<()>
where
    S: AsRef<str>,
{
    for key in keys {
        client
            .delete_object()
            .bucket(bucket)
            .key(key.as_ref())
            .send()
            .await
            .map_err(|e| InspectError::s3("DeleteObject", e))?;
    }
    Ok(())
}

/// Deletes the bucket. The store refuses this while the bucket still holds objects.
pub async fn delete_bucket(client: &Client, bucket: &str) -> Result<()> {
    client
        .delete_bucket()
        .bucket(bucket)
        .send()
        .await
        .map_err(|e| InspectError::s3("DeleteBucket", e))?;
    info!(bucket, "deleted bucket");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_matches_everything() {
        let m = KeyMatcher::new("*").unwrap();
        assert!(m.is_match("test.txt"));
        assert!(m.is_match("logs/2024/app.log.gz"));
        assert_eq!(m.list_prefix(), "");
    }

    #[test]
    fn test_literal_key_matches_only_itself() {
        let m = KeyMatcher::new("test.txt").unwrap();
        assert!(m.is_match("test.txt"));
        assert!(!m.is_match("test.png"));
        assert_eq!(m.list_prefix(), "test.txt");
    }

    #[test]
    fn test_prefix_stops_at_metacharacter() {
        let m = KeyMatcher::new("logs/2024-*.txt").unwrap();
        assert_eq!(m.list_prefix(), "logs/2024-");
        assert!(m.is_match("logs/2024-01.txt"));
        assert!(!m.is_match("logs/2023-01.txt"));

        let m = KeyMatcher::new("data/{a,b}.csv").unwrap();
        assert_eq!(m.list_prefix(), "data/");
    }

    #[test]
    fn test_invalid_pattern() {
        let err = KeyMatcher::new("[abc").unwrap_err();
        assert!(matches!(err, InspectError::InvalidPattern { pattern, .. } if pattern == "[abc"));
    }
}
