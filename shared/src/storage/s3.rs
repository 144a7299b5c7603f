use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, ObjectCannedAcl};
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use std::path::Path;
use tracing::{debug, warn};

use super::StorageError;
use crate::config::StorageConfig;

/// Part size for streamed uploads. S3 requires at least 5 MiB for every
/// part except the last.
const PART_SIZE: usize = 8 * 1024 * 1024;

/// Streams objects into a public bucket and hands out their permanent URLs.
#[derive(Debug, Clone)]
pub struct S3Archive {
    client: S3Client,
    http: reqwest::Client,
    bucket: String,
    region: String,
    endpoint: Option<String>,
}

impl S3Archive {
    pub async fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        if config.bucket.is_empty() {
            return Err(StorageError::Config("bucket name is empty".to_string()));
        }

        let sdk_config = aws_config::from_env()
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        // Support custom endpoint for LocalStack/MinIO
        let client = match &config.endpoint {
            Some(endpoint_url) => {
                let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                    .endpoint_url(endpoint_url)
                    .force_path_style(true)
                    .build();
                S3Client::from_conf(s3_config)
            }
            None => S3Client::new(&sdk_config),
        };

        Ok(Self {
            client,
            http: reqwest::Client::new(),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        })
    }

    /// Permanent, predictable URL for a key in the public bucket.
    pub fn public_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => {
                format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key)
            }
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }

    /// Streams `source_url` into `key` without buffering the whole object,
    /// marks it public-read and returns its permanent URL. The multipart
    /// upload is aborted on any failure, so a partial object is never left
    /// publicly visible.
    pub async fn archive_url(
        &self,
        source_url: &str,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let response = self
            .http
            .get(source_url)
            .send()
            .await
            .map_err(|e| StorageError::UpstreamFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::UpstreamFetch(format!(
                "source responded with HTTP {}",
                status
            )));
        }

        let upload = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        let upload_id = upload
            .upload_id()
            .ok_or_else(|| StorageError::Upload("no upload id returned".to_string()))?
            .to_string();

        match self.stream_parts(response, key, &upload_id).await {
            Ok(parts) => {
                let completed = CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build();

                self.client
                    .complete_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .multipart_upload(completed)
                    .send()
                    .await
                    .map_err(|e| StorageError::Upload(e.to_string()))?;

                debug!("Archived {} to s3://{}/{}", source_url, self.bucket, key);
                Ok(self.public_url(key))
            }
            Err(e) => {
                if let Err(abort_err) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    warn!(
                        "Failed to abort multipart upload for {}: {}",
                        key, abort_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn stream_parts(
        &self,
        mut response: reqwest::Response,
        key: &str,
        upload_id: &str,
    ) -> Result<Vec<CompletedPart>, StorageError> {
        let mut parts = Vec::new();
        let mut buffer: Vec<u8> = Vec::with_capacity(PART_SIZE);
        let mut part_number: i32 = 1;

        while let Some(bytes) = response
            .chunk()
            .await
            .map_err(|e| StorageError::UpstreamFetch(e.to_string()))?
        {
            buffer.extend_from_slice(&bytes);

            while buffer.len() >= PART_SIZE {
                let part: Vec<u8> = buffer.drain(..PART_SIZE).collect();
                parts.push(self.upload_part(key, upload_id, part_number, part).await?);
                part_number += 1;
            }
        }

        // The final part may be short. An empty body still commits one
        // zero-length part so complete_multipart_upload has something to
        // reference.
        if !buffer.is_empty() || parts.is_empty() {
            parts.push(
                self.upload_part(key, upload_id, part_number, buffer)
                    .await?,
            );
        }

        Ok(parts)
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
    ) -> Result<CompletedPart, StorageError> {
        debug!(
            "Uploading part {} ({} bytes) for {}",
            part_number,
            body.len(),
            key
        );

        let result = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(Bytes::from(body)))
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        Ok(CompletedPart::builder()
            .set_e_tag(result.e_tag().map(|t| t.to_string()))
            .part_number(part_number)
            .build())
    }

    /// Uploads a local file (rosters and other small artifacts) with the
    /// same public-read visibility and URL contract as `archive_url`.
    pub async fn archive_file(
        &self,
        path: &Path,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let content = tokio::fs::read(path).await?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .content_type(content_type)
            .body(ByteStream::from(Bytes::from(content)))
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        debug!(
            "Archived {} to s3://{}/{}",
            path.display(),
            self.bucket,
            key
        );
        Ok(self.public_url(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The round-trip test needs an S3-compatible service:
    // 1. Start LocalStack: docker run -d -p 4566:4566 localstack/localstack
    // 2. Set S3_ENDPOINT=http://localhost:4566 (plus dummy AWS credentials)
    async fn create_test_archive() -> Option<S3Archive> {
        let endpoint = std::env::var("S3_ENDPOINT").ok()?;

        let config = StorageConfig {
            bucket: "lectern-test-archive".to_string(),
            region: "us-east-1".to_string(),
            endpoint: Some(endpoint),
        };

        let archive = S3Archive::new(&config).await.ok()?;
        // Create the bucket, ignoring the error if it already exists
        let _ = archive
            .client
            .create_bucket()
            .bucket(&config.bucket)
            .send()
            .await;
        Some(archive)
    }

    #[tokio::test]
    async fn test_public_url_shapes() {
        let aws = S3Archive::new(&StorageConfig {
            bucket: "classes-archive".to_string(),
            region: "sa-east-1".to_string(),
            endpoint: None,
        })
        .await
        .unwrap();
        assert_eq!(
            aws.public_url("datavis_21-10-24.mp4"),
            "https://classes-archive.s3.sa-east-1.amazonaws.com/datavis_21-10-24.mp4"
        );

        let local = S3Archive::new(&StorageConfig {
            bucket: "classes-archive".to_string(),
            region: "us-east-1".to_string(),
            endpoint: Some("http://localhost:4566/".to_string()),
        })
        .await
        .unwrap();
        assert_eq!(
            local.public_url("roster.txt"),
            "http://localhost:4566/classes-archive/roster.txt"
        );
    }

    #[tokio::test]
    async fn test_empty_bucket_rejected() {
        let result = S3Archive::new(&StorageConfig {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint: None,
        })
        .await;
        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    #[tokio::test]
    async fn test_archive_file_roundtrip() {
        let Some(archive) = create_test_archive().await else {
            println!("Skipping S3 test - no LocalStack/MinIO available");
            return;
        };

        let path = std::env::temp_dir().join("lectern-archive-roundtrip.txt");
        tokio::fs::write(&path, b"attendance roster body")
            .await
            .unwrap();

        let url = archive
            .archive_file(&path, "rosters/test.txt", "text/plain")
            .await
            .unwrap();
        assert!(url.ends_with("/lectern-test-archive/rosters/test.txt"));

        let fetched = archive
            .client
            .get_object()
            .bucket("lectern-test-archive")
            .key("rosters/test.txt")
            .send()
            .await
            .unwrap();
        let body = fetched.body.collect().await.unwrap().into_bytes();
        assert_eq!(body.as_ref(), b"attendance roster body");

        tokio::fs::remove_file(&path).await.ok();
    }
}
