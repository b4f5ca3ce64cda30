//! AWS S3 implementation of ObjectStoreBackend
//!
//! The SDK is async; every request is driven to completion on a private
//! current-thread runtime so the store stays a plain blocking API. That
//! runtime cannot be entered from a thread that is already running one, so
//! the backend must be built and used outside any tokio context (or from
//! `spawn_blocking`).

use crate::error::{ConfigError, ProviderError};
use crate::storage::backend::{
    CreateBucketRequest, ObjectStoreBackend, ObjectVersionEntry, VersionMarker, VersionPage,
    NULL_VERSION_ID,
};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration, VersioningConfiguration,
};
use aws_sdk_s3::Client;
use bytes::Bytes;
use log::{debug, info};
use std::fmt::Debug;
use std::future::Future;
use tokio::runtime::{Builder, Handle, Runtime};

/// Convert an SDK failure into a raw provider error, keeping its code
fn provider_error<E, R>(err: SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    let code = err.code().map(str::to_string);
    let message = DisplayErrorContext(&err).to_string();
    ProviderError { code, message }
}

/// S3 backend bound to one region
pub struct S3Backend {
    client: Client,
    region: String,
    runtime: Runtime,
}

impl S3Backend {
    /// Build a client for `region`, using the ambient AWS credential chain.
    ///
    /// `endpoint` points the client at an S3-compatible service (MinIO and
    /// friends) and switches to path-style addressing.
    ///
    /// Fails with `ConfigError::NestedRuntime` when called from inside a
    /// tokio runtime.
    pub fn connect(region: &str, endpoint: Option<&str>) -> Result<Self, ConfigError> {
        if Handle::try_current().is_ok() {
            return Err(ConfigError::NestedRuntime);
        }
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ConfigError::Runtime)?;

        let sdk_config = runtime.block_on(
            aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(region.to_string()))
                .load(),
        );

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        info!(
            "S3 backend initialised for region {}{}",
            region,
            endpoint.map(|e| format!(" at {}", e)).unwrap_or_default()
        );
        Ok(Self {
            client,
            region: region.to_string(),
            runtime,
        })
    }

    /// Run one request on the private runtime, refusing instead of panicking
    /// when the caller is itself on a runtime thread.
    fn block_on<F: Future>(&self, request: F) -> Result<F::Output, ProviderError> {
        if Handle::try_current().is_ok() {
            return Err(ProviderError::uncoded(
                "S3 backend called from inside an async runtime; use spawn_blocking",
            ));
        }
        Ok(self.runtime.block_on(request))
    }
}

impl ObjectStoreBackend for S3Backend {
    fn region(&self) -> &str {
        &self.region
    }

    fn head_bucket(&self, bucket: &str) -> Result<(), ProviderError> {
        self.block_on(self.client.head_bucket().bucket(bucket).send())?
            .map_err(provider_error)?;
        Ok(())
    }

    fn create_bucket(&self, request: &CreateBucketRequest) -> Result<(), ProviderError> {
        let mut call = self.client.create_bucket().bucket(&request.bucket);
        if let Some(constraint) = &request.location_constraint {
            call = call.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(constraint.as_str()))
                    .build(),
            );
        }
        self.block_on(call.send())?.map_err(provider_error)?;
        Ok(())
    }

    fn enable_versioning(&self, bucket: &str) -> Result<(), ProviderError> {
        let versioning = VersioningConfiguration::builder()
            .status(BucketVersioningStatus::Enabled)
            .build();
        self.block_on(
            self.client
                .put_bucket_versioning()
                .bucket(bucket)
                .versioning_configuration(versioning)
                .send(),
        )?
        .map_err(provider_error)?;
        Ok(())
    }

    fn list_object_versions(
        &self,
        bucket: &str,
        marker: Option<&VersionMarker>,
    ) -> Result<VersionPage, ProviderError> {
        let output = self
            .block_on(
                self.client
                    .list_object_versions()
                    .bucket(bucket)
                    .set_key_marker(marker.map(|m| m.key_marker.clone()))
                    .set_version_id_marker(marker.map(|m| m.version_id_marker.clone()))
                    .send(),
            )?
            .map_err(provider_error)?;

        let mut entries: Vec<ObjectVersionEntry> = output
            .versions()
            .iter()
            .map(|v| ObjectVersionEntry {
                key: v.key().unwrap_or_default().to_string(),
                version_id: v.version_id().unwrap_or(NULL_VERSION_ID).to_string(),
                is_delete_marker: false,
                is_latest: v.is_latest().unwrap_or(false),
            })
            .collect();
        entries.extend(output.delete_markers().iter().map(|m| ObjectVersionEntry {
            key: m.key().unwrap_or_default().to_string(),
            version_id: m.version_id().unwrap_or(NULL_VERSION_ID).to_string(),
            is_delete_marker: true,
            is_latest: m.is_latest().unwrap_or(false),
        }));

        let next = if output.is_truncated().unwrap_or(false) {
            match (output.next_key_marker(), output.next_version_id_marker()) {
                (Some(key_marker), Some(version_id_marker)) => Some(VersionMarker {
                    key_marker: key_marker.to_string(),
                    version_id_marker: version_id_marker.to_string(),
                }),
                _ => {
                    return Err(ProviderError::uncoded(format!(
                        "truncated version listing for {} carried no continuation markers",
                        bucket
                    )))
                }
            }
        } else {
            None
        };

        debug!(
            "Listed {} versions in {}{}",
            entries.len(),
            bucket,
            if next.is_some() { " (truncated)" } else { "" }
        );
        Ok(VersionPage { entries, next })
    }

    fn delete_object_version(&self, bucket: &str, key: &str, version_id: &str) -> Result<(), ProviderError> {
        self.block_on(
            self.client
                .delete_object()
                .bucket(bucket)
                .key(key)
                .version_id(version_id)
                .send(),
        )?
        .map_err(provider_error)?;
        Ok(())
    }

    fn delete_bucket(&self, bucket: &str) -> Result<(), ProviderError> {
        self.block_on(self.client.delete_bucket().bucket(bucket).send())?
            .map_err(provider_error)?;
        Ok(())
    }

    fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), ProviderError> {
        self.block_on(
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(ByteStream::from(body))
                .send(),
        )?
        .map_err(provider_error)?;
        Ok(())
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, ProviderError> {
        self.block_on(async {
            let output = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(provider_error)?;
            let body = output
                .body
                .collect()
                .await
                .map_err(|e| ProviderError::uncoded(format!("failed to read {}/{}: {}", bucket, key, e)))?;
            Ok(body.into_bytes())
        })?
    }

    fn head_object(&self, bucket: &str, key: &str) -> Result<(), ProviderError> {
        self.block_on(self.client.head_object().bucket(bucket).key(key).send())?
            .map_err(provider_error)?;
        Ok(())
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ProviderError> {
        self.block_on(self.client.delete_object().bucket(bucket).key(key).send())?
            .map_err(provider_error)?;
        Ok(())
    }
}
