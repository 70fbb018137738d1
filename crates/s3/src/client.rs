//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from wp-core.

use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use wp_core::{
    Error, ObjectAcl, ObjectStore, PutObjectRequest, Result, RetryConfig, StoreConfig,
    is_retryable_error, retry_with_backoff,
};

/// Error codes that mean the credentials were rejected
const AUTH_ERROR_CODES: &[&str] = &[
    "AccessDenied",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "InvalidToken",
];

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    retry: RetryConfig,
}

impl S3Client {
    /// Create a new S3 client from a store configuration
    pub async fn new(config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let credentials = aws_credential_types::Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None, // session token
            None, // expiry
            "wasabi-push-static-credentials",
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        // Wasabi and most S3-compatible servers want path-style addressing
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        tracing::debug!(
            endpoint = config.endpoint.as_deref().unwrap_or("default"),
            region = %config.region,
            bucket = %config.bucket,
            "Created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            retry: config.retry.clone(),
        })
    }

    /// Format AWS SDK error into a detailed error message
    fn format_sdk_error<E>(error: &SdkError<E>) -> String
    where
        E: ProvideErrorMetadata + std::fmt::Display,
    {
        match error {
            SdkError::ServiceError(service_err) => {
                let err = service_err.err();
                let status = service_err.raw().status().as_u16();
                let mut msg = format!("Service error: {err}");
                if let Some(code) = err.code() {
                    msg.push_str(&format!(" (code: {code}, status: {status})"));
                } else {
                    msg.push_str(&format!(" (status: {status})"));
                }
                msg
            }
            SdkError::ConstructionFailure(err) => {
                format!("Request construction failed: {err:?}")
            }
            SdkError::TimeoutError(_) => "Request timeout".to_string(),
            SdkError::DispatchFailure(err) => {
                format!("Network dispatch error: {err:?}")
            }
            SdkError::ResponseError(err) => {
                format!("Response error: {err:?}")
            }
            _ => error.to_string(),
        }
    }

    /// Map an SDK error onto the wp-core error taxonomy
    fn classify_sdk_error<E>(error: &SdkError<E>) -> Error
    where
        E: ProvideErrorMetadata + std::fmt::Display,
    {
        let message = Self::format_sdk_error(error);
        match error.code() {
            Some(code) if AUTH_ERROR_CODES.contains(&code) => Error::Auth(message),
            _ => Error::Transfer(message),
        }
    }
}

/// Convert a wp-core ACL into the SDK's canned ACL
pub fn canned_acl(acl: ObjectAcl) -> ObjectCannedAcl {
    ObjectCannedAcl::from(acl.as_str())
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put_object(&self, request: PutObjectRequest) -> Result<()> {
        let acl = canned_acl(request.acl);

        retry_with_backoff(
            &self.retry,
            || {
                // Bytes clones share the buffer; each attempt needs its own stream
                let body = ByteStream::from(request.body.clone());
                let send = self
                    .inner
                    .put_object()
                    .bucket(&request.bucket)
                    .key(&request.key)
                    .body(body)
                    .content_type(&request.content_type)
                    .cache_control(&request.cache_control)
                    .acl(acl.clone())
                    .send();

                async move {
                    send.await
                        .map(|_| ())
                        .map_err(|e| Self::classify_sdk_error(&e))
                }
            },
            is_retryable_error,
        )
        .await
    }
}
