use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use std::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};

use crate::config::{Config, DEFAULT_SIZE_ERROR_MESSAGE, DEFAULT_VALID_ERROR_MESSAGE};
use crate::errors::{AppError, AppResult};

use super::invoker::UploadCapability;
use super::types::{UploadFailure, UploadItem};

/// Upload capability that POSTs each file as multipart form data.
pub struct HttpUploader {
    client: Client,
    endpoint: String,
    size_error_message: String,
    valid_error_message: String,
    min_request_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl HttpUploader {
    pub fn new(endpoint: &str, timeout: Duration) -> AppResult<Self> {
        let endpoint = endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(AppError::invalid_endpoint(endpoint));
        }

        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.to_string(),
            size_error_message: DEFAULT_SIZE_ERROR_MESSAGE.to_string(),
            valid_error_message: DEFAULT_VALID_ERROR_MESSAGE.to_string(),
            min_request_interval: Duration::ZERO,
            last_request: Mutex::new(None),
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| AppError::Config("No upload endpoint configured".to_string()))?;

        let mut uploader = Self::new(endpoint, Duration::from_secs(config.request_timeout_secs))?;
        uploader.size_error_message = config.size_error_message.clone();
        uploader.valid_error_message = config.valid_error_message.clone();
        uploader.min_request_interval = Duration::from_millis(config.request_interval_ms);
        Ok(uploader)
    }

    async fn wait_for_rate_limit(&self) {
        let wait_time = match self.last_request.lock() {
            Ok(mut last) => {
                let wait = last
                    .map(|at| at.elapsed())
                    .filter(|elapsed| *elapsed < self.min_request_interval)
                    .map(|elapsed| self.min_request_interval - elapsed);
                *last = Some(Instant::now() + wait.unwrap_or_default());
                wait
            }
            Err(e) => {
                log::warn!("Failed to acquire rate limiter lock (non-critical): {}", e);
                None
            }
        }; // MutexGuard is dropped here

        if let Some(wait_time) = wait_time {
            sleep(wait_time).await;
        }
    }

    async fn build_form(item: &UploadItem) -> Result<multipart::Form, UploadFailure> {
        let bytes = tokio::fs::read(item.path()).await.map_err(|e| {
            UploadFailure::other(format!("Failed to read {}: {}", item.path().display(), e))
        })?;

        let part = multipart::Part::bytes(bytes).file_name(item.name().to_string());
        Ok(multipart::Form::new().part("file", part))
    }

    fn failure_for_status(&self, status: StatusCode, body: &str) -> UploadFailure {
        match status {
            StatusCode::PAYLOAD_TOO_LARGE => UploadFailure::size(self.size_error_message.clone()),
            StatusCode::UNSUPPORTED_MEDIA_TYPE | StatusCode::UNPROCESSABLE_ENTITY => {
                UploadFailure::valid(self.valid_error_message.clone())
            }
            _ => UploadFailure::new(
                Some("HttpError"),
                format!("Upload endpoint returned {}: {}", status, body),
            ),
        }
    }
}

#[async_trait]
impl UploadCapability for HttpUploader {
    async fn upload_file(&self, item: &UploadItem) -> Result<(), UploadFailure> {
        let form = Self::build_form(item).await?;
        self.wait_for_rate_limit().await;

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadFailure::new(Some("NetworkError"), e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            log::debug!("Endpoint accepted {} with {}", item.name(), status);
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        log::debug!(
            "Endpoint rejected {} with {}: {}",
            item.name(),
            status,
            body.chars().take(300).collect::<String>()
        );
        Err(self.failure_for_status(status, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uploader::classifier::classify;
    use crate::uploader::types::ErrorKind;

    fn uploader() -> HttpUploader {
        HttpUploader::new("https://uploads.example.com/media", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let result = HttpUploader::new("ftp://example.com", Duration::from_secs(5));
        assert!(matches!(result, Err(AppError::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_status_classification() {
        let uploader = uploader();
        assert_eq!(
            classify(&uploader.failure_for_status(StatusCode::PAYLOAD_TOO_LARGE, "")),
            ErrorKind::SizeError
        );
        assert_eq!(
            classify(&uploader.failure_for_status(StatusCode::UNSUPPORTED_MEDIA_TYPE, "")),
            ErrorKind::ValidError
        );
        assert_eq!(
            classify(&uploader.failure_for_status(StatusCode::UNPROCESSABLE_ENTITY, "")),
            ErrorKind::ValidError
        );
        assert_eq!(
            classify(&uploader.failure_for_status(StatusCode::BAD_GATEWAY, "upstream")),
            ErrorKind::OtherError
        );
    }

    #[test]
    fn test_new_uses_default_messages() {
        let uploader = uploader();
        assert_eq!(
            uploader
                .failure_for_status(StatusCode::PAYLOAD_TOO_LARGE, "")
                .message,
            DEFAULT_SIZE_ERROR_MESSAGE
        );
        assert_eq!(
            uploader
                .failure_for_status(StatusCode::UNSUPPORTED_MEDIA_TYPE, "")
                .message,
            DEFAULT_VALID_ERROR_MESSAGE
        );
    }

    #[test]
    fn test_size_failure_uses_configured_message() {
        let mut config = Config::default();
        config.endpoint = Some("https://uploads.example.com/media".to_string());
        config.size_error_message = "Max 10MB".to_string();
        let uploader = HttpUploader::from_config(&config).unwrap();

        let failure = uploader.failure_for_status(StatusCode::PAYLOAD_TOO_LARGE, "");
        assert_eq!(failure.message, "Max 10MB");
    }

    #[test]
    fn test_from_config_requires_endpoint() {
        let config = Config::default();
        assert!(matches!(
            HttpUploader::from_config(&config),
            Err(AppError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file_is_retryable_failure() {
        let item = UploadItem::from_path("/definitely/not/here.png");
        let failure = uploader().upload_file(&item).await.unwrap_err();
        assert_eq!(classify(&failure), ErrorKind::OtherError);
    }
}
