use bytes::Bytes;
use reqwest::Client;

use crate::config::StorageConfig;
use crate::error::AppError;

/// Object-storage client for uploaded workbooks. Built once from config and
/// shared through the application state.
#[derive(Clone)]
pub struct StorageClient {
    http: Client,
    config: StorageConfig,
    max_file_size: usize,
}

impl StorageClient {
    pub fn new(config: StorageConfig, max_file_size: usize) -> Self {
        Self {
            http: Client::new(),
            config,
            max_file_size,
        }
    }

    pub fn object_url(&self, file_path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.base_url,
            self.config.bucket,
            file_path.trim_start_matches('/')
        )
    }

    pub async fn download(&self, file_path: &str) -> Result<Bytes, AppError> {
        let url = self.object_url(file_path);
        tracing::info!("Downloading {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.service_key)
            .send()
            .await
            .map_err(|e| AppError::Download(format!("Failed to fetch file: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Download(format!(
                "Failed to fetch file. Status: {}",
                response.status()
            )));
        }

        if let Some(length) = response.content_length() {
            check_size(length as usize, self.max_file_size)?;
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::Download(format!("Failed to read response bytes: {}", e)))?;
        check_size(body.len(), self.max_file_size)?;

        tracing::info!("Downloaded {}KB", body.len() / 1024);
        Ok(body)
    }
}

pub fn check_size(len: usize, max_file_size: usize) -> Result<(), AppError> {
    if len > max_file_size {
        return Err(AppError::PayloadTooLarge(format!(
            "{} bytes exceeds the {} byte limit",
            len, max_file_size
        )));
    }
    Ok(())
}
