//! Blob service client (product images).

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use tracing::debug;
use url::Url;

use super::{Service, check};
use crate::storage::StorageError;
use abc_retailers_core::StoredFile;

/// Client for the Blob service of one account.
#[derive(Debug, Clone)]
pub struct BlobClient {
    pub(super) service: Service,
}

impl BlobClient {
    pub(super) const fn new(service: Service) -> Self {
        Self { service }
    }

    /// Create a private container. An existing container is left untouched.
    pub async fn create_container(&self, container: &str) -> Result<(), StorageError> {
        let mut url = self.service.url(&[container])?;
        url.set_query(Some("restype=container"));
        let response = self
            .service
            .send(self.service.request(Method::PUT, url))
            .await?;
        match check(response, container).await {
            Ok(_) | Err(StorageError::AlreadyExists(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Upload a block blob in one request, overwriting any existing blob.
    pub async fn put_blob(
        &self,
        container: &str,
        name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<Url, StorageError> {
        let url = self.service.url(&[container, name])?;
        let size = bytes.len();
        let response = self
            .service
            .send(
                self.service
                    .request(Method::PUT, url.clone())
                    .header("x-ms-blob-type", "BlockBlob")
                    .header("x-ms-blob-content-type", content_type)
                    .header(CONTENT_TYPE, content_type)
                    .body(bytes),
            )
            .await?;
        check(response, name).await?;
        debug!(container, name, size, "Blob uploaded");
        Ok(url)
    }

    /// Download a blob, or `None` if it does not exist.
    pub async fn get_blob(
        &self,
        container: &str,
        name: &str,
    ) -> Result<Option<StoredFile>, StorageError> {
        let url = self.service.url(&[container, name])?;
        let response = self
            .service
            .send(self.service.request(Method::GET, url))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check(response, name).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_owned();
        let bytes = response.bytes().await?;
        Ok(Some(StoredFile {
            content_type,
            bytes,
        }))
    }

    /// Delete a blob. A missing blob is not an error.
    pub async fn delete_blob(&self, container: &str, name: &str) -> Result<(), StorageError> {
        let url = self.service.url(&[container, name])?;
        let response = self
            .service
            .send(self.service.request(Method::DELETE, url))
            .await?;
        match check(response, name).await {
            Ok(_) | Err(StorageError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
