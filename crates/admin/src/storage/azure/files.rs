//! File service client (payment proofs).
//!
//! Files live in the root directory of a share. Creating a file only
//! reserves its size; content is written afterwards with Put Range calls of
//! at most 4 MiB each.

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use tracing::debug;

use super::{Service, check, xml};
use crate::storage::StorageError;
use abc_retailers_core::StoredFile;

/// Largest range the service accepts in one Put Range call.
pub const MAX_RANGE_BYTES: usize = 4 * 1024 * 1024;

/// Client for the File service of one account.
#[derive(Debug, Clone)]
pub struct FileShareClient {
    pub(super) service: Service,
}

impl FileShareClient {
    pub(super) const fn new(service: Service) -> Self {
        Self { service }
    }

    /// Create a share. An existing share is left untouched.
    pub async fn create_share(&self, share: &str) -> Result<(), StorageError> {
        let mut url = self.service.url(&[share])?;
        url.set_query(Some("restype=share"));
        let response = self
            .service
            .send(self.service.request(Method::PUT, url))
            .await?;
        match check(response, share).await {
            Ok(_) | Err(StorageError::AlreadyExists(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Create `name` in the share root with the given content, replacing any
    /// existing file of that name.
    pub async fn upload(&self, share: &str, name: &str, bytes: Bytes) -> Result<(), StorageError> {
        let url = self.service.url(&[share, name])?;
        let response = self
            .service
            .send(
                self.service
                    .request(Method::PUT, url.clone())
                    .header("x-ms-type", "file")
                    .header("x-ms-content-length", bytes.len().to_string()),
            )
            .await?;
        check(response, name).await?;

        for (start, end) in ranges(bytes.len()) {
            let mut range_url = url.clone();
            range_url.set_query(Some("comp=range"));
            let chunk = bytes.slice(start..=end);
            let response = self
                .service
                .send(
                    self.service
                        .request(Method::PUT, range_url)
                        .header("x-ms-write", "update")
                        .header("x-ms-range", format!("bytes={start}-{end}"))
                        .body(chunk),
                )
                .await?;
            check(response, name).await?;
        }

        debug!(share, name, size = bytes.len(), "File uploaded");
        Ok(())
    }

    /// Names of the files (not directories) in the share root.
    pub async fn list_root_files(&self, share: &str) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut url = self.service.url(&[share])?;
            let mut query = "restype=directory&comp=list".to_owned();
            if let Some(m) = &marker {
                query.push_str("&marker=");
                query.push_str(&urlencoding::encode(m));
            }
            url.set_query(Some(&query));

            let response = self
                .service
                .send(self.service.request(Method::GET, url))
                .await?;
            let body = check(response, share).await?.text().await?;

            names.extend(
                xml::elements(&body, "File")
                    .into_iter()
                    .filter_map(|entry| xml::element(entry, "Name"))
                    .map(xml::unescape),
            );

            marker = xml::element(&body, "NextMarker")
                .filter(|m| !m.is_empty())
                .map(xml::unescape);
            if marker.is_none() {
                break;
            }
        }

        Ok(names)
    }

    /// Download a file, or `None` if it does not exist.
    pub async fn get_file(
        &self,
        share: &str,
        name: &str,
    ) -> Result<Option<StoredFile>, StorageError> {
        let url = self.service.url(&[share, name])?;
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
        Ok(Some(StoredFile {
            content_type,
            bytes: response.bytes().await?,
        }))
    }

    /// Delete a file. A missing file is not an error.
    pub async fn delete_file(&self, share: &str, name: &str) -> Result<(), StorageError> {
        let url = self.service.url(&[share, name])?;
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

/// Inclusive byte ranges covering `len` bytes in chunks of [`MAX_RANGE_BYTES`].
fn ranges(len: usize) -> Vec<(usize, usize)> {
    (0..len)
        .step_by(MAX_RANGE_BYTES)
        .map(|start| (start, (start + MAX_RANGE_BYTES).min(len) - 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_cover_content() {
        assert!(ranges(0).is_empty());
        assert_eq!(ranges(10), vec![(0, 9)]);
        assert_eq!(
            ranges(MAX_RANGE_BYTES + 1),
            vec![(0, MAX_RANGE_BYTES - 1), (MAX_RANGE_BYTES, MAX_RANGE_BYTES)]
        );
    }
}
