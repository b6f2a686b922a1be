//! Table service client.
//!
//! Speaks the JSON protocol with minimal metadata, so every returned entity
//! carries its `odata.etag`.

use reqwest::header::{ACCEPT, CONTENT_TYPE, ETAG, IF_MATCH};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::rows::TableEntity;
use super::{Service, api_error, check};
use crate::storage::StorageError;

const JSON_MINIMAL_METADATA: &str = "application/json;odata=minimalmetadata";
const NEXT_PARTITION_KEY: &str = "x-ms-continuation-NextPartitionKey";
const NEXT_ROW_KEY: &str = "x-ms-continuation-NextRowKey";

/// Page of entities returned by a query.
#[derive(Debug, Deserialize)]
struct QueryPage<T> {
    value: Vec<T>,
}

/// Client for the Table service of one account.
#[derive(Debug, Clone)]
pub struct TableClient {
    pub(super) service: Service,
}

impl TableClient {
    pub(super) const fn new(service: Service) -> Self {
        Self { service }
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.service
            .request(method, url)
            .header(ACCEPT, JSON_MINIMAL_METADATA)
            .header("DataServiceVersion", "3.0")
            .header("MaxDataServiceVersion", "3.0;NetFx")
    }

    /// URL addressing a single entity by key.
    fn entity_url<T: TableEntity>(&self, row_key: &str) -> Result<Url, StorageError> {
        let segment = format!(
            "{}(PartitionKey='{}',RowKey='{}')",
            T::TABLE,
            T::PARTITION,
            row_key.replace('\'', "''")
        );
        self.service.url(&[&segment])
    }

    /// Entity JSON with the `@odata.type` annotations the row declares.
    fn body<T: TableEntity>(row: &T) -> Result<Vec<u8>, StorageError> {
        let mut value =
            serde_json::to_value(row).map_err(|e| StorageError::Request(e.to_string()))?;
        if let Some(map) = value.as_object_mut() {
            for (property, edm_type) in T::TYPED_PROPERTIES {
                map.insert(
                    format!("{property}@odata.type"),
                    serde_json::Value::from(*edm_type),
                );
            }
        }
        serde_json::to_vec(&value).map_err(|e| StorageError::Request(e.to_string()))
    }

    /// Create a table. An existing table is left untouched.
    #[instrument(skip(self))]
    pub async fn create_table(&self, table: &str) -> Result<(), StorageError> {
        let url = self.service.url(&["Tables"])?;
        let body = serde_json::to_vec(&serde_json::json!({ "TableName": table }))
            .map_err(|e| StorageError::Request(e.to_string()))?;
        let response = self
            .service
            .send(
                self.request(Method::POST, url)
                    .header(CONTENT_TYPE, "application/json")
                    .header("Prefer", "return-no-content")
                    .body(body),
            )
            .await?;
        match check(response, table).await {
            Ok(_) => {
                debug!(table, "Table created");
                Ok(())
            }
            Err(StorageError::AlreadyExists(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// List at most one table to prove the account answers.
    pub async fn ping(&self) -> Result<(), StorageError> {
        let mut url = self.service.url(&["Tables"])?;
        url.set_query(Some("$top=1"));
        let response = self.service.send(self.request(Method::GET, url)).await?;
        check(response, "Tables").await.map(|_| ())
    }

    /// Fetch an entity by row key, or `None` if it does not exist.
    pub async fn get<T: TableEntity>(&self, row_key: &str) -> Result<Option<T>, StorageError> {
        let url = self.entity_url::<T>(row_key)?;
        let response = self.service.send(self.request(Method::GET, url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check(response, row_key).await?;
        Ok(Some(response.json().await?))
    }

    /// Every entity of the row type's partition, following continuation
    /// tokens until the service reports no more pages.
    #[instrument(skip(self), fields(table = T::TABLE))]
    pub async fn query<T: TableEntity>(&self) -> Result<Vec<T>, StorageError> {
        let filter = format!("PartitionKey eq '{}'", T::PARTITION);
        let mut rows = Vec::new();
        let mut continuation: Option<(String, String)> = None;

        loop {
            let mut url = self.service.url(&[&format!("{}()", T::TABLE)])?;
            let mut query = format!("$filter={}", urlencoding::encode(&filter));
            if let Some((partition, row)) = &continuation {
                query.push_str("&NextPartitionKey=");
                query.push_str(&urlencoding::encode(partition));
                if !row.is_empty() {
                    query.push_str("&NextRowKey=");
                    query.push_str(&urlencoding::encode(row));
                }
            }
            url.set_query(Some(&query));

            let response = self.service.send(self.request(Method::GET, url)).await?;
            let response = check(response, T::TABLE).await?;
            continuation = next_page(&response);
            let page: QueryPage<T> = response.json().await?;
            rows.extend(page.value);

            if continuation.is_none() {
                break;
            }
        }

        debug!(count = rows.len(), "Queried table");
        Ok(rows)
    }

    /// Insert a new entity and return its etag.
    ///
    /// Fails with [`StorageError::AlreadyExists`] if the row key is taken.
    pub async fn insert<T: TableEntity>(&self, row: &T) -> Result<Option<String>, StorageError> {
        let url = self.service.url(&[T::TABLE])?;
        let response = self
            .service
            .send(
                self.request(Method::POST, url)
                    .header(CONTENT_TYPE, "application/json")
                    .header("Prefer", "return-no-content")
                    .body(Self::body(row)?),
            )
            .await?;
        let response = check(response, row.row_key()).await?;
        Ok(etag(&response))
    }

    /// Replace an entity, guarded by `etag` (`*` when absent).
    pub async fn replace<T: TableEntity>(
        &self,
        row: &T,
        etag_value: Option<&str>,
    ) -> Result<Option<String>, StorageError> {
        let url = self.entity_url::<T>(row.row_key())?;
        let response = self
            .service
            .send(
                self.request(Method::PUT, url)
                    .header(CONTENT_TYPE, "application/json")
                    .header(IF_MATCH, etag_value.unwrap_or("*"))
                    .body(Self::body(row)?),
            )
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(row.row_key().to_owned())),
            StatusCode::PRECONDITION_FAILED => {
                Err(StorageError::PreconditionFailed(row.row_key().to_owned()))
            }
            s if s.is_success() => Ok(etag(&response)),
            _ => Err(api_error(response).await),
        }
    }

    /// Delete an entity. A missing entity is [`StorageError::NotFound`].
    pub async fn delete<T: TableEntity>(&self, row_key: &str) -> Result<(), StorageError> {
        let url = self.entity_url::<T>(row_key)?;
        let response = self
            .service
            .send(self.request(Method::DELETE, url).header(IF_MATCH, "*"))
            .await?;
        check(response, row_key).await.map(|_| ())
    }
}

fn etag(response: &Response) -> Option<String> {
    response
        .headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn next_page(response: &Response) -> Option<(String, String)> {
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let partition = header(NEXT_PARTITION_KEY)?;
    Some((partition, header(NEXT_ROW_KEY).unwrap_or_default()))
}
