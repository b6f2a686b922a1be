//! Azure Storage REST backend.
//!
//! One [`AzureStorage`] wraps a client per service. All four share a single
//! pooled `reqwest::Client` and the account's Shared Key credential.

pub mod auth;
pub mod blobs;
pub mod connection_string;
pub mod files;
pub mod queues;
pub mod rows;
pub mod tables;
mod xml;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::{instrument, warn};
use url::Url;

use abc_retailers_core::{
    Customer, CustomerId, FileUpload, Order, OrderId, Product, ProductId, StoredFile,
};

use self::auth::SharedKeyCredential;
use self::blobs::BlobClient;
use self::connection_string::StorageAccount;
use self::files::FileShareClient;
use self::queues::QueueClient;
use self::rows::{CustomerRow, OrderRow, ProductRow};
use self::tables::TableClient;
use super::naming::{self, content_type_for};
use super::{
    CUSTOMERS_TABLE, ORDER_QUEUE, ORDERS_TABLE, OrderMessage, PAYMENT_PROOFS_SHARE,
    PRODUCT_IMAGES_CONTAINER, PRODUCTS_TABLE, RetailStorage, StorageError, clamp_receive_count,
    parse_order_messages,
};

/// REST API version for the Blob, Queue and File services.
pub const STORAGE_API_VERSION: &str = "2023-11-03";

/// REST API version for the Table service.
pub const TABLE_API_VERSION: &str = "2019-02-02";

/// How a service authenticates its requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    SharedKey,
    SharedKeyLite,
}

/// Endpoint, version and signing scheme of one storage service.
#[derive(Debug, Clone)]
struct Service {
    http: Client,
    credential: SharedKeyCredential,
    endpoint: Url,
    version: &'static str,
    scheme: Scheme,
}

impl Service {
    /// URL of `segments` below the service endpoint.
    fn url(&self, segments: &[&str]) -> Result<Url, StorageError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| {
                StorageError::Config(format!("endpoint cannot be a base: {}", self.endpoint))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("x-ms-version", self.version)
    }

    /// Sign and send a request.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, StorageError> {
        let mut request = builder.build()?;
        match self.scheme {
            Scheme::SharedKey => self.credential.sign(&mut request)?,
            Scheme::SharedKeyLite => self.credential.sign_lite(&mut request)?,
        }
        Ok(self.http.execute(request).await?)
    }
}

/// Turn an unexpected response into [`StorageError::Api`].
///
/// Pulls the service error code out of either an XML or a JSON error body.
async fn api_error(response: Response) -> StorageError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let code = xml::element(&body, "Code")
        .map(str::to_owned)
        .or_else(|| {
            serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["odata.error"]["code"].as_str().map(str::to_owned))
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_owned()
        });
    StorageError::Api {
        status: status.as_u16(),
        message: code,
    }
}

/// Map the statuses every service shares, otherwise return the response.
async fn check(response: Response, what: &str) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(match status {
        StatusCode::NOT_FOUND => StorageError::NotFound(what.to_owned()),
        StatusCode::CONFLICT => StorageError::AlreadyExists(what.to_owned()),
        StatusCode::PRECONDITION_FAILED => StorageError::PreconditionFailed(what.to_owned()),
        _ => api_error(response).await,
    })
}

/// Storage backed by an Azure Storage account (or the Azurite emulator).
#[derive(Debug, Clone)]
pub struct AzureStorage {
    tables: TableClient,
    blobs: BlobClient,
    queues: QueueClient,
    files: Option<FileShareClient>,
}

impl AzureStorage {
    /// Build clients for every service of `account`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the account key is invalid.
    pub fn new(account: &StorageAccount) -> Result<Self, StorageError> {
        let http = Client::builder()
            .user_agent(concat!("abc-retailers-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let credential = SharedKeyCredential::new(account)?;

        let service = |endpoint: &Url, version: &'static str, scheme: Scheme| Service {
            http: http.clone(),
            credential: credential.clone(),
            endpoint: endpoint.clone(),
            version,
            scheme,
        };

        Ok(Self {
            tables: TableClient::new(service(
                &account.table_endpoint,
                TABLE_API_VERSION,
                Scheme::SharedKeyLite,
            )),
            blobs: BlobClient::new(service(
                &account.blob_endpoint,
                STORAGE_API_VERSION,
                Scheme::SharedKey,
            )),
            queues: QueueClient::new(service(
                &account.queue_endpoint,
                STORAGE_API_VERSION,
                Scheme::SharedKey,
            )),
            files: account.file_endpoint.as_ref().map(|endpoint| {
                FileShareClient::new(service(endpoint, STORAGE_API_VERSION, Scheme::SharedKey))
            }),
        })
    }

    fn files(&self) -> Result<&FileShareClient, StorageError> {
        self.files.as_ref().ok_or_else(|| {
            StorageError::Config("the storage account has no file service endpoint".to_owned())
        })
    }
}

#[async_trait]
impl RetailStorage for AzureStorage {
    #[instrument(skip(self))]
    async fn initialize(&self) -> Result<(), StorageError> {
        for table in [CUSTOMERS_TABLE, PRODUCTS_TABLE, ORDERS_TABLE] {
            self.tables.create_table(table).await?;
        }
        self.blobs.create_container(PRODUCT_IMAGES_CONTAINER).await?;
        self.queues.create_queue(ORDER_QUEUE).await?;
        match &self.files {
            Some(files) => files.create_share(PAYMENT_PROOFS_SHARE).await?,
            None => warn!("No file service endpoint; payment proofs are unavailable"),
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.tables.ping().await
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, StorageError> {
        self.tables
            .query::<CustomerRow>()
            .await?
            .into_iter()
            .map(Customer::try_from)
            .collect()
    }

    async fn get_customer(&self, id: &CustomerId) -> Result<Option<Customer>, StorageError> {
        self.tables
            .get::<CustomerRow>(id.as_str())
            .await?
            .map(Customer::try_from)
            .transpose()
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id))]
    async fn create_customer(&self, customer: &Customer) -> Result<Customer, StorageError> {
        let etag = self.tables.insert(&CustomerRow::from(customer)).await?;
        Ok(stamped(customer, etag, |c, e| c.etag = e))
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id))]
    async fn update_customer(&self, customer: &Customer) -> Result<Customer, StorageError> {
        let etag = self
            .tables
            .replace(&CustomerRow::from(customer), customer.etag.as_deref())
            .await?;
        Ok(stamped(customer, etag, |c, e| c.etag = e))
    }

    #[instrument(skip(self))]
    async fn delete_customer(&self, id: &CustomerId) -> Result<(), StorageError> {
        self.tables.delete::<CustomerRow>(id.as_str()).await
    }

    async fn list_products(&self) -> Result<Vec<Product>, StorageError> {
        self.tables
            .query::<ProductRow>()
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StorageError> {
        self.tables
            .get::<ProductRow>(id.as_str())
            .await?
            .map(Product::try_from)
            .transpose()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn create_product(&self, product: &Product) -> Result<Product, StorageError> {
        let etag = self.tables.insert(&ProductRow::from(product)).await?;
        Ok(stamped(product, etag, |p, e| p.etag = e))
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn update_product(&self, product: &Product) -> Result<Product, StorageError> {
        let etag = self
            .tables
            .replace(&ProductRow::from(product), product.etag.as_deref())
            .await?;
        Ok(stamped(product, etag, |p, e| p.etag = e))
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: &ProductId) -> Result<(), StorageError> {
        self.tables.delete::<ProductRow>(id.as_str()).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StorageError> {
        self.tables
            .query::<OrderRow>()
            .await?
            .into_iter()
            .map(Order::try_from)
            .collect()
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, StorageError> {
        self.tables
            .get::<OrderRow>(id.as_str())
            .await?
            .map(Order::try_from)
            .transpose()
    }

    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn create_order(&self, order: &Order) -> Result<Order, StorageError> {
        let etag = self.tables.insert(&OrderRow::try_from(order)?).await?;
        let stored = stamped(order, etag, |o, e| o.etag = e);
        self.send_order_message(&stored).await?;
        Ok(stored)
    }

    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn update_order(&self, order: &Order) -> Result<Order, StorageError> {
        let etag = self
            .tables
            .replace(&OrderRow::try_from(order)?, order.etag.as_deref())
            .await?;
        Ok(stamped(order, etag, |o, e| o.etag = e))
    }

    #[instrument(skip(self))]
    async fn delete_order(&self, id: &OrderId) -> Result<(), StorageError> {
        self.tables.delete::<OrderRow>(id.as_str()).await
    }

    #[instrument(skip(self, file), fields(product_id = %product_id, size = file.len()))]
    async fn upload_product_image(
        &self,
        file: &FileUpload,
        product_id: &ProductId,
    ) -> Result<String, StorageError> {
        let name = naming::product_image_name(product_id, &file.file_name, Utc::now());
        let content_type = file
            .content_type
            .as_deref()
            .unwrap_or_else(|| content_type_for(&name));
        let url = self
            .blobs
            .put_blob(
                PRODUCT_IMAGES_CONTAINER,
                &name,
                file.bytes.clone(),
                content_type,
            )
            .await?;
        Ok(url.to_string())
    }

    async fn get_product_image(&self, name: &str) -> Result<Option<StoredFile>, StorageError> {
        self.blobs.get_blob(PRODUCT_IMAGES_CONTAINER, name).await
    }

    #[instrument(skip(self))]
    async fn delete_product_image(&self, name: &str) -> Result<(), StorageError> {
        self.blobs.delete_blob(PRODUCT_IMAGES_CONTAINER, name).await
    }

    #[instrument(skip(self, file), fields(size = file.len()))]
    async fn upload_payment_proof(
        &self,
        file: &FileUpload,
        order_id: Option<&str>,
        customer_name: Option<&str>,
    ) -> Result<String, StorageError> {
        let name =
            naming::payment_proof_name(order_id, customer_name, &file.file_name, Utc::now());
        self.files()?
            .upload(PAYMENT_PROOFS_SHARE, &name, file.bytes.clone())
            .await?;
        Ok(name)
    }

    async fn list_payment_proofs(&self) -> Result<Vec<String>, StorageError> {
        self.files()?.list_root_files(PAYMENT_PROOFS_SHARE).await
    }

    async fn download_payment_proof(
        &self,
        name: &str,
    ) -> Result<Option<StoredFile>, StorageError> {
        self.files()?.get_file(PAYMENT_PROOFS_SHARE, name).await
    }

    #[instrument(skip(self))]
    async fn delete_payment_proof(&self, name: &str) -> Result<(), StorageError> {
        self.files()?.delete_file(PAYMENT_PROOFS_SHARE, name).await
    }

    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn send_order_message(&self, order: &Order) -> Result<(), StorageError> {
        let text = OrderMessage::try_from(order)?.to_json()?;
        self.queues.send_message(ORDER_QUEUE, &text).await
    }

    async fn receive_order_messages(&self, count: u8) -> Result<Vec<OrderMessage>, StorageError> {
        let texts = self
            .queues
            .receive_messages(ORDER_QUEUE, clamp_receive_count(count))
            .await?;
        Ok(parse_order_messages(texts))
    }
}

/// Copy of `record` carrying the etag the service returned.
fn stamped<T: Clone>(
    record: &T,
    etag: Option<String>,
    set: impl FnOnce(&mut T, Option<String>),
) -> T {
    let mut stored = record.clone();
    set(&mut stored, etag);
    stored
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn storage() -> AzureStorage {
        let account = StorageAccount::parse(
            "AccountName=abcretail;AccountKey=a2V5a2V5a2V5;EndpointSuffix=core.windows.net",
        )
        .unwrap();
        AzureStorage::new(&account).unwrap()
    }

    #[test]
    fn service_urls_append_segments() {
        let storage = storage();
        let url = storage
            .blobs
            .service
            .url(&["productimages", "7_20250101_000000.jpg"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://abcretail.blob.core.windows.net/productimages/7_20250101_000000.jpg"
        );

        let url = storage
            .files()
            .unwrap()
            .service
            .url(&["paymentproofs", "a b.pdf"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://abcretail.file.core.windows.net/paymentproofs/a%20b.pdf"
        );
    }

    #[test]
    fn emulator_keeps_account_in_path_and_has_no_file_service() {
        let account = StorageAccount::parse("UseDevelopmentStorage=true").unwrap();
        let storage = AzureStorage::new(&account).unwrap();
        let url = storage
            .queues
            .service
            .url(&["orderprocessing", "messages"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:10001/devstoreaccount1/orderprocessing/messages"
        );
        assert!(matches!(storage.files(), Err(StorageError::Config(_))));
    }
}
