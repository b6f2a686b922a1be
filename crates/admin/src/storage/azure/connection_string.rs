//! Storage account connection strings.
//!
//! Accepts the format produced by the Azure portal:
//!
//! ```text
//! DefaultEndpointsProtocol=https;AccountName=abc;AccountKey=...;EndpointSuffix=core.windows.net
//! ```
//!
//! Explicit `BlobEndpoint`, `QueueEndpoint`, `TableEndpoint` and
//! `FileEndpoint` entries override the derived endpoints, and
//! `UseDevelopmentStorage=true` selects the local Azurite emulator.

use secrecy::SecretString;
use url::Url;

use crate::storage::StorageError;

/// Well-known account name of the storage emulator.
pub const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";

/// Well-known, publicly documented key of the storage emulator.
pub const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Account name, key and service endpoints of a storage account.
///
/// Implements `Debug` manually to redact the account key.
#[derive(Clone)]
pub struct StorageAccount {
    pub name: String,
    pub key: SecretString,
    pub blob_endpoint: Url,
    pub queue_endpoint: Url,
    pub table_endpoint: Url,
    /// The emulator has no file service, so this may be absent.
    pub file_endpoint: Option<Url>,
    /// Whether this is the local emulator.
    pub development: bool,
}

impl std::fmt::Debug for StorageAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageAccount")
            .field("name", &self.name)
            .field("key", &"[REDACTED]")
            .field("blob_endpoint", &self.blob_endpoint.as_str())
            .field("queue_endpoint", &self.queue_endpoint.as_str())
            .field("table_endpoint", &self.table_endpoint.as_str())
            .field("file_endpoint", &self.file_endpoint.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

impl StorageAccount {
    /// Parse a connection string.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the account name or key is missing
    /// or an endpoint is not a valid URL.
    pub fn parse(connection_string: &str) -> Result<Self, StorageError> {
        let mut protocol = "https".to_owned();
        let mut name = None;
        let mut key = None;
        let mut suffix = DEFAULT_ENDPOINT_SUFFIX.to_owned();
        let mut blob = None;
        let mut queue = None;
        let mut table = None;
        let mut file = None;
        let mut development = false;

        for part in connection_string.split(';').map(str::trim) {
            if part.is_empty() {
                continue;
            }
            // Keys are split on the first '=' only; base64 keys end in '='.
            let (k, v) = part
                .split_once('=')
                .ok_or_else(|| StorageError::Config(format!("malformed setting '{part}'")))?;
            match k.trim().to_ascii_lowercase().as_str() {
                "defaultendpointsprotocol" => v.trim().clone_into(&mut protocol),
                "accountname" => name = Some(v.trim().to_owned()),
                "accountkey" => key = Some(v.trim().to_owned()),
                "endpointsuffix" => v.trim().clone_into(&mut suffix),
                "blobendpoint" => blob = Some(parse_endpoint("BlobEndpoint", v)?),
                "queueendpoint" => queue = Some(parse_endpoint("QueueEndpoint", v)?),
                "tableendpoint" => table = Some(parse_endpoint("TableEndpoint", v)?),
                "fileendpoint" => file = Some(parse_endpoint("FileEndpoint", v)?),
                "usedevelopmentstorage" => development = v.trim().eq_ignore_ascii_case("true"),
                _ => {}
            }
        }

        if development {
            return Self::development(blob, queue, table);
        }

        let name = name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| StorageError::Config("AccountName is required".to_owned()))?;
        let key = key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| StorageError::Config("AccountKey is required".to_owned()))?;

        let derive = |service: &str| -> Result<Url, StorageError> {
            parse_endpoint(service, &format!("{protocol}://{name}.{service}.{suffix}"))
        };

        Ok(Self {
            blob_endpoint: blob.map_or_else(|| derive("blob"), Ok)?,
            queue_endpoint: queue.map_or_else(|| derive("queue"), Ok)?,
            table_endpoint: table.map_or_else(|| derive("table"), Ok)?,
            file_endpoint: Some(file.map_or_else(|| derive("file"), Ok)?),
            name,
            key: SecretString::from(key),
            development: false,
        })
    }

    fn development(
        blob: Option<Url>,
        queue: Option<Url>,
        table: Option<Url>,
    ) -> Result<Self, StorageError> {
        let local = |port: u16| {
            parse_endpoint(
                "development endpoint",
                &format!("http://127.0.0.1:{port}/{DEV_ACCOUNT_NAME}"),
            )
        };
        Ok(Self {
            name: DEV_ACCOUNT_NAME.to_owned(),
            key: SecretString::from(DEV_ACCOUNT_KEY),
            blob_endpoint: blob.map_or_else(|| local(10000), Ok)?,
            queue_endpoint: queue.map_or_else(|| local(10001), Ok)?,
            table_endpoint: table.map_or_else(|| local(10002), Ok)?,
            file_endpoint: None,
            development: true,
        })
    }
}

fn parse_endpoint(setting: &str, value: &str) -> Result<Url, StorageError> {
    let value = value.trim().trim_end_matches('/');
    Url::parse(value).map_err(|e| StorageError::Config(format!("invalid {setting}: {e}")))
}
