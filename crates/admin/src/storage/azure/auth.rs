//! Shared Key request signing.
//!
//! Blob, Queue and File requests use the `SharedKey` scheme; Table requests
//! use `SharedKeyLite`. Both sign an HMAC-SHA256 over a canonical form of the
//! request with the base64-decoded account key.
//!
//! ```text
//! SharedKey string-to-sign:
//!   VERB \n Content-Encoding \n Content-Language \n Content-Length \n
//!   Content-MD5 \n Content-Type \n Date \n If-Modified-Since \n If-Match \n
//!   If-None-Match \n If-Unmodified-Since \n Range \n
//!   CanonicalizedHeaders CanonicalizedResource
//!
//! SharedKeyLite (Table) string-to-sign:
//!   x-ms-date \n CanonicalizedResource
//! ```

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Request;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use sha2::Sha256;

use super::connection_string::StorageAccount;
use crate::storage::StorageError;

type HmacSha256 = Hmac<Sha256>;

/// Headers that take part in the `SharedKey` string-to-sign, in order.
const SIGNED_HEADERS: [&str; 11] = [
    "content-encoding",
    "content-language",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "if-modified-since",
    "if-match",
    "if-none-match",
    "if-unmodified-since",
    "range",
];

/// Account name and decoded key used to sign requests.
#[derive(Clone)]
pub struct SharedKeyCredential {
    account: String,
    key: Vec<u8>,
}

impl std::fmt::Debug for SharedKeyCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKeyCredential")
            .field("account", &self.account)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl SharedKeyCredential {
    /// Build a credential from a parsed account.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the account key is not base64.
    pub fn new(account: &StorageAccount) -> Result<Self, StorageError> {
        let key = BASE64
            .decode(account.key.expose_secret().as_bytes())
            .map_err(|e| StorageError::Config(format!("AccountKey is not valid base64: {e}")))?;
        Ok(Self {
            account: account.name.clone(),
            key,
        })
    }

    /// Account name.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Stamp `x-ms-date` and a `SharedKey` authorization on a request.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature cannot be computed.
    pub fn sign(&self, request: &mut Request) -> Result<(), StorageError> {
        stamp_date(request.headers_mut())?;
        let string_to_sign = self.shared_key_string(request);
        let signature = self.hmac(&string_to_sign)?;
        set_authorization(
            request.headers_mut(),
            &format!("SharedKey {}:{signature}", self.account),
        )
    }

    /// Stamp `x-ms-date` and a `SharedKeyLite` authorization on a Table request.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature cannot be computed.
    pub fn sign_lite(&self, request: &mut Request) -> Result<(), StorageError> {
        stamp_date(request.headers_mut())?;
        let date = header_str(request.headers(), "x-ms-date");
        let mut resource = format!("/{}{}", self.account, request.url().path());
        if let Some((_, comp)) = request.url().query_pairs().find(|(k, _)| k == "comp") {
            resource.push_str("?comp=");
            resource.push_str(&comp);
        }
        let signature = self.hmac(&format!("{date}\n{resource}"))?;
        set_authorization(
            request.headers_mut(),
            &format!("SharedKeyLite {}:{signature}", self.account),
        )
    }

    fn shared_key_string(&self, request: &Request) -> String {
        let headers = request.headers();
        let mut out = String::new();
        out.push_str(request.method().as_str());
        out.push('\n');

        let body_len = request
            .body()
            .and_then(reqwest::Body::as_bytes)
            .map_or(0, <[u8]>::len);

        for name in SIGNED_HEADERS {
            let value = if name == "content-length" {
                // Zero-length bodies sign an empty Content-Length.
                let declared = header_str(headers, name);
                if !declared.is_empty() && declared != "0" {
                    declared.to_owned()
                } else if body_len > 0 {
                    body_len.to_string()
                } else {
                    String::new()
                }
            } else {
                header_str(headers, name).to_owned()
            };
            out.push_str(&value);
            out.push('\n');
        }

        out.push_str(&canonicalized_headers(headers));
        out.push_str(&self.canonicalized_resource(request.url()));
        out
    }

    fn canonicalized_resource(&self, url: &url::Url) -> String {
        let mut resource = format!("/{}{}", self.account, url.path());

        let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (k, v) in url.query_pairs() {
            params
                .entry(k.to_lowercase())
                .or_default()
                .push(v.into_owned());
        }
        for (name, mut values) in params {
            values.sort();
            resource.push('\n');
            resource.push_str(&name);
            resource.push(':');
            resource.push_str(&values.join(","));
        }
        resource
    }

    fn hmac(&self, string_to_sign: &str) -> Result<String, StorageError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| StorageError::Config(format!("HMAC key error: {e}")))?;
        mac.update(string_to_sign.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

/// `x-ms-*` headers, lowercased, sorted, one `name:value\n` line each.
fn canonicalized_headers(headers: &HeaderMap) -> String {
    let mut ms: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.as_str().to_ascii_lowercase();
        if name.starts_with("x-ms-") {
            let value = value.to_str().unwrap_or_default().trim().to_owned();
            ms.insert(name, value);
        }
    }
    ms.into_iter().fold(String::new(), |mut acc, (k, v)| {
        acc.push_str(&k);
        acc.push(':');
        acc.push_str(&v);
        acc.push('\n');
        acc
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn stamp_date(headers: &mut HeaderMap) -> Result<(), StorageError> {
    let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
    let value = HeaderValue::from_str(&date)
        .map_err(|e| StorageError::Request(format!("invalid date header: {e}")))?;
    headers.insert("x-ms-date", value);
    Ok(())
}

fn set_authorization(headers: &mut HeaderMap, value: &str) -> Result<(), StorageError> {
    let value = HeaderValue::from_str(value)
        .map_err(|e| StorageError::Request(format!("invalid authorization header: {e}")))?;
    headers.insert(AUTHORIZATION, value);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reqwest::{Client, Method};

    fn credential() -> SharedKeyCredential {
        let account = StorageAccount::parse("UseDevelopmentStorage=true").unwrap();
        SharedKeyCredential::new(&account).unwrap()
    }

    #[test]
    fn rejects_non_base64_key() {
        let account = StorageAccount::parse("AccountName=a;AccountKey=not base64!").unwrap();
        assert!(matches!(
            SharedKeyCredential::new(&account),
            Err(StorageError::Config(_))
        ));
    }

    #[test]
    fn string_to_sign_layout() {
        let request = Client::new()
            .request(
                Method::PUT,
                "http://127.0.0.1:10000/devstoreaccount1/productimages/a.png",
            )
            .header("x-ms-version", "2023-11-03")
            .header("x-ms-blob-type", "BlockBlob")
            .header("content-type", "image/png")
            .body(vec![1_u8, 2, 3])
            .build()
            .unwrap();

        let s = credential().shared_key_string(&request);
        let lines: Vec<&str> = s.split('\n').collect();
        assert_eq!(lines[0], "PUT");
        assert_eq!(lines[3], "3");
        assert_eq!(lines[5], "image/png");
        assert_eq!(lines[12], "x-ms-blob-type:BlockBlob");
        assert_eq!(lines[13], "x-ms-version:2023-11-03");
        assert_eq!(
            lines[14],
            "/devstoreaccount1/devstoreaccount1/productimages/a.png"
        );
    }

    #[test]
    fn query_parameters_are_sorted_and_lowercased() {
        let request = Client::new()
            .get("https://acct.file.core.windows.net/paymentproofs?restype=directory&comp=list")
            .build()
            .unwrap();
        let s = credential().shared_key_string(&request);
        assert!(s.ends_with("/paymentproofs\ncomp:list\nrestype:directory"));
        assert_eq!(s.split('\n').nth(3), Some(""));
    }

    #[test]
    fn signing_sets_headers() {
        let mut request = Client::new()
            .get("http://127.0.0.1:10002/devstoreaccount1/Tables")
            .build()
            .unwrap();
        credential().sign_lite(&mut request).unwrap();
        let auth = request.headers()[AUTHORIZATION].to_str().unwrap();
        assert!(auth.starts_with("SharedKeyLite devstoreaccount1:"));
        assert!(request.headers().contains_key("x-ms-date"));
    }
}
