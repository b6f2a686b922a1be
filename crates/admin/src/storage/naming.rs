//! Naming rules for uploaded blobs and files.
//!
//! Uploaded artifacts carry no metadata beyond their name, so the name
//! encodes what the file belongs to and when it was uploaded.

use abc_retailers_core::ProductId;
use abc_retailers_core::entities::upload::extension_of;
use chrono::{DateTime, Utc};

/// Order part used when a payment proof is not tied to an order.
pub const DEFAULT_PROOF_ORDER: &str = "GENERAL";

/// Customer part used when no customer name was given.
pub const DEFAULT_PROOF_CUSTOMER: &str = "UNKNOWN";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Blob name for a product image: `{productId}_{yyyyMMdd_HHmmss}{ext}`.
#[must_use]
pub fn product_image_name(product_id: &ProductId, file_name: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}{}",
        product_id,
        at.format(TIMESTAMP_FORMAT),
        extension_of(file_name)
    )
}

/// File name for a payment proof: `{orderId}_{customer}_{yyyyMMdd_HHmmss}{ext}`.
///
/// Blank parts fall back to [`DEFAULT_PROOF_ORDER`] and
/// [`DEFAULT_PROOF_CUSTOMER`]. Both parts are sanitized so the result is a
/// single path segment.
#[must_use]
pub fn payment_proof_name(
    order_id: Option<&str>,
    customer_name: Option<&str>,
    file_name: &str,
    at: DateTime<Utc>,
) -> String {
    let order = name_part(order_id, DEFAULT_PROOF_ORDER);
    let customer = name_part(customer_name, DEFAULT_PROOF_CUSTOMER);
    format!(
        "{order}_{customer}_{}{}",
        at.format(TIMESTAMP_FORMAT),
        extension_of(file_name)
    )
}

fn name_part(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => sanitize(v),
        _ => default.to_owned(),
    }
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
#[must_use]
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Blob name referenced by a stored image URL (its last path segment).
#[must_use]
pub fn image_name_from_url(image_url: &str) -> Option<String> {
    let url = url::Url::parse(image_url).ok()?;
    let last = url.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    urlencoding::decode(last).ok().map(std::borrow::Cow::into_owned)
}

/// Content type served for a stored file, chosen by extension.
#[must_use]
pub fn content_type_for(file_name: &str) -> &'static str {
    match extension_of(file_name).to_ascii_lowercase().as_str() {
        ".pdf" => "application/pdf",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".webp" => "image/webp",
        ".doc" => "application/msword",
        ".docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 14, 8, 5, 3).unwrap()
    }

    #[test]
    fn product_image_keeps_extension() {
        let pid = ProductId::parse("12").unwrap();
        assert_eq!(
            product_image_name(&pid, "kettle.PNG", at()),
            "12_20250914_080503.PNG"
        );
        assert_eq!(product_image_name(&pid, "noext", at()), "12_20250914_080503");
    }

    #[test]
    fn payment_proof_defaults_and_sanitizes() {
        assert_eq!(
            payment_proof_name(None, Some("  "), "slip.pdf", at()),
            "GENERAL_UNKNOWN_20250914_080503.pdf"
        );
        assert_eq!(
            payment_proof_name(Some("A/B 7"), Some("Jo Soap"), "slip.pdf", at()),
            "A_B_7_Jo_Soap_20250914_080503.pdf"
        );
    }

    #[test]
    fn image_name_is_last_decoded_segment() {
        assert_eq!(
            image_name_from_url(
                "https://acct.blob.core.windows.net/productimages/7_20250101_000000.jpg"
            )
            .as_deref(),
            Some("7_20250101_000000.jpg")
        );
        assert_eq!(
            image_name_from_url("memory://productimages/a%20b.png").as_deref(),
            Some("a b.png")
        );
        assert_eq!(image_name_from_url("not a url"), None);
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for("x.PDF"), "application/pdf");
        assert_eq!(content_type_for("x.jpeg"), "image/jpeg");
        assert!(content_type_for("x.docx").ends_with("wordprocessingml.document"));
        assert_eq!(content_type_for("x.exe"), "application/octet-stream");
    }
}
