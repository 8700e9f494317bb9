//! Square webhook signatures
//!
//! Square signs `notification_url ++ body` with HMAC-SHA256 and sends the
//! base64 digest in the `x-square-hmacsha256-signature` header.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature
pub const SIGNATURE_HEADER: &str = "x-square-hmacsha256-signature";

/// Verify a signature over the raw body alone
pub fn verify_signature(raw_body: &str, signature: &str, secret: &str) -> bool {
    verify_signature_with_url("", raw_body, signature, secret)
}

/// Verify a signature over the notification URL followed by the raw body
pub fn verify_signature_with_url(
    notification_url: &str,
    raw_body: &str,
    signature: &str,
    secret: &str,
) -> bool {
    if secret.is_empty() || signature.trim().is_empty() {
        return false;
    }

    let Ok(provided) = STANDARD.decode(signature.trim()) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(notification_url.as_bytes());
    mac.update(raw_body.as_bytes());

    // constant-time
    mac.verify_slice(&provided).is_ok()
}

/// Compute the signature Square would send; used to sign test fixtures
pub fn sign(notification_url: &str, raw_body: &str, secret: &str) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(notification_url.as_bytes());
    mac.update(raw_body.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
