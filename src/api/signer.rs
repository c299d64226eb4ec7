//! Crypto.com request signing
//!
//! Every authenticated request carries a millisecond timestamp and a
//! signature computed as
//!
//! ```text
//! hex(HMAC-SHA256(secret, timestamp || request_path || params_str))
//! ```
//!
//! where `params_str` is each parameter key immediately followed by its
//! value, keys in ascending byte order, no separators.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ChartsError;

type HmacSha256 = Hmac<Sha256>;

/// Query parameters of one request, kept in signing order
pub type RequestParams = BTreeMap<String, String>;

/// Timestamp and signature for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Milliseconds since the Unix epoch, decimal
    pub timestamp: String,
    /// Lowercase hex HMAC-SHA256 digest
    pub signature: String,
}

/// Error types for signer construction
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("API secret is missing or empty")]
    MissingSecret,

    #[error("Invalid HMAC key: {0}")]
    InvalidKey(String),
}

impl From<SignerError> for ChartsError {
    fn from(e: SignerError) -> Self {
        ChartsError::configuration(e.to_string())
    }
}

/// HMAC-SHA256 signer keyed once with the API secret
#[derive(Clone)]
pub struct RequestSigner {
    mac: HmacSha256,
}

impl RequestSigner {
    /// Key a signer with the API secret. A blank secret is rejected here,
    /// before any request is attempted.
    pub fn new(secret: &SecretString) -> Result<Self, SignerError> {
        let secret = secret.expose_secret();
        if secret.trim().is_empty() {
            return Err(SignerError::MissingSecret);
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        Ok(Self { mac })
    }

    /// Sign a request at the current wall-clock time
    pub fn sign(&self, request_path: &str, params: &RequestParams) -> SignedRequest {
        self.sign_at(chrono::Utc::now().timestamp_millis(), request_path, params)
    }

    /// Sign a request with an explicit millisecond timestamp
    pub fn sign_at(&self, timestamp_ms: i64, request_path: &str, params: &RequestParams) -> SignedRequest {
        let timestamp = timestamp_ms.to_string();
        let params_str = build_param_string(params);

        let mut mac = self.mac.clone();
        mac.update(timestamp.as_bytes());
        mac.update(request_path.as_bytes());
        mac.update(params_str.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        SignedRequest { timestamp, signature }
    }
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestSigner { .. }")
    }
}

/// Concatenate `key || value` for every parameter, keys ascending.
pub fn build_param_string<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: fmt::Display,
{
    let mut pairs: Vec<(K, V)> = params.into_iter().collect();
    pairs.sort_by(|a, b| a.0.as_ref().cmp(b.0.as_ref()));

    let mut out = String::new();
    for (key, value) in pairs {
        out.push_str(key.as_ref());
        out.push_str(&value.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(secret: &str) -> RequestSigner {
        RequestSigner::new(&SecretString::from(secret.to_string())).unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> RequestParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_param_string_sorted() {
        assert_eq!(build_param_string(vec![("b", 2), ("a", 1)]), "a1b2");
        assert_eq!(build_param_string(Vec::<(&str, &str)>::new()), "");
    }

    #[test]
    fn test_known_signature() {
        let signed = signer("s3cr3t").sign_at(
            1_700_000_000_000,
            "/v2/public/get-candlestick",
            &params(&[("timeframe", "1D"), ("instrument_name", "BTC_USDT")]),
        );
        assert_eq!(signed.timestamp, "1700000000000");
        assert_eq!(
            signed.signature,
            "a9e8c4f67b346556f1fa5b29018e356fd6994e097cf6afccb346aaceddb86479"
        );
    }

    #[test]
    fn test_signature_without_params() {
        let signed = signer("s3cr3t").sign_at(1_700_000_000_000, "/v2/public/get-instruments", &RequestParams::new());
        assert_eq!(
            signed.signature,
            "746a205c8588d72704b4a6282961c0cb99f8a58686364a0fbe50bec75204bbad"
        );
    }

    #[test]
    fn test_signature_is_lowercase_hex() {
        let signed = signer("another-secret").sign("/v2/public/get-instruments", &RequestParams::new());
        assert_eq!(signed.signature.len(), 64);
        assert!(signed.signature.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert!(signed.timestamp.parse::<i64>().unwrap() > 1_600_000_000_000);
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            RequestSigner::new(&SecretString::from(String::new())),
            Err(SignerError::MissingSecret)
        ));
        assert!(matches!(
            RequestSigner::new(&SecretString::from("  ".to_string())),
            Err(SignerError::MissingSecret)
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        assert_eq!(format!("{:?}", signer("s3cr3t")), "RequestSigner { .. }");
    }
}
