//! OAuth 1.0a token-based authentication for `SuiteTalk` REST.
//!
//! Every request carries a freshly signed `Authorization` header. Nothing is
//! cached between calls: a new timestamp and nonce are drawn for each
//! signature, so two signatures over the same request never match.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use url::Url;

use super::NetSuiteError;

/// Signature method advertised in the header.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA256";

/// OAuth protocol version advertised in the header.
pub const OAUTH_VERSION: &str = "1.0";

/// Header parameters whose values must never reach the logs.
const REDACTED_PARAMS: &[&str] = &["oauth_consumer_key", "oauth_token", "oauth_signature"];

/// Token-based authentication credentials for one `NetSuite` account.
///
/// Implements `Debug` manually so the secrets never appear in logs.
#[derive(Clone)]
pub struct OAuthCredentials {
    pub realm: String,
    pub consumer_key: SecretString,
    pub consumer_secret: SecretString,
    pub token_id: SecretString,
    pub token_secret: SecretString,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("realm", &self.realm)
            .field("consumer_key", &"[REDACTED]")
            .field("consumer_secret", &"[REDACTED]")
            .field("token_id", &"[REDACTED]")
            .field("token_secret", &"[REDACTED]")
            .finish()
    }
}

impl From<&crate::config::NetSuiteConfig> for OAuthCredentials {
    fn from(config: &crate::config::NetSuiteConfig) -> Self {
        Self {
            realm: config.realm.clone(),
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
            token_id: config.token_id.clone(),
            token_secret: config.token_secret.clone(),
        }
    }
}

/// A signed `Authorization` header value.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthHeader {
    value: String,
    timestamp: i64,
    nonce: String,
    signature: String,
}

impl OAuthHeader {
    /// The full header value (`OAuth realm="...", ...`).
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Unix timestamp the header was signed with.
    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Nonce the header was signed with.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Base64 signature before percent-encoding.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Header value safe for logging.
    #[must_use]
    pub fn redacted(&self) -> String {
        redact_header(&self.value)
    }
}

impl std::fmt::Debug for OAuthHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthHeader")
            .field("value", &self.redacted())
            .field("timestamp", &self.timestamp)
            .field("nonce", &self.nonce)
            .finish_non_exhaustive()
    }
}

/// Sign a request with a fresh timestamp and random nonce.
///
/// # Errors
///
/// Returns `NetSuiteError::Signing` if the HMAC key cannot be constructed.
pub fn sign_request(
    method: &str,
    url: &Url,
    credentials: &OAuthCredentials,
) -> Result<OAuthHeader, NetSuiteError> {
    let timestamp = chrono::Utc::now().timestamp();
    let nonce = hex::encode(rand::random::<[u8; 8]>());
    sign_with(method, url, credentials, timestamp, &nonce)
}

/// Sign a request with an explicit timestamp and nonce.
///
/// Deterministic: identical inputs always produce an identical header.
///
/// # Errors
///
/// Returns `NetSuiteError::Signing` if the HMAC key cannot be constructed.
pub fn sign_with(
    method: &str,
    url: &Url,
    credentials: &OAuthCredentials,
    timestamp: i64,
    nonce: &str,
) -> Result<OAuthHeader, NetSuiteError> {
    let oauth_params = vec![
        (
            "oauth_consumer_key".to_string(),
            credentials.consumer_key.expose_secret().to_string(),
        ),
        (
            "oauth_token".to_string(),
            credentials.token_id.expose_secret().to_string(),
        ),
        (
            "oauth_signature_method".to_string(),
            SIGNATURE_METHOD.to_string(),
        ),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
        ("oauth_nonce".to_string(), nonce.to_string()),
        ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
    ];

    let mut signed_params = oauth_params.clone();
    signed_params.extend(url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())));

    let base_string = signature_base_string(method, url, &signed_params);
    let signature = compute_signature(&base_string, &signing_key(credentials))?;

    let mut value = format!("OAuth realm=\"{}\"", credentials.realm);
    for (key, param) in &oauth_params {
        value.push_str(&format!(", {key}=\"{}\"", encode(param)));
    }
    value.push_str(&format!(", oauth_signature=\"{}\"", encode(&signature)));

    Ok(OAuthHeader {
        value,
        timestamp,
        nonce: nonce.to_string(),
        signature,
    })
}

/// Build the signature base string:
/// `METHOD&enc(origin + path)&enc(sorted "k=v" pairs joined by "&")`.
#[must_use]
pub fn signature_base_string(method: &str, url: &Url, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base_url = format!("{}{}", url.origin().ascii_serialization(), url.path());

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(&base_url),
        encode(&param_string)
    )
}

/// HMAC key: `enc(consumer_secret)&enc(token_secret)`.
#[must_use]
pub fn signing_key(credentials: &OAuthCredentials) -> SecretString {
    SecretString::from(format!(
        "{}&{}",
        encode(credentials.consumer_secret.expose_secret()),
        encode(credentials.token_secret.expose_secret())
    ))
}

/// Base64 HMAC-SHA256 of the base string.
///
/// # Errors
///
/// Returns `NetSuiteError::Signing` if the HMAC key cannot be constructed.
pub fn compute_signature(base_string: &str, key: &SecretString) -> Result<String, NetSuiteError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key.expose_secret().as_bytes())
        .map_err(|e| NetSuiteError::Signing(e.to_string()))?;
    mac.update(base_string.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Replace the values of the secret-bearing header parameters with `[REDACTED]`.
#[must_use]
pub fn redact_header(header: &str) -> String {
    let mut redacted = header.to_string();
    for param in REDACTED_PARAMS {
        let marker = format!("{param}=\"");
        if let Some(start) = redacted.find(&marker) {
            let value_start = start + marker.len();
            if let Some(len) = redacted.get(value_start..).and_then(|rest| rest.find('"')) {
                redacted.replace_range(value_start..value_start + len, "[REDACTED]");
            }
        }
    }
    redacted
}

/// RFC 3986 percent-encoding (unreserved characters left as-is).
fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn credentials() -> OAuthCredentials {
        OAuthCredentials {
            realm: "1234567_SB1".to_string(),
            consumer_key: SecretString::from("ck-abc123"),
            consumer_secret: SecretString::from("cs-def456"),
            token_id: SecretString::from("tk-ghi789"),
            token_secret: SecretString::from("ts-jkl012"),
        }
    }

    fn suiteql_url() -> Url {
        Url::parse("https://1234567-sb1.suitetalk.api.netsuite.com/services/rest/query/v1/suiteql")
            .unwrap()
    }

    #[test]
    fn test_base_string_sorts_and_encodes_params() {
        let url = Url::parse("https://example.com/path?b=2").unwrap();
        let params = vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "x y".to_string()),
        ];

        let base = signature_base_string("post", &url, &params);

        assert_eq!(
            base,
            "POST&https%3A%2F%2Fexample.com%2Fpath&a%3Dx%2520y%26b%3D2"
        );
    }

    #[test]
    fn test_signing_key_joins_encoded_secrets() {
        let key = signing_key(&credentials());
        assert_eq!(key.expose_secret(), "cs-def456&ts-jkl012");
    }

    #[test]
    fn test_sign_with_is_deterministic() {
        let a = sign_with("POST", &suiteql_url(), &credentials(), 1_700_000_000, "0011223344556677")
            .unwrap();
        let b = sign_with("POST", &suiteql_url(), &credentials(), 1_700_000_000, "0011223344556677")
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_header_layout() {
        let header =
            sign_with("POST", &suiteql_url(), &credentials(), 1_700_000_000, "0011223344556677")
                .unwrap();
        let value = header.value();

        assert!(value.starts_with("OAuth realm=\"1234567_SB1\", "));
        assert!(value.contains("oauth_consumer_key=\"ck-abc123\""));
        assert!(value.contains("oauth_token=\"tk-ghi789\""));
        assert!(value.contains("oauth_signature_method=\"HMAC-SHA256\""));
        assert!(value.contains("oauth_timestamp=\"1700000000\""));
        assert!(value.contains("oauth_nonce=\"0011223344556677\""));
        assert!(value.contains("oauth_version=\"1.0\""));
        assert!(value.ends_with(&format!(
            "oauth_signature=\"{}\"",
            urlencoding::encode(header.signature())
        )));
    }

    #[test]
    fn test_signature_matches_manual_computation() {
        let creds = credentials();
        let url = suiteql_url();
        let header = sign_with("POST", &url, &creds, 1_700_000_000, "0011223344556677").unwrap();

        let params = vec![
            ("oauth_consumer_key".to_string(), "ck-abc123".to_string()),
            ("oauth_token".to_string(), "tk-ghi789".to_string()),
            ("oauth_signature_method".to_string(), "HMAC-SHA256".to_string()),
            ("oauth_timestamp".to_string(), "1700000000".to_string()),
            ("oauth_nonce".to_string(), "0011223344556677".to_string()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];
        let base = signature_base_string("POST", &url, &params);
        let expected = compute_signature(&base, &signing_key(&creds)).unwrap();

        assert_eq!(header.signature(), expected);
    }

    #[test]
    fn test_query_params_are_signed() {
        let creds = credentials();
        let plain = Url::parse("https://example.com/record").unwrap();
        let with_query = Url::parse("https://example.com/record?limit=5").unwrap();

        let a = sign_with("GET", &plain, &creds, 1, "aa").unwrap();
        let b = sign_with("GET", &with_query, &creds, 1, "aa").unwrap();

        assert_ne!(a.signature(), b.signature());
        assert!(!b.value().contains("limit"));
    }

    #[test]
    fn test_sign_request_uses_fresh_nonce() {
        let creds = credentials();
        let url = suiteql_url();
        let a = sign_request("POST", &url, &creds).unwrap();
        let b = sign_request("POST", &url, &creds).unwrap();

        assert_eq!(a.nonce().len(), 16);
        assert!(a.nonce().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.nonce(), b.nonce());
        assert_ne!(a.signature(), b.signature());

        // Each header verifies against its own timestamp and nonce.
        for header in [&a, &b] {
            let again =
                sign_with("POST", &url, &creds, header.timestamp(), header.nonce()).unwrap();
            assert_eq!(again.signature(), header.signature());
        }
    }

    #[test]
    fn test_redact_header_hides_secrets() {
        let header =
            sign_with("POST", &suiteql_url(), &credentials(), 1_700_000_000, "0011223344556677")
                .unwrap();
        let redacted = header.redacted();

        assert!(redacted.contains("oauth_consumer_key=\"[REDACTED]\""));
        assert!(redacted.contains("oauth_token=\"[REDACTED]\""));
        assert!(redacted.contains("oauth_signature=\"[REDACTED]\""));
        assert!(redacted.contains("oauth_nonce=\"0011223344556677\""));
        assert!(!redacted.contains("ck-abc123"));
        assert!(!redacted.contains("tk-ghi789"));
    }

    #[test]
    fn test_credentials_debug_redacts() {
        let debug_output = format!("{:?}", credentials());
        assert!(debug_output.contains("1234567_SB1"));
        assert!(!debug_output.contains("cs-def456"));
        assert!(!debug_output.contains("ts-jkl012"));
    }
}
