//! AWS Signature Version 4 request signing.
//!
//! Minimal signer for the single request shape this crate issues: a POST to
//! the service root with a JSON body and an `X-Amz-Target` header. Built on
//! the same `hmac`/`sha2`/`hex` stack used elsewhere for signature work.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const CONTENT_TYPE: &str = "application/x-amz-json-1.0";

/// AWS credentials for request signing.
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Present when running with temporary (STS) credentials
    pub session_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &self.session_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Sign a service-root POST and return every header the request must carry
/// (including `Authorization`). `host` must match what the HTTP client will
/// actually send, port included for non-default ports.
pub fn sign_request(
    credentials: &Credentials,
    region: &str,
    service: &str,
    host: &str,
    amz_target: &str,
    body: &[u8],
    now: DateTime<Utc>,
) -> Vec<(String, String)> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();
    let payload_hash = sha256_hex(body);

    // Canonical headers, sorted by name, lowercase, trimmed values.
    let mut canonical_headers: Vec<(String, String)> = vec![
        ("content-type".into(), CONTENT_TYPE.into()),
        ("host".into(), host.into()),
        ("x-amz-date".into(), amz_date.clone()),
        ("x-amz-target".into(), amz_target.into()),
    ];
    if let Some(token) = &credentials.session_token {
        canonical_headers.push(("x-amz-security-token".into(), token.clone()));
    }
    canonical_headers.sort_by(|a, b| a.0.cmp(&b.0));

    let signed_headers = canonical_headers
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let canonical_request = format!(
        "POST\n/\n\n{}\n{}\n{}",
        canonical_headers
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect::<String>(),
        signed_headers,
        payload_hash,
    );

    let credential_scope = format!("{date}/{region}/{service}/aws4_request");
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{credential_scope}\n{}",
        sha256_hex(canonical_request.as_bytes()),
    );

    // Key derivation chain: secret -> date -> region -> service -> "aws4_request".
    let k_date = hmac_sha256(
        format!("AWS4{}", credentials.secret_access_key).as_bytes(),
        date.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    let k_signing = hmac_sha256(&k_service, b"aws4_request");
    let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes()));

    let authorization = format!(
        "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}",
        credentials.access_key_id,
    );

    let mut headers = vec![
        ("content-type".into(), CONTENT_TYPE.to_string()),
        ("x-amz-date".into(), amz_date),
        ("x-amz-target".into(), amz_target.to_string()),
        ("authorization".into(), authorization),
    ];
    if let Some(token) = &credentials.session_token {
        headers.push(("x-amz-security-token".into(), token.clone()));
    }
    headers
}
