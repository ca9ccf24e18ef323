//! Slack `v0` request signature verification.

use hmac::{Hmac, Mac};
use relay_core::is_within_skew;
use sha2::Sha256;
use thiserror::Error;

pub const SLACK_SIGNATURE_HEADER: &str = "x-slack-signature";
pub const SLACK_TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

const SLACK_SIGNATURE_VERSION: &str = "v0";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("invalid request timestamp '{0}'")]
    InvalidTimestamp(String),
    #[error("request timestamp {timestamp} is outside the {max_age_seconds}s tolerance")]
    StaleTimestamp { timestamp: u64, max_age_seconds: u64 },
    #[error("signature must use v0=<hex> format")]
    UnsupportedVersion,
    #[error("invalid signature digest: {0}")]
    MalformedDigest(String),
    #[error("signing secret cannot be empty")]
    EmptySecret,
    #[error("signature verification failed")]
    Mismatch,
}

#[derive(Debug, Clone)]
pub struct SlackSignatureVerifier {
    signing_secret: String,
    max_age_seconds: u64,
}

impl SlackSignatureVerifier {
    pub fn new(signing_secret: impl Into<String>, max_age_seconds: u64) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            max_age_seconds,
        }
    }

    /// Checks the raw request body against the timestamp and signature headers
    /// at wall-clock time `now`.
    pub fn verify(
        &self,
        timestamp_header: Option<&str>,
        signature_header: Option<&str>,
        body: &[u8],
        now: u64,
    ) -> Result<(), SignatureError> {
        let secret = self.signing_secret.trim();
        if secret.is_empty() {
            return Err(SignatureError::EmptySecret);
        }
        let timestamp_raw = timestamp_header
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(SignatureError::MissingHeader(SLACK_TIMESTAMP_HEADER))?;
        let signature = signature_header
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(SignatureError::MissingHeader(SLACK_SIGNATURE_HEADER))?;

        let timestamp = timestamp_raw
            .parse::<u64>()
            .map_err(|_| SignatureError::InvalidTimestamp(timestamp_raw.to_string()))?;
        if !is_within_skew(timestamp, now, self.max_age_seconds) {
            return Err(SignatureError::StaleTimestamp {
                timestamp,
                max_age_seconds: self.max_age_seconds,
            });
        }

        let digest_hex = signature
            .strip_prefix(SLACK_SIGNATURE_VERSION)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or(SignatureError::UnsupportedVersion)?;
        let signature_bytes = decode_hex(digest_hex)?;

        signing_mac(secret, timestamp_raw, body)?
            .verify_slice(&signature_bytes)
            .map_err(|_| SignatureError::Mismatch)
    }
}

/// Returns the `v0=<hex>` signature Slack would send for `body`.
pub fn compute_slack_signature(
    signing_secret: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<String, SignatureError> {
    let mac = signing_mac(signing_secret.trim(), timestamp.trim(), body)?;
    let digest = mac
        .finalize()
        .into_bytes()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    Ok(format!("{SLACK_SIGNATURE_VERSION}={digest}"))
}

fn signing_mac(secret: &str, timestamp: &str, body: &[u8]) -> Result<Hmac<Sha256>, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::EmptySecret);
    }
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::EmptySecret)?;
    mac.update(SLACK_SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(mac)
}

fn decode_hex(raw: &str) -> Result<Vec<u8>, SignatureError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SignatureError::MalformedDigest(
            "digest cannot be empty".to_string(),
        ));
    }
    if trimmed.len() % 2 != 0 {
        return Err(SignatureError::MalformedDigest(
            "digest must have an even number of hex characters".to_string(),
        ));
    }
    let mut bytes = Vec::with_capacity(trimmed.len() / 2);
    let mut index = 0usize;
    while index < trimmed.len() {
        let next = index.saturating_add(2);
        let chunk = trimmed
            .get(index..next)
            .ok_or_else(|| SignatureError::MalformedDigest("digest is not ascii".to_string()))?;
        let byte = u8::from_str_radix(chunk, 16)
            .map_err(|_| SignatureError::MalformedDigest(format!("invalid hex byte '{chunk}'")))?;
        bytes.push(byte);
        index = next;
    }
    Ok(bytes)
}
