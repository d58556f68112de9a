//! Payment webhook signature verification.
//!
//! Callbacks carry an HMAC-SHA256 signature over `<timestamp>.<payload>`
//! in a `t=<ts>,v1=<hex>` header. Timestamp bounds defend against replay.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::ports::PaymentGatewayError;

/// Maximum allowed age for callback events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components of the signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// HMAC-SHA256 signature bytes.
    pub signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parses a `t=<timestamp>,v1=<hex>` header. Unknown fields are
    /// ignored for forward compatibility.
    pub fn parse(header: &str) -> Result<Self, PaymentGatewayError> {
        let mut timestamp: Option<i64> = None;
        let mut signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(PaymentGatewayError::invalid_signature)?;
            match key {
                "t" => {
                    timestamp = Some(
                        value
                            .parse()
                            .map_err(|_| PaymentGatewayError::invalid_signature())?,
                    );
                }
                "v1" => {
                    signature = Some(
                        hex::decode(value)
                            .map_err(|_| PaymentGatewayError::invalid_signature())?,
                    );
                }
                _ => {}
            }
        }

        Ok(SignatureHeader {
            timestamp: timestamp.ok_or_else(PaymentGatewayError::invalid_signature)?,
            signature: signature.ok_or_else(PaymentGatewayError::invalid_signature)?,
        })
    }
}

/// Verifier for payment callback signatures.
pub struct WebhookVerifier {
    secret: Secret<String>,
}

impl WebhookVerifier {
    /// Creates a new verifier with the shared webhook secret.
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    /// Verifies the signature header against the raw payload.
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<(), PaymentGatewayError> {
        let header = SignatureHeader::parse(header)?;
        self.validate_timestamp(header.timestamp)?;

        let expected = self.compute_signature(header.timestamp, payload);
        if !constant_time_compare(&expected, &header.signature) {
            return Err(PaymentGatewayError::invalid_signature());
        }
        Ok(())
    }

    fn validate_timestamp(&self, timestamp: i64) -> Result<(), PaymentGatewayError> {
        let age = chrono::Utc::now().timestamp() - timestamp;
        if age > MAX_EVENT_AGE_SECS || age < -MAX_CLOCK_SKEW_SECS {
            return Err(PaymentGatewayError::invalid_signature());
        }
        Ok(())
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key");
        mac.update(signed_payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Constant-time comparison, so timing cannot leak the expected signature.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes a valid signature header value for test fixtures.
#[cfg(test)]
pub fn sign_for_test(secret: &str, timestamp: i64, payload: &str) -> String {
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(signed_payload.as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}
