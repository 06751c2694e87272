//! HMAC-SHA256 token and receipt codec.
//!
//! Wire format is `base64url(payload-json) . base64url(hmac(payload-b64))`
//! with unpadded URL-safe base64. Verification recomputes the MAC and
//! compares in constant time; the payload is only parsed after the MAC
//! checks out.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::types::Mode;

type HmacSha256 = Hmac<Sha256>;

/// Claims binding a client to one challenge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub challenge_id: String,
    pub mode: Mode,
    pub expires_at_ms: u64,
}

/// Signed assertion of a verdict, relayable to a party holding the secret.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptClaims {
    pub challenge_id: String,
    pub mode: Mode,
    pub verified: bool,
    pub score: f64,
    pub verdict: String,
    pub verified_at: u64,
}

fn mac(secret: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Sign raw payload bytes into the dotted wire form.
pub fn sign(secret: &[u8], payload: &[u8]) -> String {
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload);
    let sig = mac(secret, payload_b64.as_bytes());
    format!("{}.{}", payload_b64, URL_SAFE_NO_PAD.encode(sig))
}

/// Verify the dotted wire form and return the payload bytes. `None` for
/// any malformed or forged input.
pub fn verify(secret: &[u8], token: &str) -> Option<Vec<u8>> {
    let (payload_b64, sig_b64) = token.split_once('.')?;
    let claimed = URL_SAFE_NO_PAD.decode(sig_b64).ok()?;
    let expected = mac(secret, payload_b64.as_bytes());
    if claimed.len() != expected.len() || claimed.ct_eq(&expected).unwrap_u8() != 1 {
        return None;
    }
    URL_SAFE_NO_PAD.decode(payload_b64).ok()
}

pub fn sign_claims<T: Serialize>(secret: &[u8], claims: &T) -> anyhow::Result<String> {
    let payload = serde_json::to_vec(claims)?;
    Ok(sign(secret, &payload))
}

pub fn verify_claims<T: DeserializeOwned>(secret: &[u8], token: &str) -> Option<T> {
    let payload = verify(secret, token)?;
    serde_json::from_slice(&payload).ok()
}

/// First 16 hex chars of HMAC-SHA256(ip) keyed by the server secret: stable
/// per deployment, useless for recovering the address.
pub fn ip_hash(secret: &[u8], ip: &str) -> String {
    let digest = mac(secret, ip.as_bytes());
    hex::encode(&digest)[..16].to_string()
}

/// Constant-time equality for admin bearer tokens.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    a.len() == b.len() && a.ct_eq(b).unwrap_u8() == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test-secret-key";

    fn claims() -> TokenClaims {
        TokenClaims {
            challenge_id: "deadbeefdeadbeefdeadbeefdeadbeef".into(),
            mode: Mode::Standalone,
            expires_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn sign_verify_roundtrip() {
        let token = sign_claims(KEY, &claims()).unwrap();
        let back: TokenClaims = verify_claims(KEY, &token).unwrap();
        assert_eq!(back, claims());
    }

    #[test]
    fn tampered_signature_fails() {
        let token = sign_claims(KEY, &claims()).unwrap();
        let mut chars: Vec<char> = token.chars().collect();
        let last = *chars.last().unwrap();
        *chars.last_mut().unwrap() = if last == 'A' { 'B' } else { 'A' };
        let forged: String = chars.into_iter().collect();
        assert!(verify(KEY, &forged).is_none());
    }

    #[test]
    fn tampered_payload_fails() {
        let token = sign_claims(KEY, &claims()).unwrap();
        let (_, sig) = token.split_once('.').unwrap();
        let other = URL_SAFE_NO_PAD.encode(br#"{"challengeId":"ffff","mode":"embed","expiresAtMs":0}"#);
        assert!(verify(KEY, &format!("{other}.{sig}")).is_none());
    }

    #[test]
    fn wrong_key_fails() {
        let token = sign_claims(KEY, &claims()).unwrap();
        assert!(verify(b"other-key", &token).is_none());
    }

    #[test]
    fn malformed_tokens_fail_closed() {
        assert!(verify(KEY, "").is_none());
        assert!(verify(KEY, "no-dot").is_none());
        assert!(verify(KEY, "a.b.c").is_none());
        assert!(verify(KEY, "!!!.???").is_none());
    }

    #[test]
    fn wire_form_is_urlsafe_without_padding() {
        let token = sign_claims(KEY, &claims()).unwrap();
        assert!(!token.contains('='));
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
        assert_eq!(token.matches('.').count(), 1);
    }

    #[test]
    fn admin_comparator_rejects_wrong_and_wrong_length_tokens() {
        assert!(constant_time_eq("s3cret-admin", "s3cret-admin"));
        assert!(!constant_time_eq("s3cret-admin", "s3cret-admiN"));
        assert!(!constant_time_eq("s3cret-admin", "s3cret"));
        assert!(!constant_time_eq("", "s3cret-admin"));
    }

    #[test]
    fn ip_hash_is_sixteen_hex_and_keyed() {
        let h = ip_hash(KEY, "203.0.113.9");
        assert_eq!(h.len(), 16);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(h, ip_hash(b"other", "203.0.113.9"));
        assert_eq!(h, ip_hash(KEY, "203.0.113.9"));
    }
}
