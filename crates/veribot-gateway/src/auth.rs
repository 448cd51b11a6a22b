use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a GitHub-style `X-Hub-Signature-256: sha256=<hex>` header.
/// Grounded on skynet-gateway's `verify_hmac_sha256`, reused unmodified for
/// the two webhook sources that carry a shared secret (Evolution, Chatwoot);
/// Telegram has no signature scheme of its own — the bot token embedded in
/// the URL path is its credential.
pub fn verify_hmac_sha256(signature_header: Option<&str>, body: &[u8], secret: &str) -> Result<(), &'static str> {
    let sig_header = signature_header.ok_or("missing X-Hub-Signature-256 header")?;
    let sig_hex = sig_header.strip_prefix("sha256=").ok_or("malformed X-Hub-Signature-256 header")?;
    let expected = hex::decode(sig_hex).map_err(|_| "X-Hub-Signature-256 is not valid hex")?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "invalid HMAC key length")?;
    mac.update(body);
    mac.verify_slice(&expected).map_err(|_| "HMAC signature mismatch")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_header() {
        assert!(verify_hmac_sha256(None, b"body", "secret").is_err());
    }

    #[test]
    fn accepts_matching_signature() {
        let mut mac = HmacSha256::new_from_slice(b"secret").unwrap();
        mac.update(b"body");
        let sig = hex::encode(mac.finalize().into_bytes());
        let header = format!("sha256={sig}");
        assert!(verify_hmac_sha256(Some(&header), b"body", "secret").is_ok());
    }

    #[test]
    fn rejects_mismatched_signature() {
        let header = format!("sha256={}", hex::encode([0u8; 32]));
        assert!(verify_hmac_sha256(Some(&header), b"body", "secret").is_err());
    }
}
