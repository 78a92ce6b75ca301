use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::core::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &[u8], message: &[u8]) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::internal(format!("HMAC key rejected: {}", e)))?;
    mac.update(message);
    Ok(mac)
}

/// Hex-encoded HMAC-SHA256 of `message`
pub fn sign_hmac_sha256(secret: &[u8], message: &[u8]) -> Result<String> {
    Ok(hex::encode(mac(secret, message)?.finalize().into_bytes()))
}

/// Check a hex signature in constant time
pub fn verify_hmac_sha256(secret: &[u8], message: &[u8], signature_hex: &str) -> Result<()> {
    let expected = hex::decode(signature_hex.trim())
        .map_err(|_| AppError::invalid_signature("Signature is not valid hex"))?;

    mac(secret, message)?
        .verify_slice(&expected)
        .map_err(|_| AppError::invalid_signature("Signature mismatch"))
}
