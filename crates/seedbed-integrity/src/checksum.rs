use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn verify_sha256(bytes: &[u8], expected_hex: &str) -> Result<()> {
    let actual = sha256_hex(bytes);
    if !actual.eq_ignore_ascii_case(expected_hex) {
        return Err(anyhow!(
            "checksum mismatch: expected {expected_hex}, got {actual}"
        ));
    }
    Ok(())
}

pub fn verify_sha256_file(path: &Path, expected_hex: &str) -> Result<()> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read {} for checksum", path.display()))?;
    verify_sha256(&bytes, expected_hex)
        .with_context(|| format!("checksum verification failed for {}", path.display()))
}
