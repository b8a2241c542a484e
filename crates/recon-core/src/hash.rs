#![deny(unsafe_code)]

use std::fs;
use std::path::Path;

use sha2::Digest;

use recon_model::{ReconError, Result};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    hex::encode(digest)
}

pub fn file_sha256(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|err| ReconError::io(path, err))?;
    Ok(sha256_hex(&bytes))
}
