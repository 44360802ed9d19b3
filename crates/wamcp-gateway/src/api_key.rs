// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! API key provisioning for the standalone REST server.

use std::path::Path;

use rand::RngCore;

use wamcp_core::WaError;

/// File under the auth data directory that holds the persisted key.
pub const API_KEY_FILE: &str = "api_key.txt";

/// 32 random bytes, hex-encoded.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Return the persisted key, creating it on first use.
///
/// With `persist == false` a fresh key is minted and nothing is written.
pub async fn load_or_create(auth_dir: &Path, persist: bool) -> Result<String, WaError> {
    if !persist {
        return Ok(generate_api_key());
    }

    let path = auth_dir.join(API_KEY_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(existing) if !existing.trim().is_empty() => return Ok(existing.trim().to_string()),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(WaError::internal_with(
                format!("Failed to read {}", path.display()),
                e,
            ));
        }
    }

    let key = generate_api_key();
    tokio::fs::create_dir_all(auth_dir)
        .await
        .map_err(|e| WaError::internal_with(format!("Failed to create {}", auth_dir.display()), e))?;
    tokio::fs::write(&path, &key)
        .await
        .map_err(|e| WaError::internal_with(format!("Failed to write {}", path.display()), e))?;
    tracing::info!(path = %path.display(), "generated new API key");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_64_hex_chars() {
        let key = generate_api_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_api_key());
    }

    #[tokio::test]
    async fn persisted_key_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let first = load_or_create(dir.path(), true).await.unwrap();
        let second = load_or_create(dir.path(), true).await.unwrap();
        assert_eq!(first, second);
        let on_disk = std::fs::read_to_string(dir.path().join(API_KEY_FILE)).unwrap();
        assert_eq!(on_disk, first);
    }

    #[tokio::test]
    async fn ephemeral_keys_are_fresh_and_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let first = load_or_create(dir.path(), false).await.unwrap();
        let second = load_or_create(dir.path(), false).await.unwrap();
        assert_ne!(first, second);
        assert!(!dir.path().join(API_KEY_FILE).exists());
    }
}
