//! Content fingerprinting.
//!
//! SHA-256 hex digests used as the deduplication key for ingested
//! images. File hashing streams in fixed-size chunks so fingerprinting
//! never buffers a whole image in memory.

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::error::CoreError;

/// Chunk size for streaming file digests.
const HASH_CHUNK_BYTES: usize = 8192;

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Compute a SHA-256 hex digest of a file by streaming its contents.
pub async fn sha256_file(path: &Path) -> Result<String, CoreError> {
    let mut file = tokio::fs::File::open(path).await.map_err(|e| {
        CoreError::Internal(format!("Failed to open {} for hashing: {e}", path.display()))
    })?;

    let mut hasher = Sha256::new();
    let mut chunk = vec![0u8; HASH_CHUNK_BYTES];

    loop {
        let read = file.read(&mut chunk).await.map_err(|e| {
            CoreError::Internal(format!("Failed to read {} for hashing: {e}", path.display()))
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&chunk[..read]);
    }

    let hash = hasher.finalize();
    Ok(format!("{hash:x}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_produces_known_hash() {
        let hash = sha256_hex(b"");
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn consistent_output() {
        let data = b"hello world";
        assert_eq!(sha256_hex(data), sha256_hex(data));
        assert_eq!(sha256_hex(data).len(), 64);
    }

    #[tokio::test]
    async fn file_digest_matches_in_memory_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");

        // Larger than one chunk so the streaming loop iterates.
        let data: Vec<u8> = (0..HASH_CHUNK_BYTES * 3 + 17).map(|i| (i % 251) as u8).collect();
        tokio::fs::write(&path, &data).await.unwrap();

        let streamed = sha256_file(&path).await.unwrap();
        assert_eq!(streamed, sha256_hex(&data));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = sha256_file(&dir.path().join("absent")).await;
        assert!(result.is_err());
    }
}
