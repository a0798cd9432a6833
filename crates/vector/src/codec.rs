//! Packed little-endian FLOAT32 blobs, the layout RediSearch expects for
//! vector fields and KNN query parameters.

use qacache_common::{QaCacheError, Result};

/// Pack an embedding into little-endian `f32` bytes
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Unpack little-endian `f32` bytes
pub fn bytes_to_embedding(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(QaCacheError::invalid_input(format!(
            "Vector blob length {} is not a multiple of 4",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_little_endian() {
        assert_eq!(embedding_to_bytes(&[1.0]), vec![0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(embedding_to_bytes(&[1.0, -2.0]).len(), 8);
    }

    #[test]
    fn test_unpack() {
        let bytes = [0x00, 0x00, 0x80, 0x3f, 0x00, 0x00, 0x00, 0xc0];
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), vec![1.0, -2.0]);
    }

    #[test]
    fn test_unpack_rejects_truncated_blob() {
        assert!(bytes_to_embedding(&[0x00, 0x00, 0x80]).is_err());
        assert!(bytes_to_embedding(&[]).unwrap().is_empty());
    }
}
